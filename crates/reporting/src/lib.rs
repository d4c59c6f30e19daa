//! Billing metrics aggregation: MRR, plan breakdown, defaulters, churn,
//! cohorts and chart series. Everything here is deterministic; "today" is
//! always an argument.

pub mod charts;
pub mod churn;
pub mod defaulters;
pub mod mrr;
pub mod rates;
pub mod subscriptions;

pub use churn::{compute_churn_rate, identify_potential_churn, ChurnCriteria, ChurnRiskReport};
pub use defaulters::{defaulters_summary, DefaultersSummary, OverdueBucket};
pub use mrr::{calculate_mrr, MrrSummary};
pub use subscriptions::{cohort_retention, plan_distribution, subscription_stats};
