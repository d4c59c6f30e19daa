//! Subscription base: status counts, average ticket, plan distribution and
//! monthly cohorts.

use crate::charts::cohort_label;
use crate::mrr::plan_label;
use crate::rates::{percentage, ratio, round1};
use chrono::{Datelike, NaiveDate};
use pulse_core::types::{Subscription, SubscriptionStatus};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionStats {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
    pub pending: u64,
    pub cancelled: u64,
    pub other: u64,
    pub mrr: f64,
    pub average_ticket: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanCount {
    pub plan: String,
    pub subscribers: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortRow {
    pub cohort: NaiveDate,
    pub label: String,
    pub started: u64,
    pub retained: u64,
    pub retention_rate: f64,
}

pub fn subscription_stats(subscriptions: &[Subscription]) -> SubscriptionStats {
    let mut stats = SubscriptionStats::default();
    for sub in subscriptions {
        stats.total += 1;
        match sub.status {
            SubscriptionStatus::Active => {
                stats.active += 1;
                stats.mrr += sub.value;
            }
            SubscriptionStatus::Inactive => stats.inactive += 1,
            SubscriptionStatus::Pending => stats.pending += 1,
            SubscriptionStatus::Cancelled => stats.cancelled += 1,
            _ => stats.other += 1,
        }
    }
    stats.average_ticket = ratio(stats.mrr, stats.active as f64);
    stats
}

/// Subscriber count per plan across every status, largest first.
pub fn plan_distribution(subscriptions: &[Subscription]) -> Vec<PlanCount> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for sub in subscriptions {
        *counts.entry(plan_label(sub.billing_type.as_deref())).or_default() += 1;
    }
    let mut rows: Vec<PlanCount> = counts
        .into_iter()
        .map(|(plan, subscribers)| PlanCount {
            plan: plan.to_string(),
            subscribers,
        })
        .collect();
    rows.sort_by(|a, b| b.subscribers.cmp(&a.subscribers).then_with(|| a.plan.cmp(&b.plan)));
    rows
}

/// Group subscriptions by creation month, oldest first. Undated
/// subscriptions belong to no cohort.
pub fn cohort_retention(subscriptions: &[Subscription]) -> Vec<CohortRow> {
    let mut cohorts: BTreeMap<NaiveDate, (u64, u64)> = BTreeMap::new();
    for sub in subscriptions {
        let Some(month) = sub.date_created.and_then(|d| d.with_day(1)) else {
            continue;
        };
        let entry = cohorts.entry(month).or_default();
        entry.0 += 1;
        if sub.is_active() {
            entry.1 += 1;
        }
    }
    cohorts
        .into_iter()
        .map(|(cohort, (started, retained))| CohortRow {
            cohort,
            label: cohort_label(cohort),
            started,
            retained,
            retention_rate: round1(percentage(retained as f64, started as f64)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_billing::FixtureSource;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 30).unwrap()
    }

    #[test]
    fn test_stats_on_demo_data() {
        let source = FixtureSource::demo(today());
        let stats = subscription_stats(&source.data().subscriptions);
        assert_eq!(stats.total, 10);
        assert_eq!(stats.active, 6);
        assert_eq!(stats.cancelled, 2);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.inactive, 1);
        assert!((stats.mrr - 998.5).abs() < 1e-9);
        assert!((stats.average_ticket - 998.5 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_ticket_without_active() {
        assert_eq!(subscription_stats(&[]).average_ticket, 0.0);
    }

    #[test]
    fn test_plan_distribution_counts_all_statuses() {
        let source = FixtureSource::demo(today());
        let rows = plan_distribution(&source.data().subscriptions);
        assert_eq!(rows[0].plan, "CREDIT_CARD");
        assert_eq!(rows[0].subscribers, 4);
        let total: u64 = rows.iter().map(|r| r.subscribers).sum();
        assert_eq!(total, 10);
    }

    #[test]
    fn test_cohorts_by_creation_month() {
        let source = FixtureSource::demo(today());
        let rows = cohort_retention(&source.data().subscriptions);
        let started: u64 = rows.iter().map(|r| r.started).sum();
        assert_eq!(started, 10);
        assert!(rows.windows(2).all(|w| w[0].cohort < w[1].cohort));
        assert!(rows.iter().all(|r| r.retention_rate >= 0.0 && r.retention_rate <= 100.0));
    }
}
