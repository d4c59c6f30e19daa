//! Churn: cancellation rate and payment-failure risk detection.

use crate::rates::{percentage, round1};
use pulse_billing::BillingSource;
use pulse_core::types::{Customer, Payment, Subscription, SubscriptionStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Thresholds used to flag customers at risk of churning.
///
/// Only `payment_failures` is evaluated; the inactivity and usage thresholds
/// are kept with the saved settings for when usage data becomes available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChurnCriteria {
    pub inactivity_threshold: u32,
    pub usage_threshold: u32,
    pub payment_failures: u32,
}

impl Default for ChurnCriteria {
    fn default() -> Self {
        Self {
            inactivity_threshold: 14,
            usage_threshold: 30,
            payment_failures: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Medium,
    High,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Medium => "Médio",
            RiskLevel::High => "Alto",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChurnCandidate {
    pub customer_id: String,
    pub failures: u32,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtRiskCustomer {
    pub customer: Customer,
    pub risk_factor: String,
    pub risk_level: RiskLevel,
    pub failures: u32,
}

/// Enriched candidates plus the ids whose customer lookup failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChurnRiskReport {
    pub customers: Vec<AtRiskCustomer>,
    pub unresolved: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChurnSnapshot {
    pub active: u64,
    pub cancelled: u64,
    pub churn_rate: f64,
    pub retention_rate: f64,
}

/// Customers whose OVERDUE payment count reaches `criteria.payment_failures`,
/// most failures first.
pub fn flag_churn_candidates(payments: &[Payment], criteria: &ChurnCriteria) -> Vec<ChurnCandidate> {
    let mut failures: HashMap<&str, u32> = HashMap::new();
    for payment in payments.iter().filter(|p| p.is_overdue()) {
        *failures.entry(payment.customer.as_str()).or_default() += 1;
    }

    let threshold = criteria.payment_failures.max(1);
    let high_at = f64::from(threshold) * 1.5;
    let mut candidates: Vec<ChurnCandidate> = failures
        .into_iter()
        .filter(|(_, count)| *count >= threshold)
        .map(|(id, count)| ChurnCandidate {
            customer_id: id.to_string(),
            failures: count,
            risk_level: if f64::from(count) >= high_at {
                RiskLevel::High
            } else {
                RiskLevel::Medium
            },
        })
        .collect();
    candidates.sort_by(|a, b| {
        b.failures
            .cmp(&a.failures)
            .then_with(|| a.customer_id.cmp(&b.customer_id))
    });
    candidates
}

/// Flag candidates and look each one up. A failed lookup is logged and the
/// id reported in `unresolved`; it never aborts the rest.
pub async fn identify_potential_churn(
    source: &dyn BillingSource,
    payments: &[Payment],
    criteria: &ChurnCriteria,
) -> ChurnRiskReport {
    let mut report = ChurnRiskReport::default();
    for candidate in flag_churn_candidates(payments, criteria) {
        match source.get_customer_by_id(&candidate.customer_id).await {
            Ok(customer) => report.customers.push(AtRiskCustomer {
                customer,
                risk_factor: "payment_failures".to_string(),
                risk_level: candidate.risk_level,
                failures: candidate.failures,
            }),
            Err(e) => {
                warn!(customer_id = %candidate.customer_id, error = %e, "Churn candidate lookup failed");
                report.unresolved.push(candidate.customer_id);
            }
        }
    }
    debug!(
        at_risk = report.customers.len(),
        unresolved = report.unresolved.len(),
        "Churn risk identified"
    );
    report
}

/// `cancelled / (active + cancelled) * 100`, one decimal. 0 with no data.
pub fn compute_churn_rate(active: u64, cancelled: u64) -> f64 {
    round1(percentage(cancelled as f64, (active + cancelled) as f64))
}

pub fn retention_rate(churn_rate: f64) -> f64 {
    round1(100.0 - churn_rate)
}

pub fn churn_snapshot(subscriptions: &[Subscription]) -> ChurnSnapshot {
    let active = subscriptions.iter().filter(|s| s.is_active()).count() as u64;
    let cancelled = subscriptions
        .iter()
        .filter(|s| s.status == SubscriptionStatus::Cancelled)
        .count() as u64;
    let churn_rate = compute_churn_rate(active, cancelled);
    ChurnSnapshot {
        active,
        cancelled,
        churn_rate,
        retention_rate: retention_rate(churn_rate),
    }
}
