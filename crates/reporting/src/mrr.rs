//! Recurring revenue: MRR, plan breakdown, ARR/ARPU/LTV and the monthly
//! MRR trend.

use crate::charts::month_label;
use crate::rates::{percentage, ratio};
use chrono::{Datelike, Duration, Months, NaiveDate};
use pulse_core::types::Subscription;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label used for subscriptions without a billing type.
pub const UNLABELED_PLAN: &str = "Outros";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanTotals {
    pub count: u64,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MrrSummary {
    pub total_mrr: f64,
    pub subscription_count: u64,
    pub subscriptions_by_plan: BTreeMap<String, PlanTotals>,
}

/// One row of the plan breakdown, with its share of total MRR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanShare {
    pub plan: String,
    pub count: u64,
    pub value: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RevenueMetrics {
    pub mrr: f64,
    pub arr: f64,
    pub arpu: f64,
    pub ltv: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub month: NaiveDate,
    pub label: String,
    pub value: f64,
}

pub fn plan_label(billing_type: Option<&str>) -> &str {
    match billing_type {
        Some(label) if !label.trim().is_empty() => label,
        _ => UNLABELED_PLAN,
    }
}

/// Sum ACTIVE subscription values, grouped by billing type.
pub fn calculate_mrr(subscriptions: &[Subscription]) -> MrrSummary {
    let mut summary = MrrSummary::default();
    for sub in subscriptions.iter().filter(|s| s.is_active()) {
        summary.total_mrr += sub.value;
        summary.subscription_count += 1;
        let plan = plan_label(sub.billing_type.as_deref()).to_string();
        let entry = summary.subscriptions_by_plan.entry(plan).or_default();
        entry.count += 1;
        entry.value += sub.value;
    }
    summary
}

impl MrrSummary {
    /// Plans ordered by value descending. Percentages are 0 when MRR is 0.
    pub fn plan_breakdown(&self) -> Vec<PlanShare> {
        let mut rows: Vec<PlanShare> = self
            .subscriptions_by_plan
            .iter()
            .map(|(plan, totals)| PlanShare {
                plan: plan.clone(),
                count: totals.count,
                value: totals.value,
                percentage: percentage(totals.value, self.total_mrr),
            })
            .collect();
        rows.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.plan.cmp(&b.plan)));
        rows
    }
}

pub fn revenue_metrics(mrr: f64, customer_count: u64, ltv_months: u32) -> RevenueMetrics {
    let arpu = ratio(mrr, customer_count as f64);
    RevenueMetrics {
        mrr,
        arr: mrr * 12.0,
        arpu,
        ltv: arpu * f64::from(ltv_months),
    }
}

/// MRR at the end of each of the last `months` months, oldest first.
///
/// A subscription counts towards a month when it is ACTIVE now and was
/// created on or before that month's last day. Undated subscriptions count
/// in every month. The current month ends at `today`.
pub fn mrr_trend(subscriptions: &[Subscription], today: NaiveDate, months: u32) -> Vec<TrendPoint> {
    let Some(current) = today.with_day(1) else {
        return Vec::new();
    };

    (0..months)
        .rev()
        .filter_map(|back| {
            let start = current.checked_sub_months(Months::new(back))?;
            let end = if back == 0 {
                today
            } else {
                start.checked_add_months(Months::new(1))? - Duration::days(1)
            };
            let value = subscriptions
                .iter()
                .filter(|s| s.is_active())
                .filter(|s| s.date_created.map_or(true, |d| d <= end))
                .map(|s| s.value)
                .sum();
            Some(TrendPoint {
                month: start,
                label: month_label(start).to_string(),
                value,
            })
        })
        .collect()
}
