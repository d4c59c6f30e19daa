//! Churn page: cancellation and retention rates, at-risk customers and
//! monthly cohorts.

use super::{customer_identity, PageContext};
use crate::format;
use crate::query::PageQuery;
use pulse_billing::ListParams;
use pulse_core::PulseResult;
use pulse_reporting::churn::{churn_snapshot, identify_potential_churn, ChurnCriteria, RiskLevel};
use pulse_reporting::subscriptions::{cohort_retention, CohortRow};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurnPage {
    pub period: String,
    pub churn_rate: f64,
    pub churn_rate_display: String,
    pub retention_rate: f64,
    pub retention_rate_display: String,
    pub active_subscriptions: u64,
    pub lost_customers: u64,
    pub criteria: ChurnCriteria,
    pub at_risk: Vec<AtRiskCustomerRow>,
    /// Candidates whose customer lookup failed.
    pub unresolved: Vec<String>,
    pub cohorts: Vec<CohortRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtRiskCustomerRow {
    pub customer_id: String,
    pub name: String,
    pub email: String,
    pub risk_factor: String,
    pub failures: u32,
    pub risk_level: RiskLevel,
    pub risk_label: String,
}

pub async fn assemble(
    ctx: &PageContext<'_>,
    query: &PageQuery,
    criteria: &ChurnCriteria,
) -> PulseResult<ChurnPage> {
    ctx.ensure_connected().await?;
    let subscriptions = ctx.source.get_subscriptions(&ListParams::new()).await?;
    let overdue = ctx
        .source
        .get_payments(&ListParams::new().with_status("OVERDUE"))
        .await?;

    let snapshot = churn_snapshot(&subscriptions);
    let report = identify_potential_churn(ctx.source, &overdue, criteria).await;

    let at_risk = report
        .customers
        .iter()
        .map(|entry| {
            let (name, email) = customer_identity(Some(&entry.customer));
            AtRiskCustomerRow {
                customer_id: entry.customer.id.clone(),
                name,
                email,
                risk_factor: entry.risk_factor.clone(),
                failures: entry.failures,
                risk_level: entry.risk_level,
                risk_label: entry.risk_level.label().to_string(),
            }
        })
        .collect();

    Ok(ChurnPage {
        period: query.period.to_string(),
        churn_rate: snapshot.churn_rate,
        churn_rate_display: format::percent(snapshot.churn_rate),
        retention_rate: snapshot.retention_rate,
        retention_rate_display: format::percent(snapshot.retention_rate),
        active_subscriptions: snapshot.active,
        lost_customers: snapshot.cancelled,
        criteria: *criteria,
        at_risk,
        unresolved: report.unresolved,
        cohorts: cohort_retention(&subscriptions),
    })
}
