//! Overview page: headline figures, MRR trend and the first overdue
//! customers.

use super::{directory, payment_identity, PageContext};
use crate::format;
use crate::query::PageQuery;
use pulse_billing::ListParams;
use pulse_core::PulseResult;
use pulse_reporting::charts::{trend_chart, ChartPoint};
use pulse_reporting::churn::{churn_snapshot, flag_churn_candidates, ChurnCriteria};
use pulse_reporting::defaulters::{days_overdue, defaulters_summary};
use pulse_reporting::mrr::{calculate_mrr, mrr_trend};
use pulse_reporting::rates::{percentage, round1};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewPage {
    pub period: String,
    pub mrr: f64,
    pub mrr_display: String,
    pub active_customers: u64,
    pub churn_rate: f64,
    pub churn_rate_display: String,
    pub overdue_total: f64,
    pub overdue_display: String,
    pub at_risk_customers: u64,
    pub at_risk_share: f64,
    pub at_risk_share_display: String,
    pub mrr_trend: Vec<ChartPoint>,
    pub customers_at_risk: Vec<AtRiskRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtRiskRow {
    pub payment_id: String,
    pub customer_id: String,
    pub name: String,
    pub email: String,
    pub amount: f64,
    pub amount_display: String,
    pub days_overdue: i64,
}

pub async fn assemble(
    ctx: &PageContext<'_>,
    query: &PageQuery,
    criteria: &ChurnCriteria,
) -> PulseResult<OverviewPage> {
    ctx.ensure_connected().await?;
    let customers = ctx.source.get_customers(&ListParams::new()).await?;
    let subscriptions = ctx.source.get_subscriptions(&ListParams::new()).await?;
    let overdue = ctx
        .source
        .get_payments(&ListParams::new().with_status("OVERDUE"))
        .await?;

    let today = ctx.clock.today();
    let mrr = calculate_mrr(&subscriptions);
    let churn = churn_snapshot(&subscriptions);
    let defaulters = defaulters_summary(&overdue, today);
    let at_risk = flag_churn_candidates(&overdue, criteria).len() as u64;
    let at_risk_share = round1(percentage(at_risk as f64, customers.len() as f64));
    let trend = mrr_trend(&subscriptions, today, query.period.trend_months(today));

    let dir = directory(&customers);
    let customers_at_risk = overdue
        .iter()
        .filter(|p| p.is_overdue())
        .take(ctx.options.at_risk_preview)
        .map(|p| {
            let (name, email) = payment_identity(p, &dir);
            AtRiskRow {
                payment_id: p.id.clone(),
                customer_id: p.customer.clone(),
                name,
                email,
                amount: p.value,
                amount_display: format::currency(p.value),
                days_overdue: days_overdue(p.due_date, today),
            }
        })
        .collect();

    Ok(OverviewPage {
        period: query.period.to_string(),
        mrr: mrr.total_mrr,
        mrr_display: format::currency(mrr.total_mrr),
        active_customers: customers.len() as u64,
        churn_rate: churn.churn_rate,
        churn_rate_display: format::percent(churn.churn_rate),
        overdue_total: defaulters.total_overdue,
        overdue_display: format::currency(defaulters.total_overdue),
        at_risk_customers: at_risk,
        at_risk_share,
        at_risk_share_display: format::percent(at_risk_share),
        mrr_trend: trend_chart(&trend),
        customers_at_risk,
    })
}

#[cfg(test)]
mod tests {
    use super::super::testing;
    use super::*;
    use crate::query::Period;
    use pulse_billing::FixtureSource;
    use pulse_core::PulseError;

    #[tokio::test]
    async fn test_overview_from_demo_data() {
        let source = FixtureSource::demo(testing::today());
        let clock = testing::clock();
        let options = testing::options();
        let ctx = PageContext {
            source: &source,
            clock: &clock,
            options: &options,
        };
        let page = assemble(&ctx, &PageQuery::default(), &ChurnCriteria::default())
            .await
            .unwrap();

        assert_eq!(page.mrr_display, "R$ 998,50");
        assert_eq!(page.active_customers, 8);
        assert_eq!(page.churn_rate, 25.0);
        assert_eq!(page.at_risk_customers, 2);
        assert_eq!(page.at_risk_share, 25.0);
        assert_eq!(page.mrr_trend.len(), 6);
        assert_eq!(page.customers_at_risk.len(), 4);
        assert_eq!(page.customers_at_risk[0].days_overdue, 5);
    }

    #[tokio::test]
    async fn test_period_changes_trend_window() {
        let source = FixtureSource::demo(testing::today());
        let clock = testing::clock();
        let options = testing::options();
        let ctx = PageContext {
            source: &source,
            clock: &clock,
            options: &options,
        };
        let query = PageQuery {
            period: Period::Last12Months,
            ..PageQuery::default()
        };
        let page = assemble(&ctx, &query, &ChurnCriteria::default()).await.unwrap();
        assert_eq!(page.mrr_trend.len(), 12);
        assert_eq!(page.period, "12m");
    }

    #[tokio::test]
    async fn test_offline_yields_no_partial_data() {
        let source = FixtureSource::demo(testing::today()).offline();
        let clock = testing::clock();
        let options = testing::options();
        let ctx = PageContext {
            source: &source,
            clock: &clock,
            options: &options,
        };
        let result = assemble(&ctx, &PageQuery::default(), &ChurnCriteria::default()).await;
        assert!(matches!(result, Err(PulseError::Connectivity(_))));
    }
}
