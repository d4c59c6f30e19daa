//! MRR page: recurring revenue figures and plan breakdown.

use super::PageContext;
use crate::format;
use crate::query::PageQuery;
use pulse_billing::ListParams;
use pulse_core::PulseResult;
use pulse_reporting::charts::{plan_chart, trend_chart, ChartPoint};
use pulse_reporting::mrr::{calculate_mrr, mrr_trend, revenue_metrics};
use pulse_reporting::rates::round1;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MrrPage {
    pub period: String,
    pub mrr: f64,
    pub mrr_display: String,
    pub arr: f64,
    pub arr_display: String,
    pub arpu: f64,
    pub arpu_display: String,
    pub ltv: f64,
    pub ltv_display: String,
    pub active_subscriptions: u64,
    pub customers: u64,
    pub plans: Vec<PlanRow>,
    pub plan_chart: Vec<ChartPoint>,
    pub mrr_trend: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRow {
    pub plan: String,
    pub subscriptions: u64,
    pub value: f64,
    pub value_display: String,
    pub percentage: f64,
    pub percentage_display: String,
}

pub async fn assemble(ctx: &PageContext<'_>, query: &PageQuery) -> PulseResult<MrrPage> {
    ctx.ensure_connected().await?;
    let customers = ctx.source.get_customers(&ListParams::new()).await?;
    let subscriptions = ctx.source.get_subscriptions(&ListParams::new()).await?;

    let today = ctx.clock.today();
    let summary = calculate_mrr(&subscriptions);
    let revenue = revenue_metrics(summary.total_mrr, customers.len() as u64, ctx.options.ltv_months);
    let breakdown = summary.plan_breakdown();
    let trend = mrr_trend(&subscriptions, today, query.period.trend_months(today));

    let plans = breakdown
        .iter()
        .map(|share| {
            let pct = round1(share.percentage);
            PlanRow {
                plan: share.plan.clone(),
                subscriptions: share.count,
                value: share.value,
                value_display: format::currency(share.value),
                percentage: pct,
                percentage_display: format::percent(pct),
            }
        })
        .collect();

    Ok(MrrPage {
        period: query.period.to_string(),
        mrr: revenue.mrr,
        mrr_display: format::currency(revenue.mrr),
        arr: revenue.arr,
        arr_display: format::currency(revenue.arr),
        arpu: revenue.arpu,
        arpu_display: format::currency(revenue.arpu),
        ltv: revenue.ltv,
        ltv_display: format::currency(revenue.ltv),
        active_subscriptions: summary.subscription_count,
        customers: customers.len() as u64,
        plans,
        plan_chart: plan_chart(&breakdown),
        mrr_trend: trend_chart(&trend),
    })
}

#[cfg(test)]
mod tests {
    use super::super::testing;
    use super::*;
    use pulse_billing::FixtureSource;

    #[tokio::test]
    async fn test_mrr_page_from_demo_data() {
        let source = FixtureSource::demo(testing::today());
        let clock = testing::clock();
        let options = testing::options();
        let ctx = PageContext {
            source: &source,
            clock: &clock,
            options: &options,
        };
        let page = assemble(&ctx, &PageQuery::default()).await.unwrap();

        assert_eq!(page.mrr_display, "R$ 998,50");
        assert_eq!(page.arr_display, "R$ 11.982,00");
        assert_eq!(page.active_subscriptions, 6);
        assert_eq!(page.customers, 8);
        assert!((page.arpu - 998.5 / 8.0).abs() < 1e-9);
        assert!((page.ltv - page.arpu * 30.0).abs() < 1e-9);

        assert_eq!(page.plans[0].plan, "CREDIT_CARD");
        assert_eq!(page.plans[0].value_display, "R$ 698,90");
        let total: f64 = page.plans.iter().map(|p| p.percentage).sum();
        assert!((total - 100.0).abs() <= 0.2);
        assert_eq!(page.plan_chart.len(), page.plans.len());
    }
}
