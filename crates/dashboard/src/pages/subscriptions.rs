//! Subscriptions page: status counts, plan distribution and the
//! searchable subscription table.

use super::{customer_identity, directory, PageContext};
use crate::format::{self, Tone};
use crate::query::PageQuery;
use crate::table::{matches_choice, matches_search, paginate, Paginated};
use pulse_billing::ListParams;
use pulse_core::types::{Subscription, SubscriptionStatus};
use pulse_core::PulseResult;
use pulse_reporting::mrr::plan_label;
use pulse_reporting::subscriptions::{plan_distribution, subscription_stats, PlanCount};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionsPage {
    pub active: u64,
    pub inactive: u64,
    pub pending: u64,
    pub cancelled: u64,
    pub total: u64,
    pub average_ticket: f64,
    pub average_ticket_display: String,
    pub plan_distribution: Vec<PlanCount>,
    /// Plans available to the plan filter.
    pub plans: Vec<String>,
    pub subscriptions: Paginated<SubscriptionRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRow {
    pub id: String,
    pub customer_id: String,
    pub name: String,
    pub email: String,
    pub plan: String,
    pub value: f64,
    pub value_display: String,
    pub start_date: String,
    pub next_due_date: String,
    pub status: SubscriptionStatus,
    pub status_label: String,
    pub tone: Tone,
}

pub fn status_badge(status: SubscriptionStatus) -> (&'static str, Tone) {
    match status {
        SubscriptionStatus::Active => ("Ativa", Tone::Green),
        SubscriptionStatus::Inactive => ("Inativa", Tone::Red),
        SubscriptionStatus::Pending => ("Pendente", Tone::Yellow),
        SubscriptionStatus::Cancelled => ("Cancelada", Tone::Red),
        SubscriptionStatus::Expired => ("Expirada", Tone::Gray),
        SubscriptionStatus::Unknown => ("Desconhecida", Tone::Gray),
    }
}

pub async fn assemble(ctx: &PageContext<'_>, query: &PageQuery) -> PulseResult<SubscriptionsPage> {
    ctx.ensure_connected().await?;
    let subscriptions = ctx.source.get_subscriptions(&ListParams::new()).await?;
    let customers = ctx.source.get_customers(&ListParams::new()).await?;

    let stats = subscription_stats(&subscriptions);
    let distribution = plan_distribution(&subscriptions);
    let plans = distribution.iter().map(|p| p.plan.clone()).collect();

    let dir = directory(&customers);
    let rows: Vec<SubscriptionRow> = subscriptions
        .iter()
        .map(|sub| to_row(sub, customer_identity(dir.get(sub.customer.as_str()).copied())))
        .filter(|row| matches_search(query.search.as_deref(), &row.name, &row.email))
        .filter(|row| matches_choice(query.plan.as_deref(), &row.plan))
        .collect();

    Ok(SubscriptionsPage {
        active: stats.active,
        inactive: stats.inactive,
        pending: stats.pending,
        cancelled: stats.cancelled,
        total: stats.total,
        average_ticket: stats.average_ticket,
        average_ticket_display: format::currency(stats.average_ticket),
        plan_distribution: distribution,
        plans,
        subscriptions: paginate(rows, query.page(), ctx.options.items_per_page),
    })
}

fn to_row(sub: &Subscription, (name, email): (String, String)) -> SubscriptionRow {
    let (label, tone) = status_badge(sub.status);
    SubscriptionRow {
        id: sub.id.clone(),
        customer_id: sub.customer.clone(),
        name,
        email,
        plan: plan_label(sub.billing_type.as_deref()).to_string(),
        value: sub.value,
        value_display: format::currency(sub.value),
        start_date: format::optional_date(sub.date_created),
        next_due_date: format::optional_date(sub.next_due_date),
        status: sub.status,
        status_label: label.to_string(),
        tone,
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing;
    use super::*;
    use pulse_billing::FixtureSource;

    async fn load(query: PageQuery) -> SubscriptionsPage {
        let source = FixtureSource::demo(testing::today());
        let clock = testing::clock();
        let options = testing::options();
        let ctx = PageContext {
            source: &source,
            clock: &clock,
            options: &options,
        };
        assemble(&ctx, &query).await.unwrap()
    }

    #[tokio::test]
    async fn test_counts_and_first_page() {
        let page = load(PageQuery::default()).await;
        assert_eq!(page.active, 6);
        assert_eq!(page.cancelled, 2);
        assert_eq!(page.total, 10);
        assert_eq!(page.average_ticket_display, "R$ 166,42");
        assert_eq!(page.subscriptions.items.len(), 4);
        assert_eq!(page.subscriptions.total_items, 10);
        assert_eq!(page.subscriptions.total_pages, 3);
        assert_eq!(page.subscriptions.items[0].name, "Ana Souza");
    }

    #[tokio::test]
    async fn test_search_and_plan_filter() {
        let page = load(PageQuery {
            search: Some("BRUNO".into()),
            ..PageQuery::default()
        })
        .await;
        assert_eq!(page.subscriptions.total_items, 2);
        assert!(page.subscriptions.items.iter().all(|r| r.customer_id == "cus_002"));

        let page = load(PageQuery {
            plan: Some("pix".into()),
            ..PageQuery::default()
        })
        .await;
        assert_eq!(page.subscriptions.total_items, 3);
        assert!(page.subscriptions.items.iter().all(|r| r.plan == "PIX"));
    }

    #[tokio::test]
    async fn test_out_of_range_page() {
        let page = load(PageQuery {
            page: 9,
            ..PageQuery::default()
        })
        .await;
        assert!(page.subscriptions.items.is_empty());
        assert_eq!(page.subscriptions.total_items, 10);
    }

    #[test]
    fn test_status_badges() {
        assert_eq!(status_badge(SubscriptionStatus::Cancelled), ("Cancelada", Tone::Red));
        assert_eq!(status_badge(SubscriptionStatus::Pending).1, Tone::Yellow);
        assert_eq!(status_badge(SubscriptionStatus::Active).0, "Ativa");
    }
}
