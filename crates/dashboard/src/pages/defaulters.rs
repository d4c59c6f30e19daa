//! Defaulters page: overdue totals, ageing buckets and the delinquent
//! payments table.

use super::{directory, payment_identity, PageContext};
use crate::format::{self, Tone};
use crate::query::PageQuery;
use crate::table::{matches_search, paginate, Paginated};
use pulse_billing::ListParams;
use pulse_core::{PulseError, PulseResult};
use pulse_reporting::charts::{overdue_chart, ChartPoint};
use pulse_reporting::defaulters::{
    days_overdue, default_rate, defaulters_summary, BucketTotals, DelinquencyStatus, OverdueBucket,
};
use pulse_reporting::mrr::calculate_mrr;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultersPage {
    pub total_overdue: f64,
    pub total_overdue_display: String,
    pub default_rate: f64,
    pub default_rate_display: String,
    pub defaulters: u64,
    pub average_days_overdue: i64,
    pub buckets: Vec<BucketTotals>,
    pub bucket_chart: Vec<ChartPoint>,
    pub payments: Paginated<DefaulterRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaulterRow {
    pub payment_id: String,
    pub customer_id: String,
    pub name: String,
    pub email: String,
    pub value: f64,
    pub value_display: String,
    pub due_date: String,
    pub days_overdue: i64,
    pub status: DelinquencyStatus,
    pub status_label: String,
    pub tone: Tone,
}

fn status_tone(status: DelinquencyStatus) -> Tone {
    match status {
        DelinquencyStatus::Critical => Tone::Red,
        DelinquencyStatus::Resolved => Tone::Green,
        DelinquencyStatus::InProgress => Tone::Yellow,
    }
}

/// Days-overdue selection for the payments table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DaysFilter {
    Bucket(OverdueBucket),
    /// `31` / `31+`: everything past the first month.
    AtLeast(i64),
}

impl DaysFilter {
    fn contains(&self, days: i64) -> bool {
        match self {
            DaysFilter::Bucket(bucket) => bucket.contains(days),
            DaysFilter::AtLeast(min) => days >= *min,
        }
    }
}

/// `all` or absent disables the filter; otherwise a bucket label or `31+`.
fn days_filter(days: Option<&str>) -> PulseResult<Option<DaysFilter>> {
    match days.map(str::trim) {
        None | Some("") => Ok(None),
        Some(d) if d.eq_ignore_ascii_case("all") => Ok(None),
        Some("31") | Some("31+") => Ok(Some(DaysFilter::AtLeast(31))),
        Some(d) => OverdueBucket::from_label(d)
            .map(|b| Some(DaysFilter::Bucket(b)))
            .ok_or_else(|| PulseError::Validation(format!("unknown overdue range '{d}'"))),
    }
}

pub async fn assemble(ctx: &PageContext<'_>, query: &PageQuery) -> PulseResult<DefaultersPage> {
    let range = days_filter(query.days.as_deref())?;

    ctx.ensure_connected().await?;
    let overdue = ctx
        .source
        .get_payments(&ListParams::new().with_status("OVERDUE"))
        .await?;
    let subscriptions = ctx.source.get_subscriptions(&ListParams::new()).await?;
    let customers = ctx.source.get_customers(&ListParams::new()).await?;

    let today = ctx.clock.today();
    let summary = defaulters_summary(&overdue, today);
    let mrr = calculate_mrr(&subscriptions);
    let rate = default_rate(summary.total_overdue, mrr.total_mrr);

    let dir = directory(&customers);
    let rows: Vec<DefaulterRow> = overdue
        .iter()
        .filter(|p| p.is_overdue())
        .map(|p| {
            let (name, email) = payment_identity(p, &dir);
            let days = days_overdue(p.due_date, today);
            let status = DelinquencyStatus::for_days(days);
            DefaulterRow {
                payment_id: p.id.clone(),
                customer_id: p.customer.clone(),
                name,
                email,
                value: p.value,
                value_display: format::currency(p.value),
                due_date: format::date(p.due_date),
                days_overdue: days,
                status,
                status_label: status.label().to_string(),
                tone: status_tone(status),
            }
        })
        .filter(|row| matches_search(query.search.as_deref(), &row.name, &row.email))
        .filter(|row| range.map_or(true, |f| f.contains(row.days_overdue)))
        .collect();

    Ok(DefaultersPage {
        total_overdue: summary.total_overdue,
        total_overdue_display: format::currency(summary.total_overdue),
        default_rate: rate,
        default_rate_display: format::percent(rate),
        defaulters: summary.customer_count,
        average_days_overdue: summary.average_days_overdue,
        bucket_chart: overdue_chart(&summary),
        buckets: summary.payments_by_days_overdue,
        payments: paginate(rows, query.page(), ctx.options.items_per_page),
    })
}
