//! Plain-text rendering of dashboard pages.

use pulse_dashboard::pages::churn::ChurnPage;
use pulse_dashboard::pages::defaulters::DefaultersPage;
use pulse_dashboard::pages::mrr::MrrPage;
use pulse_dashboard::pages::overview::OverviewPage;
use pulse_dashboard::pages::subscriptions::SubscriptionsPage;
use pulse_dashboard::table::Paginated;
use pulse_dashboard::{format, PageView};

pub fn print_page(view: &PageView) {
    match view {
        PageView::Overview(page) => overview(page),
        PageView::Mrr(page) => mrr(page),
        PageView::Churn(page) => churn(page),
        PageView::Subscriptions(page) => subscriptions(page),
        PageView::Defaulters(page) => defaulters(page),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 {
        return String::new();
    }
    "#".repeat(((value / max) * 30.0).round() as usize)
}

fn pager<T>(page: &Paginated<T>) {
    println!(
        "  Page {} of {} ({} rows)",
        page.page,
        page.total_pages.max(1),
        page.total_items
    );
}

fn overview(page: &OverviewPage) {
    println!("=== Dashboard ({}) ===", page.period);
    println!();
    println!("  MRR:                {}", page.mrr_display);
    println!("  Active customers:   {}", page.active_customers);
    println!("  Churn rate:         {}", page.churn_rate_display);
    println!("  Overdue:            {}", page.overdue_display);
    println!(
        "  At-risk customers:  {} ({})",
        page.at_risk_customers, page.at_risk_share_display
    );
    println!();
    println!("  MRR trend");
    let max = page.mrr_trend.iter().map(|p| p.value).fold(0.0, f64::max);
    for point in &page.mrr_trend {
        println!(
            "    {:<5} {:>14} {}",
            point.label,
            format::currency(point.value),
            bar(point.value, max)
        );
    }
    println!();
    println!("  Customers at risk");
    println!("    {:<24} {:<30} {:>14} {:>6}", "Customer", "E-mail", "Amount", "Days");
    println!("    {}", "-".repeat(77));
    for row in &page.customers_at_risk {
        println!(
            "    {:<24} {:<30} {:>14} {:>6}",
            truncate(&row.name, 22),
            truncate(&row.email, 28),
            row.amount_display,
            row.days_overdue
        );
    }
}

fn mrr(page: &MrrPage) {
    println!("=== MRR ({}) ===", page.period);
    println!();
    println!("  MRR:   {}", page.mrr_display);
    println!("  ARR:   {}", page.arr_display);
    println!("  ARPU:  {}", page.arpu_display);
    println!("  LTV:   {}", page.ltv_display);
    println!(
        "  Active subscriptions: {}  Customers: {}",
        page.active_subscriptions, page.customers
    );
    println!();
    println!("  {:<20} {:>6} {:>16} {:>8}", "Plan", "Subs", "MRR", "Share");
    println!("  {}", "-".repeat(53));
    for plan in &page.plans {
        println!(
            "  {:<20} {:>6} {:>16} {:>8}",
            truncate(&plan.plan, 18),
            plan.subscriptions,
            plan.value_display,
            plan.percentage_display
        );
    }
    println!();
    println!("  MRR trend");
    let max = page.mrr_trend.iter().map(|p| p.value).fold(0.0, f64::max);
    for point in &page.mrr_trend {
        println!(
            "    {:<5} {:>14} {}",
            point.label,
            format::currency(point.value),
            bar(point.value, max)
        );
    }
}

fn churn(page: &ChurnPage) {
    println!("=== Churn ({}) ===", page.period);
    println!();
    println!("  Churn rate:      {}", page.churn_rate_display);
    println!("  Retention rate:  {}", page.retention_rate_display);
    println!("  Active:          {}", page.active_subscriptions);
    println!("  Lost customers:  {}", page.lost_customers);
    println!();
    println!(
        "  At risk (>= {} overdue payments)",
        page.criteria.payment_failures
    );
    println!("    {:<24} {:<30} {:>8} {:<6}", "Customer", "E-mail", "Failures", "Risk");
    println!("    {}", "-".repeat(71));
    for row in &page.at_risk {
        println!(
            "    {:<24} {:<30} {:>8} {:<6}",
            truncate(&row.name, 22),
            truncate(&row.email, 28),
            row.failures,
            row.risk_label
        );
    }
    if !page.unresolved.is_empty() {
        println!("    Unresolved: {}", page.unresolved.join(", "));
    }
    println!();
    println!("  Cohorts");
    println!("    {:<10} {:>8} {:>8} {:>10}", "Month", "Started", "Active", "Retention");
    for cohort in &page.cohorts {
        println!(
            "    {:<10} {:>8} {:>8} {:>10}",
            cohort.label,
            cohort.started,
            cohort.retained,
            format::percent(cohort.retention_rate)
        );
    }
}

fn subscriptions(page: &SubscriptionsPage) {
    println!("=== Subscriptions ===");
    println!();
    println!("  Active:          {}", page.active);
    println!("  Pending:         {}", page.pending);
    println!("  Inactive:        {}", page.inactive);
    println!("  Cancelled:       {}", page.cancelled);
    println!("  Average ticket:  {}", page.average_ticket_display);
    println!();
    println!("  Plan distribution");
    for plan in &page.plan_distribution {
        println!("    {:<20} {}", plan.plan, plan.subscribers);
    }
    println!();
    println!(
        "  {:<22} {:<28} {:<12} {:>12} {:<10} {:<10} Status",
        "Customer", "E-mail", "Plan", "Value", "Start", "Next due"
    );
    println!("  {}", "-".repeat(110));
    for row in &page.subscriptions.items {
        println!(
            "  {:<22} {:<28} {:<12} {:>12} {:<10} {:<10} {}",
            truncate(&row.name, 20),
            truncate(&row.email, 26),
            truncate(&row.plan, 12),
            row.value_display,
            row.start_date,
            row.next_due_date,
            row.status_label
        );
    }
    pager(&page.subscriptions);
}

fn defaulters(page: &DefaultersPage) {
    println!("=== Defaulters ===");
    println!();
    println!("  Total overdue:     {}", page.total_overdue_display);
    println!("  Default rate:      {}", page.default_rate_display);
    println!("  Defaulters:        {}", page.defaulters);
    println!("  Avg days overdue:  {}", page.average_days_overdue);
    println!();
    println!("  Overdue by age");
    let max = page.bucket_chart.iter().map(|p| p.value).fold(0.0, f64::max);
    for (bucket, point) in page.buckets.iter().zip(&page.bucket_chart) {
        println!(
            "    {:<11} {:>3} {:>14} {}",
            point.label,
            bucket.count,
            format::currency(point.value),
            bar(point.value, max)
        );
    }
    println!();
    println!(
        "  {:<22} {:<28} {:>12} {:<10} {:>5} Status",
        "Customer", "E-mail", "Value", "Due", "Days"
    );
    println!("  {}", "-".repeat(95));
    for row in &page.payments.items {
        println!(
            "  {:<22} {:<28} {:>12} {:<10} {:>5} {}",
            truncate(&row.name, 20),
            truncate(&row.email, 26),
            row.value_display,
            row.due_date,
            row.days_overdue,
            row.status_label
        );
    }
    pager(&page.payments);
}
