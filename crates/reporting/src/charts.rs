//! Chart series. Labels are pt-BR.

use crate::defaulters::DefaultersSummary;
use crate::mrr::{PlanShare, TrendPoint};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

const MONTHS: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

impl ChartPoint {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

pub fn month_label(date: NaiveDate) -> &'static str {
    MONTHS[date.month0() as usize]
}

/// `jan/2026`
pub fn cohort_label(date: NaiveDate) -> String {
    format!("{}/{}", month_label(date), date.year())
}

pub fn plan_chart(plans: &[PlanShare]) -> Vec<ChartPoint> {
    plans
        .iter()
        .map(|p| ChartPoint::new(p.plan.clone(), p.value))
        .collect()
}

pub fn overdue_chart(summary: &DefaultersSummary) -> Vec<ChartPoint> {
    summary
        .payments_by_days_overdue
        .iter()
        .map(|b| ChartPoint::new(format!("{} dias", b.bucket.label()), b.value))
        .collect()
}

pub fn trend_chart(trend: &[TrendPoint]) -> Vec<ChartPoint> {
    trend
        .iter()
        .map(|p| ChartPoint::new(p.label.clone(), p.value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaulters::defaulters_summary;

    #[test]
    fn test_month_labels() {
        let date = NaiveDate::from_ymd_opt(2026, 12, 5).unwrap();
        assert_eq!(month_label(date), "dez");
        assert_eq!(cohort_label(date), "dez/2026");
    }

    #[test]
    fn test_overdue_chart_has_every_bucket() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 30).unwrap();
        let points = overdue_chart(&defaulters_summary(&[], today));
        let labels: Vec<&str> = points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["1-7 dias", "8-15 dias", "16-30 dias", "31-60 dias", "60+ dias"]);
    }
}
