//! Overdue payments: totals, ageing buckets and delinquency status.

use crate::rates::{percentage, round1};
use chrono::NaiveDate;
use pulse_core::types::Payment;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ageing bucket of an overdue payment, by whole days past due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OverdueBucket {
    #[serde(rename = "1-7")]
    UpToWeek,
    #[serde(rename = "8-15")]
    UpToFortnight,
    #[serde(rename = "16-30")]
    UpToMonth,
    #[serde(rename = "31-60")]
    UpToTwoMonths,
    #[serde(rename = "60+")]
    OverTwoMonths,
}

impl OverdueBucket {
    pub const ALL: [OverdueBucket; 5] = [
        OverdueBucket::UpToWeek,
        OverdueBucket::UpToFortnight,
        OverdueBucket::UpToMonth,
        OverdueBucket::UpToTwoMonths,
        OverdueBucket::OverTwoMonths,
    ];

    pub fn for_days(days: i64) -> Self {
        match days {
            d if d <= 7 => OverdueBucket::UpToWeek,
            d if d <= 15 => OverdueBucket::UpToFortnight,
            d if d <= 30 => OverdueBucket::UpToMonth,
            d if d <= 60 => OverdueBucket::UpToTwoMonths,
            _ => OverdueBucket::OverTwoMonths,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OverdueBucket::UpToWeek => "1-7",
            OverdueBucket::UpToFortnight => "8-15",
            OverdueBucket::UpToMonth => "16-30",
            OverdueBucket::UpToTwoMonths => "31-60",
            OverdueBucket::OverTwoMonths => "60+",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.label() == label.trim())
    }

    pub fn contains(&self, days: i64) -> bool {
        Self::for_days(days) == *self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BucketTotals {
    pub bucket: OverdueBucket,
    pub count: u64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultersSummary {
    pub total_overdue: f64,
    pub customer_count: u64,
    pub payment_count: u64,
    pub average_days_overdue: i64,
    /// Always all five buckets, youngest first.
    pub payments_by_days_overdue: Vec<BucketTotals>,
}

impl DefaultersSummary {
    pub fn bucket(&self, bucket: OverdueBucket) -> BucketTotals {
        self.payments_by_days_overdue
            .iter()
            .copied()
            .find(|b| b.bucket == bucket)
            .unwrap_or(BucketTotals {
                bucket,
                count: 0,
                value: 0.0,
            })
    }
}

/// Whole days between the due date and `today`. Payments not yet due count
/// as 0 days overdue.
pub fn days_overdue(due_date: NaiveDate, today: NaiveDate) -> i64 {
    (today - due_date).num_days().max(0)
}

/// Rounded mean of days overdue; 0 for no payments.
pub fn average_days_overdue(payments: &[Payment], today: NaiveDate) -> i64 {
    let overdue: Vec<i64> = payments
        .iter()
        .filter(|p| p.is_overdue())
        .map(|p| days_overdue(p.due_date, today))
        .collect();
    if overdue.is_empty() {
        return 0;
    }
    (overdue.iter().sum::<i64>() as f64 / overdue.len() as f64).round() as i64
}

/// Overdue total as a share of MRR, one decimal. 0 when MRR is 0.
pub fn default_rate(total_overdue: f64, total_mrr: f64) -> f64 {
    round1(percentage(total_overdue, total_mrr))
}

/// Aggregate OVERDUE payments. Other statuses in the input are ignored.
pub fn defaulters_summary(payments: &[Payment], today: NaiveDate) -> DefaultersSummary {
    let mut buckets: Vec<BucketTotals> = OverdueBucket::ALL
        .iter()
        .map(|&bucket| BucketTotals {
            bucket,
            count: 0,
            value: 0.0,
        })
        .collect();
    let mut customers = HashSet::new();
    let mut total_overdue = 0.0;
    let mut payment_count = 0;

    for payment in payments.iter().filter(|p| p.is_overdue()) {
        total_overdue += payment.value;
        payment_count += 1;
        customers.insert(payment.customer.as_str());

        let bucket = OverdueBucket::for_days(days_overdue(payment.due_date, today));
        if let Some(slot) = buckets.iter_mut().find(|b| b.bucket == bucket) {
            slot.count += 1;
            slot.value += payment.value;
        }
    }

    DefaultersSummary {
        total_overdue,
        customer_count: customers.len() as u64,
        payment_count,
        average_days_overdue: average_days_overdue(payments, today),
        payments_by_days_overdue: buckets,
    }
}

/// Collection status shown next to each defaulter row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelinquencyStatus {
    Resolved,
    InProgress,
    Critical,
}

impl DelinquencyStatus {
    pub fn for_days(days: i64) -> Self {
        if days > 30 {
            DelinquencyStatus::Critical
        } else if days < 3 {
            DelinquencyStatus::Resolved
        } else {
            DelinquencyStatus::InProgress
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DelinquencyStatus::Resolved => "Resolvido",
            DelinquencyStatus::InProgress => "Em andamento",
            DelinquencyStatus::Critical => "Crítico",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::types::PaymentStatus;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 30).unwrap()
    }

    fn overdue(customer: &str, value: f64, days: i64) -> Payment {
        Payment {
            id: format!("pay_{customer}_{days}"),
            customer: customer.into(),
            subscription: None,
            status: PaymentStatus::Overdue,
            value,
            due_date: today() - chrono::Duration::days(days),
            customer_name: None,
            customer_email: None,
            billing_type: None,
            payment_date: None,
            description: None,
        }
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(OverdueBucket::for_days(1), OverdueBucket::UpToWeek);
        assert_eq!(OverdueBucket::for_days(7), OverdueBucket::UpToWeek);
        assert_eq!(OverdueBucket::for_days(8), OverdueBucket::UpToFortnight);
        assert_eq!(OverdueBucket::for_days(15), OverdueBucket::UpToFortnight);
        assert_eq!(OverdueBucket::for_days(16), OverdueBucket::UpToMonth);
        assert_eq!(OverdueBucket::for_days(30), OverdueBucket::UpToMonth);
        assert_eq!(OverdueBucket::for_days(60), OverdueBucket::UpToTwoMonths);
        assert_eq!(OverdueBucket::for_days(61), OverdueBucket::OverTwoMonths);
    }

    #[test]
    fn test_summary_scenario() {
        let payments = vec![
            overdue("A", 100.0, 40),
            overdue("A", 50.0, 5),
            overdue("B", 200.0, 70),
        ];
        let summary = defaulters_summary(&payments, today());
        assert_eq!(summary.total_overdue, 350.0);
        assert_eq!(summary.customer_count, 2);
        assert_eq!(summary.payment_count, 3);

        let mid = summary.bucket(OverdueBucket::UpToTwoMonths);
        assert_eq!((mid.count, mid.value), (1, 100.0));
        let old = summary.bucket(OverdueBucket::OverTwoMonths);
        assert_eq!((old.count, old.value), (1, 200.0));
        let young = summary.bucket(OverdueBucket::UpToWeek);
        assert_eq!((young.count, young.value), (1, 50.0));
        assert_eq!(summary.bucket(OverdueBucket::UpToMonth).count, 0);
        assert_eq!(summary.average_days_overdue, 38);
    }

    #[test]
    fn test_non_overdue_payments_ignored() {
        let mut received = overdue("C", 999.0, 10);
        received.status = PaymentStatus::Received;
        let summary = defaulters_summary(&[received, overdue("D", 10.0, 3)], today());
        assert_eq!(summary.total_overdue, 10.0);
        assert_eq!(summary.customer_count, 1);
    }

    #[test]
    fn test_future_due_date_clamped() {
        let early = overdue("E", 25.0, -3);
        assert_eq!(days_overdue(early.due_date, today()), 0);
        let summary = defaulters_summary(&[early], today());
        assert_eq!(summary.bucket(OverdueBucket::UpToWeek).count, 1);
    }

    #[test]
    fn test_empty_input() {
        let summary = defaulters_summary(&[], today());
        assert_eq!(summary.total_overdue, 0.0);
        assert_eq!(summary.average_days_overdue, 0);
        assert_eq!(summary.payments_by_days_overdue.len(), 5);
    }

    #[test]
    fn test_default_rate() {
        assert_eq!(default_rate(350.0, 1000.0), 35.0);
        assert_eq!(default_rate(1.0, 3.0), 33.3);
        assert_eq!(default_rate(350.0, 0.0), 0.0);
    }

    #[test]
    fn test_delinquency_status() {
        assert_eq!(DelinquencyStatus::for_days(31), DelinquencyStatus::Critical);
        assert_eq!(DelinquencyStatus::for_days(30), DelinquencyStatus::InProgress);
        assert_eq!(DelinquencyStatus::for_days(3), DelinquencyStatus::InProgress);
        assert_eq!(DelinquencyStatus::for_days(2), DelinquencyStatus::Resolved);
        assert_eq!(DelinquencyStatus::Critical.label(), "Crítico");
    }

    #[test]
    fn test_bucket_labels_round_trip() {
        for bucket in OverdueBucket::ALL {
            assert_eq!(OverdueBucket::from_label(bucket.label()), Some(bucket));
        }
        assert_eq!(OverdueBucket::from_label("90+"), None);
        assert!(OverdueBucket::UpToMonth.contains(20));
    }
}
