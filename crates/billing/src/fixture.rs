//! Static data source. Serves a built-in demo data set (anchored to a
//! supplied date so overdue ages stay meaningful) or a JSON file, and can be
//! told to fail on purpose.

use crate::params::ListParams;
use crate::source::BillingSource;
use async_trait::async_trait;
use chrono::{Duration, Months, NaiveDate};
use pulse_core::types::{Customer, Payment, PaymentStatus, Subscription, SubscriptionStatus};
use pulse_core::{PulseError, PulseResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureData {
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
    #[serde(default)]
    pub payments: Vec<Payment>,
}

#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    data: FixtureData,
    failing_lookups: HashSet<String>,
    offline: bool,
}

impl FixtureSource {
    pub fn new(data: FixtureData) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    /// Load a data set from a JSON file with `customers`, `subscriptions`
    /// and `payments` arrays.
    pub fn from_json_file(path: impl AsRef<Path>) -> PulseResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let data: FixtureData = serde_json::from_str(&raw)?;
        Ok(Self::new(data))
    }

    /// Make `get_customer_by_id` fail for this id.
    pub fn fail_lookup(mut self, customer_id: impl Into<String>) -> Self {
        self.failing_lookups.insert(customer_id.into());
        self
    }

    /// Behave like an unreachable provider.
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    pub fn data(&self) -> &FixtureData {
        &self.data
    }

    fn ensure_online(&self) -> PulseResult<()> {
        if self.offline {
            Err(PulseError::Connectivity("fixture source is offline".into()))
        } else {
            Ok(())
        }
    }

    /// Demo data set with ages relative to `today`.
    pub fn demo(today: NaiveDate) -> Self {
        let ago = |days: i64| today - Duration::days(days);
        let months_ago = |months: u32| today.checked_sub_months(Months::new(months)).unwrap_or(today);
        let ahead = |days: i64| today + Duration::days(days);

        let customer = |id: &str, name: &str, email: &str, months: u32| Customer {
            id: id.to_string(),
            name: name.to_string(),
            email: Some(email.to_string()),
            cpf_cnpj: None,
            phone: None,
            mobile_phone: None,
            date_created: Some(months_ago(months)),
            deleted: false,
        };

        let customers = vec![
            customer("cus_001", "Ana Souza", "ana.souza@example.com", 6),
            customer("cus_002", "Bruno Lima", "bruno.lima@example.com", 5),
            customer("cus_003", "Carla Mendes", "carla.mendes@example.com", 4),
            customer("cus_004", "Diego Alves", "diego.alves@example.com", 3),
            customer("cus_005", "Elisa Rocha", "elisa.rocha@example.com", 3),
            customer("cus_006", "Fábio Costa", "fabio.costa@example.com", 2),
            customer("cus_007", "Gabriela Nunes", "gabriela.nunes@example.com", 1),
            customer("cus_008", "Henrique Dias", "henrique.dias@example.com", 1),
        ];

        let subscription = |id: &str,
                            customer: &str,
                            value: f64,
                            billing_type: &str,
                            status: SubscriptionStatus,
                            months: u32| Subscription {
            id: id.to_string(),
            customer: customer.to_string(),
            status,
            value,
            billing_type: Some(billing_type.to_string()),
            cycle: Some("MONTHLY".to_string()),
            date_created: Some(months_ago(months)),
            next_due_date: Some(ahead(10)),
            description: None,
        };

        use SubscriptionStatus::{Active, Cancelled, Inactive, Pending};
        let subscriptions = vec![
            subscription("sub_001", "cus_001", 199.90, "CREDIT_CARD", Active, 5),
            subscription("sub_002", "cus_002", 99.90, "BOLETO", Active, 5),
            subscription("sub_003", "cus_003", 499.00, "CREDIT_CARD", Active, 4),
            subscription("sub_004", "cus_004", 99.90, "PIX", Active, 3),
            subscription("sub_005", "cus_005", 199.90, "BOLETO", Cancelled, 3),
            subscription("sub_006", "cus_006", 49.90, "PIX", Active, 2),
            subscription("sub_007", "cus_007", 499.00, "CREDIT_CARD", Pending, 1),
            subscription("sub_008", "cus_008", 99.90, "BOLETO", Inactive, 1),
            subscription("sub_009", "cus_002", 49.90, "PIX", Active, 0),
            subscription("sub_010", "cus_006", 199.90, "CREDIT_CARD", Cancelled, 2),
        ];

        let payment = |id: &str,
                       customer: &str,
                       value: f64,
                       status: PaymentStatus,
                       days_ago: i64,
                       name: Option<&str>,
                       email: Option<&str>| Payment {
            id: id.to_string(),
            customer: customer.to_string(),
            subscription: None,
            status,
            value,
            due_date: ago(days_ago),
            customer_name: name.map(str::to_string),
            customer_email: email.map(str::to_string),
            billing_type: Some("BOLETO".to_string()),
            payment_date: None,
            description: None,
        };

        use PaymentStatus::{Confirmed, Overdue, Received};
        let bruno = (Some("Bruno Lima"), Some("bruno.lima@example.com"));
        let diego = (Some("Diego Alves"), Some("diego.alves@example.com"));
        let payments = vec![
            payment("pay_001", "cus_002", 99.90, Overdue, 5, bruno.0, bruno.1),
            payment("pay_002", "cus_002", 99.90, Overdue, 35, bruno.0, bruno.1),
            payment("pay_003", "cus_002", 49.90, Overdue, 65, bruno.0, bruno.1),
            payment("pay_004", "cus_004", 99.90, Overdue, 12, diego.0, diego.1),
            payment("pay_005", "cus_004", 99.90, Overdue, 42, diego.0, diego.1),
            payment("pay_006", "cus_008", 99.90, Overdue, 20, Some("Henrique Dias"), None),
            payment("pay_007", "cus_006", 49.90, Overdue, 2, None, None),
            payment("pay_008", "cus_001", 199.90, Received, 30, None, None),
            payment("pay_009", "cus_003", 499.00, Confirmed, 15, None, None),
        ];

        Self::new(FixtureData {
            customers,
            subscriptions,
            payments,
        })
    }
}

fn status_matches(params: &ListParams, status: &str) -> bool {
    params
        .status
        .as_deref()
        .map_or(true, |wanted| wanted.eq_ignore_ascii_case(status))
}

fn field_matches(params: &ListParams, key: &str, value: Option<&str>) -> bool {
    match params.filter(key) {
        Some(wanted) => value.is_some_and(|v| v == wanted),
        None => true,
    }
}

/// Apply offset/limit only when the caller asked for them explicitly.
fn window<T>(items: Vec<T>, params: &ListParams) -> Vec<T> {
    let offset = params.offset.unwrap_or(0) as usize;
    let iter = items.into_iter().skip(offset);
    match params.limit {
        Some(limit) => iter.take(limit as usize).collect(),
        None => iter.collect(),
    }
}

#[async_trait]
impl BillingSource for FixtureSource {
    fn name(&self) -> &'static str {
        "fixture"
    }

    async fn test_connection(&self) -> bool {
        !self.offline
    }

    async fn get_customers(&self, params: &ListParams) -> PulseResult<Vec<Customer>> {
        self.ensure_online()?;
        let items: Vec<Customer> = self
            .data
            .customers
            .iter()
            .filter(|c| field_matches(params, "email", c.email.as_deref()))
            .cloned()
            .collect();
        Ok(window(items, params))
    }

    async fn get_subscriptions(&self, params: &ListParams) -> PulseResult<Vec<Subscription>> {
        self.ensure_online()?;
        let items: Vec<Subscription> = self
            .data
            .subscriptions
            .iter()
            .filter(|s| status_matches(params, s.status.as_str()))
            .filter(|s| field_matches(params, "customer", Some(&s.customer)))
            .filter(|s| field_matches(params, "billingType", s.billing_type.as_deref()))
            .cloned()
            .collect();
        Ok(window(items, params))
    }

    async fn get_payments(&self, params: &ListParams) -> PulseResult<Vec<Payment>> {
        self.ensure_online()?;
        let items: Vec<Payment> = self
            .data
            .payments
            .iter()
            .filter(|p| status_matches(params, p.status.as_str()))
            .filter(|p| field_matches(params, "customer", Some(&p.customer)))
            .filter(|p| field_matches(params, "subscription", p.subscription.as_deref()))
            .cloned()
            .collect();
        Ok(window(items, params))
    }

    async fn get_customer_by_id(&self, id: &str) -> PulseResult<Customer> {
        self.ensure_online()?;
        if self.failing_lookups.contains(id) {
            debug!(customer_id = id, "Fixture lookup failure injected");
            return Err(PulseError::Request {
                status: 500,
                message: format!("lookup for customer {id} failed"),
            });
        }
        self.data
            .customers
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| PulseError::Request {
                status: 404,
                message: format!("customer {id} not found"),
            })
    }
}
