//! One assembler per dashboard page. Each load is a single sequential chain:
//! connection test, fetches, aggregation, display mapping.

pub mod churn;
pub mod defaulters;
pub mod mrr;
pub mod overview;
pub mod subscriptions;

use pulse_billing::BillingSource;
use pulse_core::config::DashboardConfig;
use pulse_core::types::{Customer, Payment};
use pulse_core::{Clock, PulseError, PulseResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub use churn::ChurnPage;
pub use defaulters::DefaultersPage;
pub use mrr::MrrPage;
pub use overview::OverviewPage;
pub use subscriptions::SubscriptionsPage;

pub const CONNECTION_FAILED: &str =
    "Não foi possível conectar à API do Asaas. Verifique o token de acesso e o ambiente.";

const FALLBACK_NAME: &str = "Cliente";
const FALLBACK_EMAIL: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Overview,
    Mrr,
    Churn,
    Subscriptions,
    Defaulters,
}

impl PageKind {
    pub const ALL: [PageKind; 5] = [
        PageKind::Overview,
        PageKind::Mrr,
        PageKind::Churn,
        PageKind::Subscriptions,
        PageKind::Defaulters,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PageKind::Overview => "overview",
            PageKind::Mrr => "mrr",
            PageKind::Churn => "churn",
            PageKind::Subscriptions => "subscriptions",
            PageKind::Defaulters => "defaulters",
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageKind {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PageKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PulseError::Validation(format!("unknown page '{s}'")))
    }
}

/// A fully assembled page, tagged with its kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "page", rename_all = "lowercase")]
pub enum PageView {
    Overview(OverviewPage),
    Mrr(MrrPage),
    Churn(ChurnPage),
    Subscriptions(SubscriptionsPage),
    Defaulters(DefaultersPage),
}

impl PageView {
    pub fn kind(&self) -> PageKind {
        match self {
            PageView::Overview(_) => PageKind::Overview,
            PageView::Mrr(_) => PageKind::Mrr,
            PageView::Churn(_) => PageKind::Churn,
            PageView::Subscriptions(_) => PageKind::Subscriptions,
            PageView::Defaulters(_) => PageKind::Defaulters,
        }
    }
}

/// Everything a page assembler needs besides its query.
pub struct PageContext<'a> {
    pub source: &'a dyn BillingSource,
    pub clock: &'a dyn Clock,
    pub options: &'a DashboardConfig,
}

impl<'a> PageContext<'a> {
    pub async fn ensure_connected(&self) -> PulseResult<()> {
        if self.source.test_connection().await {
            Ok(())
        } else {
            Err(PulseError::Connectivity(CONNECTION_FAILED.to_string()))
        }
    }
}

/// Customers keyed by id, for joining display fields onto payments and
/// subscriptions.
pub(crate) fn directory(customers: &[Customer]) -> HashMap<&str, &Customer> {
    customers.iter().map(|c| (c.id.as_str(), c)).collect()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Name and e-mail for a customer id, with fallbacks.
pub(crate) fn customer_identity(
    customer: Option<&Customer>,
) -> (String, String) {
    let name = non_empty(customer.map(|c| c.name.as_str())).unwrap_or(FALLBACK_NAME);
    let email = non_empty(customer.and_then(|c| c.email.as_deref())).unwrap_or(FALLBACK_EMAIL);
    (name.to_string(), email.to_string())
}

/// Name and e-mail for a payment: its denormalised fields first, then the
/// customer record, then fallbacks.
pub(crate) fn payment_identity(
    payment: &Payment,
    customers: &HashMap<&str, &Customer>,
) -> (String, String) {
    let (joined_name, joined_email) = customer_identity(customers.get(payment.customer.as_str()).copied());
    let name = non_empty(payment.customer_name.as_deref())
        .map(String::from)
        .unwrap_or(joined_name);
    let email = non_empty(payment.customer_email.as_deref())
        .map(String::from)
        .unwrap_or(joined_email);
    (name, email)
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::NaiveDate;
    use pulse_core::config::DashboardConfig;
    use pulse_core::FixedClock;

    pub fn clock() -> FixedClock {
        FixedClock::on(2026, 6, 30).unwrap()
    }

    pub fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 30).unwrap()
    }

    pub fn options() -> DashboardConfig {
        DashboardConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_billing::FixtureSource;

    #[test]
    fn test_page_kind_parse() {
        assert_eq!("MRR".parse::<PageKind>().unwrap(), PageKind::Mrr);
        assert!(matches!(
            "billing".parse::<PageKind>(),
            Err(PulseError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_offline_source_fails_connection() {
        let source = FixtureSource::demo(testing::today()).offline();
        let clock = testing::clock();
        let options = testing::options();
        let ctx = PageContext {
            source: &source,
            clock: &clock,
            options: &options,
        };
        let err = ctx.ensure_connected().await.unwrap_err();
        assert!(matches!(err, PulseError::Connectivity(ref m) if m == CONNECTION_FAILED));
    }

    #[test]
    fn test_payment_identity_fallbacks() {
        let source = FixtureSource::demo(testing::today());
        let data = source.data();
        let dir = directory(&data.customers);

        let no_email = data.payments.iter().find(|p| p.id == "pay_006").unwrap();
        let (name, email) = payment_identity(no_email, &dir);
        assert_eq!(name, "Henrique Dias");
        assert!(email.contains('@'));

        let mut orphan = no_email.clone();
        orphan.customer = "cus_missing".into();
        orphan.customer_name = None;
        orphan.customer_email = None;
        assert_eq!(
            payment_identity(&orphan, &dir),
            ("Cliente".to_string(), "-".to_string())
        );
    }
}
