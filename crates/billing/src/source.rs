//! The data-source seam every page loads through.

use crate::asaas::AsaasClient;
use crate::fixture::FixtureSource;
use crate::params::ListParams;
use async_trait::async_trait;
use pulse_core::config::{BillingConfig, SourceKind};
use pulse_core::types::{Customer, Payment, Subscription};
use pulse_core::{Clock, PulseResult};
use std::sync::Arc;
use tracing::info;

/// Read access to the billing provider's collections.
///
/// Implemented by the live [`AsaasClient`] and by [`FixtureSource`]; pages
/// never know which one they are talking to.
#[async_trait]
pub trait BillingSource: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// True iff a minimal customers query succeeds.
    async fn test_connection(&self) -> bool;

    async fn get_customers(&self, params: &ListParams) -> PulseResult<Vec<Customer>>;

    async fn get_subscriptions(&self, params: &ListParams) -> PulseResult<Vec<Subscription>>;

    async fn get_payments(&self, params: &ListParams) -> PulseResult<Vec<Payment>>;

    async fn get_customer_by_id(&self, id: &str) -> PulseResult<Customer>;
}

pub type SharedSource = Arc<dyn BillingSource>;

/// Build the configured data source.
pub fn build_source(config: &BillingConfig, clock: &dyn Clock) -> PulseResult<SharedSource> {
    match config.source {
        SourceKind::Live => {
            let client = AsaasClient::from_config(config)?;
            info!(
                environment = %config.environment,
                base_url = %client.base_url(),
                "Using live billing source"
            );
            Ok(Arc::new(client))
        }
        SourceKind::Fixture => {
            let source = match &config.fixture_path {
                Some(path) => FixtureSource::from_json_file(path)?,
                None => FixtureSource::demo(clock.today()),
            };
            info!(
                fixture = config.fixture_path.as_deref().unwrap_or("built-in demo"),
                "Using fixture billing source"
            );
            Ok(Arc::new(source))
        }
    }
}
