//! Live Asaas v3 client.
//!
//! Every call goes through [`AsaasClient::request`], which attaches the
//! `access_token` header and turns non-2xx responses into
//! [`PulseError::Request`] carrying the provider's own error description.
//! Collections are walked page by page while the envelope reports `hasMore`.

use crate::params::ListParams;
use crate::source::BillingSource;
use async_trait::async_trait;
use pulse_core::config::BillingConfig;
use pulse_core::types::{Customer, Environment, ErrorEnvelope, ListEnvelope, Payment, Subscription};
use pulse_core::{PulseError, PulseResult};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Header Asaas reads the API key from.
const AUTH_HEADER: &str = "access_token";

/// Largest page size the provider accepts.
const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Clone)]
pub struct AsaasClient {
    http: reqwest::Client,
    base_url: String,
    token: SecretString,
    environment: Environment,
    page_limit: u32,
    max_pages: u32,
}

// Keeps the token out of debug output.
impl std::fmt::Debug for AsaasClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsaasClient")
            .field("base_url", &self.base_url)
            .field("environment", &self.environment)
            .field("page_limit", &self.page_limit)
            .field("max_pages", &self.max_pages)
            .finish_non_exhaustive()
    }
}

impl AsaasClient {
    /// Client for the given environment with default settings.
    pub fn new(token: impl Into<SecretString>, environment: Environment) -> PulseResult<Self> {
        let config = BillingConfig {
            environment,
            ..BillingConfig::default()
        };
        Self::build(token.into(), &config)
    }

    /// Client built from configuration. Fails when no token is configured.
    pub fn from_config(config: &BillingConfig) -> PulseResult<Self> {
        let token = config.api_token.clone().ok_or_else(|| {
            PulseError::Config("billing.api_token is not set".into())
        })?;
        Self::build(token, config)
    }

    fn build(token: SecretString, config: &BillingConfig) -> PulseResult<Self> {
        if token.expose_secret().trim().is_empty() {
            return Err(PulseError::Config("billing API token is empty".into()));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| PulseError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.resolved_base_url(),
            token,
            environment: config.environment,
            page_limit: config.page_limit.clamp(1, MAX_PAGE_LIMIT),
            max_pages: config.max_pages.max(1),
        })
    }

    /// Point the client somewhere else (mock servers, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit.clamp(1, MAX_PAGE_LIMIT);
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Perform one authenticated GET and decode the body.
    async fn request<T: DeserializeOwned>(
        &self,
        resource: &'static str,
        path: &str,
        query: &[(String, String)],
    ) -> PulseResult<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(resource, url = %url, "Billing API request");
        metrics::counter!("billing.requests", "resource" => resource).increment(1);

        let response = self
            .http
            .get(&url)
            .header(AUTH_HEADER, self.token.expose_secret())
            .query(query)
            .send()
            .await
            .map_err(|e| {
                metrics::counter!("billing.request_errors", "resource" => resource, "kind" => "transport")
                    .increment(1);
                warn!(resource, error = %e, "Billing API unreachable");
                transport_error(&e)
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| transport_error(&e))?;

        if !status.is_success() {
            metrics::counter!("billing.request_errors", "resource" => resource, "kind" => "status")
                .increment(1);
            let message = serde_json::from_slice::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|env| env.first_description().map(str::to_string))
                .unwrap_or_else(|| {
                    format!("Billing API request failed with status {}", status.as_u16())
                });
            warn!(resource, status = status.as_u16(), message = %message, "Billing API returned an error");
            return Err(PulseError::Request {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(|e| {
            metrics::counter!("billing.request_errors", "resource" => resource, "kind" => "decode")
                .increment(1);
            PulseError::Decode(format!("{resource}: {e}"))
        })
    }

    /// Walk a collection until `hasMore` is false or the page cap is hit.
    async fn list_all<T: DeserializeOwned>(
        &self,
        resource: &'static str,
        params: &ListParams,
    ) -> PulseResult<Vec<T>> {
        let path = format!("/{resource}");
        let limit = params.limit.unwrap_or(self.page_limit).clamp(1, MAX_PAGE_LIMIT);
        let mut offset = params.offset.unwrap_or(0);
        let mut items = Vec::new();

        for _ in 0..self.max_pages {
            let query = params.to_query(limit, offset);
            let page: ListEnvelope<T> = self.request(resource, &path, &query).await?;
            let received = page.data.len();
            items.extend(page.data);

            if !page.has_more || received == 0 {
                debug!(resource, total = items.len(), "Collection fetched");
                return Ok(items);
            }
            offset = offset.saturating_add(limit);
        }

        warn!(
            resource,
            max_pages = self.max_pages,
            fetched = items.len(),
            "Page cap reached, collection truncated"
        );
        Ok(items)
    }
}

fn transport_error(err: &reqwest::Error) -> PulseError {
    if err.is_timeout() {
        PulseError::Connectivity(format!("request timed out: {err}"))
    } else if err.is_decode() {
        PulseError::Decode(err.to_string())
    } else {
        PulseError::Connectivity(err.to_string())
    }
}

/// Provider ids are short alphanumeric tokens; anything else would let a
/// caller walk the URL space.
fn validate_id(id: &str) -> PulseResult<()> {
    let valid = !id.is_empty()
        && id.len() <= 64
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(PulseError::Validation(format!("invalid customer id '{id}'")))
    }
}

#[async_trait]
impl BillingSource for AsaasClient {
    fn name(&self) -> &'static str {
        "asaas"
    }

    async fn test_connection(&self) -> bool {
        let query = [("limit".to_string(), "1".to_string())];
        match self
            .request::<ListEnvelope<serde_json::Value>>("customers", "/customers", &query)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, environment = %self.environment, "Billing API connection test failed");
                false
            }
        }
    }

    async fn get_customers(&self, params: &ListParams) -> PulseResult<Vec<Customer>> {
        self.list_all("customers", params).await
    }

    async fn get_subscriptions(&self, params: &ListParams) -> PulseResult<Vec<Subscription>> {
        self.list_all("subscriptions", params).await
    }

    async fn get_payments(&self, params: &ListParams) -> PulseResult<Vec<Payment>> {
        self.list_all("payments", params).await
    }

    async fn get_customer_by_id(&self, id: &str) -> PulseResult<Customer> {
        validate_id(id)?;
        self.request("customers", &format!("/customers/{id}"), &[])
            .await
    }
}
