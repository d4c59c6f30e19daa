use crate::error::{PulseError, PulseResult};
use crate::types::Environment;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

/// Root application configuration. Loaded from environment variables
/// with the prefix `PULSE__` and an optional `pulse.toml` file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub billing: BillingConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

/// Where page data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Live,
    Fixture,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    #[serde(default)]
    pub source: SourceKind,
    #[serde(default)]
    pub environment: Environment,
    /// Asaas access token. Only ever supplied through the environment or a
    /// local config file.
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub api_token: Option<SecretString>,
    /// Overrides the environment's base URL (local mocks, proxies).
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// JSON data set for the fixture source; built-in demo data when unset.
    #[serde(default)]
    pub fixture_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_items_per_page")]
    pub items_per_page: usize,
    #[serde(default = "default_at_risk_preview")]
    pub at_risk_preview: usize,
    /// Expected customer lifetime used for LTV.
    #[serde(default = "default_ltv_months")]
    pub ltv_months: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SettingsConfig {
    #[serde(default = "default_settings_path")]
    pub path: String,
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .filter(|s| !s.trim().is_empty())
        .map(SecretString::from))
}

// Default functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_metrics_enabled() -> bool {
    true
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_page_limit() -> u32 {
    100
}
fn default_max_pages() -> u32 {
    50
}
fn default_user_agent() -> String {
    concat!("saas-pulse/", env!("CARGO_PKG_VERSION")).to_string()
}
fn default_items_per_page() -> usize {
    4
}
fn default_at_risk_preview() -> usize {
    4
}
fn default_ltv_months() -> u32 {
    30
}
fn default_settings_path() -> String {
    "pulse-settings.json".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            port: default_metrics_port(),
        }
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::default(),
            environment: Environment::default(),
            api_token: None,
            base_url: None,
            timeout_secs: default_timeout_secs(),
            page_limit: default_page_limit(),
            max_pages: default_max_pages(),
            user_agent: default_user_agent(),
            fixture_path: None,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            items_per_page: default_items_per_page(),
            at_risk_preview: default_at_risk_preview(),
            ltv_months: default_ltv_months(),
        }
    }
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: default_settings_path(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            billing: BillingConfig::default(),
            dashboard: DashboardConfig::default(),
            settings: SettingsConfig::default(),
        }
    }
}

impl BillingConfig {
    /// Base URL for API calls, honouring the override.
    pub fn resolved_base_url(&self) -> String {
        self.base_url
            .as_deref()
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| self.environment.base_url().to_string())
    }
}

impl AppConfig {
    /// Load configuration from environment variables and optional config file.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("pulse").required(false))
            .add_source(
                config::Environment::with_prefix("PULSE")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Reject combinations that cannot work at runtime.
    pub fn validate(&self) -> PulseResult<()> {
        if self.billing.source == SourceKind::Live && self.billing.api_token.is_none() {
            return Err(PulseError::Config(
                "billing.api_token is required for the live source (set PULSE__BILLING__API_TOKEN)"
                    .into(),
            ));
        }
        if self.billing.page_limit == 0 || self.billing.page_limit > 100 {
            return Err(PulseError::Config(
                "billing.page_limit must be between 1 and 100".into(),
            ));
        }
        if self.billing.max_pages == 0 {
            return Err(PulseError::Config("billing.max_pages must be at least 1".into()));
        }
        if self.dashboard.items_per_page == 0 {
            return Err(PulseError::Config(
                "dashboard.items_per_page must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
