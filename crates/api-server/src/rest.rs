//! REST handlers for dashboard pages, connection test, settings and
//! operational probes.

use crate::error::ApiError;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use pulse_billing::{AsaasClient, BillingSource};
use pulse_core::config::{BillingConfig, SourceKind};
use pulse_core::types::Environment;
use pulse_dashboard::settings::{AccountSettings, NotificationSettings, SettingsChange};
use pulse_core::{PulseError, PulseResult};
use pulse_dashboard::{
    Dashboard, DashboardSettings, LoadState, PageKind, PageQuery, PageView, SettingsStore,
};
use pulse_reporting::ChurnCriteria;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
    pub billing: Arc<BillingConfig>,
    pub start_time: Instant,
}

/// GET /api/overview
pub async fn overview(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageView>, ApiError> {
    let view = state.dashboard.load(PageKind::Overview, &query).await?;
    Ok(Json(view))
}

/// GET /api/metrics/:page: mrr, churn, subscriptions or defaulters.
pub async fn metrics_page(
    State(state): State<AppState>,
    Path(page): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageView>, ApiError> {
    let kind = metrics_kind(&page)?;
    let view = state.dashboard.load(kind, &query).await?;
    Ok(Json(view))
}

/// GET /api/pages/:page/state: latest applied load state of a page.
pub async fn page_state(
    State(state): State<AppState>,
    Path(page): Path<String>,
) -> Result<Json<LoadState<PageView>>, ApiError> {
    let kind: PageKind = page
        .parse()
        .map_err(|_| ApiError::NotFound(format!("unknown page '{page}'")))?;
    Ok(Json(state.dashboard.state(kind)))
}

fn metrics_kind(page: &str) -> Result<PageKind, ApiError> {
    match page.parse::<PageKind>() {
        Ok(PageKind::Overview) | Err(_) => Err(ApiError::NotFound(format!("unknown metrics page '{page}'"))),
        Ok(kind) => Ok(kind),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConnectionTestRequest {
    pub token: Option<String>,
    pub environment: Option<Environment>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectionTestResponse {
    pub connected: bool,
    pub environment: Environment,
}

/// POST /api/connection/test: without a token, tests the configured source;
/// with one, tests a throwaway client for that token and environment.
pub async fn connection_test(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ConnectionTestResponse>, ApiError> {
    let request = connection_request(&body)?;
    let environment = request.environment.unwrap_or(state.billing.environment);
    let token = request.token.filter(|t| !t.trim().is_empty());

    let connected = match token {
        None if environment == state.billing.environment => {
            state.dashboard.source().test_connection().await
        }
        None => {
            return Err(PulseError::Validation(
                "a token is required to test another environment".into(),
            )
            .into())
        }
        Some(token) => {
            let mut config = BillingConfig::clone(&state.billing);
            if environment != config.environment {
                config.base_url = None;
            }
            config.source = SourceKind::Live;
            config.environment = environment;
            config.api_token = Some(SecretString::from(token));
            AsaasClient::from_config(&config)?.test_connection().await
        }
    };

    metrics::counter!("api.connection_tests", "connected" => connected.to_string()).increment(1);
    info!(connected, environment = %environment, "Connection test");
    Ok(Json(ConnectionTestResponse {
        connected,
        environment,
    }))
}

/// An empty body means "test the configured source"; anything else must be
/// a valid request document.
fn connection_request(body: &[u8]) -> Result<ConnectionTestRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ConnectionTestRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| PulseError::Validation(format!("invalid connection test body: {e}")).into())
}

/// GET /api/settings
pub async fn get_settings(State(state): State<AppState>) -> Json<DashboardSettings> {
    Json(state.dashboard.settings().get())
}

/// GET /api/settings/changes
pub async fn settings_changes(State(state): State<AppState>) -> Json<Vec<SettingsChange>> {
    Json(state.dashboard.settings().change_log())
}

/// PUT /api/settings/notifications
pub async fn put_notifications(
    State(state): State<AppState>,
    Json(update): Json<NotificationSettings>,
) -> Result<Json<DashboardSettings>, ApiError> {
    save_settings(&state, move |store| store.update_notifications(update)).await
}

/// PUT /api/settings/churn
pub async fn put_churn(
    State(state): State<AppState>,
    Json(update): Json<ChurnCriteria>,
) -> Result<Json<DashboardSettings>, ApiError> {
    save_settings(&state, move |store| store.update_churn(update)).await
}

/// PUT /api/settings/account
pub async fn put_account(
    State(state): State<AppState>,
    Json(update): Json<AccountSettings>,
) -> Result<Json<DashboardSettings>, ApiError> {
    save_settings(&state, move |store| store.update_account(update)).await
}

/// Settings writes hit the filesystem, so they run on the blocking pool.
async fn save_settings<F>(state: &AppState, update: F) -> Result<Json<DashboardSettings>, ApiError>
where
    F: FnOnce(&SettingsStore) -> PulseResult<DashboardSettings> + Send + 'static,
{
    let store = Arc::clone(state.dashboard.settings());
    let saved = tokio::task::spawn_blocking(move || update(&store))
        .await
        .map_err(|e| PulseError::Internal(anyhow::anyhow!("settings write aborted: {e}")))??;
    Ok(Json(saved))
}

/// GET /health: Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        source: state.dashboard.source().name().to_string(),
        environment: state.billing.environment,
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /ready: Readiness probe. Does not call the billing provider.
pub async fn readiness() -> StatusCode {
    StatusCode::OK
}

/// GET /live: Liveness probe.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub source: String,
    pub environment: Environment,
    pub uptime_secs: u64,
}
