//! API server: HTTP JSON surface plus the Prometheus exporter.

use crate::rest::{self, AppState};
use axum::routing::{get, post, put};
use axum::Router;
use pulse_core::config::AppConfig;
use pulse_dashboard::Dashboard;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub struct ApiServer {
    config: AppConfig,
    dashboard: Arc<Dashboard>,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Dashboard pages
        .route("/api/overview", get(rest::overview))
        .route("/api/metrics/:page", get(rest::metrics_page))
        .route("/api/pages/:page/state", get(rest::page_state))
        // Billing connection
        .route("/api/connection/test", post(rest::connection_test))
        // Settings
        .route("/api/settings", get(rest::get_settings))
        .route("/api/settings/changes", get(rest::settings_changes))
        .route("/api/settings/notifications", put(rest::put_notifications))
        .route("/api/settings/churn", put(rest::put_churn))
        .route("/api/settings/account", put(rest::put_account))
        // Operational endpoints
        .route("/health", get(rest::health_check))
        .route("/ready", get(rest::readiness))
        .route("/live", get(rest::liveness))
        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

impl ApiServer {
    pub fn new(config: AppConfig, dashboard: Arc<Dashboard>) -> Self {
        Self { config, dashboard }
    }

    fn state(&self) -> AppState {
        AppState {
            dashboard: self.dashboard.clone(),
            billing: Arc::new(self.config.billing.clone()),
            start_time: Instant::now(),
        }
    }

    /// Start the HTTP REST server.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let app = router(self.state());

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, source = self.dashboard.source().name(), "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the metrics exporter on a separate port.
    pub async fn start_metrics(&self) -> anyhow::Result<()> {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use pulse_billing::FixtureSource;
    use pulse_core::config::{BillingConfig, DashboardConfig};
    use pulse_core::types::Environment;
    use pulse_core::FixedClock;
    use pulse_dashboard::SettingsStore;
    use serde_json::Value;
    use tower::ServiceExt;

    fn demo() -> FixtureSource {
        FixtureSource::demo(chrono::NaiveDate::from_ymd_opt(2026, 6, 30).unwrap())
    }

    fn app_with(source: FixtureSource, billing: BillingConfig) -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let settings = Arc::new(SettingsStore::open(dir.path().join("settings.json")).unwrap());
        let dashboard = Dashboard::new(
            Arc::new(source),
            Arc::new(FixedClock::on(2026, 6, 30).unwrap()),
            DashboardConfig::default(),
            settings,
        );
        let state = AppState {
            dashboard: Arc::new(dashboard),
            billing: Arc::new(billing),
            start_time: Instant::now(),
        };
        (dir, router(state))
    }

    fn app(source: FixtureSource) -> (tempfile::TempDir, Router) {
        app_with(source, BillingConfig::default())
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_overview_endpoint() {
        let (_dir, app) = app(demo());
        let (status, body) = send(&app, get("/api/overview?period=12m")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page"], "overview");
        assert_eq!(body["mrr_display"], "R$ 998,50");
        assert_eq!(body["mrr_trend"].as_array().unwrap().len(), 12);
    }

    #[tokio::test]
    async fn test_defaulters_filters() {
        let (_dir, app) = app(demo());
        let (status, body) = send(&app, get("/api/metrics/defaulters?days=31-60&page=1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["payments"]["total_items"], 2);
        assert_eq!(body["payments"]["items"][0]["status_label"], "Crítico");

        let (status, body) = send(&app, get("/api/metrics/defaulters?days=31%2B")).await;
        assert_eq!(status, StatusCode::OK);
        let rows = body["payments"]["items"].as_array().unwrap();
        assert!(rows.iter().all(|r| r["days_overdue"].as_i64().unwrap() >= 31));

        let (status, body) = send(&app, get("/api/metrics/defaulters?days=90%2B")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_request");
    }

    #[tokio::test]
    async fn test_unknown_metrics_page() {
        let (_dir, app) = app(demo());
        let (status, body) = send(&app, get("/api/metrics/revenue")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");

        let (status, _) = send(&app, get("/api/metrics/overview")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_offline_source_is_bad_gateway() {
        let (_dir, app) = app(demo().offline());
        let (status, body) = send(&app, get("/api/metrics/mrr")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "billing_unreachable");

        let (_, state) = send(&app, get("/api/pages/mrr/state")).await;
        assert_eq!(state["state"], "failed");
    }

    #[tokio::test]
    async fn test_page_state_after_load() {
        let (_dir, app) = app(demo());
        let (_, idle) = send(&app, get("/api/pages/churn/state")).await;
        assert_eq!(idle["state"], "idle");

        send(&app, get("/api/metrics/churn")).await;
        let (_, ready) = send(&app, get("/api/pages/churn/state")).await;
        assert_eq!(ready["state"], "ready");
        assert_eq!(ready["data"]["page"], "churn");
    }

    #[tokio::test]
    async fn test_settings_round_trip() {
        let (_dir, app) = app(demo());
        let (status, body) = send(
            &app,
            json(
                "PUT",
                "/api/settings/churn",
                serde_json::json!({"inactivityThreshold": 10, "usageThreshold": 20, "paymentFailures": 3}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["churn"]["paymentFailures"], 3);

        let (_, settings) = send(&app, get("/api/settings")).await;
        assert_eq!(settings["churn"]["inactivityThreshold"], 10);

        let (_, churn) = send(&app, get("/api/metrics/churn")).await;
        assert_eq!(churn["at_risk"].as_array().unwrap().len(), 1);

        let (_, changes) = send(&app, get("/api/settings/changes")).await;
        assert_eq!(changes.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_settings_written_to_disk() {
        let (dir, app) = app(demo());
        let (status, _) = send(
            &app,
            json(
                "PUT",
                "/api/settings/notifications",
                serde_json::json!({"dailyReport": false, "notificationEmail": "ops@pulse.dev"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let saved: Value =
            serde_json::from_slice(&std::fs::read(dir.path().join("settings.json")).unwrap()).unwrap();
        assert_eq!(saved["notifications"]["dailyReport"], false);
        assert_eq!(saved["notifications"]["notificationEmail"], "ops@pulse.dev");
    }

    #[tokio::test]
    async fn test_invalid_settings_rejected() {
        let (_dir, app) = app(demo());
        let (status, body) = send(
            &app,
            json(
                "PUT",
                "/api/settings/account",
                serde_json::json!({"name": "Ana", "email": "ana", "company": "Pulse"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_request");
    }

    #[tokio::test]
    async fn test_connection_test_uses_configured_source() {
        let (_dir, app) = app(demo());
        let (status, body) = send(&app, json("POST", "/api/connection/test", serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["connected"], true);
        assert_eq!(body["environment"], "sandbox");
    }

    #[tokio::test]
    async fn test_connection_test_body_handling() {
        let (_dir, app) = app(demo());
        let empty = Request::builder()
            .method("POST")
            .uri("/api/connection/test")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, empty).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["connected"], true);

        let malformed = Request::builder()
            .method("POST")
            .uri("/api/connection/test")
            .header("content-type", "application/json")
            .body(Body::from("{\"token\": "))
            .unwrap();
        let (status, body) = send(&app, malformed).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_request");
    }

    #[tokio::test]
    async fn test_connection_test_with_supplied_token() {
        let mut server = mockito::Server::new_async().await;
        let ok = server
            .mock("GET", "/customers")
            .match_query(mockito::Matcher::Any)
            .match_header("access_token", "good-token")
            .with_status(200)
            .with_body(r#"{"object":"list","hasMore":false,"data":[]}"#)
            .create_async()
            .await;
        let denied = server
            .mock("GET", "/customers")
            .match_query(mockito::Matcher::Any)
            .match_header("access_token", "bad-token")
            .with_status(401)
            .with_body(r#"{"errors":[{"code":"invalid_access_token","description":"Token inválido"}]}"#)
            .create_async()
            .await;

        let billing = BillingConfig {
            base_url: Some(server.url()),
            ..BillingConfig::default()
        };
        let (_dir, app) = app_with(demo().offline(), billing);

        let (_, body) = send(
            &app,
            json("POST", "/api/connection/test", serde_json::json!({"token": "good-token"})),
        )
        .await;
        assert_eq!(body["connected"], true);

        let (_, body) = send(
            &app,
            json("POST", "/api/connection/test", serde_json::json!({"token": "bad-token"})),
        )
        .await;
        assert_eq!(body["connected"], false);

        ok.assert_async().await;
        denied.assert_async().await;
    }

    #[tokio::test]
    async fn test_other_environment_requires_token() {
        let (_dir, app) = app(demo());
        let (status, _) = send(
            &app,
            json(
                "POST",
                "/api/connection/test",
                serde_json::json!({"environment": Environment::Production.as_str()}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health_probes() {
        let (_dir, app) = app(demo());
        let (status, body) = send(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "fixture");

        let (status, _) = send(&app, get("/live")).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, get("/ready")).await;
        assert_eq!(status, StatusCode::OK);
    }
}
