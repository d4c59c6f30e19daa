//! SaaS Pulse: subscription metrics dashboard over the Asaas billing API.
//!
//! Serves the dashboard pages over HTTP, or renders a single page in the
//! terminal.

mod render;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use pulse_api::ApiServer;
use pulse_billing::build_source;
use pulse_core::config::{AppConfig, SourceKind};
use pulse_core::types::Environment;
use pulse_core::{Clock, SystemClock};
use pulse_dashboard::{Dashboard, PageKind, PageQuery, Period, SettingsStore};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "saas-pulse")]
#[command(about = "Subscription metrics dashboard for Asaas billing accounts")]
#[command(version)]
struct Cli {
    /// Data source: live or fixture (overrides config)
    #[arg(long, global = true, env = "PULSE__BILLING__SOURCE")]
    source: Option<String>,

    /// Billing environment: sandbox or production (overrides config)
    #[arg(long, global = true, env = "PULSE__BILLING__ENVIRONMENT")]
    environment: Option<String>,

    /// Fixture JSON file for the fixture source (overrides config)
    #[arg(long, global = true, env = "PULSE__BILLING__FIXTURE_PATH")]
    fixture: Option<String>,

    /// Settings file path (overrides config)
    #[arg(long, global = true, env = "PULSE__SETTINGS__PATH")]
    settings: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP API and metrics exporter
    Serve {
        /// HTTP port (overrides config)
        #[arg(long, env = "PULSE__API__HTTP_PORT")]
        http_port: Option<u16>,

        /// Do not start the Prometheus exporter
        #[arg(long, default_value_t = false)]
        no_metrics: bool,
    },

    /// Test the connection to the billing provider
    Check,

    /// Render one dashboard page
    Page {
        /// overview, mrr, churn, subscriptions or defaulters
        name: String,

        /// 7d, 30d, 90d, 12m, ytd or all
        #[arg(long, default_value = "30d")]
        period: String,

        /// Filter table rows by customer name or e-mail
        #[arg(long)]
        search: Option<String>,

        /// Filter subscriptions by plan
        #[arg(long)]
        plan: Option<String>,

        /// Filter defaulters by overdue range (1-7, 8-15, 16-30, 31-60, 60+)
        #[arg(long)]
        days: Option<String>,

        /// Table page, starting at 1
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Print the page view model as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn parse_source(s: &str) -> anyhow::Result<SourceKind> {
    match s.trim().to_lowercase().as_str() {
        "live" => Ok(SourceKind::Live),
        "fixture" | "demo" => Ok(SourceKind::Fixture),
        other => bail!("unknown data source '{other}'"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so page output stays clean on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "saas_pulse=info,pulse_dashboard=info,pulse_billing=info,tower_http=info".into()),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(source) = cli.source.as_deref() {
        config.billing.source = parse_source(source)?;
    }
    if let Some(environment) = cli.environment.as_deref() {
        config.billing.environment = environment
            .parse::<Environment>()
            .map_err(anyhow::Error::msg)?;
    }
    if let Some(fixture) = cli.fixture {
        config.billing.fixture_path = Some(fixture);
    }
    if let Some(path) = cli.settings {
        config.settings.path = path;
    }
    if let Commands::Serve {
        http_port: Some(port),
        ..
    } = &cli.command
    {
        config.api.http_port = *port;
    }

    config.validate()?;

    info!(
        source = ?config.billing.source,
        environment = %config.billing.environment,
        settings = %config.settings.path,
        "Configuration loaded"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let source = build_source(&config.billing, clock.as_ref())?;
    let settings = Arc::new(
        SettingsStore::open(&config.settings.path)
            .with_context(|| format!("opening settings at {}", config.settings.path))?,
    );
    let dashboard = Arc::new(Dashboard::new(
        source,
        clock,
        config.dashboard.clone(),
        settings,
    ));

    match cli.command {
        Commands::Serve { no_metrics, .. } => {
            let metrics_enabled = config.metrics.enabled && !no_metrics;
            let api_server = ApiServer::new(config, dashboard);

            if metrics_enabled {
                if let Err(e) = api_server.start_metrics().await {
                    error!(error = %e, "Failed to start metrics exporter");
                }
            }

            info!("SaaS Pulse is ready to serve traffic");
            api_server.start_http().await?;
        }
        Commands::Check => {
            let environment = config.billing.environment;
            if dashboard.source().test_connection().await {
                println!("Connected to {} ({environment})", dashboard.source().name());
            } else {
                bail!("could not connect to the billing API ({environment}); check the access token and environment");
            }
        }
        Commands::Page {
            name,
            period,
            search,
            plan,
            days,
            page,
            json,
        } => {
            let kind: PageKind = name.parse()?;
            let query = PageQuery {
                period: period.parse::<Period>().map_err(anyhow::Error::msg)?,
                search,
                plan,
                days,
                page,
            };
            let view = dashboard.load(kind, &query).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                render::print_page(&view);
            }
        }
    }

    Ok(())
}
