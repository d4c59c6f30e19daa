//! Page assembly for the SaaS Pulse dashboard: turns billing aggregates
//! into display-ready view models, with filtering, pagination, load-state
//! tracking and persisted settings.

pub mod format;
pub mod loader;
pub mod pages;
pub mod query;
pub mod service;
pub mod settings;
pub mod table;

pub use loader::{LoadState, LoadTicket, PageLoader};
pub use pages::{PageKind, PageView};
pub use query::{PageQuery, Period};
pub use service::Dashboard;
pub use settings::{DashboardSettings, SettingsStore};
