//! Page orchestration over a shared billing source.

use crate::loader::{LoadState, PageLoader};
use crate::pages::{self, PageContext, PageKind, PageView};
use crate::query::PageQuery;
use crate::settings::SettingsStore;
use pulse_billing::SharedSource;
use pulse_core::config::DashboardConfig;
use pulse_core::{Clock, PulseResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Assembles pages on demand and tracks the latest load of each.
pub struct Dashboard {
    source: SharedSource,
    clock: Arc<dyn Clock>,
    options: DashboardConfig,
    settings: Arc<SettingsStore>,
    loaders: HashMap<PageKind, PageLoader<PageView>>,
}

impl Dashboard {
    pub fn new(
        source: SharedSource,
        clock: Arc<dyn Clock>,
        options: DashboardConfig,
        settings: Arc<SettingsStore>,
    ) -> Self {
        let loaders = PageKind::ALL
            .into_iter()
            .map(|kind| (kind, PageLoader::new()))
            .collect();
        Self {
            source,
            clock,
            options,
            settings,
            loaders,
        }
    }

    pub fn source(&self) -> &SharedSource {
        &self.source
    }

    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.settings
    }

    /// Assemble `kind` under a fresh load ticket. The caller always gets its
    /// own result; the tracked page state only takes it if no newer load was
    /// requested meanwhile.
    pub async fn load(&self, kind: PageKind, query: &PageQuery) -> PulseResult<PageView> {
        let started = Instant::now();
        let result = match self.loaders.get(&kind) {
            Some(loader) => loader.run(self.assemble(kind, query)).await,
            None => self.assemble(kind, query).await,
        };

        let outcome = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!("dashboard.page_loads", "page" => kind.as_str(), "outcome" => outcome)
            .increment(1);
        match &result {
            Ok(_) => info!(
                page = %kind,
                source = self.source.name(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Page loaded"
            ),
            Err(e) => warn!(page = %kind, source = self.source.name(), error = %e, "Page load failed"),
        }
        result
    }

    /// Latest applied state of a page.
    pub fn state(&self, kind: PageKind) -> LoadState<PageView> {
        self.loaders
            .get(&kind)
            .map(PageLoader::state)
            .unwrap_or(LoadState::Idle)
    }

    async fn assemble(&self, kind: PageKind, query: &PageQuery) -> PulseResult<PageView> {
        let ctx = PageContext {
            source: self.source.as_ref(),
            clock: self.clock.as_ref(),
            options: &self.options,
        };
        let criteria = self.settings.churn_criteria();
        Ok(match kind {
            PageKind::Overview => PageView::Overview(pages::overview::assemble(&ctx, query, &criteria).await?),
            PageKind::Mrr => PageView::Mrr(pages::mrr::assemble(&ctx, query).await?),
            PageKind::Churn => PageView::Churn(pages::churn::assemble(&ctx, query, &criteria).await?),
            PageKind::Subscriptions => {
                PageView::Subscriptions(pages::subscriptions::assemble(&ctx, query).await?)
            }
            PageKind::Defaulters => PageView::Defaulters(pages::defaulters::assemble(&ctx, query).await?),
        })
    }
}
