//! Page load-state tracking with stale-response protection.
//!
//! Every load takes a ticket from a generation counter. A completion is
//! applied only if its ticket is still the latest one issued, so the last
//! *requested* load wins even when an older one resolves later. A load
//! dropped before completion hands the page back to its last settled state.

use parking_lot::Mutex;
use pulse_core::PulseResult;
use serde::Serialize;
use std::future::Future;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "lowercase")]
pub enum LoadState<T> {
    Idle,
    Loading,
    Ready(T),
    /// Only the message survives a failure; no partial data.
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

struct Inner<T> {
    generation: u64,
    state: LoadState<T>,
    /// Last state that was not `Loading`.
    settled: LoadState<T>,
}

pub struct PageLoader<T> {
    inner: Mutex<Inner<T>>,
}

impl<T: Clone> Default for PageLoader<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> PageLoader<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                generation: 0,
                state: LoadState::Idle,
                settled: LoadState::Idle,
            }),
        }
    }

    /// Start a load, superseding any in flight.
    pub fn begin(&self) -> LoadTicket {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.state = LoadState::Loading;
        LoadTicket(inner.generation)
    }

    /// Apply a completion. Returns false when the ticket is stale and the
    /// result was discarded.
    pub fn finish(&self, ticket: LoadTicket, result: &PulseResult<T>) -> bool {
        let mut inner = self.inner.lock();
        if ticket.0 != inner.generation {
            debug!(
                ticket = ticket.0,
                current = inner.generation,
                "Discarding stale page load"
            );
            return false;
        }
        let state = match result {
            Ok(value) => LoadState::Ready(value.clone()),
            Err(e) => LoadState::Failed(e.to_string()),
        };
        inner.settled = state.clone();
        inner.state = state;
        true
    }

    /// Abandon a load without a result. If the ticket is still the latest,
    /// the page returns to its last settled state.
    pub fn cancel(&self, ticket: LoadTicket) -> bool {
        let mut inner = self.inner.lock();
        if ticket.0 != inner.generation {
            return false;
        }
        debug!(ticket = ticket.0, "Page load cancelled");
        inner.state = inner.settled.clone();
        true
    }

    /// Run `load` under a fresh ticket and hand its result back unchanged.
    pub async fn run<F>(&self, load: F) -> PulseResult<T>
    where
        F: Future<Output = PulseResult<T>>,
    {
        let ticket = self.begin();
        let mut pending = PendingLoad {
            loader: self,
            ticket: Some(ticket),
        };
        let result = load.await;
        pending.ticket = None;
        self.finish(ticket, &result);
        result
    }

    pub fn state(&self) -> LoadState<T> {
        self.inner.lock().state.clone()
    }

    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }
}

/// Cancels its ticket if dropped while the load is still pending.
struct PendingLoad<'a, T: Clone> {
    loader: &'a PageLoader<T>,
    ticket: Option<LoadTicket>,
}

impl<T: Clone> Drop for PendingLoad<'_, T> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.loader.cancel(ticket);
        }
    }
}
