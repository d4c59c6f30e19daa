//! Query parameters shared by the collection endpoints.

use std::collections::BTreeMap;

/// Filters for `/customers`, `/subscriptions` and `/payments`.
///
/// `limit` is the page size used while walking the collection; `offset` is
/// where the walk starts. Everything else is passed through verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub status: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub filters: BTreeMap<String, String>,
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn filter(&self, key: &str) -> Option<&str> {
        self.filters.get(key).map(String::as_str)
    }

    /// Query pairs for one page of the walk.
    pub fn to_query(&self, limit: u32, offset: u32) -> Vec<(String, String)> {
        let mut query = Vec::with_capacity(self.filters.len() + 3);
        if let Some(status) = &self.status {
            query.push(("status".to_string(), status.clone()));
        }
        for (key, value) in &self.filters {
            if matches!(key.as_str(), "status" | "limit" | "offset") {
                continue;
            }
            query.push((key.clone(), value.clone()));
        }
        query.push(("limit".to_string(), limit.to_string()));
        query.push(("offset".to_string(), offset.to_string()));
        query
    }
}
