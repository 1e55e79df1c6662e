//! The boundary to the execution backend. The core never computes series values; it names
//! the series a node needs by [`CacheKey`], asks a [`SeriesBackend`] for them, and stores
//! the returned records untouched.

use crate::error::BackendError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod cache_key;
pub mod fetch;
#[cfg(feature = "http-backend")]
pub mod http;
pub mod store;

pub use cache_key::{CacheKey, SeriesKind, node_cache_keys};
pub use fetch::{DiscardReason, FetchCoordinator, FetchOutcome, FetchTicket, MergeStatus};
#[cfg(feature = "http-backend")]
pub use http::HttpSeriesBackend;
pub use store::SeriesStore;

/// One time-stamped row of a series. Everything but the timestamp is opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRecord {
    pub timestamp: i64,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl SeriesRecord {
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            fields: serde_json::Map::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// A request for the history of one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRequest {
    pub cache_key: CacheKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    /// Only records strictly older than this timestamp, for backfilling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl HistoryRequest {
    pub fn new(cache_key: CacheKey) -> Self {
        Self {
            cache_key,
            start: None,
            end: None,
            before: None,
            limit: None,
        }
    }

    pub fn between(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start = Some(start.into());
        self.end = Some(end.into());
        self
    }

    pub fn before(mut self, timestamp: i64) -> Self {
        self.before = Some(timestamp);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A source of historical series data.
#[async_trait]
pub trait SeriesBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_history(&self, request: &HistoryRequest) -> Result<Vec<SeriesRecord>, BackendError>;
}
