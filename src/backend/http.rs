use super::{HistoryRequest, SeriesBackend, SeriesRecord};
use crate::config::BackendConfig;
use crate::error::BackendError;
use ahash::AHashMap;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Fetches history over HTTP. The request is posted as JSON to
/// `{base_url}/series/history`; the response maps cache-key strings to record arrays.
#[derive(Debug, Clone)]
pub struct HttpSeriesBackend {
    base_url: String,
    client: Client,
}

impl HttpSeriesBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        Self::new(config.base_url.clone(), Duration::from_secs(config.timeout_secs))
    }
}

#[async_trait]
impl SeriesBackend for HttpSeriesBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_history(&self, request: &HistoryRequest) -> Result<Vec<SeriesRecord>, BackendError> {
        let url = format!("{}/series/history", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                message: text,
            });
        }

        let mut body: AHashMap<String, Vec<SeriesRecord>> = resp
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        let key = request.cache_key.to_string();
        let records = body.remove(&key).ok_or(BackendError::MissingKey(key))?;
        debug!(%url, records = records.len(), "Received history");
        Ok(records)
    }
}
