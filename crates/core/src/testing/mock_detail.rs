//! Mock detail fetcher for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::source::{DetailFetcher, DetailRecord, SourceError};

/// Mock implementation of the DetailFetcher trait.
///
/// Detail pages are registered per URL; unregistered URLs fail with
/// [`SourceError::NotFound`].
#[derive(Debug, Default)]
pub struct MockDetailFetcher {
    details: Arc<RwLock<HashMap<String, DetailRecord>>>,
    /// Recorded fetches.
    fetched: Arc<RwLock<Vec<String>>>,
    /// If set, the next fetch will fail with this error.
    next_error: Arc<RwLock<Option<SourceError>>>,
}

impl MockDetailFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the detail page served for `detail_url`.
    pub async fn set_detail(&self, detail_url: &str, detail: DetailRecord) {
        self.details
            .write()
            .await
            .insert(detail_url.to_string(), detail);
    }

    /// URLs fetched so far, in order.
    pub async fn fetched_urls(&self) -> Vec<String> {
        self.fetched.read().await.clone()
    }

    pub async fn fetch_count(&self) -> usize {
        self.fetched.read().await.len()
    }

    /// Configure the next fetch to fail with the given error.
    pub async fn set_next_error(&self, error: SourceError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl DetailFetcher for MockDetailFetcher {
    async fn fetch_detail(&self, detail_url: &str) -> Result<DetailRecord, SourceError> {
        self.fetched.write().await.push(detail_url.to_string());

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        self.details
            .read()
            .await
            .get(detail_url)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(detail_url.to_string()))
    }
}
