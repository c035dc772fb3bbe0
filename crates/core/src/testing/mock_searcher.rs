//! Mock listing searcher for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use crate::source::{Listing, ListingSearcher, SearchRequest, SourceError};

/// A recorded search for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSearch {
    /// The request that was searched.
    pub request: SearchRequest,
    /// When the search was made.
    pub timestamp: Instant,
}

/// A query handler that produces results dynamically based on the query.
type QueryHandler = Box<dyn Fn(&str) -> Option<Vec<Listing>> + Send + Sync>;

/// Mock implementation of the ListingSearcher trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable listings, the same for every query by default
/// - Track search queries for assertions
/// - Simulate failures
///
/// # Example
///
/// ```rust,ignore
/// use coverscout_core::testing::{MockSearcher, fixtures};
///
/// let searcher = MockSearcher::new();
/// searcher.set_query_handler(|query| {
///     query.contains("花子").then(|| vec![fixtures::listing("名前 花子", "https://img/a.jpg", "/x/dp/1")])
/// }).await;
///
/// // ... run a resolution ...
/// assert_eq!(searcher.recorded_queries().await, vec!["名前 花子"]);
/// ```
pub struct MockSearcher {
    /// Listings returned when no handler answers.
    results: Arc<RwLock<Vec<Listing>>>,
    /// Recorded searches.
    searches: Arc<RwLock<Vec<RecordedSearch>>>,
    /// If set, the next search will fail with this error.
    next_error: Arc<RwLock<Option<SourceError>>>,
    /// Query handler for dynamic result generation based on query string.
    query_handler: Arc<RwLock<Option<QueryHandler>>>,
}

impl std::fmt::Debug for MockSearcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSearcher")
            .field("results", &"<results>")
            .field("searches", &"<searches>")
            .field("next_error", &"<next_error>")
            .field("query_handler", &"<handler>")
            .finish()
    }
}

impl Default for MockSearcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSearcher {
    /// Create a new mock searcher with empty results.
    pub fn new() -> Self {
        Self {
            results: Arc::new(RwLock::new(Vec::new())),
            searches: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            query_handler: Arc::new(RwLock::new(None)),
        }
    }

    /// Create a mock searcher with predefined results.
    pub fn with_results(results: Vec<Listing>) -> Self {
        Self {
            results: Arc::new(RwLock::new(results)),
            ..Self::new()
        }
    }

    /// Set the listings returned for every subsequent search.
    pub async fn set_results(&self, results: Vec<Listing>) {
        *self.results.write().await = results;
    }

    /// Add a single listing.
    pub async fn add_result(&self, result: Listing) {
        self.results.write().await.push(result);
    }

    /// Get recorded searches.
    pub async fn recorded_searches(&self) -> Vec<RecordedSearch> {
        self.searches.read().await.clone()
    }

    /// Get the query strings searched, in order.
    pub async fn recorded_queries(&self) -> Vec<String> {
        self.searches
            .read()
            .await
            .iter()
            .map(|s| s.request.query.clone())
            .collect()
    }

    /// Get the number of searches performed.
    pub async fn search_count(&self) -> usize {
        self.searches.read().await.len()
    }

    /// Configure the next search to fail with the given error.
    pub async fn set_next_error(&self, error: SourceError) {
        *self.next_error.write().await = Some(error);
    }

    /// Set a query handler that dynamically generates results based on the query string.
    ///
    /// The handler returns `Some(listings)` to answer a query, or `None` to
    /// fall back to the configured results.
    pub async fn set_query_handler<F>(&self, handler: F)
    where
        F: Fn(&str) -> Option<Vec<Listing>> + Send + Sync + 'static,
    {
        *self.query_handler.write().await = Some(Box::new(handler));
    }

    /// Clear the query handler.
    pub async fn clear_query_handler(&self) {
        *self.query_handler.write().await = None;
    }

    /// Take the next error if set.
    async fn take_error(&self) -> Option<SourceError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl ListingSearcher for MockSearcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<Listing>, SourceError> {
        // Failed searches are recorded too
        self.searches.write().await.push(RecordedSearch {
            request: request.clone(),
            timestamp: Instant::now(),
        });

        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let handler = self.query_handler.read().await;
        if let Some(ref h) = *handler {
            if let Some(listings) = h(&request.query) {
                return Ok(listings);
            }
        }
        drop(handler);

        Ok(self.results.read().await.clone())
    }
}
