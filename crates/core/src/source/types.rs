//! Types for the secondary-source collaborators.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::query::build_search_url;

/// One search request against the secondary source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Candidate title as generated by the segmenter.
    pub query: String,
    /// Fixed product-category filter (e.g. "dvd").
    pub category: String,
    /// URL-safe form of `query`.
    pub encoded_query: String,
    /// Full search URL, when the resolver knows the source's search endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, category: impl Into<String>) -> Self {
        let query = query.into();
        let encoded_query = urlencoding::encode(&query).into_owned();
        Self {
            query,
            category: category.into(),
            encoded_query,
            url: None,
        }
    }

    /// Attach the search URL built under `base`.
    pub fn with_base_url(mut self, base: &str) -> Self {
        self.url = Some(build_search_url(base, &self));
        self
    }
}

/// A single search-result entry from the secondary source.
///
/// Fields are optional because result pages are scraped; a listing missing
/// any of them is treated as malformed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Listing {
    /// Product category as shown on the result ("DVD", "Software Download", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Product title as shown on the result.
    #[serde(default)]
    pub title: String,
    /// Thumbnail image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Link to the product detail page. Often embeds a title slug.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_url: Option<String>,
}

impl Listing {
    /// Returns true if every field the filter needs is present.
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty()
            && self.category.as_deref().is_some_and(|c| !c.is_empty())
            && self.image_url.as_deref().is_some_and(|u| !u.is_empty())
            && self.detail_url.as_deref().is_some_and(|u| !u.is_empty())
    }
}

/// Parsed detail page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DetailRecord {
    /// Performers from credit regions (high confidence).
    #[serde(default)]
    pub credited_performers: Vec<String>,
    /// Performer-like names from purchase-option regions (low confidence).
    #[serde(default)]
    pub listed_performers: Vec<String>,
    /// Physical release date, if the page shows one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Strictly taller than wide.
    pub fn is_portrait(&self) -> bool {
        self.width < self.height
    }
}

/// Errors reported by secondary-source collaborators.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Secondary source connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Text search against the secondary source.
#[async_trait]
pub trait ListingSearcher: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Execute a search. An empty result is not an error.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Listing>, SourceError>;
}

/// Detail-page retrieval for a single listing.
#[async_trait]
pub trait DetailFetcher: Send + Sync {
    async fn fetch_detail(&self, detail_url: &str) -> Result<DetailRecord, SourceError>;
}

/// Image dimension probing.
#[async_trait]
pub trait ImageProber: Send + Sync {
    async fn probe_image_size(&self, image_url: &str) -> Result<ImageSize, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_request_encodes_query() {
        let request = SearchRequest::new("名前 花子", "dvd");
        assert_eq!(request.query, "名前 花子");
        assert_eq!(request.category, "dvd");
        assert!(!request.encoded_query.contains(' '));
        assert!(request.encoded_query.starts_with('%'));
        assert!(request.url.is_none());
    }

    #[test]
    fn test_search_request_with_base_url() {
        let request = SearchRequest::new("夏 物語", "dvd").with_base_url("https://shop.example/s?");
        let url = request.url.as_deref().unwrap();
        assert!(url.starts_with("https://shop.example/s?k="));
        assert!(url.ends_with("&i=dvd"));
    }

    #[test]
    fn test_listing_completeness() {
        let listing = Listing {
            category: Some("DVD".to_string()),
            title: "Title".to_string(),
            image_url: Some("https://img/x.jpg".to_string()),
            detail_url: Some("/t/dp/B0".to_string()),
        };
        assert!(listing.is_complete());

        let missing_image = Listing {
            image_url: None,
            ..listing.clone()
        };
        assert!(!missing_image.is_complete());

        let blank_title = Listing {
            title: "  ".to_string(),
            ..listing
        };
        assert!(!blank_title.is_complete());
    }

    #[test]
    fn test_image_orientation() {
        assert!(ImageSize::new(800, 1200).is_portrait());
        assert!(!ImageSize::new(1200, 800).is_portrait());
        assert!(!ImageSize::new(800, 800).is_portrait());
    }

    #[test]
    fn test_detail_record_minimal() {
        let json = r#"{"release_date": "2024-08-17"}"#;
        let detail: DetailRecord = serde_json::from_str(json).unwrap();
        assert!(detail.credited_performers.is_empty());
        assert_eq!(
            detail.release_date,
            NaiveDate::from_ymd_opt(2024, 8, 17)
        );
    }
}
