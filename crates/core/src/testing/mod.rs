//! Testing utilities and mock collaborators.
//!
//! This module provides mock implementations of the secondary-source traits,
//! allowing resolution runs to be tested without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use coverscout_core::testing::{fixtures, MockDetailFetcher, MockImageProber, MockSearcher};
//!
//! let searcher = MockSearcher::new();
//! let fetcher = MockDetailFetcher::new();
//! let prober = MockImageProber::new();
//!
//! // Configure mock responses
//! searcher.set_results(vec![fixtures::listing("名前 花子", "https://img/a.jpg", "/x/dp/1")]).await;
//! fetcher.set_detail("/x/dp/1", fixtures::detail(&["花子"], &[], None)).await;
//!
//! // Build a Resolver with them...
//! ```

mod mock_detail;
mod mock_prober;
mod mock_searcher;

pub use mock_detail::MockDetailFetcher;
pub use mock_prober::{MockImageProber, DEFAULT_IMAGE_SIZE};
pub use mock_searcher::{MockSearcher, RecordedSearch};

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::NaiveDate;

    use crate::record::SourceRecord;
    use crate::source::{DetailRecord, Listing};

    /// Create a DVD listing with all fields present.
    pub fn listing(title: &str, image_url: &str, detail_url: &str) -> Listing {
        Listing {
            category: Some("DVD".to_string()),
            title: title.to_string(),
            image_url: Some(image_url.to_string()),
            detail_url: Some(detail_url.to_string()),
        }
    }

    /// Create a detail record. Names are taken as already normalized.
    pub fn detail(credited: &[&str], listed: &[&str], release_date: Option<NaiveDate>) -> DetailRecord {
        DetailRecord {
            credited_performers: credited.iter().map(|s| s.to_string()).collect(),
            listed_performers: listed.iter().map(|s| s.to_string()).collect(),
            release_date,
        }
    }

    /// Create a coded source record.
    pub fn record(title: &str, actors: &[&str]) -> SourceRecord {
        SourceRecord::new(title, actors.iter().map(|s| s.to_string()).collect())
    }
}
