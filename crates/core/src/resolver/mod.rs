//! Resolver - finds a cover image for a source record on the secondary source.
//!
//! The two sources share no identifier, only a noisy title and a list of
//! performers. A resolution run:
//! - Normalizes the performer list and picks the best-match actor
//! - Segments the title into an ordered list of search queries
//! - Screens every listing a query returns (category, image size, compilations)
//! - Compares listing titles against the query with tiered length rules
//! - Confirms the actor in the listing or, failing that, on the detail page
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                            Resolver                              │
//! │                                                                  │
//! │  SourceRecord ─► normalize_actors ─► TitleSegmenter              │
//! │                                          │ candidates (ordered)  │
//! │                                          ▼                       │
//! │  ┌────────────────────────────────────────────────────────────┐  │
//! │  │ for each candidate:  ListingSearcher::search               │  │
//! │  │   for each listing:  CandidateFilter ─► titles_match       │  │
//! │  │                        └─► actor in listing? ─► ACCEPT     │  │
//! │  │   for ≤4 unverified: DetailVerifier ─► ACCEPT / LEGACY     │  │
//! │  └────────────────────────────────────────────────────────────┘  │
//! │                                                                  │
//! │  exhausted ─► first LEGACY image, or none                        │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use coverscout_core::resolver::{Resolver, ResolverConfig};
//!
//! let resolver = Resolver::new(ResolverConfig::default(), searcher, fetcher, prober)?;
//! if let Some(image) = resolver.resolve(&record).await {
//!     println!("{} ({})", image.url, image.confidence.as_str());
//! }
//! ```

pub mod actors;
pub mod comparator;
pub mod compare;
pub mod config;
mod controller;
pub mod filter;
pub mod segmenter;
pub mod sensitive;
pub mod text;
mod types;
pub mod verifier;

pub use actors::{normalize_actors, split_aliases, ActorList};
pub use comparator::titles_match;
pub use compare::{CompareTitle, TitleNormalizer};
pub use config::{
    FilterConfig, MatchThresholds, ResolverConfig, SegmenterConfig, SensitiveWords,
    VerifierConfig,
};
pub use controller::Resolver;
pub use filter::{CandidateFilter, FilterMemory, ListingRejection};
pub use segmenter::{Segmentation, TitleSegmenter};
pub use sensitive::SensitiveTable;
pub use types::*;
pub use verifier::{DetailVerdict, DetailVerifier};
