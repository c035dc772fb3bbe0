//! Secondary-source abstraction.
//!
//! The resolver never talks to the network itself. It consumes three
//! collaborator capabilities, each behind a trait:
//! - [`ListingSearcher`] runs a text search and returns listings
//! - [`DetailFetcher`] retrieves one listing's detail record
//! - [`ImageProber`] reports an image's pixel dimensions
//!
//! Transport, retries and timeouts belong to the implementations.

mod query;
mod types;

pub use query::{build_search_url, detail_slug, upscale_image_url};
pub use types::*;
