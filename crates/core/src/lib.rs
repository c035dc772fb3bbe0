pub mod config;
pub mod metrics;
pub mod record;
pub mod resolver;
pub mod source;
pub mod testing;

pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use record::{SourceCategory, SourceRecord};
pub use resolver::{
    ImageReference, MatchConfidence, ResolutionReport, ResolveError, Resolver, ResolverConfig,
};
pub use source::{
    DetailFetcher, DetailRecord, ImageProber, ImageSize, Listing, ListingSearcher, SearchRequest,
    SourceError,
};
