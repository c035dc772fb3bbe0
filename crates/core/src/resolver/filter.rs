//! Listing screening before any title comparison.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::config::FilterConfig;
use crate::metrics;
use crate::source::{upscale_image_url, ImageProber, Listing};

/// Why a listing was dropped before title comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingRejection {
    /// Category, title, image or detail URL missing.
    Malformed,
    WrongCategory,
    /// No usable image URL.
    NoImage,
    /// Image already rejected earlier in this run.
    AlreadyRejected,
    /// The prober failed.
    ImageUnavailable,
    LowResolution,
    NotPortrait,
    /// A compilation while the source title is not one.
    Collection,
}

impl ListingRejection {
    /// Whether the rejection counts toward the per-query invalid budget.
    pub fn counts_toward_budget(&self) -> bool {
        !matches!(self, Self::Collection)
    }

    /// Whether the image URL goes into [`FilterMemory`].
    pub fn remember(&self) -> bool {
        !matches!(self, Self::Malformed | Self::AlreadyRejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::WrongCategory => "wrong_category",
            Self::NoImage => "no_image",
            Self::AlreadyRejected => "already_rejected",
            Self::ImageUnavailable => "image_unavailable",
            Self::LowResolution => "low_resolution",
            Self::NotPortrait => "not_portrait",
            Self::Collection => "collection",
        }
    }
}

impl std::fmt::Display for ListingRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image URLs rejected during one resolution run.
#[derive(Debug, Default)]
pub struct FilterMemory {
    rejected: HashSet<String>,
}

impl FilterMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, image_url: &str) -> bool {
        self.rejected.contains(image_url)
    }

    pub fn insert(&mut self, image_url: impl Into<String>) {
        self.rejected.insert(image_url.into());
    }

    pub fn len(&self) -> usize {
        self.rejected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// A listing that passed screening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenedListing {
    pub title: String,
    /// Full-size image URL.
    pub image_url: String,
    pub detail_url: String,
}

/// Outcome of screening: the rejection plus the upscaled image URL when one
/// could be derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejected {
    pub reason: ListingRejection,
    pub image_url: Option<String>,
}

impl Rejected {
    fn new(reason: ListingRejection, image_url: Option<String>) -> Self {
        Self { reason, image_url }
    }
}

/// Applies the listing filters in order: completeness, category, image
/// format, memory, resolution and orientation, collection keywords.
#[derive(Debug, Clone)]
pub struct CandidateFilter {
    config: FilterConfig,
}

impl CandidateFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Whether `listing_title` is a compilation that `primary` is not.
    pub fn is_foreign_collection(&self, listing_title: &str, primary: &str) -> bool {
        let listing = listing_title.to_uppercase();
        let primary = primary.to_uppercase();
        self.config.collection_keywords.iter().any(|k| {
            let k = k.to_uppercase();
            listing.contains(&k) && !primary.contains(&k)
        })
    }

    pub async fn screen(
        &self,
        listing: &Listing,
        primary: &str,
        memory: &FilterMemory,
        prober: &dyn ImageProber,
    ) -> Result<ScreenedListing, Rejected> {
        if !listing.is_complete() {
            return Err(Rejected::new(ListingRejection::Malformed, None));
        }
        let (Some(category), Some(raw_image), Some(detail_url)) = (
            listing.category.as_deref(),
            listing.image_url.as_deref(),
            listing.detail_url.as_deref(),
        ) else {
            return Err(Rejected::new(ListingRejection::Malformed, None));
        };

        let image_url = upscale_image_url(raw_image);
        if !self
            .config
            .accepted_categories
            .iter()
            .any(|c| c == category)
        {
            return Err(Rejected::new(
                ListingRejection::WrongCategory,
                Some(image_url),
            ));
        }
        if !self
            .config
            .image_extensions
            .iter()
            .any(|ext| image_url.contains(ext.as_str()))
        {
            return Err(Rejected::new(ListingRejection::NoImage, Some(image_url)));
        }
        if memory.contains(&image_url) {
            return Err(Rejected::new(
                ListingRejection::AlreadyRejected,
                Some(image_url),
            ));
        }

        let size = match prober.probe_image_size(&image_url).await {
            Ok(size) => size,
            Err(e) => {
                warn!(image_url = %image_url, error = %e, "image probe failed");
                metrics::SOURCE_ERRORS
                    .with_label_values(&["probe_image"])
                    .inc();
                return Err(Rejected::new(
                    ListingRejection::ImageUnavailable,
                    Some(image_url),
                ));
            }
        };
        if size.width < self.config.min_image_width {
            return Err(Rejected::new(
                ListingRejection::LowResolution,
                Some(image_url),
            ));
        }
        if !size.is_portrait() {
            return Err(Rejected::new(ListingRejection::NotPortrait, Some(image_url)));
        }

        if self.is_foreign_collection(&listing.title, primary) {
            debug!(title = %listing.title, "skipping compilation listing");
            return Err(Rejected::new(ListingRejection::Collection, Some(image_url)));
        }

        Ok(ScreenedListing {
            title: listing.title.clone(),
            image_url,
            detail_url: detail_url.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ImageSize;
    use crate::testing::{fixtures, MockImageProber};

    fn filter() -> CandidateFilter {
        CandidateFilter::new(FilterConfig::default())
    }

    #[tokio::test]
    async fn test_screen_accepts_portrait_dvd() {
        let prober = MockImageProber::new();
        let listing = fixtures::listing("名前 花子", "https://img/a._AC_UL320_.jpg", "/x/dp/1");
        let screened = filter()
            .screen(&listing, "名前 花子", &FilterMemory::new(), &prober)
            .await
            .unwrap();
        assert_eq!(screened.image_url, "https://img/a.jpg");
        assert_eq!(prober.probed_urls().await, vec!["https://img/a.jpg"]);
    }

    #[tokio::test]
    async fn test_screen_rejects_malformed() {
        let prober = MockImageProber::new();
        let mut listing = fixtures::listing("名前", "https://img/a.jpg", "/x/dp/1");
        listing.detail_url = None;
        let err = filter()
            .screen(&listing, "名前", &FilterMemory::new(), &prober)
            .await
            .unwrap_err();
        assert_eq!(err.reason, ListingRejection::Malformed);
        assert!(prober.probed_urls().await.is_empty());
    }

    #[tokio::test]
    async fn test_screen_rejects_wrong_category() {
        let prober = MockImageProber::new();
        let mut listing = fixtures::listing("名前", "https://img/a.jpg", "/x/dp/1");
        listing.category = Some("Blu-ray".into());
        let err = filter()
            .screen(&listing, "名前", &FilterMemory::new(), &prober)
            .await
            .unwrap_err();
        assert_eq!(err.reason, ListingRejection::WrongCategory);
        assert_eq!(err.image_url.as_deref(), Some("https://img/a.jpg"));
    }

    #[tokio::test]
    async fn test_screen_rejects_non_jpeg() {
        let prober = MockImageProber::new();
        let listing = fixtures::listing("名前", "https://img/a.gif", "/x/dp/1");
        let err = filter()
            .screen(&listing, "名前", &FilterMemory::new(), &prober)
            .await
            .unwrap_err();
        assert_eq!(err.reason, ListingRejection::NoImage);
    }

    #[tokio::test]
    async fn test_screen_skips_remembered_image() {
        let prober = MockImageProber::new();
        let listing = fixtures::listing("名前", "https://img/a.jpg", "/x/dp/1");
        let mut memory = FilterMemory::new();
        memory.insert("https://img/a.jpg");
        let err = filter()
            .screen(&listing, "名前", &memory, &prober)
            .await
            .unwrap_err();
        assert_eq!(err.reason, ListingRejection::AlreadyRejected);
        assert!(!err.reason.remember());
        assert!(prober.probed_urls().await.is_empty());
    }

    #[tokio::test]
    async fn test_screen_rejects_small_and_landscape() {
        let prober = MockImageProber::new();
        prober.set_size("https://img/small.jpg", ImageSize::new(699, 1000)).await;
        prober.set_size("https://img/wide.jpg", ImageSize::new(1200, 800)).await;
        prober.set_size("https://img/square.jpg", ImageSize::new(800, 800)).await;

        for (url, expected) in [
            ("https://img/small.jpg", ListingRejection::LowResolution),
            ("https://img/wide.jpg", ListingRejection::NotPortrait),
            ("https://img/square.jpg", ListingRejection::NotPortrait),
        ] {
            let listing = fixtures::listing("名前", url, "/x/dp/1");
            let err = filter()
                .screen(&listing, "名前", &FilterMemory::new(), &prober)
                .await
                .unwrap_err();
            assert_eq!(err.reason, expected, "{url}");
        }
    }

    #[tokio::test]
    async fn test_screen_probe_failure() {
        let prober = MockImageProber::new();
        prober
            .set_next_error(crate::source::SourceError::Timeout)
            .await;
        let listing = fixtures::listing("名前", "https://img/a.jpg", "/x/dp/1");
        let err = filter()
            .screen(&listing, "名前", &FilterMemory::new(), &prober)
            .await
            .unwrap_err();
        assert_eq!(err.reason, ListingRejection::ImageUnavailable);
    }

    #[tokio::test]
    async fn test_probe_failure_is_counted_as_source_error() {
        let errors = metrics::SOURCE_ERRORS.with_label_values(&["probe_image"]);
        let before = errors.get();
        let prober = MockImageProber::new();
        prober
            .set_next_error(crate::source::SourceError::ConnectionFailed(
                "reset".to_string(),
            ))
            .await;
        let listing = fixtures::listing("名前", "https://img/b.jpg", "/x/dp/2");
        let _ = filter()
            .screen(&listing, "名前", &FilterMemory::new(), &prober)
            .await;
        assert!(errors.get() > before);
    }

    #[tokio::test]
    async fn test_screen_rejects_blank_fields_as_malformed() {
        let prober = MockImageProber::new();
        let mut listing = fixtures::listing("名前", "https://img/a.jpg", "/x/dp/1");
        listing.category = Some(String::new());
        let err = filter()
            .screen(&listing, "名前", &FilterMemory::new(), &prober)
            .await
            .unwrap_err();
        assert_eq!(err.reason, ListingRejection::Malformed);
        assert!(prober.probed_urls().await.is_empty());
    }

    #[tokio::test]
    async fn test_screen_rejects_foreign_collection() {
        let prober = MockImageProber::new();
        let listing = fixtures::listing("名前 総集編 8時間", "https://img/a.jpg", "/x/dp/1");
        let err = filter()
            .screen(&listing, "名前 花子", &FilterMemory::new(), &prober)
            .await
            .unwrap_err();
        assert_eq!(err.reason, ListingRejection::Collection);
        assert!(!err.reason.counts_toward_budget());
        assert!(err.reason.remember());
    }

    #[test]
    fn test_collection_shared_with_source_is_kept() {
        assert!(!filter().is_foreign_collection("名前 BEST 4時間", "名前 best 4時間"));
        assert!(filter().is_foreign_collection("名前 best", "名前"));
    }
}
