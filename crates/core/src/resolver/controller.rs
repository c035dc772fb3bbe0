//! Resolver - drives one resolution run from source record to cover image.

use std::sync::Arc;
use std::time::Instant;

use regex_lite::Regex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::metrics;
use crate::record::SourceRecord;
use crate::resolver::{
    actors::{normalize_actors, ActorList},
    comparator::titles_match,
    compare::{CompareTitle, TitleNormalizer},
    config::ResolverConfig,
    filter::{CandidateFilter, FilterMemory, ScreenedListing},
    segmenter::{Segmentation, TitleSegmenter},
    sensitive::SensitiveTable,
    types::{
        ImageReference, ListingOutcome, ListingTrace, MatchVerdict, ResolutionReport,
        ResolveError,
    },
    verifier::{DetailVerdict, DetailVerifier},
};
use crate::source::{
    detail_slug, DetailFetcher, ImageProber, ListingSearcher, SearchRequest,
};

/// Everything derived from the source record before the first query.
struct ResolutionPlan {
    actors: ActorList,
    segmentation: Segmentation,
    normalizer: TitleNormalizer,
    /// Compare form of the primary candidate.
    primary: CompareTitle,
}

/// Finds the cover image of a source record on the secondary source.
///
/// Candidate titles are queried strictly in order. The first confirmed
/// listing ends the run; otherwise the first listing whose detail page was
/// inconclusive is returned as a legacy result.
pub struct Resolver {
    config: ResolverConfig,
    searcher: Arc<dyn ListingSearcher>,
    prober: Arc<dyn ImageProber>,
    verifier: DetailVerifier,
    filter: CandidateFilter,
    segmenter: TitleSegmenter,
    decoration: Regex,
    sensitive: SensitiveTable,
}

impl Resolver {
    pub fn new(
        config: ResolverConfig,
        searcher: Arc<dyn ListingSearcher>,
        fetcher: Arc<dyn DetailFetcher>,
        prober: Arc<dyn ImageProber>,
    ) -> Result<Self, ResolveError> {
        config.validate().map_err(ResolveError::InvalidConfig)?;

        let sensitive = SensitiveTable::new(&config.sensitive_words);
        let segmenter = TitleSegmenter::new(&config.segmenter, sensitive.clone())
            .map_err(|e| ResolveError::InvalidConfig(e.to_string()))?;
        let decoration = config
            .segmenter
            .decoration_regex()
            .map_err(|e| ResolveError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            verifier: DetailVerifier::new(config.verifier.clone(), fetcher),
            filter: CandidateFilter::new(config.filter.clone()),
            config,
            searcher,
            prober,
            segmenter,
            decoration,
            sensitive,
        })
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Candidate titles for `record`, in query order.
    pub fn candidates(&self, record: &SourceRecord) -> Segmentation {
        let actors = self.actors(record);
        self.segmenter.segment(&record.title, &actors)
    }

    /// Resolve the cover image of `record`.
    pub async fn resolve(&self, record: &SourceRecord) -> Option<ImageReference> {
        self.resolve_with_report(record).await.image
    }

    /// Resolve and report every step taken.
    pub async fn resolve_with_report(&self, record: &SourceRecord) -> ResolutionReport {
        match self.run(record, None).await {
            Ok(report) => report,
            // Only cancellation fails a run
            Err(_) => ResolutionReport::default(),
        }
    }

    /// Resolve, stopping before the next query once `cancel` reads `true`.
    /// A cancelled run discards whatever it found so far.
    pub async fn resolve_cancellable(
        &self,
        record: &SourceRecord,
        cancel: &watch::Receiver<bool>,
    ) -> Result<ResolutionReport, ResolveError> {
        self.run(record, Some(cancel)).await
    }

    fn actors(&self, record: &SourceRecord) -> ActorList {
        normalize_actors(
            &record.title,
            &record.actor_names,
            record.title_actor.as_deref(),
        )
    }

    fn plan(&self, record: &SourceRecord) -> ResolutionPlan {
        let actors = self.actors(record);
        let segmentation = self.segmenter.segment(&record.title, &actors);

        let producers: Vec<&str> = record
            .producers()
            .into_iter()
            .chain(self.config.producers.iter().map(String::as_str))
            .collect();
        let normalizer = TitleNormalizer::new(
            self.decoration.clone(),
            self.sensitive.clone(),
            &producers,
            &actors.actors,
            self.config.segmenter.min_title_length,
        );
        let primary = normalizer.compare_title(&segmentation.primary);

        ResolutionPlan {
            actors,
            segmentation,
            normalizer,
            primary,
        }
    }

    async fn run(
        &self,
        record: &SourceRecord,
        cancel: Option<&watch::Receiver<bool>>,
    ) -> Result<ResolutionReport, ResolveError> {
        let start = Instant::now();
        let mut report = ResolutionReport::default();

        if !record.category.is_resolvable() {
            debug!(title = %record.title, category = ?record.category, "category not resolvable");
            return Ok(self.finish(report, None, start, "skipped"));
        }

        let plan = self.plan(record);
        metrics::CANDIDATES_GENERATED
            .with_label_values(&[])
            .observe(plan.segmentation.candidates.len() as f64);
        if plan.segmentation.is_empty() {
            debug!(title = %record.title, "no candidate titles");
            return Ok(self.finish(report, None, start, "none"));
        }
        debug!(
            title = %record.title,
            primary = %plan.segmentation.primary,
            candidates = plan.segmentation.candidates.len(),
            best_actor = %plan.actors.best_match,
            "resolution planned"
        );

        let mut memory = FilterMemory::new();
        let mut legacy: Vec<String> = Vec::new();

        for query in &plan.segmentation.candidates {
            if cancel.is_some_and(|rx| *rx.borrow()) {
                info!(title = %record.title, "resolution cancelled");
                metrics::RESOLUTIONS_TOTAL
                    .with_label_values(&["cancelled"])
                    .inc();
                return Err(ResolveError::Cancelled);
            }

            if let Some(image) = self
                .run_query(query, record, &plan, &mut memory, &mut legacy, &mut report)
                .await
            {
                return Ok(self.finish(report, Some(image), start, "confirmed"));
            }
        }

        match legacy.into_iter().next() {
            Some(url) => {
                debug!(image_url = %url, "falling back to legacy result");
                Ok(self.finish(report, Some(ImageReference::legacy(url)), start, "legacy"))
            }
            None => Ok(self.finish(report, None, start, "none")),
        }
    }

    /// Issue one query and evaluate its listings. Returns a confirmed image
    /// as soon as one is found.
    async fn run_query(
        &self,
        query: &str,
        record: &SourceRecord,
        plan: &ResolutionPlan,
        memory: &mut FilterMemory,
        legacy: &mut Vec<String>,
        report: &mut ResolutionReport,
    ) -> Option<ImageReference> {
        report.queries_tried.push(query.to_string());
        metrics::SEARCH_QUERIES.inc();

        let mut request = SearchRequest::new(query, &self.config.search_category);
        if let Some(base) = &self.config.search_base_url {
            request = request.with_base_url(base);
        }
        let listings = match self.searcher.search(&request).await {
            Ok(listings) => listings,
            Err(e) => {
                warn!(searcher = self.searcher.name(), query = %query, error = %e, "search failed");
                metrics::SOURCE_ERRORS.with_label_values(&["search"]).inc();
                return None;
            }
        };
        if listings.is_empty() {
            debug!(query = %query, "no results");
            return None;
        }

        let compare = plan.normalizer.compare_title(query);
        let cap = self.config.filter.max_invalid_results;
        let mut invalid = 0usize;
        let mut pending: Vec<ScreenedListing> = Vec::new();

        for listing in &listings {
            if invalid >= cap {
                debug!(query = %query, invalid, "too many invalid results, next query");
                break;
            }
            report.listings_evaluated += 1;

            let screened = match self
                .filter
                .screen(listing, &plan.segmentation.primary, memory, self.prober.as_ref())
                .await
            {
                Ok(screened) => screened,
                Err(rejected) => {
                    debug!(title = %listing.title, reason = %rejected.reason, "listing filtered");
                    metrics::LISTINGS_REJECTED
                        .with_label_values(&[rejected.reason.as_str()])
                        .inc();
                    if rejected.reason.counts_toward_budget() {
                        invalid += 1;
                    }
                    if rejected.reason.remember() {
                        if let Some(url) = &rejected.image_url {
                            memory.insert(url.clone());
                        }
                    }
                    report.trace.push(ListingTrace {
                        query: query.to_string(),
                        image_url: rejected.image_url,
                        outcome: ListingOutcome::Filtered {
                            reason: rejected.reason,
                        },
                    });
                    continue;
                }
            };

            let listing_compare = plan.normalizer.compare_title(&screened.title);
            if !titles_match(
                &compare.no_actor,
                &listing_compare.no_actor,
                &plan.primary.no_actor,
                &self.config.thresholds,
            ) {
                debug!(title = %screened.title, "title rejected");
                metrics::LISTINGS_REJECTED
                    .with_label_values(&["title_mismatch"])
                    .inc();
                invalid += 1;
                memory.insert(screened.image_url.clone());
                trace(report, query, &screened, MatchVerdict::TitleRejected, None);
                continue;
            }

            if self.listing_names_actor(plan, &listing_compare, &screened.detail_url) {
                info!(title = %screened.title, image_url = %screened.image_url, "actor confirmed in listing");
                trace(
                    report,
                    query,
                    &screened,
                    MatchVerdict::TitleMatchedActorConfirmed,
                    None,
                );
                return Some(ImageReference::confirmed(screened.image_url));
            }

            debug!(title = %screened.title, "title matched, actor unverified");
            pending.push(screened);
        }

        let max_checks = self.config.verifier.max_detail_checks;
        for (index, candidate) in pending.into_iter().enumerate() {
            if index >= max_checks {
                trace(
                    report,
                    query,
                    &candidate,
                    MatchVerdict::TitleMatchedUnverified,
                    None,
                );
                continue;
            }

            report.detail_checks += 1;
            let verdict = self
                .verifier
                .verify(
                    &candidate.detail_url,
                    &plan.actors.actors,
                    record.release_date,
                    &candidate.title,
                )
                .await;
            metrics::DETAIL_CHECKS
                .with_label_values(&[verdict.as_str()])
                .inc();
            if verdict == DetailVerdict::GetDetailFailed {
                metrics::SOURCE_ERRORS
                    .with_label_values(&["fetch_detail"])
                    .inc();
            }
            trace(
                report,
                query,
                &candidate,
                MatchVerdict::TitleMatchedUnverified.after_detail(verdict),
                Some(verdict),
            );

            if verdict.is_accept() {
                info!(title = %candidate.title, image_url = %candidate.image_url, verdict = verdict.as_str(), "detail page confirmed listing");
                return Some(ImageReference::confirmed(candidate.image_url));
            }
            memory.insert(candidate.image_url.clone());
            if verdict == DetailVerdict::LackOfProof {
                legacy.push(candidate.image_url);
            }
        }
        None
    }

    /// Whether an actor shows up in the listing title or in the title slug
    /// of its detail URL.
    fn listing_names_actor(
        &self,
        plan: &ResolutionPlan,
        listing: &CompareTitle,
        detail_url: &str,
    ) -> bool {
        if plan.actors.is_empty() {
            return false;
        }
        if plan.normalizer.mentions_actor(&listing.full) {
            return true;
        }
        detail_slug(detail_url)
            .map(|slug| plan.normalizer.compare_title(&slug))
            .is_some_and(|slug| plan.normalizer.mentions_actor(&slug.full))
    }

    fn finish(
        &self,
        mut report: ResolutionReport,
        image: Option<ImageReference>,
        start: Instant,
        outcome: &str,
    ) -> ResolutionReport {
        let elapsed = start.elapsed();
        report.image = image;
        report.duration_ms = elapsed.as_millis() as u64;

        metrics::RESOLUTIONS_TOTAL
            .with_label_values(&[outcome])
            .inc();
        metrics::RESOLUTION_DURATION
            .with_label_values(&[outcome])
            .observe(elapsed.as_secs_f64());

        info!(
            outcome,
            image_url = report.image_url().unwrap_or(""),
            queries = report.queries_tried.len(),
            listings = report.listings_evaluated,
            detail_checks = report.detail_checks,
            duration_ms = report.duration_ms,
            "resolution finished"
        );
        report
    }
}

fn trace(
    report: &mut ResolutionReport,
    query: &str,
    listing: &ScreenedListing,
    verdict: MatchVerdict,
    detail: Option<DetailVerdict>,
) {
    report.trace.push(ListingTrace {
        query: query.to_string(),
        image_url: Some(listing.image_url.clone()),
        outcome: ListingOutcome::Judged { verdict, detail },
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SourceCategory;
    use crate::testing::{fixtures, MockDetailFetcher, MockImageProber, MockSearcher};

    struct Harness {
        searcher: Arc<MockSearcher>,
        fetcher: Arc<MockDetailFetcher>,
        prober: Arc<MockImageProber>,
        resolver: Resolver,
    }

    fn harness() -> Harness {
        let searcher = Arc::new(MockSearcher::new());
        let fetcher = Arc::new(MockDetailFetcher::new());
        let prober = Arc::new(MockImageProber::new());
        let resolver = Resolver::new(
            ResolverConfig::default(),
            searcher.clone(),
            fetcher.clone(),
            prober.clone(),
        )
        .unwrap();
        Harness {
            searcher,
            fetcher,
            prober,
            resolver,
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = ResolverConfig::default();
        config.filter.max_invalid_results = 0;
        let result = Resolver::new(
            config,
            Arc::new(MockSearcher::new()),
            Arc::new(MockDetailFetcher::new()),
            Arc::new(MockImageProber::new()),
        );
        assert!(matches!(result, Err(ResolveError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_unresolvable_category_makes_no_calls() {
        let h = harness();
        let record = fixtures::record("夏の終わりの物語", &["花子"])
            .with_category(SourceCategory::Western);
        let report = h.resolver.resolve_with_report(&record).await;
        assert!(report.image.is_none());
        assert!(report.queries_tried.is_empty());
        assert_eq!(h.searcher.search_count().await, 0);
    }

    #[tokio::test]
    async fn test_actor_in_detail_slug_confirms() {
        let h = harness();
        h.searcher
            .set_results(vec![fixtures::listing(
                "夏の終わりの物語",
                "https://img/a.jpg",
                "/%E5%A4%8F-%E8%8A%B1%E5%AD%90/dp/B01",
            )])
            .await;
        let record = fixtures::record("夏の終わりの物語", &["花子"]);
        let image = h.resolver.resolve(&record).await.unwrap();
        assert_eq!(image, ImageReference::confirmed("https://img/a.jpg"));
        assert!(h.fetcher.fetched_urls().await.is_empty());
    }

    #[tokio::test]
    async fn test_pending_checks_are_capped() {
        let h = harness();
        let listings: Vec<_> = (0..6)
            .map(|i| {
                fixtures::listing(
                    "夏の終わりの物語",
                    &format!("https://img/{i}.jpg"),
                    &format!("/x/dp/{i}"),
                )
            })
            .collect();
        h.searcher.set_results(listings).await;
        let record = fixtures::record("夏の終わりの物語", &["花子"]);

        let report = h.resolver.resolve_with_report(&record).await;
        assert!(report.image.is_none());
        assert_eq!(report.queries_tried.len(), 2);
        // Unregistered detail pages fail: four checks on the first query,
        // the two unchecked listings on the second
        assert_eq!(report.detail_checks, 6);
        assert_eq!(h.fetcher.fetched_urls().await.len(), 6);
        assert_eq!(h.prober.probed_urls().await.len(), 8);
    }

    #[tokio::test]
    async fn test_candidates_are_exposed() {
        let h = harness();
        let record = fixtures::record("ABC-123 名前 花子", &["花子"]);
        assert_eq!(h.resolver.candidates(&record).candidates, vec!["名前 花子"]);
    }
}
