//! Detail-page verification.
//!
//! Used when a listing matched on title but none of the source actors could
//! be found in the listing itself. The detail page is checked for performer
//! names and a release date; either can confirm or veto the listing.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::actors::split_aliases;
use super::config::VerifierConfig;
use super::text::compact;
use crate::source::{DetailFetcher, DetailRecord};

/// Outcome of a detail check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetailVerdict {
    ActorMatch,
    ActorMismatch,
    ReleaseMatch,
    ReleaseMismatch,
    /// Nothing on the page confirms or contradicts the listing.
    LackOfProof,
    GetDetailFailed,
}

impl DetailVerdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Self::ActorMatch | Self::ReleaseMatch)
    }

    pub fn is_reject(&self) -> bool {
        matches!(self, Self::ActorMismatch | Self::ReleaseMismatch)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ActorMatch => "actor_match",
            Self::ActorMismatch => "actor_mismatch",
            Self::ReleaseMatch => "release_match",
            Self::ReleaseMismatch => "release_mismatch",
            Self::LackOfProof => "lack_of_proof",
            Self::GetDetailFailed => "get_detail_failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActorSignal {
    Match,
    Mismatch,
    Uncertain,
    NoActor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReleaseSignal {
    Match,
    Mismatch,
    /// Dates differ but the listing is a promotional re-release.
    Promotion,
    NoDate,
}

/// Performer names from raw page-region strings.
///
/// Each region is split on `/` and `,`; non-word characters are dropped and
/// only tokens up to `max_name_length` characters are kept as names.
pub fn performers_from_regions<S: AsRef<str>>(regions: &[S], max_name_length: usize) -> Vec<String> {
    let mut names = Vec::new();
    for region in regions {
        let region = region.as_ref();
        if region.trim().is_empty() {
            continue;
        }
        for element in region.split(['/', ',']) {
            let cleaned: String = element.chars().filter(|c| c.is_alphanumeric()).collect();
            if !cleaned.is_empty() && cleaned.chars().count() <= max_name_length {
                names.push(cleaned);
            }
        }
    }
    split_aliases(&names)
}

/// Parse a detail-page date, either `2024/8/17` or `2024-08-17`.
pub fn parse_release_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y/%m/%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y-%m-%d"))
        .ok()
}

impl DetailRecord {
    /// Build a record from raw page regions. `credited` regions name the
    /// cast with confidence; `listed` regions (purchase info) may contain
    /// other text.
    pub fn from_regions<S: AsRef<str>>(
        credited: &[S],
        listed: &[S],
        release_date: Option<&str>,
        max_name_length: usize,
    ) -> Self {
        Self {
            credited_performers: performers_from_regions(credited, max_name_length),
            listed_performers: performers_from_regions(listed, max_name_length),
            release_date: release_date.and_then(parse_release_date),
        }
    }
}

/// Checks listings against their detail pages.
pub struct DetailVerifier {
    config: VerifierConfig,
    fetcher: Arc<dyn DetailFetcher>,
}

impl DetailVerifier {
    pub fn new(config: VerifierConfig, fetcher: Arc<dyn DetailFetcher>) -> Self {
        Self { config, fetcher }
    }

    pub async fn verify(
        &self,
        detail_url: &str,
        actors: &[String],
        source_release: Option<NaiveDate>,
        listing_title: &str,
    ) -> DetailVerdict {
        match self.fetcher.fetch_detail(detail_url).await {
            Ok(detail) => {
                let verdict = self.judge(&detail, actors, source_release, listing_title);
                debug!(detail_url = %detail_url, verdict = verdict.as_str(), "detail checked");
                verdict
            }
            Err(e) => {
                warn!(detail_url = %detail_url, error = %e, "detail fetch failed");
                DetailVerdict::GetDetailFailed
            }
        }
    }

    /// Verdict for an already fetched detail record. A mismatch on either
    /// signal wins over a match on the other.
    pub fn judge(
        &self,
        detail: &DetailRecord,
        actors: &[String],
        source_release: Option<NaiveDate>,
        listing_title: &str,
    ) -> DetailVerdict {
        let actor = actor_signal(detail, actors);
        let release = self.release_signal(detail.release_date, source_release, listing_title);

        if actor == ActorSignal::Mismatch {
            return DetailVerdict::ActorMismatch;
        }
        if release == ReleaseSignal::Mismatch {
            return DetailVerdict::ReleaseMismatch;
        }
        if actor == ActorSignal::Match {
            return DetailVerdict::ActorMatch;
        }
        if release == ReleaseSignal::Match {
            return DetailVerdict::ReleaseMatch;
        }
        DetailVerdict::LackOfProof
    }

    fn release_signal(
        &self,
        detail: Option<NaiveDate>,
        source: Option<NaiveDate>,
        listing_title: &str,
    ) -> ReleaseSignal {
        let (Some(detail), Some(source)) = (detail, source) else {
            return ReleaseSignal::NoDate;
        };
        let days = (detail - source).num_days().abs();
        if days <= self.config.release_window_days {
            ReleaseSignal::Match
        } else if self
            .config
            .promotion_keywords
            .iter()
            .any(|k| listing_title.contains(k.as_str()))
        {
            ReleaseSignal::Promotion
        } else {
            ReleaseSignal::Mismatch
        }
    }
}

fn actor_signal(detail: &DetailRecord, actors: &[String]) -> ActorSignal {
    let wanted: Vec<String> = actors
        .iter()
        .map(|a| compact(a))
        .filter(|a| !a.is_empty())
        .collect();
    if wanted.is_empty()
        || (detail.credited_performers.is_empty() && detail.listed_performers.is_empty())
    {
        return ActorSignal::NoActor;
    }

    let found = detail
        .credited_performers
        .iter()
        .chain(detail.listed_performers.iter())
        .map(|name| compact(name))
        .any(|name| wanted.iter().any(|a| name.contains(a.as_str())));
    if found {
        ActorSignal::Match
    } else if !detail.credited_performers.is_empty() {
        ActorSignal::Mismatch
    } else {
        ActorSignal::Uncertain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockDetailFetcher};

    fn verifier() -> DetailVerifier {
        DetailVerifier::new(VerifierConfig::default(), Arc::new(MockDetailFetcher::new()))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn actors(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_performers_from_regions() {
        let names = performers_from_regions(
            &["花子 (はなこ) / 桃子, 長すぎる名前ではない何かの説明文です", "  "],
            12,
        );
        assert_eq!(names, vec!["花子はなこ", "桃子"]);
    }

    #[test]
    fn test_parse_release_date() {
        assert_eq!(parse_release_date("2024/8/17"), Some(date(2024, 8, 17)));
        assert_eq!(parse_release_date(" 2024-08-17 "), Some(date(2024, 8, 17)));
        assert_eq!(parse_release_date("8月17日"), None);
    }

    #[test]
    fn test_from_regions() {
        let record = DetailRecord::from_regions(&["花子"], &["桃子"], Some("2024/1/2"), 12);
        assert_eq!(record.credited_performers, vec!["花子"]);
        assert_eq!(record.listed_performers, vec!["桃子"]);
        assert_eq!(record.release_date, Some(date(2024, 1, 2)));
    }

    #[test]
    fn test_actor_match() {
        let detail = fixtures::detail(&["花子"], &[], None);
        let verdict = verifier().judge(&detail, &actors(&["花子"]), None, "");
        assert_eq!(verdict, DetailVerdict::ActorMatch);
    }

    #[test]
    fn test_actor_mismatch_on_credited_cast() {
        let detail = fixtures::detail(&["桃子"], &[], None);
        let verdict = verifier().judge(&detail, &actors(&["花子"]), None, "");
        assert_eq!(verdict, DetailVerdict::ActorMismatch);
    }

    #[test]
    fn test_listed_only_is_not_a_mismatch() {
        let detail = fixtures::detail(&[], &["桃子"], None);
        let verdict = verifier().judge(&detail, &actors(&["花子"]), None, "");
        assert_eq!(verdict, DetailVerdict::LackOfProof);
    }

    #[test]
    fn test_release_window_edges() {
        let source = date(2024, 1, 1);
        let v = verifier();

        let within = fixtures::detail(&[], &[], Some(date(2024, 1, 31)));
        assert_eq!(
            v.judge(&within, &[], Some(source), "名前"),
            DetailVerdict::ReleaseMatch
        );

        let outside = fixtures::detail(&[], &[], Some(date(2024, 2, 1)));
        assert_eq!(
            v.judge(&outside, &[], Some(source), "名前"),
            DetailVerdict::ReleaseMismatch
        );
        assert_eq!(
            v.judge(&outside, &[], Some(source), "名前 特選アウトレット"),
            DetailVerdict::LackOfProof
        );
    }

    #[test]
    fn test_mismatch_beats_match() {
        let detail = fixtures::detail(&["花子"], &[], Some(date(2020, 1, 1)));
        let verdict = verifier().judge(&detail, &actors(&["花子"]), Some(date(2024, 1, 1)), "");
        assert_eq!(verdict, DetailVerdict::ReleaseMismatch);
    }

    #[test]
    fn test_empty_actor_list_degrades_gracefully() {
        let detail = fixtures::detail(&["桃子"], &[], None);
        assert_eq!(verifier().judge(&detail, &[], None, ""), DetailVerdict::LackOfProof);
    }

    #[tokio::test]
    async fn test_verify_fetch_failure() {
        let fetcher = Arc::new(MockDetailFetcher::new());
        fetcher
            .set_next_error(crate::source::SourceError::Timeout)
            .await;
        let v = DetailVerifier::new(VerifierConfig::default(), fetcher.clone());
        let verdict = v.verify("/x/dp/1", &actors(&["花子"]), None, "").await;
        assert_eq!(verdict, DetailVerdict::GetDetailFailed);
        assert_eq!(fetcher.fetched_urls().await, vec!["/x/dp/1"]);
    }

    #[tokio::test]
    async fn test_verify_uses_registered_detail() {
        let fetcher = Arc::new(MockDetailFetcher::new());
        fetcher
            .set_detail("/x/dp/1", fixtures::detail(&["花子"], &[], None))
            .await;
        let v = DetailVerifier::new(VerifierConfig::default(), fetcher);
        let verdict = v.verify("/x/dp/1", &actors(&["花子"]), None, "").await;
        assert_eq!(verdict, DetailVerdict::ActorMatch);
    }
}
