use thiserror::Error;

use super::filter::ListingRejection;
use super::verifier::DetailVerdict;

/// Title-level verdict for one listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchVerdict {
    TitleRejected,
    /// Title matched and an actor was found in the listing or its detail page.
    TitleMatchedActorConfirmed,
    /// Title matched but the detail page contradicted the listing.
    TitleMatchedActorRejected,
    /// Title matched, nothing confirmed it yet.
    TitleMatchedUnverified,
}

impl MatchVerdict {
    /// Refine an unverified verdict with a detail check.
    pub fn after_detail(self, detail: DetailVerdict) -> Self {
        if self != Self::TitleMatchedUnverified {
            return self;
        }
        if detail.is_accept() {
            Self::TitleMatchedActorConfirmed
        } else if detail.is_reject() {
            Self::TitleMatchedActorRejected
        } else {
            Self::TitleMatchedUnverified
        }
    }
}

/// How much the returned image can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchConfidence {
    /// Verified through an actor or release date.
    Confirmed,
    /// Title matched, verification was inconclusive.
    Legacy,
}

impl MatchConfidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Legacy => "legacy",
        }
    }
}

/// The resolved cover image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub url: String,
    pub confidence: MatchConfidence,
}

impl ImageReference {
    pub fn confirmed(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            confidence: MatchConfidence::Confirmed,
        }
    }

    pub fn legacy(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            confidence: MatchConfidence::Legacy,
        }
    }
}

/// What happened to one listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingOutcome {
    Filtered {
        reason: ListingRejection,
    },
    Judged {
        verdict: MatchVerdict,
        detail: Option<DetailVerdict>,
    },
}

/// One entry of the per-listing trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingTrace {
    /// The query that returned the listing.
    pub query: String,
    pub image_url: Option<String>,
    pub outcome: ListingOutcome,
}

/// Everything a resolution run did, for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    pub image: Option<ImageReference>,
    /// Queries in the order they were issued.
    pub queries_tried: Vec<String>,
    pub listings_evaluated: usize,
    pub detail_checks: usize,
    pub trace: Vec<ListingTrace>,
    pub duration_ms: u64,
}

impl ResolutionReport {
    pub fn image_url(&self) -> Option<&str> {
        self.image.as_ref().map(|i| i.url.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Resolution cancelled")]
    Cancelled,

    #[error("Invalid resolver configuration: {0}")]
    InvalidConfig(String),
}
