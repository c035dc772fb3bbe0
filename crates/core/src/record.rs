//! Primary-source records handed to the resolver.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Release category reported by the primary source.
///
/// Only some categories are sold as physical media on the secondary storefront,
/// so the category gates whether a resolution run happens at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceCategory {
    /// Regular censored release.
    #[default]
    Coded,
    /// Leaked copy of a coded release.
    Leaked,
    /// Uncensored rework of a coded release.
    UncensoredCracked,
    /// Animated release.
    Animated,
    Uncensored,
    Domestic,
    Western,
    Unknown,
}

impl SourceCategory {
    /// Returns true if records of this category are worth resolving.
    pub fn is_resolvable(&self) -> bool {
        matches!(
            self,
            SourceCategory::Coded
                | SourceCategory::Leaked
                | SourceCategory::UncensoredCracked
                | SourceCategory::Animated
        )
    }
}

/// A catalog entry scraped from the primary source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Free-text title as published by the primary source.
    pub title: String,
    /// Performer names in source order. May be empty.
    #[serde(default)]
    pub actor_names: Vec<String>,
    /// Performer the primary source attached to the title, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_actor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub category: SourceCategory,
    /// Studio name, stripped from compare titles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub studio: Option<String>,
    /// Publisher name, stripped from compare titles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
}

impl SourceRecord {
    /// Create a coded record with the given title and performers.
    pub fn new(title: impl Into<String>, actor_names: Vec<String>) -> Self {
        Self {
            title: title.into(),
            actor_names,
            title_actor: None,
            release_date: None,
            category: SourceCategory::default(),
            studio: None,
            publisher: None,
        }
    }

    pub fn with_release_date(mut self, date: NaiveDate) -> Self {
        self.release_date = Some(date);
        self
    }

    pub fn with_category(mut self, category: SourceCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_title_actor(mut self, actor: impl Into<String>) -> Self {
        self.title_actor = Some(actor.into());
        self
    }

    pub fn with_studio(mut self, studio: impl Into<String>) -> Self {
        self.studio = Some(studio.into());
        self
    }

    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    /// Studio and publisher names that are present.
    pub fn producers(&self) -> Vec<&str> {
        [self.studio.as_deref(), self.publisher.as_deref()]
            .into_iter()
            .flatten()
            .filter(|p| !p.trim().is_empty())
            .collect()
    }
}
