//! Comparison forms of titles.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use tracing::warn;

use super::actors::split_aliases;
use super::sensitive::SensitiveTable;
use super::text::{char_len, compact, strip_trailing_actors};

static PARENTHESISED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[(（][^)）]*[)）]").expect("valid parenthesis pattern"));

/// A title reduced for comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompareTitle {
    /// Upper-case alphanumerics, actors kept.
    pub full: String,
    /// Same, with trailing actors removed.
    pub no_actor: String,
}

/// Builds [`CompareTitle`]s for one resolution run.
#[derive(Debug)]
pub struct TitleNormalizer {
    decoration: Regex,
    sensitive: SensitiveTable,
    producers: Option<Regex>,
    actors: Vec<String>,
    min_title_length: usize,
}

impl TitleNormalizer {
    /// `producers` are studio or publisher names; each is alias-split and
    /// removed wherever it appears in a compare title.
    pub fn new<S: AsRef<str>>(
        decoration: Regex,
        sensitive: SensitiveTable,
        producers: &[S],
        actors: &[String],
        min_title_length: usize,
    ) -> Self {
        let mut names: Vec<String> = split_aliases(producers)
            .iter()
            .map(|p| compact(p))
            .filter(|p| !p.is_empty())
            .collect();
        names.dedup();
        let producers = if names.is_empty() {
            None
        } else {
            let alternation = names
                .iter()
                .map(|n| regex_lite::escape(n))
                .collect::<Vec<_>>()
                .join("|");
            match Regex::new(&alternation) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    warn!(error = %e, "producer names ignored");
                    None
                }
            }
        };

        Self {
            decoration,
            sensitive,
            producers,
            actors: actors.iter().map(|a| compact(a)).collect(),
            min_title_length,
        }
    }

    pub fn compare_title(&self, raw: &str) -> CompareTitle {
        let title = self.decoration.replace_all(raw, "");
        let title = PARENTHESISED.replace_all(title.trim(), "");
        let title = self.sensitive.collapse(title.trim());
        let mut full = compact(&title);
        if let Some(producers) = &self.producers {
            full = producers.replace_all(&full, "").into_owned();
        }

        let stripped = strip_trailing_actors(&full, &self.actors);
        let no_actor = if char_len(&stripped) <= self.min_title_length {
            full.clone()
        } else {
            stripped
        };
        CompareTitle { full, no_actor }
    }

    /// Whether any actor appears in `compare`, which must already be compact.
    pub fn mentions_actor(&self, compare: &str) -> bool {
        self.actors
            .iter()
            .any(|a| !a.is_empty() && compare.contains(a.as_str()))
    }
}
