//! Resolver configuration types.
//!
//! Every numeric threshold and keyword list the matching rules depend on lives
//! here, so tuning never touches the algorithms.

use std::collections::BTreeMap;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

/// Comparator thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchThresholds {
    /// A listing title may be at most this many times longer than an
    /// unsplit compare title.
    #[serde(default = "default_length_diff_ratio")]
    pub length_diff_ratio: usize,
    /// Titles at or below this length must match literally.
    #[serde(default = "default_min_match_length")]
    pub min_match_length: usize,
    /// Upper bound of the "medium" unsplit title band.
    #[serde(default = "default_mid_title_length")]
    pub mid_title_length: usize,
    /// Share of a long unsplit title the listing prefix must cover.
    #[serde(default = "default_no_split_match_ratio")]
    pub no_split_match_ratio: f64,
    /// Share of a fragment that must occur in the listing title.
    #[serde(default = "default_split_match_ratio")]
    pub split_match_ratio: f64,
    /// Unsplit titles longer than this get the long-title checks.
    #[serde(default = "default_long_title_length")]
    pub long_title_length: usize,
    /// Minimum shorter/longer length ratio for long titles.
    #[serde(default = "default_length_ratio")]
    pub length_ratio: f64,
    /// Share of the shorter length the listing prefix must cover for long titles.
    #[serde(default = "default_golden_ratio")]
    pub golden_ratio: f64,
}

fn default_length_diff_ratio() -> usize {
    5
}

fn default_min_match_length() -> usize {
    4
}

fn default_mid_title_length() -> usize {
    12
}

fn default_no_split_match_ratio() -> f64 {
    0.5
}

fn default_split_match_ratio() -> f64 {
    0.8
}

fn default_long_title_length() -> usize {
    60
}

fn default_length_ratio() -> f64 {
    0.4
}

fn default_golden_ratio() -> f64 {
    0.618
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            length_diff_ratio: default_length_diff_ratio(),
            min_match_length: default_min_match_length(),
            mid_title_length: default_mid_title_length(),
            no_split_match_ratio: default_no_split_match_ratio(),
            split_match_ratio: default_split_match_ratio(),
            long_title_length: default_long_title_length(),
            length_ratio: default_length_ratio(),
            golden_ratio: default_golden_ratio(),
        }
    }
}

/// Title segmentation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmenterConfig {
    /// Regex of decorations removed from every title before use.
    #[serde(default = "default_decoration_pattern")]
    pub decoration_pattern: String,
    /// Titles at or below this many characters are searched with the actor
    /// appended and never segmented.
    #[serde(default = "default_min_title_length")]
    pub min_title_length: usize,
    /// Primary separator regex.
    #[serde(default = "default_separator")]
    pub separator: String,
    /// Secondary separator regexes, applied after the primary one.
    #[serde(default = "default_extra_separators")]
    pub extra_separators: Vec<String>,
    /// Fragments shorter than this are never used on their own.
    #[serde(default = "default_min_fragment_length")]
    pub min_fragment_length: usize,
    /// Minimum fragment share of the unsplit title once the title is crowded.
    #[serde(default = "default_fragment_length_ratio")]
    pub fragment_length_ratio: f64,
    /// Separator count at which a title counts as crowded.
    #[serde(default = "default_crowded_separator_count")]
    pub crowded_separator_count: usize,
    /// If the shortest candidate is at most this long, actor-suffixed queries go first.
    #[serde(default = "default_actor_first_max_length")]
    pub actor_first_max_length: usize,
}

fn default_decoration_pattern() -> String {
    r"^\[.*?\]|^【.*?】|DVD|オンラインコード版|（DOD）|（BOD）|^[A-Za-z]{2,6}-?[0-9]{2,5}[\s　]+".to_string()
}

fn default_min_title_length() -> usize {
    3
}

fn default_separator() -> String {
    r"[\s　]+".to_string()
}

fn default_extra_separators() -> Vec<String> {
    ["！+", "…+", "。+", "～+"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_min_fragment_length() -> usize {
    4
}

fn default_fragment_length_ratio() -> f64 {
    0.15
}

fn default_crowded_separator_count() -> usize {
    4
}

fn default_actor_first_max_length() -> usize {
    15
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            decoration_pattern: default_decoration_pattern(),
            min_title_length: default_min_title_length(),
            separator: default_separator(),
            extra_separators: default_extra_separators(),
            min_fragment_length: default_min_fragment_length(),
            fragment_length_ratio: default_fragment_length_ratio(),
            crowded_separator_count: default_crowded_separator_count(),
            actor_first_max_length: default_actor_first_max_length(),
        }
    }
}

impl SegmenterConfig {
    /// Compile the decoration pattern.
    pub fn decoration_regex(&self) -> Result<Regex, regex_lite::Error> {
        Regex::new(&self.decoration_pattern)
    }
}

/// Listing filter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Product categories a listing must belong to.
    #[serde(default = "default_accepted_categories")]
    pub accepted_categories: Vec<String>,
    /// An image URL must contain one of these to count as an image.
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
    /// Minimum image width in pixels.
    #[serde(default = "default_min_image_width")]
    pub min_image_width: u32,
    /// Invalid results tolerated per query before the query is abandoned.
    #[serde(default = "default_max_invalid_results")]
    pub max_invalid_results: usize,
    /// Keywords marking a listing as a collection or compilation.
    #[serde(default = "default_collection_keywords")]
    pub collection_keywords: Vec<String>,
}

fn default_accepted_categories() -> Vec<String> {
    vec!["DVD".to_string(), "Software Download".to_string()]
}

fn default_image_extensions() -> Vec<String> {
    vec![".jpg".to_string()]
}

fn default_min_image_width() -> u32 {
    700
}

fn default_max_invalid_results() -> usize {
    6
}

fn default_collection_keywords() -> Vec<String> {
    ["BEST", "時間", "総集編", "完全", "枚組"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            accepted_categories: default_accepted_categories(),
            image_extensions: default_image_extensions(),
            min_image_width: default_min_image_width(),
            max_invalid_results: default_max_invalid_results(),
            collection_keywords: default_collection_keywords(),
        }
    }
}

/// Detail verification settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Maximum release-date difference still accepted as the same release.
    #[serde(default = "default_release_window_days")]
    pub release_window_days: i64,
    /// Title-matched listings escalated to detail verification per query.
    #[serde(default = "default_max_detail_checks")]
    pub max_detail_checks: usize,
    /// Keywords of promotional re-releases, which legitimately carry later dates.
    #[serde(default = "default_promotion_keywords")]
    pub promotion_keywords: Vec<String>,
    /// Longest token accepted as a performer name on a detail page.
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
}

fn default_release_window_days() -> i64 {
    30
}

fn default_max_detail_checks() -> usize {
    4
}

fn default_promotion_keywords() -> Vec<String> {
    vec!["特選アウトレット".to_string(), "ベストヒッツ".to_string()]
}

fn default_max_name_length() -> usize {
    12
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            release_window_days: default_release_window_days(),
            max_detail_checks: default_max_detail_checks(),
            promotion_keywords: default_promotion_keywords(),
            max_name_length: default_max_name_length(),
        }
    }
}

/// Masked-token table: masked form (using `●` or `○`) to its unmasked forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensitiveWords(pub BTreeMap<String, Vec<String>>);

impl Default for SensitiveWords {
    fn default() -> Self {
        let entries = [
            ("強●", &["強姦", "強制"][..]),
            ("レ●プ", &["レイプ"][..]),
            ("痴●", &["痴漢"][..]),
            ("監●", &["監禁"][..]),
            ("陵●", &["陵辱"][..]),
        ];
        Self(
            entries
                .into_iter()
                .map(|(masked, unmasked)| {
                    (
                        masked.to_string(),
                        unmasked.iter().map(|s| s.to_string()).collect(),
                    )
                })
                .collect(),
        )
    }
}

/// Resolver configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub thresholds: MatchThresholds,
    #[serde(default)]
    pub segmenter: SegmenterConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub verifier: VerifierConfig,
    #[serde(default)]
    pub sensitive_words: SensitiveWords,
    /// Producer names stripped from compare titles, in addition to the
    /// record's own studio and publisher.
    #[serde(default)]
    pub producers: Vec<String>,
    /// Category filter sent with every search.
    #[serde(default = "default_search_category")]
    pub search_category: String,
    /// Search endpoint of the secondary source. When set, every request
    /// carries a ready-made search URL.
    #[serde(default)]
    pub search_base_url: Option<String>,
}

fn default_search_category() -> String {
    "dvd".to_string()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            thresholds: MatchThresholds::default(),
            segmenter: SegmenterConfig::default(),
            filter: FilterConfig::default(),
            verifier: VerifierConfig::default(),
            sensitive_words: SensitiveWords::default(),
            producers: Vec::new(),
            search_category: default_search_category(),
            search_base_url: None,
        }
    }
}

impl ResolverConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        let t = &self.thresholds;
        if t.length_diff_ratio == 0 {
            return Err("thresholds.length_diff_ratio must be greater than 0".to_string());
        }
        if t.min_match_length == 0 {
            return Err("thresholds.min_match_length must be greater than 0".to_string());
        }
        if t.mid_title_length < t.min_match_length {
            return Err(format!(
                "thresholds.mid_title_length ({}) must not be below min_match_length ({})",
                t.mid_title_length, t.min_match_length
            ));
        }
        for (name, value) in [
            ("thresholds.no_split_match_ratio", t.no_split_match_ratio),
            ("thresholds.split_match_ratio", t.split_match_ratio),
            ("thresholds.length_ratio", t.length_ratio),
            ("thresholds.golden_ratio", t.golden_ratio),
            ("segmenter.fragment_length_ratio", self.segmenter.fragment_length_ratio),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(format!("{} must be in (0.0, 1.0], got {}", name, value));
            }
        }

        if let Err(e) = self.segmenter.decoration_regex() {
            return Err(format!("segmenter.decoration_pattern is invalid: {}", e));
        }
        for sep in std::iter::once(&self.segmenter.separator).chain(&self.segmenter.extra_separators) {
            if sep.is_empty() {
                return Err("segmenter separators cannot be empty".to_string());
            }
            if let Err(e) = Regex::new(sep) {
                return Err(format!("segmenter separator {:?} is invalid: {}", sep, e));
            }
        }

        if self.filter.max_invalid_results == 0 {
            return Err("filter.max_invalid_results must be greater than 0".to_string());
        }
        if self.filter.accepted_categories.is_empty() {
            return Err("filter.accepted_categories cannot be empty".to_string());
        }
        if self.verifier.release_window_days < 0 {
            return Err(format!(
                "verifier.release_window_days cannot be negative, got {}",
                self.verifier.release_window_days
            ));
        }

        for (masked, unmasked) in &self.sensitive_words.0 {
            if !masked.contains('●') && !masked.contains('○') {
                return Err(format!(
                    "sensitive word {:?} has no mask character (● or ○)",
                    masked
                ));
            }
            if unmasked.is_empty() {
                return Err(format!("sensitive word {:?} has no unmasked forms", masked));
            }
        }

        Ok(())
    }
}
