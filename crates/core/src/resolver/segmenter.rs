//! Turns a source title into an ordered list of search queries.
//!
//! The cleaned title is searched first in all its spellings, followed by the
//! fragments obtained by cutting it at whitespace and at a few full-width
//! punctuation marks. Every query may get a twin carrying the best-match
//! actor; for short titles the twin is searched first.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use tracing::debug;

use super::actors::ActorList;
use super::config::SegmenterConfig;
use super::sensitive::SensitiveTable;
use super::text::{char_len, dedup_preserving_order, strip_trailing_actors};

/// Catalog numbers are not descriptive text: `ABC123`, `ABC-123`.
static CATALOG_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[A-Za-z0-9]+|[A-Za-z]+-[0-9]+)$").expect("valid code pattern"));

/// Result of segmenting one source title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmentation {
    /// The cleaned title with the best-match actor appended. Every accepted
    /// listing must agree with it.
    pub primary: String,
    /// Unsplit spellings of the title, with actor twins.
    pub unsplit: Vec<String>,
    /// All search queries in priority order.
    pub candidates: Vec<String>,
}

impl Segmentation {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Where the actor-suffixed twin goes relative to the plain query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TwinOrder {
    ActorFirst,
    PlainFirst,
}

#[derive(Debug)]
struct SeparatorRule {
    regex: Regex,
    /// Used to glue a rejected trailing fragment back on.
    joiner: String,
}

/// Pattern without its trailing quantifiers.
fn core_of(pattern: &str) -> &str {
    pattern.trim_end_matches(['+', '*', '?'])
}

fn joiner_of(pattern: &str) -> String {
    let core = core_of(pattern);
    if core.contains(r"\s") {
        return " ".to_string();
    }
    core.chars()
        .next()
        .map(|c| c.to_string())
        .unwrap_or_else(|| " ".to_string())
}

/// Splits titles into search queries.
#[derive(Debug)]
pub struct TitleSegmenter {
    decoration: Regex,
    primary: SeparatorRule,
    extras: Vec<SeparatorRule>,
    any_separator: Regex,
    leading_separators: Regex,
    trailing_separators: Regex,
    sensitive: SensitiveTable,
    min_title_length: usize,
    min_fragment_length: usize,
    fragment_length_ratio: f64,
    crowded_separator_count: usize,
    actor_first_max_length: usize,
}

impl TitleSegmenter {
    pub fn new(
        config: &SegmenterConfig,
        sensitive: SensitiveTable,
    ) -> Result<Self, regex_lite::Error> {
        let rule = |pattern: &str| -> Result<SeparatorRule, regex_lite::Error> {
            Ok(SeparatorRule {
                regex: Regex::new(pattern)?,
                joiner: joiner_of(pattern),
            })
        };

        let primary = rule(config.separator.as_str())?;
        let extras = config
            .extra_separators
            .iter()
            .map(|p| rule(p.as_str()))
            .collect::<Result<Vec<_>, _>>()?;

        let all: Vec<&str> = std::iter::once(config.separator.as_str())
            .chain(config.extra_separators.iter().map(String::as_str))
            .collect();
        let any_separator = Regex::new(&all.join("|"))?;
        let cores = all
            .iter()
            .map(|p| core_of(p))
            .collect::<Vec<_>>()
            .join("|");

        Ok(Self {
            decoration: config.decoration_regex()?,
            primary,
            extras,
            any_separator,
            leading_separators: Regex::new(&format!("^(?:{cores})+"))?,
            trailing_separators: Regex::new(&format!("(?:{cores})+$"))?,
            sensitive,
            min_title_length: config.min_title_length,
            min_fragment_length: config.min_fragment_length,
            fragment_length_ratio: config.fragment_length_ratio,
            crowded_separator_count: config.crowded_separator_count,
            actor_first_max_length: config.actor_first_max_length,
        })
    }

    /// Decoration removed, trimmed, trailing actors cut.
    pub fn clean(&self, title: &str, actors: &ActorList) -> String {
        let stripped = self.decoration.replace_all(title, "");
        strip_trailing_actors(stripped.trim(), &actors.actors)
            .trim()
            .to_string()
    }

    pub fn segment(&self, title: &str, actors: &ActorList) -> Segmentation {
        let cleaned = self.clean(title, actors);
        if cleaned.is_empty() {
            debug!(title = %title, "title is empty after cleaning");
            return Segmentation::default();
        }

        let mut unsplit = vec![cleaned.clone()];
        unsplit.extend(
            self.sensitive
                .expand(&cleaned)
                .into_iter()
                .filter(|v| *v != cleaned),
        );
        let unsplit = dedup_preserving_order(unsplit);
        let best = actors.best();

        if char_len(&cleaned) <= self.min_title_length {
            if let Some(actor) = best {
                let suffixed: Vec<String> =
                    unsplit.iter().map(|t| format!("{t} {actor}")).collect();
                return Segmentation {
                    primary: suffixed[0].clone(),
                    unsplit: suffixed.clone(),
                    candidates: suffixed,
                };
            }
        }

        let primary = match best {
            Some(actor) => format!("{cleaned} {actor}"),
            None => cleaned.clone(),
        };

        if !self.any_separator.is_match(&unsplit[0]) {
            let order = self.order_for(char_len(&unsplit[0]));
            let candidates = interleave(&unsplit, best, order);
            return Segmentation {
                primary,
                unsplit: candidates.clone(),
                candidates,
            };
        }

        let unsplit_length = char_len(&unsplit[0]);
        let mut fragments = Vec::new();
        for t in &unsplit {
            fragments.extend(self.split_and_filter(t, unsplit_length, &self.primary, actors));
        }
        if !self.extras.is_empty() {
            let base = if fragments.is_empty() {
                unsplit.clone()
            } else {
                fragments.clone()
            };
            for rule in &self.extras {
                for t in &base {
                    fragments.extend(self.split_and_filter(t, unsplit_length, rule, actors));
                }
            }
        }

        let plain: Vec<String> = unsplit
            .iter()
            .chain(fragments.iter())
            .map(|t| self.trim_separators(t))
            .filter(|t| !t.is_empty() && !is_actor(t, actors))
            .collect();
        let plain = dedup_preserving_order(plain);

        let shortest = plain.iter().map(|t| char_len(t)).min().unwrap_or(0);
        let order = self.order_for(shortest);
        debug!(
            title = %cleaned,
            fragments = plain.len(),
            actor_first = order == TwinOrder::ActorFirst,
            "segmented title"
        );

        Segmentation {
            primary,
            unsplit: interleave(&unsplit, best, order),
            candidates: interleave(&plain, best, order),
        }
    }

    fn order_for(&self, length: usize) -> TwinOrder {
        if length <= self.actor_first_max_length {
            TwinOrder::ActorFirst
        } else {
            TwinOrder::PlainFirst
        }
    }

    fn trim_separators(&self, title: &str) -> String {
        let head = self.leading_separators.replace(title, "");
        self.trailing_separators.replace(&head, "").into_owned()
    }

    fn is_valid_fragment(
        &self,
        part: &str,
        unsplit_length: usize,
        separator_count: usize,
        actors: &ActorList,
    ) -> bool {
        let length = char_len(part);
        if length < self.min_fragment_length {
            return false;
        }
        if is_actor(part, actors) || CATALOG_CODE.is_match(part) {
            return false;
        }
        !(separator_count >= self.crowded_separator_count
            && (length as f64) < self.fragment_length_ratio * unsplit_length as f64)
    }

    /// Cut `title` at every run of `rule`. An invalid fragment is not cut
    /// off; it stays joined with whatever follows. An invalid last fragment
    /// is glued onto the previous accepted one.
    fn split_and_filter(
        &self,
        title: &str,
        unsplit_length: usize,
        rule: &SeparatorRule,
        actors: &ActorList,
    ) -> Vec<String> {
        let blocks: Vec<(usize, usize)> = rule
            .regex
            .find_iter(title)
            .map(|m| (m.start(), m.end()))
            .collect();
        let separator_count = blocks.len();

        let mut result: Vec<String> = Vec::new();
        let mut start = 0;
        for (block_start, block_end) in blocks {
            let part = &title[start..block_start];
            if self.is_valid_fragment(part, unsplit_length, separator_count, actors) {
                result.push(part.to_string());
                start = block_end;
            }
        }

        let last = &title[start..];
        if !last.is_empty() {
            if self.is_valid_fragment(last, unsplit_length, separator_count, actors) {
                result.push(last.to_string());
            } else if let Some(previous) = result.last_mut() {
                previous.push_str(&rule.joiner);
                previous.push_str(last.trim());
            } else {
                result.push(last.to_string());
            }
        }
        result
    }
}

fn is_actor(part: &str, actors: &ActorList) -> bool {
    let upper = part.trim().to_uppercase();
    actors.actors.iter().any(|a| *a == upper)
}

fn interleave(titles: &[String], actor: Option<&str>, order: TwinOrder) -> Vec<String> {
    let Some(actor) = actor else {
        return titles.to_vec();
    };
    let mut out = Vec::with_capacity(titles.len() * 2);
    for t in titles {
        let twin = format!("{t} {actor}");
        match order {
            TwinOrder::ActorFirst => {
                out.push(twin);
                out.push(t.clone());
            }
            TwinOrder::PlainFirst => {
                out.push(t.clone());
                out.push(twin);
            }
        }
    }
    dedup_preserving_order(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::actors::normalize_actors;
    use crate::resolver::config::SensitiveWords;

    fn segmenter() -> TitleSegmenter {
        TitleSegmenter::new(
            &SegmenterConfig::default(),
            SensitiveTable::new(&SensitiveWords::default()),
        )
        .unwrap()
    }

    #[test]
    fn test_short_title_gets_actor_suffix() {
        let actors = normalize_actors("ABC-123 名前 花子", &["花子"], None);
        let seg = segmenter().segment("ABC-123 名前 花子", &actors);
        assert_eq!(seg.candidates, vec!["名前 花子"]);
        assert_eq!(seg.primary, "名前 花子");
        assert!(seg.candidates.iter().all(|c| c.ends_with("花子")));
    }

    #[test]
    fn test_empty_title_yields_nothing() {
        let actors = normalize_actors("", &["花子"], None);
        let seg = segmenter().segment("【特典付き】", &actors);
        assert!(seg.is_empty());
        assert_eq!(seg.primary, "");
    }

    #[test]
    fn test_unseparated_short_title_puts_actor_first() {
        let actors = normalize_actors("", &["花子"], None);
        let seg = segmenter().segment("夏の終わりの物語", &actors);
        assert_eq!(seg.candidates, vec!["夏の終わりの物語 花子", "夏の終わりの物語"]);
        assert_eq!(seg.primary, "夏の終わりの物語 花子");
    }

    #[test]
    fn test_unseparated_long_title_puts_plain_first() {
        let actors = normalize_actors("", &["花子"], None);
        let title = "長い長い夏の終わりの物語をもう一度だけ聞かせて";
        let seg = segmenter().segment(title, &actors);
        assert_eq!(seg.candidates[0], title);
        assert_eq!(seg.candidates[1], format!("{title} 花子"));
    }

    #[test]
    fn test_split_on_whitespace() {
        let actors = normalize_actors("", &[] as &[String], None);
        let seg = segmenter().segment("夏の終わりの物語 秋の始まりの歌", &actors);
        assert_eq!(
            seg.candidates,
            vec![
                "夏の終わりの物語 秋の始まりの歌",
                "夏の終わりの物語",
                "秋の始まりの歌"
            ]
        );
    }

    #[test]
    fn test_short_fragment_stays_joined() {
        let actors = normalize_actors("", &[] as &[String], None);
        let seg = segmenter().segment("新作 夏の終わりの物語", &actors);
        // "新作" is too short to stand alone, so no cut happens at all
        assert_eq!(seg.candidates, vec!["新作 夏の終わりの物語"]);
    }

    #[test]
    fn test_failing_last_fragment_is_merged_back() {
        let actors = normalize_actors("", &[] as &[String], None);
        let seg = segmenter().segment("夏の終わりの物語 続編", &actors);
        assert_eq!(seg.candidates, vec!["夏の終わりの物語 続編"]);
    }

    const HEAD: &str = "あいうえおかきくけこさしすせそ";
    const MIDDLE: &str = "なにぬねのはひふへほまみむめも";
    const TAIL: &str = "アイウエオカキクケコサシスセソ";

    #[test]
    fn test_crowded_title_keeps_small_pieces_joined() {
        let actors = normalize_actors("", &[] as &[String], None);
        // Four separators, 57 characters: 4-character pieces fall under 15%
        let title = format!("{HEAD} たちつて {MIDDLE} やゆよら {TAIL}");
        let seg = segmenter().segment(&title, &actors);
        assert_eq!(
            seg.candidates,
            vec![
                title.clone(),
                HEAD.to_string(),
                format!("たちつて {MIDDLE}"),
                format!("やゆよら {TAIL}"),
            ]
        );
        assert!(!seg.candidates.iter().any(|c| c == "たちつて"));
    }

    #[test]
    fn test_sparse_title_cuts_small_pieces() {
        let actors = normalize_actors("", &[] as &[String], None);
        let title = format!("{HEAD} たちつて {MIDDLE}");
        let seg = segmenter().segment(&title, &actors);
        assert_eq!(
            seg.candidates,
            vec![
                title.clone(),
                HEAD.to_string(),
                "たちつて".to_string(),
                MIDDLE.to_string(),
            ]
        );
    }

    #[test]
    fn test_actor_fragment_is_excluded() {
        let actors = normalize_actors("", &["桃子さくら"], None);
        let seg = segmenter().segment("桃子さくら 夏の終わりの物語 続き", &actors);
        assert!(!seg.candidates.iter().any(|c| c == "桃子さくら"));
        assert!(seg
            .candidates
            .iter()
            .all(|c| c.to_uppercase() != "桃子さくら"));
    }

    #[test]
    fn test_catalog_code_fragment_is_not_cut() {
        let actors = normalize_actors("", &[] as &[String], None);
        let seg = segmenter().segment("ABCD123 夏の終わりの物語", &actors);
        assert!(!seg.candidates.iter().any(|c| c == "ABCD123"));
    }

    #[test]
    fn test_extra_separator_split() {
        let actors = normalize_actors("", &[] as &[String], None);
        let seg = segmenter().segment("夏の終わりの物語！秋の始まりの歌", &actors);
        assert!(seg.candidates.contains(&"夏の終わりの物語".to_string()));
        assert!(seg.candidates.contains(&"秋の始まりの歌".to_string()));
    }

    #[test]
    fn test_sensitive_variants_are_searched() {
        let actors = normalize_actors("", &[] as &[String], None);
        let seg = TitleSegmenter::new(
            &SegmenterConfig::default(),
            SensitiveTable::new(&SensitiveWords::default()),
        )
        .unwrap()
        .segment("痴●電車の午後", &actors);
        assert_eq!(seg.candidates, vec!["痴●電車の午後", "痴漢電車の午後"]);
    }

    #[test]
    fn test_joiner_of_patterns() {
        assert_eq!(joiner_of(r"[\s　]+"), " ");
        assert_eq!(joiner_of("！+"), "！");
        assert_eq!(joiner_of("…+"), "…");
    }
}
