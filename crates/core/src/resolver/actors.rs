//! Actor name normalization.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::text::dedup_preserving_order;

/// `NAME（ALIAS）` or `NAME(ALIAS)`.
static ALIAS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)[（(](.+?)[）)]").expect("valid alias pattern"));

/// Split `NAME(ALIAS)` entries into both names, trimmed and upper-cased.
/// Empty names are dropped and the result is deduplicated.
pub fn split_aliases<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut out = Vec::new();
    for name in names {
        let name = name.as_ref().trim();
        if name.is_empty() {
            continue;
        }
        match ALIAS_PATTERN.captures(name) {
            Some(caps) => {
                for part in [&caps[1], &caps[2]] {
                    let part = part.trim();
                    if !part.is_empty() {
                        out.push(part.to_uppercase());
                    }
                }
            }
            None => out.push(name.to_uppercase()),
        }
    }
    dedup_preserving_order(out)
}

/// Normalized actors of a source record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorList {
    /// Upper-cased, alias-split, deduplicated names.
    pub actors: Vec<String>,
    /// The actor most likely to appear in listing titles, or empty.
    pub best_match: String,
}

impl ActorList {
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn best(&self) -> Option<&str> {
        (!self.best_match.is_empty()).then_some(self.best_match.as_str())
    }
}

/// Build the [`ActorList`] for a title.
///
/// The optional `hint` (the actor printed in the source title) is tried
/// first. The first actor that appears in the title itself becomes the best
/// match.
pub fn normalize_actors<S: AsRef<str>>(title: &str, raw: &[S], hint: Option<&str>) -> ActorList {
    let mut actors = match hint {
        Some(h) => split_aliases(&[h]),
        None => Vec::new(),
    };
    actors.extend(split_aliases(raw));
    let mut actors = dedup_preserving_order(actors);

    let upper = title.to_uppercase();
    if let Some(pos) = actors.iter().position(|a| upper.contains(a.as_str())) {
        let found = actors.remove(pos);
        actors.insert(0, found);
    }

    let best_match = actors.first().cloned().unwrap_or_default();
    ActorList { actors, best_match }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_aliases() {
        assert_eq!(split_aliases(&["A(B)", "C"]), vec!["A", "B", "C"]);
        assert_eq!(split_aliases(&["花子（はなこ）"]), vec!["花子", "はなこ"]);
        assert_eq!(split_aliases(&[" abc ", "", "ABC"]), vec!["ABC"]);
    }

    #[test]
    fn test_normalize_moves_title_actor_first() {
        let list = normalize_actors("夏の日 桃子", &["花子", "桃子"], None);
        assert_eq!(list.actors, vec!["桃子", "花子"]);
        assert_eq!(list.best(), Some("桃子"));
    }

    #[test]
    fn test_normalize_without_title_actor() {
        let list = normalize_actors("", &["A(B)", "C"], None);
        assert_eq!(list.actors, vec!["A", "B", "C"]);
        assert_eq!(list.best_match, "A");
    }

    #[test]
    fn test_normalize_hint_comes_first() {
        let list = normalize_actors("無関係", &["花子", "桃子"], Some("桃子"));
        assert_eq!(list.actors, vec!["桃子", "花子"]);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_actors("夏の日 桃子", &["花子(はなこ)", "桃子"], None);
        let twice = normalize_actors("夏の日 桃子", &once.actors, None);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_actors() {
        let list = normalize_actors("タイトル", &[] as &[String], None);
        assert!(list.is_empty());
        assert_eq!(list.best(), None);
    }
}
