//! Character-level helpers shared by the segmenter, normalizer and comparator.
//!
//! All lengths are counted in `char`s, never bytes: titles are mostly CJK.

/// Number of characters in `s`.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// The first `n` characters of `s` (all of `s` if shorter).
pub fn char_prefix(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Convert full-width ASCII variants and the ideographic space to half-width.
pub fn to_half_width(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{3000}' => ' ',
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            _ => c,
        })
        .collect()
}

/// Comparison form: half-width, alphanumerics only, upper-case.
pub fn compact(s: &str) -> String {
    to_half_width(s)
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Characters allowed to end a title once a trailing actor is cut off.
fn is_title_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c,
            '\u{4E00}'..='\u{9FFF}'   // CJK ideographs
            | '\u{3040}'..='\u{309F}' // hiragana
            | '\u{30A0}'..='\u{30FF}' // katakana
            | '●' | '○')
}

/// Case-insensitive `ends_with`, returning the byte index where the suffix starts.
fn suffix_start(title: &str, suffix: &str) -> Option<usize> {
    let n = char_len(suffix);
    let (start, _) = title.char_indices().rev().nth(n.checked_sub(1)?)?;
    let tail = &title[start..];
    let same = tail
        .chars()
        .flat_map(char::to_uppercase)
        .eq(suffix.chars().flat_map(char::to_uppercase));
    same.then_some(start)
}

/// Remove every actor name at the end of `title`, repeatedly, together with
/// the punctuation that joined them. Names in the middle are kept.
pub fn strip_trailing_actors(title: &str, actors: &[String]) -> String {
    let mut title = title.to_string();
    loop {
        let cut = actors
            .iter()
            .filter(|a| !a.is_empty())
            .find_map(|a| suffix_start(&title, a));
        let Some(start) = cut else {
            break;
        };
        title.truncate(start);
        let keep = title.trim_end_matches(|c: char| !is_title_char(c)).len();
        title.truncate(keep);
    }
    title
}

/// Order-preserving dedup.
pub fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actors(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_char_prefix() {
        assert_eq!(char_prefix("名前花子", 2), "名前");
        assert_eq!(char_prefix("名前", 5), "名前");
        assert_eq!(char_prefix("abc", 0), "");
    }

    #[test]
    fn test_to_half_width() {
        assert_eq!(to_half_width("ＡＢＣ１２３！"), "ABC123!");
        assert_eq!(to_half_width("a\u{3000}b"), "a b");
        assert_eq!(to_half_width("名前"), "名前");
    }

    #[test]
    fn test_compact() {
        assert_eq!(compact("名前 花子 Special!"), "名前花子SPECIAL");
        assert_eq!(compact("ＢＥＳＴ・セレクション"), "BESTセレクション");
        assert_eq!(compact("a_b-c"), "ABC");
    }

    #[test]
    fn test_strip_trailing_actor() {
        assert_eq!(
            strip_trailing_actors("美しい日々 花子", &actors(&["花子"])),
            "美しい日々"
        );
    }

    #[test]
    fn test_strip_repeated_trailing_actors() {
        assert_eq!(
            strip_trailing_actors("美しい日々 花子 桃子", &actors(&["花子", "桃子"])),
            "美しい日々"
        );
    }

    #[test]
    fn test_strip_keeps_mid_title_actor() {
        assert_eq!(
            strip_trailing_actors("花子の美しい日々", &actors(&["花子"])),
            "花子の美しい日々"
        );
    }

    #[test]
    fn test_strip_is_case_insensitive() {
        assert_eq!(
            strip_trailing_actors("Summer Days Yua Mikami", &actors(&["YUA MIKAMI"])),
            "Summer Days"
        );
    }

    #[test]
    fn test_strip_with_no_actors() {
        assert_eq!(strip_trailing_actors("タイトル", &[]), "タイトル");
        assert_eq!(strip_trailing_actors("タイトル", &actors(&[""])), "タイトル");
    }

    #[test]
    fn test_dedup_preserving_order() {
        let items = actors(&["b", "a", "b", "c", "a"]);
        assert_eq!(dedup_preserving_order(items), actors(&["b", "a", "c"]));
    }
}
