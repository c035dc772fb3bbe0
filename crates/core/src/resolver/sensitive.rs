//! Masked-token handling.
//!
//! Some sources publish titles with masked tokens (`強●`), others spell them
//! out (`強制`). For searching, a title is expanded into its masked and
//! unmasked spellings; for comparing, both spellings are collapsed onto a
//! common stem with the masked character removed.

use std::collections::BTreeMap;

use super::config::SensitiveWords;

/// Upper bound on generated spellings for one title.
const MAX_VARIANTS: usize = 16;

const MASK: char = '●';
const ALT_MASK: char = '○';

#[derive(Debug, Clone)]
struct Pattern {
    /// Pattern text with `○` normalized to `●`.
    chars: Vec<char>,
    masked: bool,
    /// Spellings this pattern can be swapped for.
    counterparts: Vec<String>,
    /// Common comparison stem.
    stem: String,
}

enum Segment<'a> {
    Text(String),
    Token(&'a Pattern),
}

/// Compiled masked-token table.
#[derive(Debug, Clone, Default)]
pub struct SensitiveTable {
    /// Sorted longest first so longer patterns win.
    patterns: Vec<Pattern>,
}

fn normalize_mask(s: &str) -> String {
    s.replace(ALT_MASK, &MASK.to_string())
}

/// `word` without the character at the mask position of `masked`.
fn stem_of(masked: &str, word: &str) -> String {
    let Some(index) = masked.chars().position(|c| c == MASK) else {
        return word.to_string();
    };
    word.chars()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, c)| c)
        .collect()
}

impl SensitiveTable {
    pub fn new(words: &SensitiveWords) -> Self {
        let mut builders: BTreeMap<String, Pattern> = BTreeMap::new();

        for (masked_raw, unmasked) in &words.0 {
            let masked = normalize_mask(masked_raw);
            let Some(first) = unmasked.first() else {
                continue;
            };

            let entry = builders.entry(masked.clone()).or_insert_with(|| Pattern {
                chars: masked.chars().collect(),
                masked: true,
                counterparts: Vec::new(),
                stem: stem_of(&masked, first),
            });
            for word in unmasked {
                if !entry.counterparts.contains(word) {
                    entry.counterparts.push(word.clone());
                }
            }

            for word in unmasked {
                let entry = builders.entry(word.clone()).or_insert_with(|| Pattern {
                    chars: word.chars().collect(),
                    masked: false,
                    counterparts: Vec::new(),
                    stem: stem_of(&masked, word),
                });
                if !entry.counterparts.contains(masked_raw) {
                    entry.counterparts.push(masked_raw.clone());
                }
            }
        }

        let mut patterns: Vec<Pattern> = builders
            .into_values()
            .filter(|p| !p.chars.is_empty())
            .collect();
        patterns.sort_by(|a, b| b.chars.len().cmp(&a.chars.len()));
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    fn tokenize(&self, s: &str) -> Vec<Segment<'_>> {
        let original: Vec<char> = s.chars().collect();
        let normalized: Vec<char> = original
            .iter()
            .map(|&c| if c == ALT_MASK { MASK } else { c })
            .collect();

        let mut segments = Vec::new();
        let mut text = String::new();
        let mut i = 0;
        while i < original.len() {
            let hit = self
                .patterns
                .iter()
                .find(|p| normalized[i..].starts_with(&p.chars));
            match hit {
                Some(pattern) => {
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    segments.push(Segment::Token(pattern));
                    i += pattern.chars.len();
                }
                None => {
                    text.push(original[i]);
                    i += 1;
                }
            }
        }
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }
        segments
    }

    /// Alternate spellings of `s`, unmasked ones first. Empty if `s`
    /// contains no known token.
    ///
    /// Every occurrence of the same token takes the same replacement. When a
    /// title mixes masked and unmasked tokens, unmasked tokens may also stay
    /// as they are.
    pub fn expand(&self, s: &str) -> Vec<String> {
        if self.is_empty() {
            return Vec::new();
        }
        let segments = self.tokenize(s);

        let mut distinct: Vec<&Pattern> = Vec::new();
        for segment in &segments {
            if let Segment::Token(p) = segment {
                if !distinct.iter().any(|d| std::ptr::eq(*d, *p)) {
                    distinct.push(*p);
                }
            }
        }
        if distinct.is_empty() {
            return Vec::new();
        }

        let mixed = distinct.iter().any(|p| p.masked) && distinct.iter().any(|p| !p.masked);
        let options: Vec<Vec<String>> = distinct
            .iter()
            .map(|p| {
                let mut opts = p.counterparts.clone();
                if mixed && !p.masked {
                    let own: String = p.chars.iter().collect();
                    if !opts.contains(&own) {
                        opts.push(own);
                    }
                }
                opts
            })
            .collect();
        if options.iter().any(|o| o.is_empty()) {
            return Vec::new();
        }

        let mut variants = Vec::new();
        let mut choice = vec![0usize; distinct.len()];
        loop {
            let mut out = String::new();
            for segment in &segments {
                match segment {
                    Segment::Text(t) => out.push_str(t),
                    Segment::Token(p) => {
                        let slot = distinct
                            .iter()
                            .position(|d| std::ptr::eq(*d, *p))
                            .unwrap_or(0);
                        out.push_str(&options[slot][choice[slot]]);
                    }
                }
            }
            if !variants.contains(&out) {
                variants.push(out);
            }
            if variants.len() >= MAX_VARIANTS {
                break;
            }

            // Advance the odometer
            let mut slot = 0;
            while slot < choice.len() {
                choice[slot] += 1;
                if choice[slot] < options[slot].len() {
                    break;
                }
                choice[slot] = 0;
                slot += 1;
            }
            if slot == choice.len() {
                break;
            }
        }

        variants.sort_by_key(|v| v.contains(MASK) || v.contains(ALT_MASK));
        variants
    }

    /// Replace every masked or unmasked token by its stem.
    pub fn collapse(&self, s: &str) -> String {
        if self.is_empty() {
            return s.to_string();
        }
        self.tokenize(s)
            .into_iter()
            .map(|segment| match segment {
                Segment::Text(t) => t,
                Segment::Token(p) => p.stem.clone(),
            })
            .collect()
    }
}
