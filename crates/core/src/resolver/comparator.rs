//! Tiered title matching.
//!
//! All three inputs are compare titles (see [`super::compare`]). `unsplit` is
//! the compare form of the primary candidate; when `compare` equals it the
//! query was not produced by segmentation and a single check applies.
//! Otherwise the listing is first validated against the whole title, then
//! the fragment against the listing.

use super::config::MatchThresholds;
use super::text::{char_len, char_prefix};

pub fn titles_match(
    compare: &str,
    listing: &str,
    unsplit: &str,
    thresholds: &MatchThresholds,
) -> bool {
    if compare.is_empty() || listing.is_empty() {
        return false;
    }

    let len_compare = char_len(compare);
    let len_listing = char_len(listing);
    let (short, long) = if len_compare < len_listing {
        (compare, listing)
    } else {
        (listing, compare)
    };
    let len_short = char_len(short);

    if compare == unsplit {
        return whole_title_matches(compare, listing, short, long, len_short, thresholds);
    }

    listing_agrees_with_unsplit(listing, unsplit, thresholds)
        && fragment_agrees_with_listing(compare, listing, short, long, len_short, thresholds)
}

fn whole_title_matches(
    compare: &str,
    listing: &str,
    short: &str,
    long: &str,
    len_short: usize,
    t: &MatchThresholds,
) -> bool {
    let len_compare = char_len(compare);
    if char_len(listing) > len_compare * t.length_diff_ratio {
        return false;
    }

    if len_compare <= t.min_match_length {
        return long.contains(short) && listing.starts_with(short);
    }
    if len_compare <= t.mid_title_length {
        let needed = t.min_match_length.min(len_short);
        return compare.contains(char_prefix(listing, needed));
    }
    let needed = ((len_compare as f64 * t.no_split_match_ratio).floor() as usize).min(len_short);
    compare.contains(char_prefix(listing, needed))
}

fn listing_agrees_with_unsplit(listing: &str, unsplit: &str, t: &MatchThresholds) -> bool {
    let len_listing = char_len(listing);
    let len_unsplit = char_len(unsplit);

    let head = if len_listing <= t.min_match_length {
        unsplit.contains(listing)
    } else {
        unsplit.contains(char_prefix(listing, t.min_match_length))
    };
    if !head {
        return false;
    }

    if len_unsplit > t.long_title_length {
        let shorter = len_unsplit.min(len_listing);
        let longer = len_unsplit.max(len_listing);
        if (shorter as f64) / (longer as f64) < t.length_ratio {
            return false;
        }
        let needed = (shorter as f64 * t.golden_ratio).floor() as usize;
        return unsplit.contains(char_prefix(listing, needed));
    }
    true
}

fn fragment_agrees_with_listing(
    compare: &str,
    listing: &str,
    short: &str,
    long: &str,
    len_short: usize,
    t: &MatchThresholds,
) -> bool {
    let len_compare = char_len(compare);
    let short_fragment = (1.5 * t.min_match_length as f64).ceil() as usize;
    if len_compare <= short_fragment {
        return long.contains(short) && compare.starts_with(short);
    }
    let needed = ((len_compare as f64 * t.split_match_ratio).ceil() as usize).min(len_short);
    listing.contains(char_prefix(compare, needed))
}
