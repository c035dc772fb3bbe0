//! URL helpers for the secondary source.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::SearchRequest;

/// Thumbnail size suffix, e.g. `._AC_UL320_.` in `81abc._AC_UL320_.jpg`.
static THUMBNAIL_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\._{1,2}AC_[^.]+\.").expect("valid thumbnail suffix pattern"));

/// Build a search URL for `request` under `base`.
///
/// Words are joined with `+` before encoding, the category filter is
/// appended as a separate parameter.
pub fn build_search_url(base: &str, request: &SearchRequest) -> String {
    let words = request.query.split_whitespace().collect::<Vec<_>>().join("+");
    format!(
        "{}?k={}&i={}",
        base.trim_end_matches('?'),
        urlencoding::encode(&words),
        urlencoding::encode(&request.category)
    )
}

/// Strip the thumbnail size suffix so the URL addresses the full-size image.
pub fn upscale_image_url(url: &str) -> String {
    THUMBNAIL_SUFFIX.replace_all(url, ".").into_owned()
}

/// Extract the decoded title slug from a detail URL of the form
/// `.../<slug>/dp/<id>`.
pub fn detail_slug(detail_url: &str) -> Option<String> {
    let end = detail_url.rfind("/dp/")?;
    let head = &detail_url[..end];
    let slug = &head[head.rfind('/')? + 1..];
    if slug.is_empty() {
        return None;
    }
    let plus_decoded = slug.replace('+', " ");
    let decoded = urlencoding::decode(&plus_decoded)
        .map(|s| s.into_owned())
        .unwrap_or(plus_decoded);
    Some(decoded)
}
