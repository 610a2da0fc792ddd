use url::Url;

use crate::error::AppError;

/// Query parameters that only carry tracking state.
const TRACKING_PARAMS: &[&str] = &[
    "gclid", "fbclid", "msclkid", "trk", "trkinfo", "trackingid", "refid", "ref", "source",
    "mc_cid", "mc_eid", "_hsenc", "_hsmi",
];

/// Resolve `raw` against `base` (when relative) and strip tracking state:
/// the fragment, `utm_*` parameters and other known tracking keys.
///
/// Example: `"/jobs/42?utm_source=x&page=2#top"` on `https://a.io/` →
/// `"https://a.io/jobs/42?page=2"`
pub fn canonicalize_url(raw: &str, base: Option<&Url>) -> Result<String, AppError> {
    let raw = raw.trim();
    let mut url = match base {
        Some(base) => base.join(raw),
        None => Url::parse(raw),
    }
    .map_err(|e| AppError::ParseError(format!("Invalid URL '{raw}': {e}")))?;

    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    Ok(url.to_string())
}

fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key.as_str())
}

/// Collapse runs of whitespace (including NBSP) into single spaces.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split a free-text location such as `"Berlin, Germany"` into
/// `(city, country)`.
///
/// The first comma-separated part is the city and the last is the country.
/// A single part is taken as the city. Remote markers in parentheses are
/// dropped (`"Kyiv (remote)"` → city `Kyiv`).
pub fn split_location(text: &str) -> (Option<String>, Option<String>) {
    let without_notes: String = {
        let mut out = String::with_capacity(text.len());
        let mut depth = 0usize;
        for c in text.chars() {
            match c {
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                _ if depth == 0 => out.push(c),
                _ => {}
            }
        }
        out
    };

    let parts: Vec<String> = without_notes
        .split([',', '·', '|', ';'])
        .map(normalize_whitespace)
        .filter(|p| !p.is_empty() && !is_non_place(p))
        .collect();

    match parts.as_slice() {
        [] => (None, None),
        [city] => (Some(city.clone()), None),
        [city, .., country] => (Some(city.clone()), Some(country.clone())),
    }
}

fn is_non_place(part: &str) -> bool {
    matches!(
        part.to_lowercase().as_str(),
        "remote" | "hybrid" | "on-site" | "onsite" | "office" | "віддалено" | "удаленно"
            | "worldwide" | "anywhere"
    )
}
