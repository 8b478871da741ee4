// src/ingest/normalize.rs
//! Canonicalizes raw adapter records into `NewsItem`s.
//!
//! Pure transforms only: no I/O, no clock beyond stamping `collected_at`.
//! An item that fails validation (empty title) is dropped by returning
//! `None` — the caller counts it, nothing raises.

use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::ingest::types::{NewsItem, RawRecord};

/// Summary length cap after cleanup.
const MAX_SUMMARY_CHARS: usize = 1500;

/// Normalize text: decode entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out = out.trim().to_string();

    // 5) Length cap
    if out.chars().count() > MAX_SUMMARY_CHARS {
        out = out.chars().take(MAX_SUMMARY_CHARS).collect();
    }

    out
}

/// Parse a source-supplied timestamp into UTC.
///
/// Accepts RFC 3339, RFC 2822 and the common naive shapes; naive values are
/// interpreted as UTC at this boundary so the rest of the pipeline only ever
/// compares `DateTime<Utc>` against `DateTime<Utc>`. Anything unparseable
/// yields `None` and the freshness filter fail-opens on it.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// Keep a link only when it parses as an absolute URL; a relative or
/// malformed link degrades to "absent" rather than failing the item.
fn normalize_link(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    match url::Url::parse(trimmed) {
        Ok(_) => trimmed.to_string(),
        Err(_) => String::new(),
    }
}

/// Canonicalize one raw record under the given adapter tag.
///
/// Returns `None` when the record has no usable title.
pub fn normalize_record(raw: RawRecord, source_id: &str, now: DateTime<Utc>) -> Option<NewsItem> {
    let title = normalize_text(&raw.title);
    if title.is_empty() {
        return None;
    }
    let summary = normalize_text(&raw.summary);
    let published_at = raw.published.as_deref().and_then(parse_published);

    Some(NewsItem {
        title,
        link: normalize_link(&raw.link),
        summary,
        published_at,
        collected_at: now,
        source: raw.source,
        source_id: source_id.to_string(),
        engagement: raw.engagement,
        extra: raw.extra,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(title: &str, link: &str) -> RawRecord {
        RawRecord {
            title: title.to_string(),
            link: link.to_string(),
            summary: "  some <b>summary</b>  ".to_string(),
            published: None,
            source: "Test".to_string(),
            engagement: None,
            extra: serde_json::Value::Null,
        }
    }

    #[test]
    fn normalize_text_collapses_ws_and_strips_tags() {
        let s = "  Hello,&nbsp;&nbsp; <b>world</b>  ";
        assert_eq!(normalize_text(s), "Hello, world");
    }

    #[test]
    fn empty_title_is_dropped() {
        let now = Utc::now();
        assert!(normalize_record(raw("   ", "https://x.test/a"), "t", now).is_none());
        assert!(normalize_record(raw("<p></p>", ""), "t", now).is_none());
    }

    #[test]
    fn relative_link_degrades_to_absent() {
        let now = Utc::now();
        let item = normalize_record(raw("A title", "/relative/path"), "t", now).unwrap();
        assert!(item.link.is_empty());
        assert_eq!(item.summary, "some summary");
    }

    #[test]
    fn parse_published_accepts_common_shapes() {
        assert!(parse_published("2025-06-01T10:00:00Z").is_some());
        assert!(parse_published("2025-06-01T10:00:00+02:00").is_some());
        assert!(parse_published("Sun, 01 Jun 2025 10:00:00 GMT").is_some());
        assert!(parse_published("2025-06-01 10:00:00").is_some());
        assert!(parse_published("yesterday-ish").is_none());
        assert!(parse_published("").is_none());
    }

    #[test]
    fn naive_timestamps_land_in_utc() {
        let a = parse_published("2025-06-01T10:00:00").unwrap();
        let b = parse_published("2025-06-01T10:00:00Z").unwrap();
        assert_eq!(a, b);
    }
}
