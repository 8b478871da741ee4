// src/freshness.rs
//! Freshness filter. Fail-open: an item without a parseable timestamp is
//! accepted — its freshness cannot be asserted, and over-filtering costs
//! more than occasionally admitting a stale item the scorer and selector
//! will handle anyway.

use chrono::{DateTime, Duration, Utc};

use crate::ingest::types::NewsItem;

/// Cutoff instant for a horizon of `max_age_hours` before `now`.
pub fn cutoff_for(now: DateTime<Utc>, max_age_hours: i64) -> DateTime<Utc> {
    now - Duration::hours(max_age_hours)
}

/// True when the item is at or after the cutoff, or carries no timestamp.
pub fn is_fresh(item: &NewsItem, cutoff: DateTime<Utc>) -> bool {
    match item.published_at {
        Some(published_at) => published_at >= cutoff,
        None => true,
    }
}
