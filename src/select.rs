// src/select.rs
//! Quota-bound selection over scored items.

use std::cmp::Ordering;

use crate::scoring::{ScoredItem, ScoringConfig};

/// Order by score descending, tie-break by `published_at` descending (more
/// recent wins, missing timestamps last), then original input order. The
/// sort is stable, so the final tie-break is free.
///
/// The result length is `min(quota, eligible)` where eligible items are
/// neither rejected nor below the configured minimum score.
pub fn select(
    items: Vec<ScoredItem>,
    cfg: &ScoringConfig,
    quota: Option<usize>,
) -> Vec<ScoredItem> {
    let quota = quota.unwrap_or(cfg.scoring.default_quota);

    let mut eligible: Vec<ScoredItem> = items
        .into_iter()
        .filter(|s| !s.rejected && s.score >= cfg.scoring.min_score)
        .collect();

    eligible.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| match (b.item.published_at, a.item.published_at) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Greater,
                (None, Some(_)) => Ordering::Less,
                (None, None) => Ordering::Equal,
            })
    });

    eligible.truncate(quota);
    eligible
}
