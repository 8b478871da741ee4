// src/scoring.rs
//! Tier-weighted relevance scoring: config types, TOML loading, and the
//! scoring function itself.
//!
//! Scoring is a pure function of `(item, config)` — no I/O, no clock —
//! so identical inputs always rank identically.

use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::ingest::types::NewsItem;

// --- env defaults & names ---
pub const DEFAULT_SCORING_CONFIG_PATH: &str = "config/scoring.toml";
pub const ENV_SCORING_CONFIG_PATH: &str = "SCORING_CONFIG_PATH";

/// Score assigned to excluded items. Exclusion is absolute: no other rule
/// can recover an item once an exclude term matched.
pub const EXCLUDED_SCORE: f64 = -100.0;

/* ----------------------------
Config schema (from TOML)
---------------------------- */

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    pub scoring: ScoringSection,
    pub tiers: Tiers,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub priority_sources: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringSection {
    /// Multiplier for title matches; must be ≥ 1.0.
    pub title_weight: f64,
    pub min_score: f64,
    pub default_quota: usize,
    #[serde(default = "default_source_bonus")]
    pub source_bonus: f64,
    #[serde(default = "default_title_length_bonus")]
    pub title_length_bonus: f64,
    #[serde(default = "default_title_length_min")]
    pub title_length_min: usize,
    #[serde(default = "default_title_length_max")]
    pub title_length_max: usize,
}

fn default_source_bonus() -> f64 {
    12.0
}
fn default_title_length_bonus() -> f64 {
    5.0
}
fn default_title_length_min() -> usize {
    40
}
fn default_title_length_max() -> usize {
    150
}

/// The four keyword tiers, ordered by decreasing priority.
#[derive(Debug, Clone, Deserialize)]
pub struct Tiers {
    pub ultra_high: Tier,
    pub high: Tier,
    pub medium: Tier,
    pub low: Tier,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tier {
    pub value: f64,
    #[serde(default)]
    pub terms: Vec<String>,
}

impl Tiers {
    /// Fixed evaluation order.
    pub fn iter(&self) -> [&Tier; 4] {
        [&self.ultra_high, &self.high, &self.medium, &self.low]
    }
}

impl ScoringConfig {
    /// Load from the configured path. Uses SCORING_CONFIG_PATH or defaults
    /// to "config/scoring.toml". A load failure is fatal to the caller:
    /// ranking without config is meaningless.
    pub fn from_toml() -> Result<Self> {
        let path = std::env::var(ENV_SCORING_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SCORING_CONFIG_PATH));
        let content = fs::read_to_string(&path)
            .with_context(|| format!("reading scoring config at {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let mut cfg: ScoringConfig =
            toml::from_str(toml_str).context("parsing scoring config")?;
        if !cfg.scoring.title_weight.is_finite() || cfg.scoring.title_weight < 1.0 {
            cfg.scoring.title_weight = 1.0;
        }
        Ok(cfg)
    }
}

/* ----------------------------
Scoring
---------------------------- */

/// A `NewsItem` with its computed relevance. Created here, consumed by the
/// selector, never mutated afterward.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ScoredItem {
    #[serde(flatten)]
    pub item: NewsItem,
    pub score: f64,
    pub rejected: bool,
}

/// Score one item against the config.
///
/// Rules, in fixed order: exclusion sentinel, keyword tiers (a term in the
/// title contributes `value × title_weight` *instead of* the flat summary
/// value — never both for the same term), priority-source bonus, and a small
/// well-formed-title-length bonus. No clamping beyond the sentinel.
pub fn score(item: NewsItem, cfg: &ScoringConfig) -> ScoredItem {
    let title = item.title.to_lowercase();
    let summary = item.summary.to_lowercase();
    let full_text = format!("{title} {summary}");

    for term in &cfg.exclude {
        if full_text.contains(&term.to_lowercase()) {
            return ScoredItem {
                item,
                score: EXCLUDED_SCORE,
                rejected: true,
            };
        }
    }

    let mut total = 0.0;
    for tier in cfg.tiers.iter() {
        for term in &tier.terms {
            let term = term.to_lowercase();
            if title.contains(&term) {
                total += tier.value * cfg.scoring.title_weight;
            } else if summary.contains(&term) {
                total += tier.value;
            }
        }
    }

    if cfg.priority_sources.iter().any(|s| s == &item.source) {
        total += cfg.scoring.source_bonus;
    }

    let title_len = item.title.chars().count();
    if (cfg.scoring.title_length_min..=cfg.scoring.title_length_max).contains(&title_len) {
        total += cfg.scoring.title_length_bonus;
    }

    ScoredItem {
        item,
        score: total,
        rejected: false,
    }
}
