// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Loose record as produced by a source adapter, before normalization.
/// Field shapes differ wildly between adapters; this is the common envelope
/// they all map into at their own boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub summary: String,
    /// Timestamp as supplied by the source, unparsed.
    #[serde(default)]
    pub published: Option<String>,
    /// Human label, e.g. "Hacker News".
    pub source: String,
    #[serde(default)]
    pub engagement: Option<Engagement>,
    /// Opaque per-source metadata, carried through untouched.
    #[serde(default)]
    pub extra: serde_json::Value,
}

/// Optional numeric signals a source may attach.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub comments: Option<i64>,
    #[serde(default)]
    pub reactions: Option<i64>,
}

/// Canonical item flowing through the pipeline. `title` is guaranteed
/// non-empty; an empty `link` means "absent".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub summary: String,
    pub published_at: Option<DateTime<Utc>>,
    pub collected_at: DateTime<Utc>,
    pub source: String,
    /// Adapter tag, e.g. "hackernews".
    pub source_id: String,
    #[serde(default)]
    pub engagement: Option<Engagement>,
    #[serde(default)]
    pub extra: serde_json::Value,
}

#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn collect(&self) -> Result<Vec<RawRecord>>;
    fn name(&self) -> &'static str;
}
