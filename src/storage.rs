// src/storage.rs
//! Persisted cycle outputs: the latest selection and a capped rolling
//! history of accepted items. Both are JSON arrays written atomically.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::dedup::write_atomic;
use crate::ingest::types::NewsItem;
use crate::scoring::ScoredItem;

pub const DEFAULT_SELECTED_PATH: &str = "data/selected.json";
pub const DEFAULT_HISTORY_PATH: &str = "data/history.json";
pub const DEFAULT_HISTORY_CAP: usize = 200;

#[derive(Debug, Clone)]
pub struct OutputStore {
    selected_path: PathBuf,
    history_path: PathBuf,
    history_cap: usize,
}

impl Default for OutputStore {
    fn default() -> Self {
        Self::new(DEFAULT_SELECTED_PATH, DEFAULT_HISTORY_PATH, DEFAULT_HISTORY_CAP)
    }
}

impl OutputStore {
    pub fn new(
        selected_path: impl Into<PathBuf>,
        history_path: impl Into<PathBuf>,
        history_cap: usize,
    ) -> Self {
        Self {
            selected_path: selected_path.into(),
            history_path: history_path.into(),
            history_cap,
        }
    }

    /// Replace the selection artifact wholesale with this cycle's output.
    pub fn write_selected(&self, items: &[ScoredItem]) -> Result<()> {
        ensure_parent(&self.selected_path)?;
        let body = serde_json::to_vec_pretty(items).context("serializing selection")?;
        write_atomic(&self.selected_path, &body)
            .with_context(|| format!("writing {}", self.selected_path.display()))
    }

    pub fn load_selected(&self) -> Result<Vec<ScoredItem>> {
        let content = fs::read_to_string(&self.selected_path)
            .with_context(|| format!("reading {}", self.selected_path.display()))?;
        serde_json::from_str(&content).context("parsing selection artifact")
    }

    /// Append accepted items to the rolling history, keeping only the most
    /// recent `history_cap` entries (ring-buffer semantics; oldest dropped).
    /// An unreadable existing artifact starts the history over rather than
    /// failing the cycle.
    pub fn append_history(&self, items: &[NewsItem]) -> Result<()> {
        ensure_parent(&self.history_path)?;
        let mut history: Vec<NewsItem> = match fs::read_to_string(&self.history_path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(
                    path = %self.history_path.display(),
                    error = %e,
                    "history artifact unreadable, starting over"
                );
                Vec::new()
            }),
            Err(_) => Vec::new(),
        };
        history.extend_from_slice(items);
        if history.len() > self.history_cap {
            let excess = history.len() - self.history_cap;
            history.drain(0..excess);
        }
        let body = serde_json::to_vec_pretty(&history).context("serializing history")?;
        write_atomic(&self.history_path, &body)
            .with_context(|| format!("writing {}", self.history_path.display()))
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    Ok(())
}
