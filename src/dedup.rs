// src/dedup.rs
//! Cross-run deduplication over a persisted fingerprint set.
//!
//! Every accepted item contributes two fingerprints: a canonicalized URL
//! (when a link is present) and a hash of its lowercased title. Title
//! hashing catches the same story arriving with tracking-parameter-mutated
//! URLs from different sources; URL hashing catches a single source
//! republishing under a reworded title.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

use crate::ingest::types::NewsItem;

/// Canonicalize a URL for fingerprinting: lowercase scheme/host (the parser
/// does this), strip query string and fragment. Returns `None` for relative
/// or malformed links — those are treated as "no URL" rather than an error.
pub fn canonical_url(link: &str) -> Option<String> {
    let trimmed = link.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut url = url::Url::parse(trimmed).ok()?;
    url.set_query(None);
    url.set_fragment(None);
    Some(url.to_string())
}

/// Hash of the lowercased, trimmed title. `min_len` skips fingerprinting
/// very short titles, where hash collisions between unrelated stories are
/// more likely than genuine duplicates.
pub fn title_fingerprint(title: &str, min_len: usize) -> Option<String> {
    let normalized = title.trim().to_lowercase();
    if normalized.is_empty() || normalized.chars().count() < min_len {
        return None;
    }
    let digest = Sha256::digest(normalized.as_bytes());
    let mut out = String::with_capacity(32);
    for b in digest.iter().take(16) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    Some(format!("t:{out}"))
}

/// Persisted set of fingerprints ever accepted. Append-only across the
/// process lifetime; owned by the orchestrator, never shared with adapter
/// tasks.
#[derive(Debug)]
pub struct SeenSet {
    path: PathBuf,
    entries: HashSet<String>,
    min_title_len: usize,
}

impl SeenSet {
    /// Load from disk. A missing or unreadable file is non-fatal: the set
    /// starts empty and the condition is logged, accepting transient
    /// re-delivery of already-seen items over stopping collection.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "seen-set not loaded, starting empty"
                );
                HashSet::new()
            }
        };
        Self {
            path,
            entries,
            min_title_len: 0,
        }
    }

    /// Require at least `min_len` title characters before title-hash dedup
    /// applies (URL dedup is unaffected).
    pub fn with_min_title_len(mut self, min_len: usize) -> Self {
        self.min_title_len = min_len;
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// An item is a duplicate if either of its fingerprints is known.
    pub fn is_duplicate(&self, item: &NewsItem) -> bool {
        if let Some(url) = canonical_url(&item.link) {
            if self.entries.contains(&url) {
                return true;
            }
        }
        if let Some(fp) = title_fingerprint(&item.title, self.min_title_len) {
            if self.entries.contains(&fp) {
                return true;
            }
        }
        false
    }

    /// Insert both fingerprints (URL only when a link is present).
    pub fn mark_seen(&mut self, item: &NewsItem) {
        if let Some(url) = canonical_url(&item.link) {
            self.entries.insert(url);
        }
        if let Some(fp) = title_fingerprint(&item.title, self.min_title_len) {
            self.entries.insert(fp);
        }
    }

    /// Write the full set to disk, one fingerprint per line, via a temp
    /// file and rename so a stop mid-flush never leaves partial state.
    pub fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        let mut lines: Vec<&str> = self.entries.iter().map(String::as_str).collect();
        lines.sort_unstable();
        let body = lines.join("\n") + "\n";
        write_atomic(&self.path, body.as_bytes())
            .with_context(|| format!("flushing seen-set to {}", self.path.display()))
    }
}

/// Temp-file-then-rename write used for every persisted artifact.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("renaming into {}", path.display()))?;
    Ok(())
}
