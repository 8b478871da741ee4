// src/orchestrator.rs
//! Drives one full collect→dedupe→filter→score→select→persist pass, and
//! repeats it on a timer in continuous mode.
//!
//! The orchestrator owns the only state that crosses cycle boundaries: the
//! persisted `SeenSet` and the capped output history. Everything after the
//! COLLECTING phase runs on the orchestrator's own task, so the seen-set
//! needs no locking — adapter tasks never touch it.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use metrics::{counter, gauge};
use serde::Serialize;
use tokio::sync::watch;

use crate::dedup::SeenSet;
use crate::freshness::{cutoff_for, is_fresh};
use crate::ingest::types::{NewsItem, SourceProvider};
use crate::ingest::{collect_all, CollectOptions};
use crate::scoring::{score, ScoredItem, ScoringConfig};
use crate::select::select;
use crate::storage::OutputStore;

/// Phases of one cycle, logged as structured fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    Collecting,
    Deduping,
    Filtering,
    Scoring,
    Selecting,
    Persisting,
}

/// Per-cycle counters. Reported, never persisted.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CycleStats {
    /// Raw records returned by adapters before any filtering.
    pub total: usize,
    pub malformed: usize,
    pub duplicates: usize,
    pub too_old: usize,
    pub scored: usize,
    pub selected: usize,
    pub adapter_failures: usize,
}

/// What one cycle produced. `persisted` is false when a write failed; the
/// in-memory results are still valid for the caller (degraded duplication
/// on the next cycle, not data loss).
#[derive(Debug)]
pub struct CycleOutcome {
    pub selected: Vec<ScoredItem>,
    pub stats: CycleStats,
    pub persisted: bool,
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Freshness horizon in hours.
    pub max_age_hours: i64,
    /// Per-invocation quota override; falls back to the scoring config.
    pub quota: Option<usize>,
    pub collect: CollectOptions,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_age_hours: 4,
            quota: None,
            collect: CollectOptions::default(),
        }
    }
}

pub struct Orchestrator {
    providers: Vec<Arc<dyn SourceProvider>>,
    seen: SeenSet,
    store: OutputStore,
    cfg: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        providers: Vec<Arc<dyn SourceProvider>>,
        seen: SeenSet,
        store: OutputStore,
        cfg: OrchestratorConfig,
    ) -> Self {
        Self {
            providers,
            seen,
            store,
            cfg,
        }
    }

    /// Run one full cycle.
    ///
    /// The only fatal error is a scoring-config load failure; adapter
    /// failures, malformed items and persistence failures all degrade and
    /// are reflected in the outcome instead.
    pub async fn run_cycle(&mut self, stop: watch::Receiver<bool>) -> Result<CycleOutcome> {
        // Ranking without config is meaningless, so this one propagates.
        let scoring_cfg = ScoringConfig::from_toml()?;
        self.run_cycle_with_config(&scoring_cfg, stop).await
    }

    /// Same as `run_cycle` but with an externally supplied config (tests,
    /// callers that manage config themselves).
    pub async fn run_cycle_with_config(
        &mut self,
        scoring_cfg: &ScoringConfig,
        stop: watch::Receiver<bool>,
    ) -> Result<CycleOutcome> {
        let mut stats = CycleStats::default();

        tracing::debug!(phase = ?CyclePhase::Collecting, adapters = self.providers.len(), "cycle start");
        let collected = collect_all(&self.providers, self.cfg.collect, stop).await;
        stats.adapter_failures = collected.adapter_failures;
        stats.malformed = collected.malformed;
        stats.total = collected.items.len() + collected.malformed;

        tracing::debug!(phase = ?CyclePhase::Deduping, items = collected.items.len(), "collected");
        let now = Utc::now();
        let cutoff = cutoff_for(now, self.cfg.max_age_hours);
        let mut accepted: Vec<NewsItem> = Vec::with_capacity(collected.items.len());
        for item in collected.items {
            if self.seen.is_duplicate(&item) {
                stats.duplicates += 1;
                continue;
            }
            // Filtering folds into the same pass; an item must clear both
            // gates before it is marked seen.
            if !is_fresh(&item, cutoff) {
                stats.too_old += 1;
                continue;
            }
            self.seen.mark_seen(&item);
            accepted.push(item);
        }
        counter!("cycle_duplicates_total").increment(stats.duplicates as u64);
        counter!("cycle_too_old_total").increment(stats.too_old as u64);

        tracing::debug!(phase = ?CyclePhase::Scoring, accepted = accepted.len(), "filtered");
        let scored: Vec<ScoredItem> = accepted
            .iter()
            .cloned()
            .map(|item| score(item, scoring_cfg))
            .collect();
        stats.scored = scored.len();

        tracing::debug!(phase = ?CyclePhase::Selecting, "scored");
        let selected = select(scored, scoring_cfg, self.cfg.quota);
        stats.selected = selected.len();
        counter!("cycle_selected_total").increment(stats.selected as u64);

        tracing::debug!(phase = ?CyclePhase::Persisting, selected = stats.selected, "selected");
        let mut persisted = true;
        if let Err(e) = self.store.write_selected(&selected) {
            tracing::error!(error = ?e, "failed to persist selection");
            persisted = false;
        }
        if let Err(e) = self.store.append_history(&accepted) {
            tracing::error!(error = ?e, "failed to persist history");
            persisted = false;
        }
        if let Err(e) = self.seen.flush() {
            tracing::error!(error = ?e, "failed to flush seen-set");
            persisted = false;
        }

        gauge!("cycle_last_run_ts").set(now.timestamp().max(0) as f64);
        tracing::info!(
            phase = ?CyclePhase::Idle,
            total = stats.total,
            duplicates = stats.duplicates,
            too_old = stats.too_old,
            selected = stats.selected,
            adapter_failures = stats.adapter_failures,
            seen = self.seen.len(),
            "cycle complete"
        );

        Ok(CycleOutcome {
            selected,
            stats,
            persisted,
        })
    }

    /// Run cycles on a fixed wall-clock interval until the optional
    /// duration elapses or the stop signal fires. A stop received mid-cycle
    /// lets the in-flight cycle finish its persistence before returning.
    pub async fn run_continuous(
        &mut self,
        interval: Duration,
        duration: Option<Duration>,
        mut stop: watch::Receiver<bool>,
    ) -> Result<()> {
        let started = tokio::time::Instant::now();
        let deadline = duration.map(|d| started + d);
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut iteration = 0u64;
        // Closed stop channel means nobody can stop us; stop polling it.
        let mut stop_open = true;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // A tick can land past the deadline when the interval is
                    // longer than the remaining duration; never start a cycle
                    // the duration does not cover.
                    if deadline.is_some_and(|dl| tokio::time::Instant::now() >= dl) {
                        tracing::info!(iteration, "configured duration elapsed");
                        break;
                    }
                    iteration += 1;
                    tracing::info!(iteration, "continuous cycle starting");
                    let outcome = self.run_cycle(stop.clone()).await?;
                    tracing::info!(
                        iteration,
                        selected = outcome.stats.selected,
                        persisted = outcome.persisted,
                        "continuous cycle finished"
                    );
                    if *stop.borrow() {
                        break;
                    }
                }
                // Exit as soon as the duration elapses instead of waiting
                // out the next tick. The branch is disabled when no duration
                // was given, so the fallback instant is never slept on.
                _ = tokio::time::sleep_until(deadline.unwrap_or(started)), if deadline.is_some() => {
                    tracing::info!(iteration, "configured duration elapsed");
                    break;
                }
                changed = stop.changed(), if stop_open => {
                    match changed {
                        Ok(()) if *stop.borrow() => break,
                        Ok(()) => {}
                        Err(_) => stop_open = false,
                    }
                }
            }
        }

        tracing::info!(iteration, seen = self.seen.len(), "continuous mode stopped");
        Ok(())
    }

    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }
}
