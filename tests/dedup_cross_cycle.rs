// tests/dedup_cross_cycle.rs
// The seen-set is the state that crosses cycle boundaries: an unchanged
// source must contribute nothing on the second pass, even after a restart.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::watch;

use newsradar::dedup::SeenSet;
use newsradar::ingest::types::{RawRecord, SourceProvider};
use newsradar::orchestrator::{Orchestrator, OrchestratorConfig};
use newsradar::scoring::ScoringConfig;
use newsradar::storage::OutputStore;

const CFG_TOML: &str = r#"
[scoring]
title_weight = 2.0
min_score = 0.0
default_quota = 100

[tiers.ultra_high]
value = 25.0
[tiers.high]
value = 18.0
[tiers.medium]
value = 10.0
[tiers.low]
value = 3.0
"#;

struct FixedProvider;

#[async_trait]
impl SourceProvider for FixedProvider {
    async fn collect(&self) -> Result<Vec<RawRecord>> {
        Ok(vec![
            RawRecord {
                title: "Rust 2.0 Released".to_string(),
                link: "https://x.test/a?utm=1".to_string(),
                source: "Feed".to_string(),
                ..RawRecord::default()
            },
            // Same story, tracking-parameter-mutated URL: one must survive.
            RawRecord {
                title: "Rust 2.0 Released".to_string(),
                link: "https://x.test/a?utm=2".to_string(),
                source: "Feed".to_string(),
                ..RawRecord::default()
            },
            RawRecord {
                title: "Postgres 18 brings async I/O".to_string(),
                link: "https://x.test/pg".to_string(),
                source: "Feed".to_string(),
                ..RawRecord::default()
            },
        ])
    }
    fn name(&self) -> &'static str {
        "fixed"
    }
}

fn orchestrator_with(dir: &std::path::Path) -> Orchestrator {
    let store = OutputStore::new(dir.join("selected.json"), dir.join("history.json"), 500);
    let seen = SeenSet::load(dir.join("seen.txt"));
    let providers: Vec<Arc<dyn SourceProvider>> = vec![Arc::new(FixedProvider)];
    Orchestrator::new(providers, seen, store, OrchestratorConfig::default())
}

#[tokio::test]
async fn second_cycle_accepts_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut orchestrator = orchestrator_with(dir.path());
    let cfg = ScoringConfig::from_toml_str(CFG_TOML).unwrap();

    let (_tx, stop) = watch::channel(false);
    let first = orchestrator
        .run_cycle_with_config(&cfg, stop.clone())
        .await
        .unwrap();
    // URL-variant duplicate collapses within the first cycle already.
    assert_eq!(first.stats.duplicates, 1);
    assert_eq!(first.stats.scored, 2);

    let second = orchestrator
        .run_cycle_with_config(&cfg, stop)
        .await
        .unwrap();
    assert_eq!(second.stats.scored, 0);
    assert_eq!(second.stats.duplicates, 3);
    assert_eq!(second.stats.selected, 0);
}

#[tokio::test]
async fn dedup_survives_restart_via_persisted_seen_set() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = ScoringConfig::from_toml_str(CFG_TOML).unwrap();

    {
        let mut orchestrator = orchestrator_with(dir.path());
        let (_tx, stop) = watch::channel(false);
        let first = orchestrator
            .run_cycle_with_config(&cfg, stop)
            .await
            .unwrap();
        assert_eq!(first.stats.scored, 2);
    }

    // Fresh orchestrator, same state directory: everything is a repeat.
    let mut orchestrator = orchestrator_with(dir.path());
    let (_tx, stop) = watch::channel(false);
    let second = orchestrator
        .run_cycle_with_config(&cfg, stop)
        .await
        .unwrap();
    assert_eq!(second.stats.scored, 0);
    assert_eq!(second.stats.duplicates, 3);
}
