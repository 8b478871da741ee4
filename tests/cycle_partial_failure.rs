// tests/cycle_partial_failure.rs
// One failing adapter must not abort the cycle: partial results from the
// healthy adapters still flow through the whole pipeline.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::watch;

use newsradar::dedup::SeenSet;
use newsradar::ingest::types::{RawRecord, SourceProvider};
use newsradar::ingest::CollectOptions;
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

struct StaticProvider {
    tag: &'static str,
    count: usize,
}

#[async_trait]
impl SourceProvider for StaticProvider {
    async fn collect(&self) -> Result<Vec<RawRecord>> {
        Ok((0..self.count)
            .map(|i| RawRecord {
                title: format!("{} headline number {}", self.tag, i),
                link: format!("https://{}.test/{}", self.tag, i),
                source: self.tag.to_string(),
                ..RawRecord::default()
            })
            .collect())
    }
    fn name(&self) -> &'static str {
        self.tag
    }
}

struct StallingProvider;

#[async_trait]
impl SourceProvider for StallingProvider {
    async fn collect(&self) -> Result<Vec<RawRecord>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(anyhow!("unreachable"))
    }
    fn name(&self) -> &'static str {
        "stalled"
    }
}

fn orchestrator_with(providers: Vec<Arc<dyn SourceProvider>>, dir: &std::path::Path) -> Orchestrator {
    let store = OutputStore::new(dir.join("selected.json"), dir.join("history.json"), 500);
    let seen = SeenSet::load(dir.join("seen.txt"));
    Orchestrator::new(
        providers,
        seen,
        store,
        OrchestratorConfig {
            max_age_hours: 24,
            quota: None,
            collect: CollectOptions {
                max_concurrency: 2,
                adapter_timeout: Duration::from_millis(200),
                global_deadline: Duration::from_secs(5),
            },
        },
    )
}

#[tokio::test]
async fn timed_out_adapter_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let providers: Vec<Arc<dyn SourceProvider>> = vec![
        Arc::new(StaticProvider { tag: "alpha", count: 10 }),
        Arc::new(StallingProvider),
        Arc::new(StaticProvider { tag: "gamma", count: 5 }),
    ];
    let mut orchestrator = orchestrator_with(providers, dir.path());

    let cfg = ScoringConfig::from_toml_str(CFG_TOML).unwrap();
    let (_tx, stop) = watch::channel(false);
    let outcome = orchestrator
        .run_cycle_with_config(&cfg, stop)
        .await
        .unwrap();

    assert_eq!(outcome.stats.total, 15);
    assert_eq!(outcome.stats.adapter_failures, 1);
    assert_eq!(outcome.stats.scored, 15);
    assert_eq!(outcome.stats.selected, 15);
}

#[tokio::test]
async fn deadline_keeps_results_already_collected() {
    // The staller outlives the global deadline while its per-call timeout
    // never fires; the finished adapter's items must survive the abort.
    let dir = tempfile::tempdir().unwrap();
    let providers: Vec<Arc<dyn SourceProvider>> = vec![
        Arc::new(StaticProvider { tag: "alpha", count: 4 }),
        Arc::new(StallingProvider),
    ];
    let store = OutputStore::new(
        dir.path().join("selected.json"),
        dir.path().join("history.json"),
        500,
    );
    let seen = SeenSet::load(dir.path().join("seen.txt"));
    let mut orchestrator = Orchestrator::new(
        providers,
        seen,
        store,
        OrchestratorConfig {
            max_age_hours: 24,
            quota: None,
            collect: CollectOptions {
                max_concurrency: 2,
                adapter_timeout: Duration::from_secs(3600),
                global_deadline: Duration::from_millis(200),
            },
        },
    );

    let cfg = ScoringConfig::from_toml_str(CFG_TOML).unwrap();
    let (_tx, stop) = watch::channel(false);
    let outcome = orchestrator
        .run_cycle_with_config(&cfg, stop)
        .await
        .unwrap();

    assert_eq!(outcome.stats.total, 4);
    assert_eq!(outcome.stats.adapter_failures, 1);
    assert_eq!(outcome.stats.selected, 4);
}

#[tokio::test]
async fn erroring_adapter_is_isolated() {
    struct ErroringProvider;

    #[async_trait]
    impl SourceProvider for ErroringProvider {
        async fn collect(&self) -> Result<Vec<RawRecord>> {
            Err(anyhow!("boom"))
        }
        fn name(&self) -> &'static str {
            "erroring"
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let providers: Vec<Arc<dyn SourceProvider>> = vec![
        Arc::new(ErroringProvider),
        Arc::new(StaticProvider { tag: "beta", count: 3 }),
    ];
    let mut orchestrator = orchestrator_with(providers, dir.path());

    let cfg = ScoringConfig::from_toml_str(CFG_TOML).unwrap();
    let (_tx, stop) = watch::channel(false);
    let outcome = orchestrator
        .run_cycle_with_config(&cfg, stop)
        .await
        .unwrap();

    assert_eq!(outcome.stats.adapter_failures, 1);
    assert_eq!(outcome.stats.total, 3);
}
