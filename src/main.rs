//! newsradar — Binary Entrypoint
//! Aggregates tech-news items from independent sources, deduplicates them
//! across runs, ranks them by configured relevance and keeps a bounded
//! selection refreshed on disk.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newsradar::dedup::SeenSet;
use newsradar::ingest::providers::{DevToProvider, HackerNewsProvider, RssProvider};
use newsradar::ingest::types::SourceProvider;
use newsradar::orchestrator::{Orchestrator, OrchestratorConfig};
use newsradar::storage::OutputStore;

const DEFAULT_SEEN_PATH: &str = "data/seen_fingerprints.txt";

#[derive(Parser)]
#[command(name = "newsradar", about = "Tech-news aggregation and ranking engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single collection cycle and print the selection.
    Collect {
        /// Freshness horizon in hours.
        #[arg(long, default_value_t = 24)]
        max_age_hours: i64,
        /// Override the configured selection quota.
        #[arg(long)]
        quota: Option<usize>,
    },
    /// Run collection cycles continuously on a fixed interval.
    Watch {
        #[arg(long, default_value_t = 1800)]
        interval_secs: u64,
        /// Stop after this many seconds (default: run until Ctrl-C).
        #[arg(long)]
        duration_secs: Option<u64>,
        #[arg(long, default_value_t = 4)]
        max_age_hours: i64,
    },
    /// Print the currently selected items.
    List,
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("newsradar=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn default_providers() -> Vec<Arc<dyn SourceProvider>> {
    vec![
        Arc::new(HackerNewsProvider::from_default_url()),
        Arc::new(DevToProvider::from_default_url()),
        Arc::new(RssProvider::from_url(
            "The Verge",
            "https://www.theverge.com/rss/index.xml",
        )),
    ]
}

fn build_orchestrator(cfg: OrchestratorConfig) -> Orchestrator {
    let seen = SeenSet::load(DEFAULT_SEEN_PATH);
    Orchestrator::new(default_providers(), seen, OutputStore::default(), cfg)
}

/// Stop channel flipped by Ctrl-C; the in-flight cycle still flushes.
fn spawn_ctrl_c_handler() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("stop requested, finishing in-flight cycle");
            let _ = tx.send(true);
        }
    });
    rx
}

fn print_selection(selected: &[newsradar::scoring::ScoredItem]) {
    if selected.is_empty() {
        println!("No items selected.");
        return;
    }
    for (i, s) in selected.iter().enumerate() {
        println!("{:>2}. [{:>6.1} pts] {}", i + 1, s.score, s.item.title);
        println!("      {} | {}", s.item.source, s.item.link);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op elsewhere. Enables SCORING_CONFIG_PATH
    // overrides without exporting them by hand.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Collect {
            max_age_hours,
            quota,
        } => {
            let mut orchestrator = build_orchestrator(OrchestratorConfig {
                max_age_hours,
                quota,
                ..OrchestratorConfig::default()
            });
            let stop = spawn_ctrl_c_handler();
            // Config load failure is the only error that reaches here;
            // adapter and persistence failures are already degraded inside.
            let outcome = orchestrator.run_cycle(stop).await?;
            print_selection(&outcome.selected);
            println!(
                "\n{} collected, {} duplicates, {} too old, {} selected ({} adapter failures)",
                outcome.stats.total,
                outcome.stats.duplicates,
                outcome.stats.too_old,
                outcome.stats.selected,
                outcome.stats.adapter_failures,
            );
        }
        Command::Watch {
            interval_secs,
            duration_secs,
            max_age_hours,
        } => {
            let mut orchestrator = build_orchestrator(OrchestratorConfig {
                max_age_hours,
                ..OrchestratorConfig::default()
            });
            let stop = spawn_ctrl_c_handler();
            orchestrator
                .run_continuous(
                    Duration::from_secs(interval_secs.max(1)),
                    duration_secs.map(Duration::from_secs),
                    stop,
                )
                .await?;
        }
        Command::List => {
            let store = OutputStore::default();
            match store.load_selected() {
                Ok(selected) => print_selection(&selected),
                Err(_) => println!("No selection on disk yet. Run `newsradar collect` first."),
            }
        }
    }

    Ok(())
}
