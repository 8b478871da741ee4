// src/ingest/mod.rs
pub mod normalize;
pub mod providers;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use metrics::{counter, describe_counter, describe_gauge};
use once_cell::sync::OnceCell;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;

use crate::ingest::normalize::normalize_record;
use crate::ingest::types::{NewsItem, SourceProvider};

/// One-time metrics registration (series exist even before the first cycle).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("cycle_items_total", "Total items returned by adapters.");
        describe_counter!(
            "cycle_malformed_total",
            "Items dropped at the normalizer boundary."
        );
        describe_counter!("cycle_duplicates_total", "Items removed by deduplication.");
        describe_counter!("cycle_too_old_total", "Items dropped by the freshness filter.");
        describe_counter!("cycle_selected_total", "Items selected per cycle.");
        describe_counter!(
            "cycle_adapter_errors_total",
            "Adapter fetch errors or timeouts."
        );
        describe_gauge!("cycle_last_run_ts", "Unix ts when a cycle last completed.");
    });
}

/// Tunables for the COLLECTING phase.
#[derive(Debug, Clone, Copy)]
pub struct CollectOptions {
    /// Adapters running at once; excess adapters queue on the pool.
    pub max_concurrency: usize,
    /// Independent timeout per adapter call.
    pub adapter_timeout: Duration,
    /// Hard ceiling on the whole COLLECTING phase.
    pub global_deadline: Duration,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            adapter_timeout: Duration::from_secs(20),
            global_deadline: Duration::from_secs(60),
        }
    }
}

/// Result of the COLLECTING phase: normalized items plus failure counters.
#[derive(Debug, Default)]
pub struct CollectOutcome {
    pub items: Vec<NewsItem>,
    pub adapter_failures: usize,
    pub malformed: usize,
}

/// Invoke all adapters on a bounded worker pool and normalize their output.
///
/// One failing or stalled adapter never blocks the others: each call gets its
/// own timeout, the whole phase has a global deadline, and a stop signal
/// aborts outstanding calls while keeping whatever already arrived. Item
/// order across adapters is undefined here; ordering is only enforced after
/// the selector sort.
type AdapterResult = Result<(&'static str, Vec<types::RawRecord>), &'static str>;

/// Normalize one adapter's records into the outcome, counting drops.
fn harvest(outcome: &mut CollectOutcome, source_id: &str, records: Vec<types::RawRecord>) {
    counter!("cycle_items_total").increment(records.len() as u64);
    let now = Utc::now();
    for raw in records {
        match normalize_record(raw, source_id, now) {
            Some(item) => outcome.items.push(item),
            None => {
                outcome.malformed += 1;
                counter!("cycle_malformed_total").increment(1);
            }
        }
    }
}

/// Join adapters that already finished, without waiting on stragglers.
/// Called before an abort so completed-but-unjoined results are not lost.
fn drain_finished(tasks: &mut JoinSet<AdapterResult>, outcome: &mut CollectOutcome) {
    while let Some(joined) = tasks.try_join_next() {
        match joined {
            Ok(Ok((source_id, records))) => harvest(outcome, source_id, records),
            Ok(Err(_)) | Err(_) => {
                outcome.adapter_failures += 1;
                counter!("cycle_adapter_errors_total").increment(1);
            }
        }
    }
}

pub async fn collect_all(
    providers: &[Arc<dyn SourceProvider>],
    opts: CollectOptions,
    mut stop: watch::Receiver<bool>,
) -> CollectOutcome {
    ensure_metrics_described();

    let semaphore = Arc::new(Semaphore::new(opts.max_concurrency.max(1)));
    let mut tasks: JoinSet<AdapterResult> = JoinSet::new();

    for provider in providers {
        let provider = Arc::clone(provider);
        let semaphore = Arc::clone(&semaphore);
        let adapter_timeout = opts.adapter_timeout;
        tasks.spawn(async move {
            // Closed semaphore only happens on abort; the task result is
            // discarded then anyway.
            let _permit = semaphore.acquire().await.map_err(|_| provider.name())?;
            match tokio::time::timeout(adapter_timeout, provider.collect()).await {
                Ok(Ok(records)) => Ok((provider.name(), records)),
                Ok(Err(e)) => {
                    tracing::warn!(provider = provider.name(), error = ?e, "adapter error");
                    Err(provider.name())
                }
                Err(_) => {
                    tracing::warn!(provider = provider.name(), "adapter timed out");
                    Err(provider.name())
                }
            }
        });
    }

    let mut outcome = CollectOutcome::default();
    let deadline = tokio::time::sleep(opts.global_deadline);
    tokio::pin!(deadline);
    // Closed stop channel means nobody can stop us; stop polling it.
    let mut stop_open = true;

    loop {
        tokio::select! {
            joined = tasks.join_next() => {
                match joined {
                    None => break,
                    Some(Ok(Ok((source_id, records)))) => {
                        harvest(&mut outcome, source_id, records);
                    }
                    Some(Ok(Err(_))) | Some(Err(_)) => {
                        outcome.adapter_failures += 1;
                        counter!("cycle_adapter_errors_total").increment(1);
                    }
                }
            }
            _ = &mut deadline => {
                drain_finished(&mut tasks, &mut outcome);
                let pending = tasks.len();
                tracing::warn!(pending, "collection deadline reached, aborting stragglers");
                outcome.adapter_failures += pending;
                counter!("cycle_adapter_errors_total").increment(pending as u64);
                tasks.abort_all();
                break;
            }
            changed = stop.changed(), if stop_open => {
                match changed {
                    Ok(()) if *stop.borrow() => {
                        drain_finished(&mut tasks, &mut outcome);
                        let pending = tasks.len();
                        tracing::info!(pending, "stop requested, keeping partial collection");
                        tasks.abort_all();
                        break;
                    }
                    Ok(()) => {}
                    Err(_) => stop_open = false,
                }
            }
        }
    }

    outcome
}
