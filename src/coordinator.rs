use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::io::BufRead;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::{RecordBoundary, TallyConfig};
use crate::errors::TallyError;
use crate::extract::classify;
use crate::records::RecordSplitter;
use crate::source::{RecordSource, ShardSpan};
use crate::tally::Tally;
use crate::types::SourceId;

/// Cooperative cancellation flag shared between a caller and a running coordinator.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every run observing this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once `cancel` has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Tally a single reader sequentially.
///
/// This is the single-shard path the coordinator runs on every worker,
/// without cancellation or time budget.
pub fn tally_reader<R: BufRead>(reader: R, boundary: RecordBoundary) -> std::io::Result<Tally> {
    let mut splitter = RecordSplitter::new(reader, boundary);
    let mut tally = Tally::new();
    while let Some(record) = splitter.next_record()? {
        tally.observe(classify(record));
    }
    Ok(tally)
}

/// Per-source totals for sources whose every shard completed.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SourceSummary {
    /// Merged tally of the source's shards.
    pub tally: Tally,
    /// Number of shards the source was split into.
    pub shards: usize,
    /// Bytes consumed across all shards.
    pub bytes_read: u64,
    /// Sum of per-shard wall time in milliseconds.
    pub elapsed_ms: u128,
}

/// A source excluded from the merged tally.
#[derive(Debug)]
pub struct SourceFailure {
    /// Source that failed.
    pub source_id: SourceId,
    /// First error observed for the source.
    pub error: TallyError,
    /// Number of the source's shards that failed.
    pub failed_shards: usize,
}

impl SourceFailure {
    /// Short machine-readable failure category.
    pub fn kind(&self) -> &'static str {
        match self.error {
            TallyError::ShardTimeout { .. } => "shard_timeout",
            TallyError::ShardCancelled { .. } => "shard_cancelled",
            _ => "source_unavailable",
        }
    }
}

impl Serialize for SourceFailure {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Repr<'a> {
            source_id: &'a str,
            kind: &'static str,
            message: String,
            failed_shards: usize,
        }
        Repr {
            source_id: &self.source_id,
            kind: self.kind(),
            message: self.error.to_string(),
            failed_shards: self.failed_shards,
        }
        .serialize(serializer)
    }
}

/// Outcome of one coordinator run.
///
/// `tally` merges only sources listed in `per_source`; every other registered
/// source appears exactly once in `failures`.
#[derive(Debug, Serialize)]
pub struct RunReport {
    /// Merged tally of every fully processed source.
    pub tally: Tally,
    /// Per-source summaries in registration order.
    pub per_source: IndexMap<SourceId, SourceSummary>,
    /// Sources excluded from the merged tally.
    pub failures: Vec<SourceFailure>,
    /// Whether the run observed a cancellation request.
    pub cancelled: bool,
    /// Wall-clock run start.
    pub started_at: DateTime<Utc>,
    /// Wall-clock run end.
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    /// True when at least one source was registered and none could be read.
    pub fn all_sources_failed(&self) -> bool {
        self.per_source.is_empty() && !self.failures.is_empty()
    }

    /// True when every registered source was merged.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }
}

/// Splits sources into shards, tallies shards on a bounded worker pool, and
/// merges the per-shard tallies.
pub struct StreamCoordinator {
    config: TallyConfig,
    sources: Vec<Box<dyn RecordSource + 'static>>,
}

struct PlannedShard {
    source_idx: usize,
    span: ShardSpan,
}

struct ShardOutcome {
    tally: Tally,
    bytes_read: u64,
    elapsed: Duration,
}

#[derive(Default)]
struct SourceProgress {
    summary: SourceSummary,
    failure: Option<TallyError>,
    failed_shards: usize,
}

impl StreamCoordinator {
    /// Create a coordinator with no sources.
    pub fn new(config: TallyConfig) -> Self {
        Self {
            config,
            sources: Vec::new(),
        }
    }

    /// Register a source; sources are reported in registration order.
    pub fn register_source(&mut self, source: Box<dyn RecordSource + 'static>) {
        self.sources.push(source);
    }

    /// Number of registered sources.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Active configuration.
    pub fn config(&self) -> &TallyConfig {
        &self.config
    }

    /// Run every registered source to completion.
    pub fn run(&self) -> Result<RunReport, TallyError> {
        self.run_with_cancel(&CancelToken::new())
    }

    /// Run every registered source, stopping early once `cancel` fires.
    ///
    /// Only configuration errors are returned as `Err`; per-source problems
    /// are reported in `RunReport::failures`.
    pub fn run_with_cancel(&self, cancel: &CancelToken) -> Result<RunReport, TallyError> {
        self.config.validate()?;
        let started_at = Utc::now();
        let mut progress: Vec<SourceProgress> =
            self.sources.iter().map(|_| SourceProgress::default()).collect();

        let mut shards = Vec::new();
        for (source_idx, source) in self.sources.iter().enumerate() {
            match source.plan_shards(&self.config) {
                Ok(spans) => {
                    progress[source_idx].summary.shards = spans.len();
                    shards.extend(
                        spans
                            .into_iter()
                            .map(|span| PlannedShard { source_idx, span }),
                    );
                }
                Err(err) => {
                    progress[source_idx].failed_shards = 1;
                    progress[source_idx].failure = Some(err);
                }
            }
        }

        let workers = self.config.workers.min(shards.len()).max(1);
        debug!(
            sources = self.sources.len(),
            shards = shards.len(),
            workers,
            "starting tally run"
        );

        let next = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel::<(usize, Result<ShardOutcome, TallyError>)>();
        thread::scope(|scope| {
            for _ in 0..workers {
                let tx = tx.clone();
                let shards = &shards;
                let next = &next;
                scope.spawn(move || {
                    loop {
                        let idx = next.fetch_add(1, Ordering::Relaxed);
                        let Some(shard) = shards.get(idx) else {
                            break;
                        };
                        let result = self.run_shard(shard, cancel);
                        if tx.send((idx, result)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(tx);

            for (idx, result) in rx {
                let shard = &shards[idx];
                let source_id = self.sources[shard.source_idx].id();
                let state = &mut progress[shard.source_idx];
                match result {
                    Ok(outcome) => {
                        debug!(
                            source_id = %source_id,
                            shard = %shard.span,
                            records = outcome.tally.total(),
                            bytes = outcome.bytes_read,
                            elapsed_ms = outcome.elapsed.as_millis(),
                            "shard completed"
                        );
                        state.summary.tally = state.summary.tally.merge(&outcome.tally);
                        state.summary.bytes_read += outcome.bytes_read;
                        state.summary.elapsed_ms += outcome.elapsed.as_millis();
                    }
                    Err(err) => {
                        warn!(
                            source_id = %source_id,
                            shard_id = %shard.span.shard_id(source_id),
                            error = %err,
                            "shard failed"
                        );
                        state.failed_shards += 1;
                        if state.failure.is_none() {
                            state.failure = Some(err);
                        }
                    }
                }
            }
        });

        let mut per_source = IndexMap::new();
        let mut failures = Vec::new();
        for (source, state) in self.sources.iter().zip(progress) {
            let source_id = source.id().to_string();
            match state.failure {
                Some(error) => failures.push(SourceFailure {
                    source_id,
                    error,
                    failed_shards: state.failed_shards,
                }),
                None => {
                    per_source.insert(source_id, state.summary);
                }
            }
        }
        let tally = Tally::merge_all(per_source.values().map(|summary| &summary.tally));

        let report = RunReport {
            tally,
            per_source,
            failures,
            cancelled: cancel.is_cancelled(),
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            total = report.tally.total(),
            sources_ok = report.per_source.len(),
            sources_failed = report.failures.len(),
            cancelled = report.cancelled,
            "tally run finished"
        );
        Ok(report)
    }

    fn run_shard(&self, shard: &PlannedShard, cancel: &CancelToken) -> Result<ShardOutcome, TallyError> {
        let source = self.sources[shard.source_idx].as_ref();
        if cancel.is_cancelled() {
            return Err(TallyError::ShardCancelled {
                source_id: source.id().to_string(),
            });
        }
        panic::catch_unwind(AssertUnwindSafe(|| {
            tally_shard(source, &shard.span, &self.config, cancel)
        }))
        .unwrap_or_else(|_| {
            Err(TallyError::unavailable(
                source.id(),
                "shard worker panicked",
            ))
        })
    }
}

/// Tally one shard, checking cancellation and the time budget between records.
///
/// Any early exit discards the partial tally.
fn tally_shard(
    source: &dyn RecordSource,
    span: &ShardSpan,
    config: &TallyConfig,
    cancel: &CancelToken,
) -> Result<ShardOutcome, TallyError> {
    let start = Instant::now();
    let reader = source.open(span)?;
    let mut splitter = RecordSplitter::new(reader, config.boundary);
    let mut tally = Tally::new();
    loop {
        if cancel.is_cancelled() {
            return Err(TallyError::ShardCancelled {
                source_id: source.id().to_string(),
            });
        }
        if let Some(budget) = config.shard_timeout
            && start.elapsed() > budget
        {
            return Err(TallyError::ShardTimeout {
                source_id: source.id().to_string(),
                elapsed_ms: start.elapsed().as_millis(),
            });
        }
        match splitter.next_record() {
            Ok(Some(record)) => tally.observe(classify(record)),
            Ok(None) => break,
            Err(err) => return Err(TallyError::unavailable(source.id(), err)),
        }
    }
    Ok(ShardOutcome {
        tally,
        bytes_read: splitter.bytes_read(),
        elapsed: start.elapsed(),
    })
}
