use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;

use crate::constants::coordinator::{
    DEFAULT_MIN_SHARD_BYTES, DEFAULT_SHARDS_PER_SOURCE, FALLBACK_WORKERS,
};
use crate::errors::TallyError;

/// Controls where one record ends and the next begins.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordBoundary {
    /// Every run of blank lines ends the current record.
    BlankLine,
    /// Blank lines end a record, except the one separating a game's tag
    /// section from its movetext.
    #[default]
    PgnGame,
}

/// Top-level coordinator configuration.
#[derive(Clone, Debug)]
pub struct TallyConfig {
    /// Number of worker threads processing shards concurrently.
    pub workers: usize,
    /// Max number of byte-range shards a single seekable file is split into.
    pub shards_per_source: usize,
    /// Files smaller than this many bytes are processed as one shard.
    pub min_shard_bytes: u64,
    /// Optional per-shard time budget; a shard over budget is reported as a failure.
    pub shard_timeout: Option<Duration>,
    /// Record boundary convention used when splitting sources.
    pub boundary: RecordBoundary,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            shards_per_source: DEFAULT_SHARDS_PER_SOURCE,
            min_shard_bytes: DEFAULT_MIN_SHARD_BYTES,
            shard_timeout: None,
            boundary: RecordBoundary::default(),
        }
    }
}

impl TallyConfig {
    /// Override worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Override how many byte-range shards a file may be split into.
    pub fn with_shards_per_source(mut self, shards: usize) -> Self {
        self.shards_per_source = shards;
        self
    }

    /// Override the minimum file size eligible for byte-range sharding.
    pub fn with_min_shard_bytes(mut self, bytes: u64) -> Self {
        self.min_shard_bytes = bytes;
        self
    }

    /// Set or clear the per-shard time budget.
    pub fn with_shard_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.shard_timeout = timeout;
        self
    }

    /// Override the record boundary convention.
    pub fn with_boundary(mut self, boundary: RecordBoundary) -> Self {
        self.boundary = boundary;
        self
    }

    /// Reject configurations the coordinator cannot run.
    pub fn validate(&self) -> Result<(), TallyError> {
        if self.workers == 0 {
            return Err(TallyError::Configuration(
                "workers must be at least 1".into(),
            ));
        }
        if self.shards_per_source == 0 {
            return Err(TallyError::Configuration(
                "shards_per_source must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn default_workers() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(FALLBACK_WORKERS)
}
