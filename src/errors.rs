use std::io;

use thiserror::Error;

use crate::types::SourceId;

/// Error type for source, shard, configuration, and report output failures.
#[derive(Debug, Error)]
pub enum TallyError {
    /// A source could not be opened or read.
    #[error("source '{source_id}' is unavailable: {reason}")]
    SourceUnavailable {
        /// Source that failed.
        source_id: SourceId,
        /// Underlying cause as text.
        reason: String,
    },
    /// A shard ran past the configured time budget.
    #[error("shard of source '{source_id}' exceeded its time budget after {elapsed_ms} ms")]
    ShardTimeout {
        /// Source the shard belongs to.
        source_id: SourceId,
        /// Time spent on the shard before it was abandoned.
        elapsed_ms: u128,
    },
    /// A shard stopped because the run was cancelled.
    #[error("shard of source '{source_id}' was cancelled")]
    ShardCancelled {
        /// Source the shard belongs to.
        source_id: SourceId,
    },
    /// Invalid coordinator settings.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Raw I/O failure, e.g. while writing a report.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// JSON serialization failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl TallyError {
    /// Source named by a source-level failure, if any.
    pub fn source_id(&self) -> Option<&str> {
        match self {
            TallyError::SourceUnavailable { source_id, .. }
            | TallyError::ShardTimeout { source_id, .. }
            | TallyError::ShardCancelled { source_id } => Some(source_id),
            _ => None,
        }
    }

    pub(crate) fn unavailable(source_id: impl Into<SourceId>, err: impl ToString) -> Self {
        TallyError::SourceUnavailable {
            source_id: source_id.into(),
            reason: err.to_string(),
        }
    }
}
