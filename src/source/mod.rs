//! Record source interfaces and shard spans.
//!
//! Ownership model:
//! - `RecordSource` is the coordinator-facing interface that opens byte streams.
//! - `ShardSpan` names the part of a source one worker reads start to finish.
//! - Sources that can seek (files, in-memory buffers) plan byte-range spans
//!   whose cut points always fall on record boundaries, so any partition of a
//!   source tallies to the same counts as the whole source.

use std::fmt;
use std::io::BufRead;
use std::ops::Range;

use crate::config::TallyConfig;
use crate::errors::TallyError;
use crate::types::ShardId;

/// Source implementation modules.
pub mod sources;
/// Utility helpers used by source implementations.
pub mod utilities;

pub use sources::{FileSource, MemorySource, ReaderSource};

/// Part of a source processed by one worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShardSpan {
    /// The entire source.
    Whole,
    /// A half-open byte range that starts and ends on record boundaries.
    Bytes(Range<u64>),
}

impl ShardSpan {
    /// Stable shard identifier for logs and failures.
    pub fn shard_id(&self, source_id: &str) -> ShardId {
        match self {
            ShardSpan::Whole => source_id.to_string(),
            ShardSpan::Bytes(range) => format!("{source_id}@{}..{}", range.start, range.end),
        }
    }
}

impl fmt::Display for ShardSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShardSpan::Whole => f.write_str("whole"),
            ShardSpan::Bytes(range) => write!(f, "bytes {}..{}", range.start, range.end),
        }
    }
}

/// Boxed line reader handed to a shard worker.
pub type SourceReader<'a> = Box<dyn BufRead + Send + 'a>;

/// Coordinator-facing record source.
///
/// Implementations only produce bytes; record splitting and classification
/// happen in the coordinator. Opening the same span twice must yield the
/// same bytes, except for one-shot sources such as standard input, which
/// report `SourceUnavailable` on a second open.
pub trait RecordSource: Send + Sync {
    /// Stable source identifier used in reports and failures.
    fn id(&self) -> &str;

    /// Open a reader positioned at the start of `span`.
    fn open(&self, span: &ShardSpan) -> Result<SourceReader<'_>, TallyError>;

    /// Split the source into independently readable spans.
    ///
    /// The default treats the source as a single shard. Seekable sources
    /// override this to honor `TallyConfig::shards_per_source`.
    fn plan_shards(&self, _config: &TallyConfig) -> Result<Vec<ShardSpan>, TallyError> {
        Ok(vec![ShardSpan::Whole])
    }
}
