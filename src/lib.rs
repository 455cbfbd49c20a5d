#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Command-line entry point shared by the `pgn-tally` binary.
pub mod cli;
/// Coordinator configuration types.
pub mod config;
/// Centralized constants grouped by concern.
pub mod constants;
/// Bounded worker pool that shards, tallies, and merges sources.
pub mod coordinator;
/// Record and classification types.
pub mod data;
/// Result classification and tag-pair parsing.
pub mod extract;
/// Per-game header export as JSON lines.
pub mod games;
/// Aggregate metrics helpers.
pub mod metrics;
/// Streaming record splitting.
pub mod records;
/// Report rendering.
pub mod report;
/// Record source traits and built-in sources.
pub mod source;
/// Commutative result tallies.
pub mod tally;
/// Input transports used by sources (filesystem today).
pub mod transport;
/// Shared type aliases.
pub mod types;
/// Line and percentage helpers.
pub mod utils;

mod errors;

pub use config::{RecordBoundary, TallyConfig};
pub use coordinator::{
    CancelToken, RunReport, SourceFailure, SourceSummary, StreamCoordinator, tally_reader,
};
pub use data::{ClassificationKey, Record};
pub use errors::TallyError;
pub use extract::{classify, classify_result_value, visit_tags};
pub use records::RecordSplitter;
pub use report::{OutputFormat, write_report};
pub use source::{FileSource, MemorySource, ReaderSource, RecordSource, ShardSpan};
pub use tally::Tally;
pub use types::SourceId;
