/// Filesystem-backed source with byte-range sharding.
pub mod file_source;
/// In-memory source used for piped input and tests.
pub mod memory_source;
/// One-shot source over an arbitrary reader such as standard input.
pub mod reader_source;

pub use file_source::FileSource;
pub use memory_source::MemorySource;
pub use reader_source::ReaderSource;
