/// Filesystem transport helpers used by file-backed sources.
pub mod fs;
