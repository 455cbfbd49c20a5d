/// Record-boundary-aligned byte-range planning for seekable sources.
pub mod ranges;
