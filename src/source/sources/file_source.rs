use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::TallyConfig;
use crate::errors::TallyError;
use crate::source::utilities::ranges::plan_ranges;
use crate::source::{RecordSource, ShardSpan, SourceReader};
use crate::transport::fs::{FileDiscovery, file_len, open_file, open_range};
use crate::types::SourceId;

/// Filesystem-backed record source.
///
/// Opening is deferred until a worker needs the bytes, so a missing file
/// surfaces as a per-source `SourceUnavailable` failure instead of aborting
/// source registration.
#[derive(Clone, Debug)]
pub struct FileSource {
    source_id: SourceId,
    path: PathBuf,
}

impl FileSource {
    /// Create a source for `path`, identified by its display path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            source_id: path.display().to_string(),
            path,
        }
    }

    /// Override the source identifier.
    pub fn with_id(mut self, source_id: impl Into<SourceId>) -> Self {
        self.source_id = source_id.into();
        self
    }

    /// Path backing this source.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Expand `root` into one source per matching file.
    ///
    /// Directories are walked recursively for files with `extension`; a file
    /// root (existing or not) becomes a single source.
    pub fn discover(root: impl Into<PathBuf>, extension: &str) -> Vec<FileSource> {
        FileDiscovery::new(root, extension)
            .files()
            .into_iter()
            .map(FileSource::new)
            .collect()
    }

    fn unavailable(&self, err: impl ToString) -> TallyError {
        TallyError::unavailable(self.source_id.clone(), err)
    }
}

impl RecordSource for FileSource {
    fn id(&self) -> &str {
        &self.source_id
    }

    fn open(&self, span: &ShardSpan) -> Result<SourceReader<'_>, TallyError> {
        match span {
            ShardSpan::Whole => open_file(&self.path)
                .map(|reader| Box::new(reader) as SourceReader<'_>)
                .map_err(|err| self.unavailable(err)),
            ShardSpan::Bytes(range) => open_range(&self.path, range)
                .map(|reader| Box::new(reader) as SourceReader<'_>)
                .map_err(|err| self.unavailable(err)),
        }
    }

    fn plan_shards(&self, config: &TallyConfig) -> Result<Vec<ShardSpan>, TallyError> {
        if config.shards_per_source <= 1 {
            return Ok(vec![ShardSpan::Whole]);
        }
        let len = file_len(&self.path).map_err(|err| self.unavailable(err))?;
        if len < config.min_shard_bytes {
            return Ok(vec![ShardSpan::Whole]);
        }
        let mut reader = open_file(&self.path).map_err(|err| self.unavailable(err))?;
        let ranges = plan_ranges(&mut reader, len, config.shards_per_source, config.boundary)
            .map_err(|err| self.unavailable(err))?;
        debug!(
            source_id = %self.source_id,
            bytes = len,
            shards = ranges.len(),
            "planned byte-range shards"
        );
        Ok(ranges.into_iter().map(ShardSpan::Bytes).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TallyConfig;
    use std::io::Read;
    use tempfile::tempdir;

    fn read_all(source: &FileSource, span: &ShardSpan) -> String {
        let mut text = String::new();
        source.open(span).unwrap().read_to_string(&mut text).unwrap();
        text
    }

    #[test]
    fn missing_file_is_source_unavailable_on_open() {
        let temp = tempdir().unwrap();
        let source = FileSource::new(temp.path().join("missing.pgn")).with_id("missing");
        let err = source.open(&ShardSpan::Whole).err().expect("open must fail");
        assert!(matches!(
            err,
            TallyError::SourceUnavailable { ref source_id, .. } if source_id == "missing"
        ));
    }

    #[test]
    fn byte_range_shards_partition_the_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("games.pgn");
        let text = (0..40)
            .map(|idx| format!("[Round \"{idx}\"]\n[Result \"0-1\"]\n\n1. d4 d5 0-1\n"))
            .collect::<Vec<_>>()
            .join("\n");
        std::fs::write(&path, &text).unwrap();

        let source = FileSource::new(&path);
        let config = TallyConfig::default()
            .with_shards_per_source(4)
            .with_min_shard_bytes(0);
        let spans = source.plan_shards(&config).unwrap();
        assert_eq!(spans.len(), 4);

        let rebuilt: String = spans.iter().map(|span| read_all(&source, span)).collect();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn small_files_are_not_split() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("tiny.pgn");
        std::fs::write(&path, "[Result \"1-0\"]\n\n[Result \"0-1\"]\n").unwrap();
        let config = TallyConfig::default().with_shards_per_source(8);
        let spans = FileSource::new(&path).plan_shards(&config).unwrap();
        assert_eq!(spans, vec![ShardSpan::Whole]);
    }

    #[test]
    fn discover_expands_directories() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("one.pgn"), "").unwrap();
        std::fs::write(temp.path().join("two.pgn"), "").unwrap();
        std::fs::write(temp.path().join("skip.md"), "").unwrap();
        let sources = FileSource::discover(temp.path(), "pgn");
        assert_eq!(sources.len(), 2);
        assert!(sources[0].id().ends_with("one.pgn"));
    }
}
