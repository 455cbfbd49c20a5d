use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use crate::types::FileExtension;

/// Filesystem discovery of source files under a root.
pub struct FileDiscovery {
    root: PathBuf,
    extension: FileExtension,
    follow_links: bool,
}

impl FileDiscovery {
    /// Create a discovery rooted at `root` matching `extension` (case-insensitive).
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<FileExtension>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
            follow_links: false,
        }
    }

    /// Configure symlink traversal.
    pub fn with_follow_symlinks(mut self, follow_links: bool) -> Self {
        self.follow_links = follow_links;
        self
    }

    /// List matching files, sorted by path.
    ///
    /// A root that is itself a file is returned as-is regardless of its
    /// extension. Unreadable directory entries are logged and skipped.
    pub fn files(&self) -> Vec<PathBuf> {
        if !self.root.is_dir() {
            return vec![self.root.clone()];
        }
        let mut files: Vec<PathBuf> = WalkDir::new(&self.root)
            .follow_links(self.follow_links)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!(root = %self.root.display(), error = %err, "skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| has_extension(path, &self.extension))
            .collect();
        files.sort();
        files
    }
}

/// True if the path has `extension` (case-insensitive, without the dot).
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(extension.trim_start_matches('.')))
        .unwrap_or(false)
}

/// Length of a regular file in bytes.
pub fn file_len(path: &Path) -> io::Result<u64> {
    let metadata = fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("'{}' is not a regular file", path.display()),
        ));
    }
    Ok(metadata.len())
}

/// Open `path` for buffered reading.
pub fn open_file(path: &Path) -> io::Result<BufReader<File>> {
    Ok(BufReader::new(File::open(path)?))
}

/// Open `path` for buffered reading limited to `range`.
pub fn open_range(path: &Path, range: &Range<u64>) -> io::Result<BufReader<io::Take<File>>> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(range.start))?;
    let limit = range.end.saturating_sub(range.start);
    Ok(BufReader::new(file.take(limit)))
}
