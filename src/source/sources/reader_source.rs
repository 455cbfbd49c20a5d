use std::io::{self, BufRead, BufReader, Read};
use std::sync::Mutex;

use crate::constants::sources::STDIN_SOURCE_ID;
use crate::errors::TallyError;
use crate::source::{RecordSource, ShardSpan, SourceReader};
use crate::types::SourceId;

type BoxedRead = Box<dyn Read + Send>;

/// One-shot record source over an arbitrary reader.
///
/// The reader is handed out on the first `open`; any later open reports the
/// source as unavailable. Only `ShardSpan::Whole` is supported.
pub struct ReaderSource {
    source_id: SourceId,
    reader: Mutex<Option<BoxedRead>>,
}

impl ReaderSource {
    /// Wrap `reader` as a source named `source_id`.
    pub fn new(source_id: impl Into<SourceId>, reader: impl Read + Send + 'static) -> Self {
        Self {
            source_id: source_id.into(),
            reader: Mutex::new(Some(Box::new(reader))),
        }
    }

    /// Source over the process's standard input.
    pub fn stdin() -> Self {
        Self::new(STDIN_SOURCE_ID, io::stdin())
    }

    fn unavailable(&self, reason: &str) -> TallyError {
        TallyError::unavailable(self.source_id.clone(), reason)
    }
}

impl RecordSource for ReaderSource {
    fn id(&self) -> &str {
        &self.source_id
    }

    fn open(&self, span: &ShardSpan) -> Result<SourceReader<'_>, TallyError> {
        if *span != ShardSpan::Whole {
            return Err(self.unavailable("reader sources cannot be split into byte ranges"));
        }
        let mut guard = self
            .reader
            .lock()
            .map_err(|_| self.unavailable("reader lock poisoned"))?;
        let reader = guard
            .take()
            .ok_or_else(|| self.unavailable("reader was already consumed"))?;
        Ok(Box::new(BufReader::new(reader)) as Box<dyn BufRead + Send>)
    }
}
