use std::io::Cursor;
use std::sync::Arc;

use crate::config::TallyConfig;
use crate::errors::TallyError;
use crate::source::utilities::ranges::plan_ranges;
use crate::source::{RecordSource, ShardSpan, SourceReader};
use crate::types::SourceId;

/// Record source backed by an in-memory byte buffer.
///
/// Cloning is cheap; clones share the buffer.
#[derive(Clone, Debug)]
pub struct MemorySource {
    source_id: SourceId,
    bytes: Arc<[u8]>,
}

impl MemorySource {
    /// Create a source named `source_id` over `bytes`.
    pub fn new(source_id: impl Into<SourceId>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            source_id: source_id.into(),
            bytes: Arc::from(bytes.into()),
        }
    }

    /// Number of bytes held by the source.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when the source holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl RecordSource for MemorySource {
    fn id(&self) -> &str {
        &self.source_id
    }

    fn open(&self, span: &ShardSpan) -> Result<SourceReader<'_>, TallyError> {
        let bytes: &[u8] = &self.bytes;
        match span {
            ShardSpan::Whole => Ok(Box::new(bytes)),
            ShardSpan::Bytes(range) => {
                let start = usize::try_from(range.start).unwrap_or(usize::MAX);
                let end = usize::try_from(range.end).unwrap_or(usize::MAX);
                bytes
                    .get(start..end)
                    .map(|slice| Box::new(slice) as SourceReader<'_>)
                    .ok_or_else(|| TallyError::SourceUnavailable {
                        source_id: self.source_id.clone(),
                        reason: format!("byte range {start}..{end} is out of bounds"),
                    })
            }
        }
    }

    fn plan_shards(&self, config: &TallyConfig) -> Result<Vec<ShardSpan>, TallyError> {
        let len = self.bytes.len() as u64;
        if config.shards_per_source <= 1 || len < config.min_shard_bytes {
            return Ok(vec![ShardSpan::Whole]);
        }
        let mut cursor = Cursor::new(&self.bytes[..]);
        let ranges = plan_ranges(&mut cursor, len, config.shards_per_source, config.boundary)?;
        Ok(ranges.into_iter().map(ShardSpan::Bytes).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn out_of_bounds_ranges_are_unavailable() {
        let source = MemorySource::new("mem", "abc");
        assert_eq!(source.len(), 3);
        let err = source.open(&ShardSpan::Bytes(2..10)).err().expect("must fail");
        assert!(matches!(err, TallyError::SourceUnavailable { .. }));

        let mut text = String::new();
        source
            .open(&ShardSpan::Bytes(1..3))
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "bc");
    }
}
