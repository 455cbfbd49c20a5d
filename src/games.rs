//! Export of per-game tag pairs as JSON lines.

use indexmap::IndexMap;
use std::io::{BufRead, Write};
use std::ops::ControlFlow;
use tracing::debug;

use crate::config::RecordBoundary;
use crate::constants::pgn::RESULT_TAG;
use crate::data::Record;
use crate::errors::TallyError;
use crate::extract::visit_tags;
use crate::records::RecordSplitter;
use crate::types::{TagName, TagValue};

/// Collect a record's tag pairs keyed by lowercased tag name.
///
/// The first occurrence of a name wins. Returns `None` when the record has no
/// `Result` tag.
pub fn game_headers(record: Record<'_>) -> Option<IndexMap<TagName, TagValue>> {
    let mut headers = IndexMap::new();
    let mut has_result = false;
    visit_tags(record, |name, value| {
        has_result |= name == RESULT_TAG.as_bytes();
        headers
            .entry(String::from_utf8_lossy(name).to_ascii_lowercase())
            .or_insert_with(|| value.decode_utf8_lossy().into_owned());
        ControlFlow::Continue(())
    });
    has_result.then_some(headers)
}

/// Stream every game's headers from `reader` to `out`, one JSON object per line.
///
/// Returns the number of games written.
pub fn export_game_headers<R: BufRead, W: Write>(
    reader: R,
    boundary: RecordBoundary,
    out: &mut W,
) -> Result<u64, TallyError> {
    let mut splitter = RecordSplitter::new(reader, boundary);
    let mut written = 0u64;
    while let Some(record) = splitter.next_record()? {
        let Some(headers) = game_headers(record) else {
            continue;
        };
        serde_json::to_writer(&mut *out, &headers)?;
        writeln!(out)?;
        written += 1;
    }
    debug!(
        records = splitter.records_read(),
        games = written,
        "exported game headers"
    );
    Ok(written)
}
