//! Record extraction: classify a record by its result tag and visit its tags.
//!
//! Tag pairs are read with `pgn_reader`, so several tags on one line, escaped
//! quotes and stray whitespace all follow the PGN import rules. Extraction is
//! total. Anything that does not parse degrades to `ClassificationKey::Unknown`
//! instead of an error, so a single corrupt game never aborts its shard.

use pgn_reader::{RawTag, Reader, Visitor};
use std::ops::ControlFlow;
use tracing::debug;

use crate::constants::pgn::{
    RESULT_BLACK_WINS, RESULT_DRAW, RESULT_TAG, RESULT_UNDETERMINED, RESULT_WHITE_WINS,
};
use crate::data::{ClassificationKey, Record};

/// Visitor that hands each tag of one game to a callback and skips movetext.
struct TagVisitor<F> {
    on_tag: F,
}

impl<F> Visitor for TagVisitor<F>
where
    F: FnMut(&[u8], RawTag<'_>) -> ControlFlow<()>,
{
    type Tags = ();
    type Movetext = ();
    type Output = ();

    fn begin_tags(&mut self) -> ControlFlow<(), ()> {
        ControlFlow::Continue(())
    }

    fn tag(&mut self, _tags: &mut (), name: &[u8], value: RawTag<'_>) -> ControlFlow<()> {
        (self.on_tag)(name.trim_ascii(), value)
    }

    fn begin_movetext(&mut self, _tags: ()) -> ControlFlow<(), ()> {
        ControlFlow::Break(())
    }

    fn end_game(&mut self, _movetext: ()) {}
}

/// Call `on_tag` for every tag pair of the first game in `record`, in order.
///
/// Returning `ControlFlow::Break` from the callback stops the scan early.
/// Movetext is never parsed.
pub fn visit_tags<F>(record: Record<'_>, on_tag: F)
where
    F: FnMut(&[u8], RawTag<'_>) -> ControlFlow<()>,
{
    let mut reader = Reader::new(record.as_bytes());
    let mut visitor = TagVisitor { on_tag };
    if let Err(err) = reader.read_game(&mut visitor) {
        debug!(error = %err, "tag scan stopped on a read error");
    }
}

/// Classify a record by the first `Result` tag it contains.
///
/// Later `Result` tags are ignored. Records without one, or whose value is
/// outside the result vocabulary, classify as `Unknown`.
pub fn classify(record: Record<'_>) -> ClassificationKey {
    let mut key = ClassificationKey::Unknown;
    visit_tags(record, |name, value| {
        if name != RESULT_TAG.as_bytes() {
            return ControlFlow::Continue(());
        }
        key = classify_result_value(value.decode_utf8_lossy().as_bytes());
        ControlFlow::Break(())
    });
    key
}

/// Map a raw result value onto the closed vocabulary.
pub fn classify_result_value(value: &[u8]) -> ClassificationKey {
    match value {
        RESULT_WHITE_WINS => ClassificationKey::WhiteWins,
        RESULT_BLACK_WINS => ClassificationKey::BlackWins,
        RESULT_DRAW => ClassificationKey::Draw,
        RESULT_UNDETERMINED => ClassificationKey::Unknown,
        _ => ClassificationKey::Unknown,
    }
}
