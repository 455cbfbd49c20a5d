use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::strip_line_ending;

/// Closed set of outcomes a record can be classified into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationKey {
    /// First party (white) won: `1-0`.
    WhiteWins,
    /// Second party (black) won: `0-1`.
    BlackWins,
    /// Drawn game: `1/2-1/2`.
    Draw,
    /// Missing, malformed, undetermined, or out-of-vocabulary result.
    Unknown,
}

impl ClassificationKey {
    /// Every key in stable reporting order.
    pub const ALL: [ClassificationKey; 4] = [
        ClassificationKey::WhiteWins,
        ClassificationKey::BlackWins,
        ClassificationKey::Draw,
        ClassificationKey::Unknown,
    ];

    /// Number of distinct keys.
    pub const COUNT: usize = Self::ALL.len();

    /// Dense index used by fixed-size count arrays.
    pub const fn index(self) -> usize {
        match self {
            ClassificationKey::WhiteWins => 0,
            ClassificationKey::BlackWins => 1,
            ClassificationKey::Draw => 2,
            ClassificationKey::Unknown => 3,
        }
    }

    /// Snake-case label used in reports.
    pub const fn label(self) -> &'static str {
        match self {
            ClassificationKey::WhiteWins => "white_wins",
            ClassificationKey::BlackWins => "black_wins",
            ClassificationKey::Draw => "draws",
            ClassificationKey::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ClassificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Borrowed view over the raw bytes of one record.
///
/// Records are never retained: the splitter reuses its buffer for the next
/// record as soon as the borrow ends.
#[derive(Clone, Copy, Debug)]
pub struct Record<'a> {
    bytes: &'a [u8],
}

impl<'a> Record<'a> {
    /// Wrap raw record bytes (lines joined with their original terminators).
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Raw bytes of the record.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// True when the record holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Iterate the record's lines without terminators.
    pub fn lines(&self) -> impl Iterator<Item = &'a [u8]> + 'a {
        self.bytes
            .split_inclusive(|b| *b == b'\n')
            .map(strip_line_ending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_indices_match_reporting_order() {
        for (idx, key) in ClassificationKey::ALL.iter().enumerate() {
            assert_eq!(key.index(), idx);
        }
        assert_eq!(ClassificationKey::COUNT, 4);
    }

    #[test]
    fn record_lines_strip_crlf_terminators() {
        let record = Record::new(b"[Event \"x\"]\r\n1. e4 e5\n*");
        let lines: Vec<&[u8]> = record.lines().collect();
        assert_eq!(lines, vec![&b"[Event \"x\"]"[..], &b"1. e4 e5"[..], &b"*"[..]]);
    }
}
