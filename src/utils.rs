//! Byte-level line helpers shared by the splitter, extractor, and shard planner.

use crate::constants::pgn::{TAG_CLOSE, TAG_OPEN};

/// Strip a trailing `\n` or `\r\n` from a line.
pub fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// True when the line holds nothing but ASCII whitespace.
pub fn is_blank_line(line: &[u8]) -> bool {
    line.iter().all(|b| b.is_ascii_whitespace())
}

/// True when the line looks like a PGN tag pair (`[Name "Value"]`).
///
/// Only the brackets are checked; `extract::visit_tags` parses the pairs.
pub fn is_tag_line(line: &[u8]) -> bool {
    let trimmed = line.trim_ascii();
    trimmed.first() == Some(&TAG_OPEN) && trimmed.last() == Some(&TAG_CLOSE)
}

/// Percentage of `part` over `whole`, rounded to one decimal; 0 when `whole` is 0.
pub fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    ((part as f64 / whole as f64) * 1000.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_helpers_handle_whitespace_and_brackets() {
        assert_eq!(strip_line_ending(b"abc\r\n"), b"abc");
        assert_eq!(strip_line_ending(b"abc\n"), b"abc");
        assert_eq!(strip_line_ending(b"abc"), b"abc");
        assert!(is_blank_line(b""));
        assert!(is_blank_line(b" \t\r"));
        assert!(!is_blank_line(b" x "));
        assert!(is_tag_line(b"  [Result \"1-0\"]  "));
        assert!(!is_tag_line(b"1. e4 [%clk 0:03:00]"));
    }

    #[test]
    fn percent_rounds_to_one_decimal() {
        assert_eq!(percent(1, 3), 33.3);
        assert_eq!(percent(2, 3), 66.7);
        assert_eq!(percent(5, 0), 0.0);
    }
}
