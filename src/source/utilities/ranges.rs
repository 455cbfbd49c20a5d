//! Byte-range planning for seekable sources.
//!
//! Nominal cut points are spaced evenly across the source and then moved
//! forward to the start of the next line that is guaranteed to begin a new
//! record under the active `RecordBoundary`:
//! - `BlankLine`: any non-blank line directly after a blank line.
//! - `PgnGame`: a tag-pair line directly after a blank line.
//!
//! Ranges never cut through a record, so tallying every range and merging the
//! results equals tallying the whole source.

use std::io::{self, BufRead, Seek, SeekFrom};
use std::ops::Range;

use crate::config::RecordBoundary;
use crate::utils::{is_blank_line, is_tag_line, strip_line_ending};

/// Plan up to `shards` contiguous ranges covering `0..len`.
///
/// Returns fewer ranges when the source has too few safe cut points.
pub fn plan_ranges<R>(
    reader: &mut R,
    len: u64,
    shards: usize,
    boundary: RecordBoundary,
) -> io::Result<Vec<Range<u64>>>
where
    R: BufRead + Seek,
{
    if shards <= 1 || len == 0 {
        return Ok(vec![0..len]);
    }
    let mut cuts = Vec::with_capacity(shards - 1);
    let mut last = 0u64;
    for k in 1..shards {
        let nominal = ((len as u128 * k as u128) / shards as u128) as u64;
        let from = nominal.max(last);
        match next_record_start(reader, from, boundary)? {
            Some(cut) if cut > last && cut < len => {
                cuts.push(cut);
                last = cut;
            }
            Some(_) => continue,
            None => break,
        }
    }

    let mut ranges = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0u64;
    for cut in cuts {
        ranges.push(start..cut);
        start = cut;
    }
    ranges.push(start..len);
    Ok(ranges)
}

/// Offset of the first safe record start strictly after the line containing `from`.
///
/// The line containing `from` is always skipped, so the blank-line check only
/// ever looks at lines that were read in full.
pub fn next_record_start<R>(
    reader: &mut R,
    from: u64,
    boundary: RecordBoundary,
) -> io::Result<Option<u64>>
where
    R: BufRead + Seek,
{
    reader.seek(SeekFrom::Start(from))?;
    let mut line = Vec::new();
    let mut offset = from;
    if from > 0 {
        let skipped = reader.read_until(b'\n', &mut line)?;
        if skipped == 0 {
            return Ok(None);
        }
        offset += skipped as u64;
    }

    let mut prev_blank = false;
    loop {
        line.clear();
        let read = reader.read_until(b'\n', &mut line)?;
        if read == 0 {
            return Ok(None);
        }
        let content = strip_line_ending(&line);
        let blank = is_blank_line(content);
        if prev_blank && !blank && starts_record(content, boundary) {
            return Ok(Some(offset));
        }
        prev_blank = blank;
        offset += read as u64;
    }
}

fn starts_record(line: &[u8], boundary: RecordBoundary) -> bool {
    match boundary {
        RecordBoundary::BlankLine => true,
        RecordBoundary::PgnGame => is_tag_line(line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn games(count: usize) -> String {
        (0..count)
            .map(|idx| format!("[Round \"{idx}\"]\n[Result \"1-0\"]\n\n1. e4 e5 1-0\n"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn single_shard_covers_whole_source() {
        let text = games(3);
        let mut cursor = Cursor::new(text.as_bytes());
        let ranges =
            plan_ranges(&mut cursor, text.len() as u64, 1, RecordBoundary::PgnGame).unwrap();
        assert_eq!(ranges, vec![0..text.len() as u64]);
    }

    #[test]
    fn cuts_land_on_tag_lines_after_blank_lines() {
        let text = games(20);
        let len = text.len() as u64;
        let mut cursor = Cursor::new(text.as_bytes());
        let ranges = plan_ranges(&mut cursor, len, 4, RecordBoundary::PgnGame).unwrap();
        assert_eq!(ranges.len(), 4);
        assert_eq!(ranges.first().unwrap().start, 0);
        assert_eq!(ranges.last().unwrap().end, len);
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
            let cut = pair[1].start as usize;
            assert!(text[cut..].starts_with("[Round"));
            assert!(text[..cut].ends_with("1-0\n\n"));
        }
    }

    #[test]
    fn never_cuts_between_tags_and_movetext() {
        let text = games(50);
        let mut cursor = Cursor::new(text.as_bytes());
        let ranges =
            plan_ranges(&mut cursor, text.len() as u64, 16, RecordBoundary::PgnGame).unwrap();
        for range in &ranges[1..] {
            assert!(text[range.start as usize..].starts_with("[Round"));
        }
    }

    #[test]
    fn sources_without_boundaries_stay_whole() {
        let text = "[Result \"1-0\"]\n1. e4 e5\n2. Nf3 Nc6\n".repeat(10);
        let mut cursor = Cursor::new(text.as_bytes());
        let ranges =
            plan_ranges(&mut cursor, text.len() as u64, 4, RecordBoundary::PgnGame).unwrap();
        assert_eq!(ranges, vec![0..text.len() as u64]);
    }

    #[test]
    fn blank_line_mode_cuts_before_any_non_blank_line() {
        let text = "a\nb\n\nc\nd\n\ne\nf\n\ng\n";
        let mut cursor = Cursor::new(text.as_bytes());
        let start = next_record_start(&mut cursor, 1, RecordBoundary::BlankLine).unwrap();
        assert_eq!(start, Some(5));
        let start = next_record_start(&mut cursor, 0, RecordBoundary::BlankLine).unwrap();
        assert_eq!(start, Some(5));
        let none = next_record_start(&mut cursor, 16, RecordBoundary::BlankLine).unwrap();
        assert_eq!(none, None);
    }
}
