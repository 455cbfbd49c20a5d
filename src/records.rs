//! Streaming record splitter.
//!
//! Reads one line at a time from a `BufRead` and hands out one record at a
//! time. Buffers are reused between records, so memory stays proportional to
//! the largest single record rather than to the input.

use std::io::{self, BufRead};
use std::mem;

use crate::config::RecordBoundary;
use crate::data::Record;
use crate::utils::{is_blank_line, is_tag_line, strip_line_ending};

/// Splits a byte stream into records using a `RecordBoundary` convention.
pub struct RecordSplitter<R> {
    reader: R,
    boundary: RecordBoundary,
    record: Vec<u8>,
    line: Vec<u8>,
    carry: Option<Vec<u8>>,
    records_read: u64,
    bytes_read: u64,
}

impl<R: BufRead> RecordSplitter<R> {
    /// Create a splitter over `reader`.
    pub fn new(reader: R, boundary: RecordBoundary) -> Self {
        Self {
            reader,
            boundary,
            record: Vec::new(),
            line: Vec::new(),
            carry: None,
            records_read: 0,
            bytes_read: 0,
        }
    }

    /// Number of records handed out so far.
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Number of bytes consumed from the reader so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Read the next record, or `None` at end of stream.
    ///
    /// A stream that ends mid-record still yields that record. Runs of blank
    /// lines never yield empty records.
    pub fn next_record(&mut self) -> io::Result<Option<Record<'_>>> {
        self.record.clear();
        let mut tags_only = true;
        let mut pending_blank = false;

        if let Some(carried) = self.carry.take() {
            self.record.extend_from_slice(&carried);
            self.line = carried;
        }

        loop {
            self.line.clear();
            let read = self.reader.read_until(b'\n', &mut self.line)?;
            if read == 0 {
                break;
            }
            self.bytes_read += read as u64;
            let content = strip_line_ending(&self.line);

            if is_blank_line(content) {
                if self.record.is_empty() {
                    continue;
                }
                match self.boundary {
                    RecordBoundary::BlankLine => break,
                    RecordBoundary::PgnGame if tags_only => {
                        pending_blank = true;
                        continue;
                    }
                    RecordBoundary::PgnGame => break,
                }
            }

            let tag_line = is_tag_line(content);
            if pending_blank {
                if tag_line {
                    // Tag section of the next game; hold it for the next call.
                    self.carry = Some(mem::take(&mut self.line));
                    break;
                }
                self.record.push(b'\n');
                pending_blank = false;
            }
            if !tag_line {
                tags_only = false;
            }
            self.record.extend_from_slice(&self.line);
        }

        if self.record.is_empty() {
            return Ok(None);
        }
        self.records_read += 1;
        Ok(Some(Record::new(&self.record)))
    }
}
