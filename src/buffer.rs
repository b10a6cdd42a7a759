//! Line buffer: decomposes arbitrary byte chunks into complete
//! newline-terminated lines plus at most one trailing partial fragment.
//!
//! Complete lines are the only unit of work the scheduler ever writes; the
//! trailing fragment stays buffered until a later chunk terminates it, and is
//! discarded (never written) on `end`/`destroy`.

use std::collections::VecDeque;

/// High-water mark in buffered bytes above which `write` signals backpressure.
pub const HIGH_WATER_MARK: usize = 16_387;

#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    lines: VecDeque<Vec<u8>>,
    partial: Vec<u8>,
}

impl LineBuffer {
    /// Split `chunk` on `\n` (separator inclusive) and queue the results.
    ///
    /// The first completed segment absorbs any in-progress fragment; a
    /// trailing unterminated segment extends (or starts) the fragment.
    /// Empty chunks are no-ops.
    pub fn ingest(&mut self, chunk: &[u8]) {
        for segment in chunk.split_inclusive(|&b| b == b'\n') {
            if segment.ends_with(b"\n") {
                if self.partial.is_empty() {
                    self.lines.push_back(segment.to_vec());
                } else {
                    let mut line = std::mem::take(&mut self.partial);
                    line.extend_from_slice(segment);
                    self.lines.push_back(line);
                }
            } else {
                self.partial.extend_from_slice(segment);
            }
        }
    }

    /// Pop the oldest complete line, if any. The fragment is never returned.
    pub fn pop_line(&mut self) -> Option<Vec<u8>> {
        self.lines.pop_front()
    }

    pub fn has_complete_line(&self) -> bool {
        !self.lines.is_empty()
    }

    #[cfg(test)]
    pub fn partial_len(&self) -> usize {
        self.partial.len()
    }

    /// Discard all queued lines and the fragment.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.partial.clear();
    }
}
