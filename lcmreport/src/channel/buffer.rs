//! Pattern buffer with tail-only prompt search.
//!
//! Prompt detection only looks at the last N bytes of the accumulated
//! output, so a long `show tech` style response does not turn every
//! incoming chunk into a full rescan.

use bytes::{Bytes, BytesMut};
use regex::bytes::Regex;

/// Buffer for accumulating channel output and searching its tail for a prompt.
#[derive(Debug)]
pub struct PatternBuffer {
    /// The accumulated output buffer.
    buffer: BytesMut,

    /// How many bytes from the end to search for patterns.
    search_depth: usize,
}

impl PatternBuffer {
    /// Create a new pattern buffer with the specified search depth.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            search_depth,
        }
    }

    /// Append raw channel bytes with ANSI escape codes stripped.
    ///
    /// Returns the cleaned bytes that were appended.
    pub fn extend(&mut self, data: &[u8]) -> &[u8] {
        let start = self.buffer.len();
        let cleaned = strip_ansi_escapes::strip(data);
        self.buffer.extend_from_slice(&cleaned);
        &self.buffer[start..]
    }

    /// Search only the last `search_depth` bytes for the pattern.
    pub fn search_tail(&self, pattern: &Regex) -> Option<regex::bytes::Match<'_>> {
        let start = self.buffer.len().saturating_sub(self.search_depth);
        pattern.find(&self.buffer[start..])
    }

    /// Check if the tail contains a pattern match.
    pub fn tail_contains(&self, pattern: &Regex) -> bool {
        self.search_tail(pattern).is_some()
    }

    /// Take the buffer contents and reset.
    pub fn take(&mut self) -> Bytes {
        self.buffer.split().freeze()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}
