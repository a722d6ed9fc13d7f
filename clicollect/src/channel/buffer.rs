//! Accumulation buffer with tail-window prompt search.
//!
//! Prompt detection only looks at the last `search_depth` bytes of the
//! buffer. Long command output (full routing tables, debug dumps) would
//! otherwise be rescanned on every chunk.

use std::borrow::Cow;
use std::fmt;
use std::ops::Range;

use vte::{Parser, Perform};

/// Buffer for accumulating shell output one chunk at a time.
///
/// Bytes are optionally passed through a `vte` parser that drops escape
/// sequences. The parser persists across calls to [`extend`](Self::extend),
/// so a sequence split between two reads is still removed. Malformed UTF-8
/// never fails: the parser substitutes U+FFFD, and the raw path decodes with
/// [`String::from_utf8_lossy`].
pub struct ByteAccumulator {
    /// The accumulated output.
    buffer: Vec<u8>,

    /// How many bytes from the end to search for prompts.
    search_depth: usize,

    /// ANSI stripper, present when stripping is enabled.
    parser: Option<Parser>,
}

impl ByteAccumulator {
    /// Create an accumulator that stores bytes exactly as received.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            search_depth,
            parser: None,
        }
    }

    /// Create an accumulator that strips ANSI escape sequences.
    pub fn stripping_ansi(search_depth: usize) -> Self {
        Self {
            parser: Some(Parser::new()),
            ..Self::new(search_depth)
        }
    }

    /// Append a chunk of received data.
    pub fn extend(&mut self, data: &[u8]) {
        match self.parser.as_mut() {
            Some(parser) => {
                let mut printer = Printer(&mut self.buffer);
                parser.advance(&mut printer, data);
            }
            None => self.buffer.extend_from_slice(data),
        }
    }

    /// The last `search_depth` bytes of the buffer.
    pub fn tail(&self) -> &[u8] {
        let start = self.buffer.len().saturating_sub(self.search_depth);
        &self.buffer[start..]
    }

    /// Remove a byte range from the buffer (used to elide pager prompts).
    pub fn elide(&mut self, range: Range<usize>) {
        if range.start <= range.end && range.end <= self.buffer.len() {
            self.buffer.drain(range);
        }
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the buffer contents as a string (lossy UTF-8 conversion).
    pub fn as_str_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Get the search depth setting.
    pub fn search_depth(&self) -> usize {
        self.search_depth
    }
}

impl Default for ByteAccumulator {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl fmt::Debug for ByteAccumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteAccumulator")
            .field("len", &self.buffer.len())
            .field("search_depth", &self.search_depth)
            .field("strip_ansi", &self.parser.is_some())
            .finish()
    }
}

/// `vte` performer that keeps printable text and line control characters.
struct Printer<'a>(&'a mut Vec<u8>);

impl Perform for Printer<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.0.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        // \b, \t, \n, \r
        if matches!(byte, 0x08 | b'\t' | b'\n' | b'\r') {
            self.0.push(byte);
        }
    }
}
