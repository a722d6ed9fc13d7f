//! Channel layer: framing an unframed shell stream.
//!
//! This module holds the pieces that decide where one command's output ends:
//! output accumulation, prompt matching, pager detection and the bounded
//! read loop that combines them.

mod buffer;
mod pager;
mod patterns;
mod reader;

pub use buffer::ByteAccumulator;
pub use pager::{DEFAULT_PAGER_SENTINELS, PAGER_CONTINUE, PagerDetector};
pub use patterns::{GENERIC_PROMPT, PromptMatcher, PromptPattern};
pub use reader::{BoundedReader, ReadBuffer, ReadOutcome, ReadStatus, ReadTermination};
