//! Detection of "more" pager prompts.
//!
//! Pager prompts are matched as raw substrings rather than lines. They are
//! usually printed mid-line without a trailing newline, so a line-anchored
//! match would miss them. A sentinel only counts as a pending prompt when
//! nothing but whitespace follows it.

use std::fmt;
use std::ops::Range;

use memchr::memmem::Finder;

/// Pager sentinels printed by FortiOS and similar CLIs.
pub const DEFAULT_PAGER_SENTINELS: &[&str] = &[
    "--More--",
    "--More-- ",
    "More ",
    "Press any key to continue",
];

/// Keystroke sent to advance a pager.
pub const PAGER_CONTINUE: &[u8] = b" ";

/// Recognizes pager sentinels in accumulated output.
pub struct PagerDetector {
    finders: Vec<Finder<'static>>,
}

impl PagerDetector {
    /// Build a detector for the given sentinels. Empty sentinels are ignored.
    pub fn new<I, S>(sentinels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let finders = sentinels
            .into_iter()
            .filter(|s| !s.as_ref().is_empty())
            .map(|s| Finder::new(s.as_ref().as_bytes()).into_owned())
            .collect();
        Self { finders }
    }

    /// Whether `buffer` contains any sentinel.
    pub fn is_pager_prompt(&self, buffer: &[u8]) -> bool {
        self.finders.iter().any(|f| f.find(buffer).is_some())
    }

    /// Locate a sentinel still waiting for a keystroke.
    ///
    /// A pager blocks further output, so a pending prompt is the last thing in
    /// the buffer, followed at most by whitespace. Sentinels that appear in
    /// ordinary text with output after them are ignored. Only matches starting
    /// at or after `from` count. When several sentinels qualify the earliest
    /// wins, and the longest at that offset, so `--More-- ` is preferred over
    /// `--More--`.
    pub fn find_pending(&self, buffer: &[u8], from: usize) -> Option<Range<usize>> {
        let content_end = buffer
            .iter()
            .rposition(|b| !b.is_ascii_whitespace())
            .map_or(0, |i| i + 1);

        self.finders
            .iter()
            .filter_map(|f| {
                let len = f.needle().len();
                let start = content_end.saturating_sub(len).max(from).min(buffer.len());
                f.find(&buffer[start..]).map(|at| start + at..start + at + len)
            })
            .min_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)))
    }

    /// Number of configured sentinels.
    pub fn len(&self) -> usize {
        self.finders.len()
    }

    /// Whether no sentinels are configured.
    pub fn is_empty(&self) -> bool {
        self.finders.is_empty()
    }
}

impl Default for PagerDetector {
    fn default() -> Self {
        Self::new(DEFAULT_PAGER_SENTINELS)
    }
}

impl fmt::Debug for PagerDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sentinels: Vec<_> = self
            .finders
            .iter()
            .map(|f| String::from_utf8_lossy(f.needle()))
            .collect();
        f.debug_struct("PagerDetector")
            .field("sentinels", &sentinels)
            .finish()
    }
}
