//! Prompt discovery and matching.

use regex::bytes::Regex;

use crate::error::ChannelError;

/// Pattern used before the device prompt is known: any `#` or `>` at the
/// end of the buffer.
pub const GENERIC_PROMPT: &str = r"[#>]\s*$";

/// Characters that terminate a device prompt.
const PROMPT_GLYPHS: &[char] = &['#', '>'];

/// Trait for prompt matching - regex by default, extensible for custom parsers.
pub trait PromptMatcher: Send + Sync {
    /// Returns the byte offset in `data` where the match ends, or None if no
    /// match.
    fn find_match(&self, data: &[u8]) -> Option<usize>;

    /// Check if the data matches the pattern.
    fn is_match(&self, data: &[u8]) -> bool {
        self.find_match(data).is_some()
    }
}

/// A prompt regex derived once per session from the banner.
///
/// The pattern is `<hostname literal>(?s-u:.){0,K}[#>]\s*$`, where K counts
/// bytes. The bounded span lets contextual suffixes such as `(global)` or
/// `(settings)` sit between the hostname and the glyph without letting
/// arbitrary output ending in `#` or `>` match. Matching runs on raw bytes,
/// so malformed UTF-8 never needs decoding and offsets are exact.
#[derive(Debug, Clone)]
pub struct PromptPattern {
    regex: Regex,

    /// The hostname literal the pattern was built from (empty if generic).
    literal: String,
}

impl PromptPattern {
    /// The fallback pattern that matches any trailing prompt glyph.
    pub fn generic() -> Self {
        Self {
            regex: Regex::new(GENERIC_PROMPT).expect("generic prompt pattern is valid"),
            literal: String::new(),
        }
    }

    /// Derive a prompt pattern from the text printed after login.
    ///
    /// Uses the last non-blank line of `sample`. The line's own trailing glyph
    /// and whitespace are removed so the literal is just the hostname part.
    /// Falls back to [`generic`](Self::generic) when nothing usable remains.
    pub fn derive(sample: &str, slack: usize) -> Result<Self, ChannelError> {
        let Some(literal) = prompt_literal(sample) else {
            return Ok(Self::generic());
        };

        let pattern = format!(r"{}(?s-u:.){{0,{}}}[#>]\s*$", regex::escape(literal), slack);
        Ok(Self {
            regex: Regex::new(&pattern)?,
            literal: literal.to_string(),
        })
    }

    /// Check the pattern against decoded text.
    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text.as_bytes())
    }

    /// The hostname literal, or `None` for the generic pattern.
    pub fn literal(&self) -> Option<&str> {
        if self.literal.is_empty() {
            None
        } else {
            Some(&self.literal)
        }
    }

    /// Get a reference to the underlying regex.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

impl Default for PromptPattern {
    fn default() -> Self {
        Self::generic()
    }
}

impl PromptMatcher for PromptPattern {
    fn find_match(&self, data: &[u8]) -> Option<usize> {
        self.regex.find(data).map(|m| m.end())
    }
}

/// Pick the hostname literal out of a banner sample.
fn prompt_literal(sample: &str) -> Option<&str> {
    let line = sample.lines().rev().map(str::trim).find(|l| !l.is_empty())?;
    let literal = line.trim_end_matches(PROMPT_GLYPHS).trim_end();
    (!literal.is_empty()).then_some(literal)
}
