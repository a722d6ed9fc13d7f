//! Bounded read loop over an unframed shell stream.
//!
//! A read ends on the first of three conditions: the prompt reappears at the
//! end of the buffer, the stream goes quiet for `idle_exit_after`, or the
//! invocation's `max_wait` elapses. Pager prompts met along the way are
//! acknowledged and reading continues on the same buffer.

use std::borrow::Cow;
use std::time::Duration;

use log::{debug, trace, warn};
use tokio::time::{Instant, sleep};

use super::buffer::ByteAccumulator;
use super::pager::{PAGER_CONTINUE, PagerDetector};
use super::patterns::PromptMatcher;
use crate::session::SessionConfig;
use crate::transport::Transport;

/// Why a read stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadTermination {
    /// The prompt matched at the end of the buffer.
    PromptFound,

    /// No bytes arrived for the idle threshold.
    IdleExpired,

    /// The invocation's ceiling elapsed while data was still arriving.
    MaxWaitExceeded,

    /// The transport reported a broken stream.
    Disconnected(String),
}

impl ReadTermination {
    /// Whether another read could still produce output.
    pub fn is_resumable(&self) -> bool {
        matches!(self, Self::MaxWaitExceeded)
    }
}

/// How one reader invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadStatus {
    /// Which condition ended the read.
    pub termination: ReadTermination,

    /// Continuation keystrokes sent during this invocation.
    pub pager_continuations: usize,

    /// Time spent in the read.
    pub elapsed: Duration,
}

/// Bytes collected by one read plus how it ended.
#[derive(Debug)]
pub struct ReadOutcome {
    /// The data that was read.
    pub data: Vec<u8>,

    /// Which condition ended the read.
    pub termination: ReadTermination,

    /// Continuation keystrokes sent for pager prompts.
    pub pager_continuations: usize,

    /// Time spent in the read.
    pub elapsed: Duration,
}

impl ReadOutcome {
    /// Get the data as a string (lossy UTF-8).
    pub fn as_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }
}

/// Output of one command, carried across reader invocations.
///
/// Prompt and pager searches run over everything collected so far, so a
/// prompt or pager sentinel split across two invocations is still seen.
#[derive(Debug)]
pub struct ReadBuffer {
    bytes: ByteAccumulator,

    /// Offset where the next pager search starts. Everything before it has
    /// been acknowledged already.
    pager_scan_from: usize,
}

impl ReadBuffer {
    /// Create an empty buffer using the session's ANSI and search settings.
    pub fn new(config: &SessionConfig) -> Self {
        let bytes = if config.strip_ansi {
            ByteAccumulator::stripping_ansi(config.search_depth)
        } else {
            ByteAccumulator::new(config.search_depth)
        };
        Self {
            bytes,
            pager_scan_from: 0,
        }
    }

    /// The collected bytes.
    pub fn as_slice(&self) -> &[u8] {
        self.bytes.as_slice()
    }

    /// The collected bytes as text (lossy UTF-8).
    pub fn as_str_lossy(&self) -> Cow<'_, str> {
        self.bytes.as_str_lossy()
    }

    /// Number of bytes collected.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether nothing has been collected.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Take the collected bytes, leaving the buffer empty.
    pub fn take(&mut self) -> Vec<u8> {
        self.pager_scan_from = 0;
        self.bytes.take()
    }
}

/// Read loop combining prompt matching, pager handling and the timeout policy.
pub struct BoundedReader<'a> {
    prompt: &'a dyn PromptMatcher,
    pager: &'a PagerDetector,
    config: &'a SessionConfig,
}

impl<'a> BoundedReader<'a> {
    /// Create a reader for one session's prompt, pager and timings.
    pub fn new(
        prompt: &'a dyn PromptMatcher,
        pager: &'a PagerDetector,
        config: &'a SessionConfig,
    ) -> Self {
        Self {
            prompt,
            pager,
            config,
        }
    }

    /// Read into a fresh buffer until the prompt, idle expiry, `max_wait`, or
    /// a broken stream.
    pub async fn read<T: Transport>(&self, transport: &mut T, max_wait: Duration) -> ReadOutcome {
        let mut output = ReadBuffer::new(self.config);
        let status = self.read_into(transport, &mut output, max_wait).await;
        ReadOutcome {
            data: output.take(),
            termination: status.termination,
            pager_continuations: status.pager_continuations,
            elapsed: status.elapsed,
        }
    }

    /// Read more output into `output`, with the same stop conditions as
    /// [`read`](Self::read).
    ///
    /// Never fails: transport errors end the read as
    /// [`ReadTermination::Disconnected`] and keep whatever arrived before.
    pub async fn read_into<T: Transport>(
        &self,
        transport: &mut T,
        output: &mut ReadBuffer,
        max_wait: Duration,
    ) -> ReadStatus {
        let start = Instant::now();
        let mut last_data = start;
        let mut pager_continuations = 0;

        let termination = loop {
            let idle_left = self.config.idle_exit_after.saturating_sub(last_data.elapsed());
            let max_left = max_wait.saturating_sub(start.elapsed());
            let wait = self.config.read_timeout.min(idle_left).min(max_left);

            let chunk = match transport.recv_available(wait).await {
                Ok(chunk) => chunk,
                Err(e) => {
                    warn!("read: transport failed after {} bytes: {}", output.len(), e);
                    break ReadTermination::Disconnected(e.to_string());
                }
            };

            if chunk.is_empty() {
                sleep(self.config.poll_interval).await;
            } else {
                output.bytes.extend(&chunk);
                last_data = Instant::now();
                trace!("read: chunk {} bytes, buffer {} bytes", chunk.len(), output.len());

                if self.prompt.is_match(output.bytes.tail()) {
                    debug!("read: prompt found after {:?}", start.elapsed());
                    break ReadTermination::PromptFound;
                }

                let pending = self
                    .pager
                    .find_pending(output.as_slice(), output.pager_scan_from);
                if let Some(sentinel) = pending {
                    debug!(
                        "read: pager prompt {:?} detected, sending continuation",
                        String::from_utf8_lossy(&output.as_slice()[sentinel.clone()])
                    );
                    if self.config.strip_pager_prompts {
                        output.bytes.elide(sentinel);
                    }
                    if let Err(e) = transport.send(PAGER_CONTINUE).await {
                        warn!("read: failed to acknowledge pager prompt: {}", e);
                    }
                    pager_continuations += 1;
                    output.pager_scan_from = output.len();
                    sleep(self.config.pager_pause).await;
                    last_data = Instant::now();
                }
            }

            if last_data.elapsed() >= self.config.idle_exit_after {
                debug!("read: idle for {:?}, assuming complete", self.config.idle_exit_after);
                break ReadTermination::IdleExpired;
            }
            if start.elapsed() >= max_wait {
                debug!("read: max wait {:?} exceeded", max_wait);
                break ReadTermination::MaxWaitExceeded;
            }
        };

        ReadStatus {
            termination,
            pager_continuations,
            elapsed: start.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::PromptPattern;
    use crate::transport::scripted::ScriptedTransport;

    fn config() -> SessionConfig {
        SessionConfig::default()
            .with_idle_exit_after(Duration::from_secs(2))
            .with_max_wait_per_read(Duration::from_secs(10))
    }

    fn fgt_prompt() -> PromptPattern {
        PromptPattern::derive("FGT60E # ", 30).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_at_prompt() {
        let config = config();
        let prompt = fgt_prompt();
        let pager = PagerDetector::default();
        let reader = BoundedReader::new(&prompt, &pager, &config);
        let mut transport = ScriptedTransport::new()
            .banner("get system status\r\nVersion: ")
            .banner("FortiGate-60E v7.2.5\r\n")
            .banner("FGT60E # ");

        let outcome = reader.read(&mut transport, config.max_wait_per_read).await;
        assert_eq!(outcome.termination, ReadTermination::PromptFound);
        assert_eq!(
            outcome.as_str(),
            "get system status\r\nVersion: FortiGate-60E v7.2.5\r\nFGT60E # "
        );
        assert_eq!(outcome.pager_continuations, 0);
        assert!(outcome.elapsed < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_transport_returns_within_max_wait() {
        let config = config();
        let prompt = fgt_prompt();
        let pager = PagerDetector::default();
        let reader = BoundedReader::new(&prompt, &pager, &config);
        let mut transport = ScriptedTransport::new();

        let max_wait = Duration::from_secs(5);
        let started = Instant::now();
        let outcome = reader.read(&mut transport, max_wait).await;
        assert_eq!(outcome.termination, ReadTermination::IdleExpired);
        assert!(outcome.data.is_empty());
        assert!(started.elapsed() <= max_wait + config.poll_interval);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_expiry_without_prompt() {
        let config = config();
        let prompt = fgt_prompt();
        let pager = PagerDetector::default();
        let reader = BoundedReader::new(&prompt, &pager, &config);
        let mut transport = ScriptedTransport::new().banner("partial output with no prompt");

        let outcome = reader.read(&mut transport, config.max_wait_per_read).await;
        assert_eq!(outcome.termination, ReadTermination::IdleExpired);
        assert_eq!(outcome.as_str(), "partial output with no prompt");
        let idle = config.idle_exit_after;
        assert!(outcome.elapsed >= idle && outcome.elapsed <= idle + config.poll_interval * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_wait_with_streaming_output() {
        let config = config();
        let prompt = fgt_prompt();
        let pager = PagerDetector::default();
        let reader = BoundedReader::new(&prompt, &pager, &config);
        let mut transport = ScriptedTransport::new().endless("diag line\r\n");

        let max_wait = Duration::from_secs(1);
        let outcome = reader.read(&mut transport, max_wait).await;
        assert_eq!(outcome.termination, ReadTermination::MaxWaitExceeded);
        assert!(outcome.termination.is_resumable());
        assert!(outcome.as_str().starts_with("diag line\r\n"));
        assert!(outcome.elapsed < max_wait + Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pager_is_acknowledged() {
        let config = config();
        let prompt = fgt_prompt();
        let pager = PagerDetector::default();
        let reader = BoundedReader::new(&prompt, &pager, &config);
        let mut transport = ScriptedTransport::new()
            .banner("page one\r\n--More-- ")
            .reply(" ", &["\rpage two\r\nFGT60E # "]);

        let outcome = reader.read(&mut transport, config.max_wait_per_read).await;
        assert_eq!(outcome.termination, ReadTermination::PromptFound);
        assert_eq!(outcome.pager_continuations, 1);
        assert_eq!(transport.sent_count(" "), 1);
        assert_eq!(outcome.as_str(), "page one\r\n--More-- \rpage two\r\nFGT60E # ");
    }

    #[tokio::test(start_paused = true)]
    async fn test_pager_prompt_elided() {
        let config = config().with_strip_pager_prompts(true);
        let prompt = fgt_prompt();
        let pager = PagerDetector::default();
        let reader = BoundedReader::new(&prompt, &pager, &config);
        let mut transport = ScriptedTransport::new()
            .banner("page one\r\n--More-- ")
            .reply(" ", &["page two\r\nFGT60E # "]);

        let outcome = reader.read(&mut transport, config.max_wait_per_read).await;
        assert_eq!(outcome.as_str(), "page one\r\npage two\r\nFGT60E # ");
    }

    #[tokio::test(start_paused = true)]
    async fn test_sentinel_split_across_chunks() {
        let config = config();
        let prompt = fgt_prompt();
        let pager = PagerDetector::default();
        let reader = BoundedReader::new(&prompt, &pager, &config);
        let mut transport = ScriptedTransport::new()
            .banner("rows\r\n--Mo")
            .banner("re-- ")
            .reply(" ", &["\rlast\r\nFGT60E # "]);

        let outcome = reader.read(&mut transport, config.max_wait_per_read).await;
        assert_eq!(outcome.termination, ReadTermination::PromptFound);
        assert_eq!(transport.sent_count(" "), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unanswered_pager_ends_by_idle() {
        let config = config();
        let prompt = fgt_prompt();
        let pager = PagerDetector::default();
        let reader = BoundedReader::new(&prompt, &pager, &config);
        let mut transport = ScriptedTransport::new().banner("rows\r\n--More-- ");

        let outcome = reader.read(&mut transport, config.max_wait_per_read).await;
        assert_eq!(outcome.termination, ReadTermination::IdleExpired);
        assert_eq!(outcome.pager_continuations, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_keeps_partial_output() {
        let config = config();
        let prompt = fgt_prompt();
        let pager = PagerDetector::default();
        let reader = BoundedReader::new(&prompt, &pager, &config);
        let mut transport = ScriptedTransport::new()
            .banner("half a line")
            .disconnect_when_drained();

        let outcome = reader.read(&mut transport, config.max_wait_per_read).await;
        assert!(matches!(outcome.termination, ReadTermination::Disconnected(_)));
        assert_eq!(outcome.as_str(), "half a line");
    }

    #[tokio::test(start_paused = true)]
    async fn test_ansi_stripped_before_prompt_match() {
        let config = config();
        let prompt = fgt_prompt();
        let pager = PagerDetector::default();
        let reader = BoundedReader::new(&prompt, &pager, &config);
        let mut transport = ScriptedTransport::new().banner("ok\r\n\x1b[1mFGT60E\x1b[0m # \x1b[K");

        let outcome = reader.read(&mut transport, config.max_wait_per_read).await;
        assert_eq!(outcome.termination, ReadTermination::PromptFound);
        assert_eq!(outcome.as_str(), "ok\r\nFGT60E # ");
    }

    #[tokio::test(start_paused = true)]
    async fn test_sentinel_split_across_invocations() {
        let config = config();
        let prompt = fgt_prompt();
        let pager = PagerDetector::default();
        let reader = BoundedReader::new(&prompt, &pager, &config);
        let mut transport = ScriptedTransport::new()
            .banner("rows\r\n--Mo")
            .pause(Duration::from_millis(1500))
            .banner("re-- ")
            .reply(" ", &["\rlast\r\nFGT60E # "]);

        let mut output = ReadBuffer::new(&config);
        let first = reader.read_into(&mut transport, &mut output, Duration::from_secs(1)).await;
        assert_eq!(first.termination, ReadTermination::MaxWaitExceeded);
        assert_eq!(first.pager_continuations, 0);

        let second = reader.read_into(&mut transport, &mut output, config.max_wait_per_read).await;
        assert_eq!(second.termination, ReadTermination::PromptFound);
        assert_eq!(second.pager_continuations, 1);
        assert_eq!(transport.sent_count(" "), 1);
        assert_eq!(output.as_str_lossy(), "rows\r\n--More-- \rlast\r\nFGT60E # ");
    }

    #[tokio::test(start_paused = true)]
    async fn test_prompt_split_across_invocations() {
        let config = config();
        let prompt = fgt_prompt();
        let pager = PagerDetector::default();
        let reader = BoundedReader::new(&prompt, &pager, &config);
        let mut transport = ScriptedTransport::new()
            .banner("done\r\nFGT6")
            .pause(Duration::from_millis(1500))
            .banner("0E # ");

        let mut output = ReadBuffer::new(&config);
        let first = reader.read_into(&mut transport, &mut output, Duration::from_secs(1)).await;
        assert_eq!(first.termination, ReadTermination::MaxWaitExceeded);
        let second = reader.read_into(&mut transport, &mut output, config.max_wait_per_read).await;
        assert_eq!(second.termination, ReadTermination::PromptFound);
    }

    #[tokio::test(start_paused = true)]
    async fn test_more_in_ordinary_text_is_kept() {
        let config = config().with_strip_pager_prompts(true);
        let prompt = fgt_prompt();
        let pager = PagerDetector::default();
        let reader = BoundedReader::new(&prompt, &pager, &config);
        let mut transport = ScriptedTransport::new()
            .banner("More than 10 sessions dropped\r\n")
            .banner("total 12\r\nFGT60E # ");

        let outcome = reader.read(&mut transport, config.max_wait_per_read).await;
        assert_eq!(outcome.termination, ReadTermination::PromptFound);
        assert_eq!(outcome.pager_continuations, 0);
        assert_eq!(transport.sent_count(" "), 0);
        assert_eq!(
            outcome.as_str(),
            "More than 10 sessions dropped\r\ntotal 12\r\nFGT60E # "
        );
    }
}
