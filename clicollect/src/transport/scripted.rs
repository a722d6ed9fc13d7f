//! In-memory transport that replays canned device output.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use bytes::Bytes;
use tokio::time::{Instant, sleep};

use super::Transport;
use crate::error::TransportError;

/// One entry of scripted output.
#[derive(Debug)]
enum Step {
    Data(Bytes),
    /// Nothing arrives until this long after the step is first reached.
    Pause(Duration),
}

/// Replays scripted replies for the bytes it is sent.
///
/// Replies are consumed in order: when a send equals the head of the reply
/// script, that entry's chunks are queued for delivery, one chunk per
/// [`recv_available`](Transport::recv_available) call.
#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    pending: VecDeque<Step>,
    pause_until: Option<Instant>,
    replies: VecDeque<(Vec<u8>, Vec<Bytes>)>,
    failing_sends: Vec<Vec<u8>>,
    endless: Option<Bytes>,
    disconnect_when_drained: bool,
    pub sent: Vec<Vec<u8>>,
    pub closed: bool,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output available immediately after connecting.
    pub fn banner(mut self, banner: &str) -> Self {
        self.pending.push_back(Step::Data(Bytes::copy_from_slice(banner.as_bytes())));
        self
    }

    /// Hold back the rest of the queued output for `duration`.
    pub fn pause(mut self, duration: Duration) -> Self {
        self.pending.push_back(Step::Pause(duration));
        self
    }

    /// Queue `chunks` once `input` is sent.
    pub fn reply(mut self, input: &str, chunks: &[&str]) -> Self {
        let chunks = chunks
            .iter()
            .map(|c| Bytes::copy_from_slice(c.as_bytes()))
            .collect();
        self.replies.push_back((input.as_bytes().to_vec(), chunks));
        self
    }

    /// Make sends of `input` fail.
    pub fn fail_send(mut self, input: &str) -> Self {
        self.failing_sends.push(input.as_bytes().to_vec());
        self
    }

    /// Deliver `chunk` every 10ms once the queue is drained, forever.
    pub fn endless(mut self, chunk: &str) -> Self {
        self.endless = Some(Bytes::copy_from_slice(chunk.as_bytes()));
        self
    }

    /// Report a broken stream once the queue is drained.
    pub fn disconnect_when_drained(mut self) -> Self {
        self.disconnect_when_drained = true;
        self
    }

    /// How many times `input` was sent.
    pub fn sent_count(&self, input: &str) -> usize {
        self.sent.iter().filter(|s| s.as_slice() == input.as_bytes()).count()
    }
}

impl Transport for ScriptedTransport {
    async fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        if self.failing_sends.iter().any(|f| f.as_slice() == data) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "scripted send failure").into());
        }
        self.sent.push(data.to_vec());
        if self.replies.front().is_some_and(|(input, _)| input.as_slice() == data) {
            if let Some((_, chunks)) = self.replies.pop_front() {
                self.pending.extend(chunks.into_iter().map(Step::Data));
            }
        }
        Ok(())
    }

    async fn recv_available(&mut self, wait: Duration) -> Result<Bytes, TransportError> {
        while let Some(step) = self.pending.front() {
            match step {
                Step::Pause(duration) => {
                    let until = *self.pause_until.get_or_insert_with(|| Instant::now() + *duration);
                    let now = Instant::now();
                    if now < until {
                        sleep((until - now).min(wait)).await;
                        return Ok(Bytes::new());
                    }
                    self.pending.pop_front();
                    self.pause_until = None;
                }
                Step::Data(chunk) => {
                    let chunk = chunk.clone();
                    self.pending.pop_front();
                    return Ok(chunk);
                }
            }
        }
        if let Some(chunk) = &self.endless {
            sleep(Duration::from_millis(10)).await;
            return Ok(chunk.clone());
        }
        if self.disconnect_when_drained {
            return Err(TransportError::Disconnected);
        }
        Ok(Bytes::new())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.closed = true;
        Ok(())
    }
}
