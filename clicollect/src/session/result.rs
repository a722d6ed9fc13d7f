//! Result type for one executed command.

use std::fmt;
use std::time::Duration;

use serde::{Serialize, Serializer};

/// How a command's output was judged complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Completion {
    /// The device prompt reappeared.
    Prompt,

    /// Output stopped without a recognizable prompt.
    IdleExpired {
        #[serde(serialize_with = "as_secs")]
        after: Duration,
    },

    /// The per-command hard ceiling fired.
    TimedOut {
        #[serde(serialize_with = "as_secs")]
        after: Duration,
    },

    /// The command could not be written to the transport.
    SendFailed { message: String },

    /// The stream broke while reading output.
    TransportFailed { message: String },
}

/// Output of one command, created once the command finishes.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResult {
    /// The command that was executed.
    pub command: String,

    /// Everything read back for the command, echo and trailing prompt included.
    pub output: String,

    /// How completion was decided.
    pub completion: Completion,

    /// Time taken to execute the command.
    #[serde(serialize_with = "as_secs")]
    pub elapsed: Duration,

    /// Continuation keystrokes sent for pager prompts.
    pub pager_continuations: usize,
}

impl CommandResult {
    /// Create a result from collected output.
    pub fn new(
        command: impl Into<String>,
        output: impl Into<String>,
        completion: Completion,
        elapsed: Duration,
        pager_continuations: usize,
    ) -> Self {
        Self {
            command: command.into(),
            output: output.into(),
            completion,
            elapsed,
            pager_continuations,
        }
    }

    /// Create a result for a command that could not be sent.
    pub fn send_failed(command: impl Into<String>, message: impl Into<String>, elapsed: Duration) -> Self {
        Self::new(
            command,
            String::new(),
            Completion::SendFailed {
                message: message.into(),
            },
            elapsed,
            0,
        )
    }

    /// Whether the prompt confirmed completion.
    pub fn is_success(&self) -> bool {
        self.completion == Completion::Prompt
    }

    /// Whether the hard ceiling fired.
    pub fn timed_out(&self) -> bool {
        matches!(self.completion, Completion::TimedOut { .. })
    }

    /// Marker line recorded in the transcript, if any.
    pub fn annotation(&self) -> Option<String> {
        match &self.completion {
            Completion::Prompt => None,
            Completion::IdleExpired { after } => Some(format!(
                "[WARN] prompt not detected; output ended after {:.1} seconds of silence",
                after.as_secs_f64()
            )),
            Completion::TimedOut { after } => Some(format!(
                "[ERROR] command timed out after {:.0} seconds",
                after.as_secs_f64()
            )),
            Completion::SendFailed { message } => {
                Some(format!("[ERROR] failed to send command: {message}"))
            }
            Completion::TransportFailed { message } => {
                Some(format!("[ERROR] connection lost while reading output: {message}"))
            }
        }
    }

    /// Get the output lines as an iterator.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.output.lines()
    }

    /// Check if the output contains a substring.
    pub fn contains(&self, pattern: &str) -> bool {
        self.output.contains(pattern)
    }
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.output)
    }
}

fn as_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}
