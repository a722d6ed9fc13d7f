//! Timing and matching configuration for a collection session.

use std::time::Duration;

use crate::channel::DEFAULT_PAGER_SENTINELS;
use crate::error::ConfigError;

/// Configuration threaded through every read of a session.
///
/// There are three nested time bounds: a single transport poll
/// (`read_timeout`), one reader invocation (`idle_exit_after` and
/// `max_wait_per_read`), and a whole command (`max_command_time`).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Longest wait for a single transport poll.
    pub read_timeout: Duration,

    /// Sleep between polls that returned no data.
    pub poll_interval: Duration,

    /// Silence after which a command is assumed complete.
    pub idle_exit_after: Duration,

    /// Ceiling for one reader invocation.
    pub max_wait_per_read: Duration,

    /// Hard ceiling for a whole command, pager continuations included.
    pub max_command_time: Duration,

    /// Pause after connecting before the banner is read.
    pub settle_delay: Duration,

    /// Ceiling for the banner read.
    pub banner_max_wait: Duration,

    /// Pause after sending a command before reading.
    pub command_delay: Duration,

    /// Pause after acknowledging a pager prompt.
    pub pager_pause: Duration,

    /// Substrings that identify a pager prompt.
    pub pager_sentinels: Vec<String>,

    /// Remove pager prompts from captured output.
    pub strip_pager_prompts: bool,

    /// Remove ANSI escape sequences from captured output.
    pub strip_ansi: bool,

    /// Bytes from the end of the buffer searched for the prompt.
    pub search_depth: usize,

    /// Maximum bytes allowed between hostname and prompt glyph.
    pub prompt_slack: usize,

    /// Appended to every command.
    pub line_terminator: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(100),
            poll_interval: Duration::from_millis(50),
            idle_exit_after: Duration::from_secs(3),
            max_wait_per_read: Duration::from_secs(10),
            max_command_time: Duration::from_secs(120),
            settle_delay: Duration::from_millis(500),
            banner_max_wait: Duration::from_secs(3),
            command_delay: Duration::from_millis(200),
            pager_pause: Duration::from_millis(150),
            pager_sentinels: DEFAULT_PAGER_SENTINELS.iter().map(|s| s.to_string()).collect(),
            strip_pager_prompts: false,
            strip_ansi: true,
            search_depth: 1000,
            prompt_slack: 30,
            line_terminator: "\n".to_string(),
        }
    }
}

impl SessionConfig {
    /// Set the per-poll transport wait.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the idle threshold.
    pub fn with_idle_exit_after(mut self, idle: Duration) -> Self {
        self.idle_exit_after = idle;
        self
    }

    /// Set the per-read ceiling.
    pub fn with_max_wait_per_read(mut self, max_wait: Duration) -> Self {
        self.max_wait_per_read = max_wait;
        self
    }

    /// Set the per-command hard ceiling.
    pub fn with_max_command_time(mut self, max: Duration) -> Self {
        self.max_command_time = max;
        self
    }

    /// Replace the pager sentinels.
    pub fn with_pager_sentinels<I, S>(mut self, sentinels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pager_sentinels = sentinels.into_iter().map(Into::into).collect();
        self
    }

    /// Elide pager prompts from captured output.
    pub fn with_strip_pager_prompts(mut self, strip: bool) -> Self {
        self.strip_pager_prompts = strip;
        self
    }

    /// Strip or keep ANSI escape sequences.
    pub fn with_strip_ansi(mut self, strip: bool) -> Self {
        self.strip_ansi = strip;
        self
    }

    /// Set the prompt slack (characters between hostname and glyph).
    pub fn with_prompt_slack(mut self, slack: usize) -> Self {
        self.prompt_slack = slack;
        self
    }

    /// Check that the configuration can bound every read.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ceilings = [
            ("read_timeout", self.read_timeout),
            ("idle_exit_after", self.idle_exit_after),
            ("max_wait_per_read", self.max_wait_per_read),
            ("max_command_time", self.max_command_time),
            ("banner_max_wait", self.banner_max_wait),
        ];
        if let Some((name, _)) = ceilings.iter().find(|(_, d)| d.is_zero()) {
            return Err(invalid(format!("{name} must be greater than zero")));
        }
        if self.pager_sentinels.iter().any(String::is_empty) {
            return Err(invalid("pager sentinels must not be empty strings".into()));
        }
        if self.prompt_slack == 0 {
            return Err(invalid("prompt_slack must be at least 1".into()));
        }
        if self.search_depth == 0 {
            return Err(invalid("search_depth must be greater than zero".into()));
        }
        Ok(())
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::InvalidConfig { message }
}
