//! Session orchestration: prompt discovery, then one command at a time.

use log::{debug, info, warn};
use tokio::time::{Instant, sleep};

use super::config::SessionConfig;
use super::result::{CommandResult, Completion};
use super::transcript::{Transcript, TranscriptSink};
use crate::channel::{BoundedReader, PagerDetector, PromptPattern, ReadBuffer, ReadTermination};
use crate::error::Result;
use crate::transport::Transport;

/// Drives a command list through one shell session.
///
/// # Example
///
/// ```rust,no_run
/// use clicollect::{SessionConfig, SessionRunner, SshTransport, TextFileSink};
///
/// # async fn example(transport: SshTransport) -> Result<(), clicollect::Error> {
/// let runner = SessionRunner::new(SessionConfig::default())?.with_target("10.0.0.1 as admin");
/// let commands = vec!["get system status".to_string()];
/// let mut sink = TextFileSink::new("output-file.txt");
/// let transcript = runner.run(transport, &commands, &mut sink).await?;
/// println!("{} commands collected", transcript.results.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SessionRunner {
    config: SessionConfig,
    pager: PagerDetector,
    target: Option<String>,
}

impl SessionRunner {
    /// Create a runner, rejecting configurations that cannot bound a read.
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let pager = PagerDetector::new(&config.pager_sentinels);
        Ok(Self {
            config,
            pager,
            target: None,
        })
    }

    /// Describe the device in the transcript header.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Run every command, write the transcript to `sink`, then close the
    /// transport.
    ///
    /// Command failures are recorded in the transcript rather than returned.
    /// Only a sink failure or an unusable prompt pattern ends in `Err`; the
    /// transport is closed either way.
    pub async fn run<T, S>(&self, mut transport: T, commands: &[String], sink: &mut S) -> Result<Transcript>
    where
        T: Transport,
        S: TranscriptSink + ?Sized,
    {
        let outcome = self.collect(&mut transport, commands).await;

        let outcome = match outcome {
            Ok(transcript) => sink.write(&transcript).map(|_| transcript).map_err(Into::into),
            Err(e) => Err(e),
        };

        if let Err(e) = transport.close().await {
            debug!("session: error while closing transport: {}", e);
        }
        outcome
    }

    /// Discover the prompt and execute all commands.
    async fn collect<T: Transport>(&self, transport: &mut T, commands: &[String]) -> Result<Transcript> {
        let mut transcript = Transcript::new(self.target.clone());

        let (banner, prompt) = self.discover_prompt(transport).await?;
        transcript.banner = banner;

        for command in commands {
            let result = self.execute(transport, &prompt, command).await;
            match &result.completion {
                Completion::Prompt => info!("{}: done in {:?}", command, result.elapsed),
                _ => warn!(
                    "{}: {}",
                    command,
                    result.annotation().unwrap_or_default()
                ),
            }
            transcript.results.push(result);
        }

        transcript.finish();
        Ok(transcript)
    }

    /// Read the login banner and derive the session's prompt pattern.
    pub async fn discover_prompt<T: Transport>(&self, transport: &mut T) -> Result<(String, PromptPattern)> {
        sleep(self.config.settle_delay).await;

        let generic = PromptPattern::generic();
        let reader = BoundedReader::new(&generic, &self.pager, &self.config);
        let outcome = reader.read(transport, self.config.banner_max_wait).await;
        let banner = outcome.as_str().into_owned();

        let prompt = PromptPattern::derive(&banner, self.config.prompt_slack)?;
        match prompt.literal() {
            Some(literal) => info!("session: detected prompt {:?}", literal),
            None => warn!("session: no prompt line in banner, using generic prompt pattern"),
        }
        Ok((banner, prompt))
    }

    /// Execute one command. Always produces exactly one result.
    pub async fn execute<T: Transport>(
        &self,
        transport: &mut T,
        prompt: &PromptPattern,
        command: &str,
    ) -> CommandResult {
        let start = Instant::now();
        info!("running: {}", command);

        let line = format!("{}{}", command, self.config.line_terminator);
        if let Err(e) = transport.send(line.as_bytes()).await {
            warn!("{}: send failed: {}", command, e);
            return CommandResult::send_failed(command, e.to_string(), start.elapsed());
        }
        sleep(self.config.command_delay).await;

        let reader = BoundedReader::new(prompt, &self.pager, &self.config);
        // Shared by every read of this command, so prompts and pager
        // sentinels split across reads are still found
        let mut output = ReadBuffer::new(&self.config);
        let mut pager_continuations = 0;

        let completion = loop {
            let remaining = self.config.max_command_time.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                break Completion::TimedOut {
                    after: self.config.max_command_time,
                };
            }

            let status = reader
                .read_into(transport, &mut output, self.config.max_wait_per_read.min(remaining))
                .await;
            pager_continuations += status.pager_continuations;

            match status.termination {
                ReadTermination::PromptFound => break Completion::Prompt,
                ReadTermination::IdleExpired => {
                    break Completion::IdleExpired {
                        after: self.config.idle_exit_after,
                    };
                }
                ReadTermination::Disconnected(message) => {
                    break Completion::TransportFailed { message };
                }
                ReadTermination::MaxWaitExceeded => {
                    debug!("{}: still receiving, reading again", command);
                }
            }
        };

        CommandResult::new(
            command,
            output.as_str_lossy(),
            completion,
            start.elapsed(),
            pager_continuations,
        )
    }
}
