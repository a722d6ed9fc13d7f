//! # clicollect
//!
//! Async collector for interactive network device CLIs.
//!
//! clicollect logs into a device shell over SSH, runs a list of commands one
//! at a time and records what each one printed. Interactive shells give no
//! framing, so the end of each command's output is inferred: by the
//! reappearance of the prompt learned from the login banner, by sustained
//! silence, or by a hard time limit. Pagination prompts such as `--More--`
//! are acknowledged automatically so long outputs arrive complete.
//!
//! ## Features
//!
//! - Async SSH connections via russh, with a PTY sized to trigger paging
//! - Prompt discovery from the login banner, tolerant of context suffixes
//! - Pager acknowledgment with optional removal of pager prompts
//! - Efficient pattern buffer matching (tail search) with ANSI stripping
//! - Text and JSON transcripts
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clicollect::{ConnectBuilder, SessionConfig, SessionRunner, TextFileSink};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), clicollect::Error> {
//!     let transport = ConnectBuilder::new("192.168.1.99")
//!         .username("admin")
//!         .password("secret")
//!         .connect()
//!         .await?;
//!
//!     let commands = clicollect::commands::load("cli-commands.txt")?;
//!     let runner = SessionRunner::new(SessionConfig::default())?
//!         .with_target("192.168.1.99 as admin");
//!
//!     let mut sink = TextFileSink::new("output-file.txt");
//!     let transcript = runner.run(transport, &commands, &mut sink).await?;
//!     println!("{} commands, {} failed", transcript.results.len(), transcript.failures());
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod commands;
pub mod error;
pub mod session;
pub mod transport;

// Re-export main types for convenience
pub use channel::{
    BoundedReader, ByteAccumulator, PagerDetector, PromptMatcher, PromptPattern, ReadBuffer,
    ReadOutcome, ReadStatus, ReadTermination,
};
pub use error::{Error, Result};
pub use session::{
    CommandResult, Completion, JsonFileSink, SessionConfig, SessionRunner, TextFileSink,
    Transcript, TranscriptSink,
};
pub use transport::{
    AuthMethod, ConnectBuilder, HostKeyVerification, SshConfig, SshTransport, Transport,
};
