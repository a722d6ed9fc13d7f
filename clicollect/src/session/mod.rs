//! Session layer: running a command list and assembling the transcript.

mod config;
mod result;
mod runner;
mod transcript;

pub use config::SessionConfig;
pub use result::{CommandResult, Completion};
pub use runner::SessionRunner;
pub use transcript::{JsonFileSink, TextFileSink, Transcript, TranscriptSink};
