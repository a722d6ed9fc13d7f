//! Session transcript and the sinks it is written to.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use super::result::CommandResult;
use crate::error::OutputError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Everything collected during one session, in execution order.
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    /// When the session started.
    pub started_at: DateTime<Local>,

    /// When the last command finished.
    pub finished_at: Option<DateTime<Local>>,

    /// Free-form description of the device, e.g. `10.0.0.1 as admin`.
    pub target: Option<String>,

    /// Text read before the first command.
    pub banner: String,

    /// One result per command.
    pub results: Vec<CommandResult>,
}

impl Transcript {
    /// Start a transcript now.
    pub fn new(target: Option<String>) -> Self {
        Self {
            started_at: Local::now(),
            finished_at: None,
            target,
            banner: String::new(),
            results: Vec::new(),
        }
    }

    /// Record the end of the session.
    pub fn finish(&mut self) {
        self.finished_at = Some(Local::now());
    }

    /// Number of commands whose prompt was not confirmed.
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| !r.is_success()).count()
    }

    /// Render the plain-text transcript.
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Serialize the transcript as pretty JSON.
    pub fn to_json(&self) -> Result<String, OutputError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// The plain-text transcript layout.
impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "-- Session start: {} --", self.started_at.format(TIMESTAMP_FORMAT))?;
        if let Some(target) = &self.target {
            writeln!(f, "Connected to {target}")?;
        }
        writeln!(f)?;

        if !self.banner.trim().is_empty() {
            writeln!(f, "--- Initial banner/prompt ---")?;
            writeln!(f, "{}", self.banner)?;
            writeln!(f, "--- End initial banner ---")?;
            writeln!(f)?;
        }

        for result in &self.results {
            write!(f, "\n=== Command: {} ===\n", result.command)?;
            f.write_str(&result.output)?;
            if let Some(annotation) = result.annotation() {
                write!(f, "\n{annotation}")?;
            }
            write!(f, "\n=== End of Command: {} ===\n", result.command)?;
        }

        if let Some(finished) = self.finished_at {
            write!(f, "\n-- Session end: {} --\n", finished.format(TIMESTAMP_FORMAT))?;
        }
        Ok(())
    }
}

/// Destination for a finished transcript.
pub trait TranscriptSink {
    /// Write the transcript as a single artifact.
    fn write(&mut self, transcript: &Transcript) -> Result<(), OutputError>;
}

/// Plain-text transcript file.
#[derive(Debug, Clone)]
pub struct TextFileSink {
    path: PathBuf,
}

impl TextFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TranscriptSink for TextFileSink {
    fn write(&mut self, transcript: &Transcript) -> Result<(), OutputError> {
        write_file(&self.path, transcript.render())
    }
}

/// JSON transcript file.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TranscriptSink for JsonFileSink {
    fn write(&mut self, transcript: &Transcript) -> Result<(), OutputError> {
        write_file(&self.path, transcript.to_json()?)
    }
}

/// Render into memory.
impl TranscriptSink for String {
    fn write(&mut self, transcript: &Transcript) -> Result<(), OutputError> {
        self.push_str(&transcript.render());
        Ok(())
    }
}

fn write_file(path: &Path, contents: String) -> Result<(), OutputError> {
    fs::write(path, contents).map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })
}
