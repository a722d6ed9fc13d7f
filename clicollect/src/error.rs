//! Error types for clicollect.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for clicollect operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Prompt pattern errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Configuration and command source errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Transcript output errors
    #[error("Output error: {0}")]
    Output(#[from] OutputError),
}

/// Transport layer errors (SSH connection, authentication, channel I/O).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// The server presented a key that differs from known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// Strict verification and the host is not in known_hosts
    #[error("Host key for {host}:{port} is not in known_hosts")]
    HostKeyUnknown { host: String, port: u16 },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (prompt pattern construction).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Configuration and command source errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The commands file could not be read
    #[error("Commands file not found: {}", path.display())]
    CommandsFileNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The commands file held no runnable commands
    #[error("No commands to run in {} (file empty or only comments)", path.display())]
    NoCommands { path: PathBuf },
}

/// Transcript output errors.
#[derive(Error, Debug)]
pub enum OutputError {
    /// Failed to write the transcript
    #[error("Failed to write output file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to serialize the transcript
    #[error("Failed to serialize transcript: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type alias using clicollect's Error.
pub type Result<T> = std::result::Result<T, Error>;
