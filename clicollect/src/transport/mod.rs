//! Byte-stream transports to a remote shell.
//!
//! The session engine only needs three operations from a connection, captured
//! by the [`Transport`] trait. [`SshTransport`] implements it on top of an
//! interactive russh shell channel.

mod builder;
pub mod config;
#[cfg(test)]
pub(crate) mod scripted;
mod ssh;

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;

use crate::error::TransportError;

pub use builder::ConnectBuilder;
pub use config::{AuthMethod, HostKeyVerification, SshConfig};
pub use ssh::SshTransport;

/// An unframed, bidirectional byte stream to a remote shell.
pub trait Transport: Send {
    /// Write bytes to the remote shell.
    fn send(&mut self, data: &[u8]) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Return whatever bytes arrive within `wait`.
    ///
    /// An empty chunk means nothing arrived in time. That is not an error:
    /// callers poll again. Errors are reserved for a broken stream.
    fn recv_available(
        &mut self,
        wait: Duration,
    ) -> impl Future<Output = Result<Bytes, TransportError>> + Send;

    /// Close the stream.
    fn close(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;
}
