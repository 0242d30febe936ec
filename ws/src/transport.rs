//! Abstraction over one physical duplex connection.
//!
//! The hub and session code never touch a socket directly. The web layer
//! wraps each upgraded connection in a sink/source pair, which lets the
//! core be tested against in-memory fakes and keeps the transport crate
//! choice out of this crate entirely.

use async_trait::async_trait;
use std::error::Error as StdError;
use std::fmt;

/// Terminal failure on a transport half.
///
/// Any transport error ends the session; errors are never retried.
#[derive(Debug)]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for TransportError {}

/// Write half of one client connection.
///
/// Owned exclusively by that client's outbound pump; no other component
/// writes to the connection.
#[async_trait]
pub trait MessageSink: Send + 'static {
    /// Write one text frame to the peer.
    async fn send(&mut self, frame: &str) -> Result<(), TransportError>;

    /// Close the underlying connection. Must be safe to call after a
    /// failed `send`.
    async fn close(&mut self);
}

/// Read half of one client connection.
///
/// Owned exclusively by that client's inbound pump. `Ok(None)` means the
/// peer closed cleanly; an error means the connection died.
#[async_trait]
pub trait MessageSource: Send + 'static {
    async fn recv(&mut self) -> Result<Option<String>, TransportError>;
}
