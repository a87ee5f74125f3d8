//! Error taxonomy for the messaging core.

use thiserror::Error;

/// Raised by a subscribed handler. Carries a message for the negative
/// acknowledgement path; never unwound as a panic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<&str> for HandlerError {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for HandlerError {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Fatal misuse of the transport/registry surface — distinct from the
/// ordinary `false`/`None` returns the protocol uses for expected
/// failures like unknown destinations or ack timeouts.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport {0} is already disposed")]
    Disposed(String),
    #[error("transport {0} was never initialized")]
    NotInitialized(String),
}
