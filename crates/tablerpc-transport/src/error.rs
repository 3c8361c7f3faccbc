use std::time::Duration;

/// Errors raised by a byte RPC transport.
///
/// Layers above the transport pass these through untouched.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// No reply arrived within the transport's deadline.
    #[error("rpc call timed out after {0:?}")]
    Timeout(Duration),

    /// The transport (or its underlying connection) has been shut down.
    #[error("transport shut down: {reason}")]
    Shutdown { reason: String },

    /// An I/O error occurred on the transport.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Opening or closing the transport failed.
    #[error("connection error: {0}")]
    Connection(String),
}

impl TransportError {
    /// Shorthand for a [`TransportError::Shutdown`] with the given reason.
    pub fn shutdown(reason: impl Into<String>) -> Self {
        Self::Shutdown {
            reason: reason.into(),
        }
    }

    /// Returns true if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
