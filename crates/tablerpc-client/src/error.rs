use tablerpc_codec::CodecError;
use tablerpc_transport::TransportError;

/// Errors returned by a table RPC call.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The request table could not be encoded. The transport was not called.
    #[error("failed to encode request: {0}")]
    Encode(#[source] CodecError),

    /// The reply bytes are not a valid field table.
    #[error("failed to decode reply: {0}")]
    Decode(#[source] CodecError),

    /// The transport failed; the error is passed through as-is.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl RpcError {
    /// Returns true if the transport reported a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, RpcError::Transport(err) if err.is_timeout())
    }

    /// The transport error, if this failure came from the transport.
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            RpcError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RpcError>;
