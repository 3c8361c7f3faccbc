use tablerpc_codec::{CodecConfig, FieldTable, TableCodec};
use tablerpc_transport::{ByteRpcTransport, TransportError};
use tracing::{debug, warn};

use crate::error::{Result, RpcError};

/// A request/response client that speaks in field tables.
///
/// Implemented by [`TableRpcClient`]; code that only needs to make calls can
/// depend on this trait and take a test double instead.
pub trait TableRpc {
    /// Open the underlying channel.
    fn open(&self) -> std::result::Result<(), TransportError>;

    /// Close the underlying channel.
    fn close(&self) -> std::result::Result<(), TransportError>;

    /// Call `destination` with `request` and return the reply table.
    fn call(
        &self,
        destination: &str,
        routing_key: &str,
        request: &FieldTable,
    ) -> Result<FieldTable>;
}

/// Field table client layered over a byte-array transport.
///
/// Each call encodes the request, hands the bytes to the transport, and
/// decodes the reply. The client adds no retries, no correlation, and no
/// locking: it is `Send`/`Sync` exactly when the transport is, and
/// concurrent calls are as safe as concurrent calls on the transport.
pub struct TableRpcClient<T> {
    transport: T,
    codec: TableCodec,
}

impl<T: ByteRpcTransport> TableRpcClient<T> {
    /// Create a client with the default codec configuration.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, CodecConfig::default())
    }

    /// Create a client with explicit codec limits and policies.
    pub fn with_config(transport: T, config: CodecConfig) -> Self {
        Self {
            transport,
            codec: TableCodec::new(config),
        }
    }

    /// Open the transport.
    pub fn open(&self) -> std::result::Result<(), TransportError> {
        self.transport.open()
    }

    /// Close the transport.
    pub fn close(&self) -> std::result::Result<(), TransportError> {
        self.transport.close()
    }

    /// Encode `request`, send it, and decode the reply.
    ///
    /// A failed call returns no table; whether the remote side acted on the
    /// request is unknown.
    pub fn call(
        &self,
        destination: &str,
        routing_key: &str,
        request: &FieldTable,
    ) -> Result<FieldTable> {
        let request_bytes = self.codec.encode(request).map_err(RpcError::Encode)?;
        debug!(
            destination,
            routing_key,
            request_bytes = request_bytes.len(),
            "sending table rpc request"
        );

        let reply = self
            .transport
            .call(destination, routing_key, &request_bytes)
            .map_err(|err| {
                warn!(destination, routing_key, error = %err, "table rpc transport call failed");
                RpcError::Transport(err)
            })?;

        let table = self.codec.decode(&reply).map_err(|err| {
            warn!(
                destination,
                routing_key,
                reply_bytes = reply.len(),
                error = %err,
                "table rpc reply could not be decoded"
            );
            RpcError::Decode(err)
        })?;

        debug!(
            destination,
            routing_key,
            reply_bytes = reply.len(),
            fields = table.len(),
            "received table rpc reply"
        );
        Ok(table)
    }

    /// Codec configuration used for requests and replies.
    pub fn config(&self) -> &CodecConfig {
        self.codec.config()
    }

    /// Borrow the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the underlying transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the client and return the transport.
    pub fn into_inner(self) -> T {
        self.transport
    }
}

impl<T: ByteRpcTransport> TableRpc for TableRpcClient<T> {
    fn open(&self) -> std::result::Result<(), TransportError> {
        TableRpcClient::open(self)
    }

    fn close(&self) -> std::result::Result<(), TransportError> {
        TableRpcClient::close(self)
    }

    fn call(
        &self,
        destination: &str,
        routing_key: &str,
        request: &FieldTable,
    ) -> Result<FieldTable> {
        TableRpcClient::call(self, destination, routing_key, request)
    }
}

impl<T> std::fmt::Debug for TableRpcClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableRpcClient")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}
