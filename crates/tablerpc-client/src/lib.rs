//! Field table request/response client.
//!
//! This is the "just works" layer. Hand it any [`ByteRpcTransport`] and call
//! remote procedures with [`FieldTable`] requests and replies; encoding and
//! decoding happen on the way through.
//!
//! [`ByteRpcTransport`]: tablerpc_transport::ByteRpcTransport
//! [`FieldTable`]: tablerpc_codec::FieldTable

pub mod client;
pub mod error;

pub use client::{TableRpc, TableRpcClient};
pub use error::{Result, RpcError};
