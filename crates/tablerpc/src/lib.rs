//! Typed field-table RPC over any byte-array request/response transport.
//!
//! tablerpc turns a transport that moves opaque byte arrays into one that
//! moves typed, nested field tables, using the AMQP field table encoding.
//!
//! # Crate Structure
//!
//! - [`transport`]: The byte-array transport trait and its error taxonomy
//! - [`codec`]: Field table types and the binary wire codec
//! - [`client`]: Table-level client over any transport
//!
//! # Example
//!
//! ```
//! use tablerpc::client::TableRpcClient;
//! use tablerpc::codec::FieldTable;
//! use tablerpc::transport::LoopbackTransport;
//!
//! let client = TableRpcClient::new(LoopbackTransport::echo());
//! client.open().unwrap();
//!
//! let request = FieldTable::new().with("status", "ok").with("code", 200);
//! let reply = client.call("amq.direct", "svc.status", &request).unwrap();
//! assert_eq!(reply, request);
//!
//! client.close().unwrap();
//! ```

/// Re-export transport types.
pub mod transport {
    pub use tablerpc_transport::*;
}

/// Re-export codec types.
pub mod codec {
    pub use tablerpc_codec::*;
}

/// Re-export client types.
pub mod client {
    pub use tablerpc_client::*;
}
