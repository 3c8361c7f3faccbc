//! Byte-array request/response transport abstraction.
//!
//! This is the lowest layer of tablerpc. A transport moves opaque request
//! bytes to a destination and hands back the reply bytes; it owns the
//! connection, correlation, and timeouts. Everything above this crate only
//! sees the [`ByteRpcTransport`] trait.

pub mod error;
pub mod loopback;
pub mod traits;

pub use error::{Result, TransportError};
pub use loopback::LoopbackTransport;
pub use traits::ByteRpcTransport;
