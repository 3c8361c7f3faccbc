use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::ByteRpcTransport;

/// In-process transport that answers calls with a handler closure.
///
/// The transport starts closed; calls made before [`open`](ByteRpcTransport::open)
/// or after [`close`](ByteRpcTransport::close) fail with
/// [`TransportError::Shutdown`]. Useful as a test double and for exercising
/// the table layer without a broker.
pub struct LoopbackTransport<F> {
    handler: F,
    open: AtomicBool,
}

impl<F> LoopbackTransport<F>
where
    F: Fn(&str, &str, &[u8]) -> Result<Vec<u8>>,
{
    /// Create a closed loopback transport around `handler`.
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            open: AtomicBool::new(false),
        }
    }

    /// Returns true while the transport is open.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}

impl LoopbackTransport<fn(&str, &str, &[u8]) -> Result<Vec<u8>>> {
    /// A loopback transport whose reply is the request bytes, unchanged.
    pub fn echo() -> Self {
        fn reply_with_request(_: &str, _: &str, request: &[u8]) -> Result<Vec<u8>> {
            Ok(request.to_vec())
        }
        Self::new(reply_with_request)
    }
}

impl<F> ByteRpcTransport for LoopbackTransport<F>
where
    F: Fn(&str, &str, &[u8]) -> Result<Vec<u8>>,
{
    fn open(&self) -> Result<()> {
        if !self.open.swap(true, Ordering::AcqRel) {
            debug!("loopback transport opened");
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        if self.open.swap(false, Ordering::AcqRel) {
            debug!("loopback transport closed");
        }
        Ok(())
    }

    fn call(&self, destination: &str, routing_key: &str, request: &[u8]) -> Result<Bytes> {
        if !self.is_open() {
            return Err(TransportError::shutdown("loopback transport is not open"));
        }
        let reply = (self.handler)(destination, routing_key, request)?;
        Ok(Bytes::from(reply))
    }
}

impl<F> std::fmt::Debug for LoopbackTransport<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopbackTransport")
            .field("open", &self.open.load(Ordering::Relaxed))
            .finish()
    }
}
