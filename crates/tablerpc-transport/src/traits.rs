use std::sync::Arc;

use bytes::Bytes;

use crate::error::Result;

/// A request/response transport that speaks in opaque byte arrays.
///
/// Implementations own connection management, correlation of replies to
/// requests, and any deadline. A call either yields the full reply payload
/// or fails with a [`TransportError`](crate::TransportError).
///
/// Methods take `&self` so a transport can be shared between callers. Whether
/// that sharing is sound is decided by the implementation's `Send`/`Sync`
/// impls; callers layered on top add no locking of their own.
pub trait ByteRpcTransport {
    /// Open the transport (connect, declare reply queues, etc).
    fn open(&self) -> Result<()>;

    /// Close the transport and release its resources.
    fn close(&self) -> Result<()>;

    /// Send `request` to `destination` using `routing_key` and wait for the reply.
    fn call(&self, destination: &str, routing_key: &str, request: &[u8]) -> Result<Bytes>;
}

impl<T: ByteRpcTransport + ?Sized> ByteRpcTransport for &T {
    fn open(&self) -> Result<()> {
        (**self).open()
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }

    fn call(&self, destination: &str, routing_key: &str, request: &[u8]) -> Result<Bytes> {
        (**self).call(destination, routing_key, request)
    }
}

impl<T: ByteRpcTransport + ?Sized> ByteRpcTransport for Box<T> {
    fn open(&self) -> Result<()> {
        (**self).open()
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }

    fn call(&self, destination: &str, routing_key: &str, request: &[u8]) -> Result<Bytes> {
        (**self).call(destination, routing_key, request)
    }
}

impl<T: ByteRpcTransport + ?Sized> ByteRpcTransport for Arc<T> {
    fn open(&self) -> Result<()> {
        (**self).open()
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }

    fn call(&self, destination: &str, routing_key: &str, request: &[u8]) -> Result<Bytes> {
        (**self).call(destination, routing_key, request)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    struct CountingTransport {
        calls: AtomicUsize,
    }

    impl ByteRpcTransport for CountingTransport {
        fn open(&self) -> Result<()> {
            Ok(())
        }

        fn close(&self) -> Result<()> {
            Ok(())
        }

        fn call(&self, _destination: &str, _routing_key: &str, request: &[u8]) -> Result<Bytes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Bytes::copy_from_slice(request))
        }
    }

    fn call_through<T: ByteRpcTransport>(transport: T) -> Bytes {
        transport.call("exchange", "key", b"abc").unwrap()
    }

    #[test]
    fn reference_delegates() {
        let inner = CountingTransport::default();
        assert_eq!(call_through(&inner).as_ref(), b"abc");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_delegates() {
        let inner = Arc::new(CountingTransport::default());
        call_through(Arc::clone(&inner));
        call_through(Arc::clone(&inner));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn boxed_trait_object_delegates() {
        let boxed: Box<dyn ByteRpcTransport> = Box::new(CountingTransport::default());
        boxed.open().unwrap();
        assert_eq!(call_through(boxed).as_ref(), b"abc");
    }
}
