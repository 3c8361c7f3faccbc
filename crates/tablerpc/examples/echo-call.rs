//! A table-level call against a hand-written in-process service.
//!
//! The service decodes each request, answers `svc.status` with a status table
//! and rejects other routing keys at the transport level.
//!
//! Run with:
//!   cargo run --example echo-call

use std::sync::atomic::{AtomicU32, Ordering};

use tablerpc::client::TableRpcClient;
use tablerpc::codec::{decode_table, encode_table, FieldTable, FieldValue, Timestamp};
use tablerpc::transport::{ByteRpcTransport, Result, TransportError};

/// Answers calls in-process, counting how many it served.
#[derive(Default)]
struct StatusService {
    served: AtomicU32,
}

impl ByteRpcTransport for StatusService {
    fn open(&self) -> Result<()> {
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }

    fn call(&self, destination: &str, routing_key: &str, request: &[u8]) -> Result<bytes::Bytes> {
        if routing_key != "svc.status" {
            return Err(TransportError::Connection(format!(
                "no route {routing_key:?} on {destination:?}"
            )));
        }
        let request = decode_table(request)
            .map_err(|err| TransportError::Connection(format!("bad request: {err}")))?;

        let served = self.served.fetch_add(1, Ordering::Relaxed) + 1;
        let reply = FieldTable::new()
            .with("status", "ok")
            .with("served", i32::try_from(served).unwrap_or(i32::MAX))
            .with("at", Timestamp::now())
            .with("echo", request);
        encode_table(&reply).map_err(|err| TransportError::Connection(err.to_string()))
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let client = TableRpcClient::new(StatusService::default());
    client.open()?;

    let request = FieldTable::new()
        .with("caller", "echo-call")
        .with("verbose", true)
        .with("tags", vec![FieldValue::from("a"), FieldValue::from("b")]);

    let reply = client.call("amq.direct", "svc.status", &request)?;
    for (key, value) in &reply {
        eprintln!("{key} ({}) = {value:?}", value.type_name());
    }

    match client.call("amq.direct", "svc.unknown", &request) {
        Ok(_) => eprintln!("unexpected reply"),
        Err(err) => eprintln!("call failed as expected: {err}"),
    }

    client.close()?;
    Ok(())
}
