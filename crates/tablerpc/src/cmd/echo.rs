use tablerpc_client::TableRpcClient;
use tablerpc_codec::FieldTable;
use tablerpc_transport::{ByteRpcTransport, LoopbackTransport};
use tracing::{info, warn};

use crate::cmd::encode::parse_table;
use crate::cmd::{read_input, EchoArgs};
use crate::exit::{rpc_error, transport_error, CliResult, SUCCESS};
use crate::output::{print_table, OutputFormat};

pub fn run(args: EchoArgs, format: OutputFormat) -> CliResult<i32> {
    let input = read_input(args.json.as_deref(), args.file.as_deref())?;
    let request = parse_table(&input)?;

    let client =
        TableRpcClient::with_config(LoopbackTransport::echo(), args.limits.codec_config());
    let reply = call_once(&client, &args.destination, &args.routing_key, &request)?;
    info!(fields = reply.len(), "echo reply received");

    print_table(&reply, format);
    Ok(SUCCESS)
}

fn call_once<T: ByteRpcTransport>(
    client: &TableRpcClient<T>,
    destination: &str,
    routing_key: &str,
    request: &FieldTable,
) -> CliResult<FieldTable> {
    client
        .open()
        .map_err(|err| transport_error("open failed", err))?;
    let result = client
        .call(destination, routing_key, request)
        .map_err(|err| rpc_error("call failed", err));
    match (result, client.close()) {
        (Ok(reply), Ok(())) => Ok(reply),
        (Ok(_), Err(err)) => Err(transport_error("close failed", err)),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            warn!(error = %close_err, "close failed after failed call");
            Err(err)
        }
    }
}
