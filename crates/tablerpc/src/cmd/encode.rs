use tablerpc_codec::{FieldTable, TableCodec};
use tracing::debug;

use crate::cmd::{read_input, EncodeArgs};
use crate::exit::{codec_error, CliError, CliResult, SUCCESS};
use crate::json::table_from_json;
use crate::output::{hex_encode, print_raw};

pub fn run(args: EncodeArgs) -> CliResult<i32> {
    let input = read_input(args.json.as_deref(), args.file.as_deref())?;
    let table = parse_table(&input)?;

    let codec = TableCodec::new(args.limits.codec_config());
    let bytes = codec
        .encode(&table)
        .map_err(|err| codec_error("encode failed", err))?;
    debug!(fields = table.len(), bytes = bytes.len(), "encoded table");

    if args.raw {
        print_raw(&bytes)?;
    } else {
        println!("{}", hex_encode(&bytes));
    }
    Ok(SUCCESS)
}

/// Parse JSON input text into a field table.
pub(crate) fn parse_table(input: &[u8]) -> CliResult<FieldTable> {
    let value: serde_json::Value = serde_json::from_slice(input)
        .map_err(|err| CliError::data_invalid(format!("input is not valid JSON: {err}")))?;
    table_from_json(&value)
}
