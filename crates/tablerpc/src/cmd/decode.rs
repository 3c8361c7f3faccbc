use tablerpc_codec::{FieldTable, TableCodec};
use tracing::{debug, warn};

use crate::cmd::{read_input, DecodeArgs};
use crate::exit::{codec_error, CliResult, SUCCESS};
use crate::output::{hex_decode, print_table, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = match &args.hex {
        Some(text) => hex_decode(text)?,
        None => {
            let input = read_input(None, args.file.as_deref())?;
            if args.hex_input {
                hex_decode(&String::from_utf8_lossy(&input))?
            } else {
                input
            }
        }
    };

    let codec = TableCodec::new(args.limits.codec_config());
    let table = decode_bytes(&codec, &bytes, args.allow_trailing)?;
    print_table(&table, format);
    Ok(SUCCESS)
}

fn decode_bytes(codec: &TableCodec, bytes: &[u8], allow_trailing: bool) -> CliResult<FieldTable> {
    if !allow_trailing {
        let table = codec
            .decode(bytes)
            .map_err(|err| codec_error("decode failed", err))?;
        debug!(fields = table.len(), bytes = bytes.len(), "decoded table");
        return Ok(table);
    }

    let (table, consumed) = codec
        .decode_prefix(bytes)
        .map_err(|err| codec_error("decode failed", err))?;
    if consumed < bytes.len() {
        warn!(
            consumed,
            ignored = bytes.len() - consumed,
            "ignoring bytes after table"
        );
    }
    Ok(table)
}
