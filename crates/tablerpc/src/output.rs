use std::fmt::Write as _;
use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use tablerpc_codec::{FieldTable, FieldValue};

use crate::exit::{CliError, CliResult};
use crate::json::table_to_json;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

pub fn print_table(table: &FieldTable, format: OutputFormat) {
    println!("{}", render_table(table, format));
}

pub fn render_table(table: &FieldTable, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => table_to_json(table).to_string(),
        OutputFormat::Table => {
            let mut out = Table::new();
            out.load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "TYPE", "VALUE"]);
            for (key, value) in table {
                out.add_row(vec![
                    key.clone(),
                    value.type_name().to_string(),
                    display_value(value),
                ]);
            }
            out.to_string()
        }
        OutputFormat::Pretty => {
            let mut out = String::new();
            write_pretty(&mut out, table, 0);
            out.trim_end().to_string()
        }
    }
}

fn write_pretty(out: &mut String, table: &FieldTable, indent: usize) {
    for (key, value) in table {
        let pad = "  ".repeat(indent);
        match value {
            FieldValue::Table(inner) => {
                let _ = writeln!(out, "{pad}{key} ({}):", value.type_name());
                write_pretty(out, inner, indent + 1);
            }
            other => {
                let _ = writeln!(
                    out,
                    "{pad}{key} ({}) = {}",
                    other.type_name(),
                    display_value(other)
                );
            }
        }
    }
}

/// Single-line rendering of a value for human-facing formats.
pub fn display_value(value: &FieldValue) -> String {
    match value {
        FieldValue::ShortString(s) => s.clone(),
        FieldValue::LongString(s) => match s.as_str() {
            Some(text) => text.to_string(),
            None => format!("<binary {} bytes>", s.len()),
        },
        FieldValue::Integer(v) => v.to_string(),
        FieldValue::Decimal(d) => d.to_string(),
        FieldValue::Timestamp(t) => t.as_secs().to_string(),
        FieldValue::Boolean(b) => b.to_string(),
        FieldValue::Void => "void".to_string(),
        FieldValue::Table(t) => table_to_json(t).to_string(),
        FieldValue::Array(items) => {
            let parts: Vec<String> = items.iter().map(display_value).collect();
            format!("[{}]", parts.join(", "))
        }
    }
}

pub fn print_raw(data: &[u8]) -> CliResult<()> {
    let mut out = std::io::stdout();
    out.write_all(data)
        .and_then(|()| out.flush())
        .map_err(|err| crate::exit::io_error("failed writing stdout", err))
}

pub fn hex_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    for byte in data {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Parse hex text, ignoring ASCII whitespace between digits.
pub fn hex_decode(text: &str) -> CliResult<Vec<u8>> {
    let digits: Vec<u8> = text
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if digits.len() % 2 != 0 {
        return Err(CliError::data_invalid(
            "hex input has an odd number of digits",
        ));
    }
    digits
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| match (nibble(pair[0]), nibble(pair[1])) {
            (Some(hi), Some(lo)) => Ok((hi << 4) | lo),
            _ => Err(CliError::data_invalid(format!(
                "invalid hex digit near byte {i}"
            ))),
        })
        .collect()
}

fn nibble(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}
