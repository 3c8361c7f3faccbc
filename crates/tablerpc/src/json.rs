//! JSON <-> field table mapping used by the CLI.
//!
//! Plain JSON covers most field types, with strings written as long strings.
//! The rest use single-key tagged objects:
//! `{"$decimal": {"scale": 2, "value": 1234}}`, `{"$timestamp": 1700000000}`,
//! `{"$shortstr": "text"}`, `{"$longstr": "text"}` or `{"$longstr": {"hex": "ff00"}}`
//! for bytes that are not UTF-8, and `{"$table": {...}}` for a nested table
//! whose only key is itself one of these tags. Any other object is a table.

use serde_json::{json, Map, Value};
use tablerpc_codec::{Decimal, FieldTable, FieldValue, LongString, Timestamp};

use crate::exit::{CliError, CliResult};
use crate::output::{hex_decode, hex_encode};

const DECIMAL_KEY: &str = "$decimal";
const TIMESTAMP_KEY: &str = "$timestamp";
const SHORT_STRING_KEY: &str = "$shortstr";
const LONG_STRING_KEY: &str = "$longstr";
const TABLE_KEY: &str = "$table";

const TAGS: [&str; 5] = [
    DECIMAL_KEY,
    TIMESTAMP_KEY,
    SHORT_STRING_KEY,
    LONG_STRING_KEY,
    TABLE_KEY,
];

/// Convert a JSON object into a field table.
pub fn table_from_json(value: &Value) -> CliResult<FieldTable> {
    match value {
        Value::Object(map) => object_to_table(map, "$"),
        other => Err(CliError::data_invalid(format!(
            "expected a JSON object at $, found {}",
            kind(other)
        ))),
    }
}

/// Convert a field table into JSON, using tagged objects where plain JSON would lose the type.
pub fn table_to_json(table: &FieldTable) -> Value {
    Value::Object(
        table
            .iter()
            .map(|(key, value)| (key.clone(), value_to_json(value)))
            .collect(),
    )
}

pub fn value_to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::ShortString(s) => json!({ SHORT_STRING_KEY: s }),
        FieldValue::LongString(s) => match s.as_str() {
            Some(text) => Value::String(text.to_string()),
            None => json!({ LONG_STRING_KEY: { "hex": hex_encode(s.as_bytes()) } }),
        },
        FieldValue::Integer(v) => json!(v),
        FieldValue::Decimal(d) => json!({
            DECIMAL_KEY: { "scale": d.scale(), "value": d.value() }
        }),
        FieldValue::Timestamp(t) => json!({ TIMESTAMP_KEY: t.as_secs() }),
        FieldValue::Table(t) => {
            let object = table_to_json(t);
            if t.len() == 1 && t.keys().any(|key| TAGS.contains(&key.as_str())) {
                json!({ TABLE_KEY: object })
            } else {
                object
            }
        }
        FieldValue::Array(items) => Value::Array(items.iter().map(value_to_json).collect()),
        FieldValue::Boolean(b) => Value::Bool(*b),
        FieldValue::Void => Value::Null,
    }
}

fn object_to_table(map: &Map<String, Value>, path: &str) -> CliResult<FieldTable> {
    let mut table = FieldTable::new();
    for (key, value) in map {
        let field_path = format!("{path}.{key}");
        table.insert(key.clone(), value_from_json(value, &field_path)?);
    }
    Ok(table)
}

fn value_from_json(value: &Value, path: &str) -> CliResult<FieldValue> {
    match value {
        Value::Null => Ok(FieldValue::Void),
        Value::Bool(b) => Ok(FieldValue::Boolean(*b)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(FieldValue::Integer)
            .ok_or_else(|| {
                CliError::data_invalid(format!(
                    "number {n} at {path} is not a 32-bit integer (use {{\"{DECIMAL_KEY}\": ...}})"
                ))
            }),
        Value::String(s) => Ok(FieldValue::from(s.clone())),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| value_from_json(item, &format!("{path}[{i}]")))
            .collect::<CliResult<Vec<_>>>()
            .map(FieldValue::Array),
        Value::Object(map) => match tagged(map) {
            Some((tag, inner)) => tagged_from_json(tag, inner, path),
            None => object_to_table(map, path).map(FieldValue::Table),
        },
    }
}

/// The tag and its payload when `map` is exactly one known tag key.
fn tagged(map: &Map<String, Value>) -> Option<(&str, &Value)> {
    if map.len() != 1 {
        return None;
    }
    map.iter()
        .next()
        .filter(|(key, _)| TAGS.contains(&key.as_str()))
        .map(|(key, value)| (key.as_str(), value))
}

fn tagged_from_json(tag: &str, inner: &Value, path: &str) -> CliResult<FieldValue> {
    match tag {
        DECIMAL_KEY => {
            let scale = inner
                .get("scale")
                .and_then(Value::as_u64)
                .and_then(|s| u8::try_from(s).ok());
            let value = inner
                .get("value")
                .and_then(Value::as_i64)
                .and_then(|v| i32::try_from(v).ok());
            match (scale, value) {
                (Some(scale), Some(value)) => Ok(FieldValue::Decimal(Decimal::new(value, scale))),
                _ => Err(CliError::data_invalid(format!(
                    "{DECIMAL_KEY} at {path} needs \"scale\" (0-255) and \"value\" (32-bit integer)"
                ))),
            }
        }
        TIMESTAMP_KEY => inner
            .as_i64()
            .map(|secs| FieldValue::Timestamp(Timestamp::from_secs(secs)))
            .ok_or_else(|| {
                CliError::data_invalid(format!(
                    "{TIMESTAMP_KEY} at {path} must be an integer number of seconds"
                ))
            }),
        SHORT_STRING_KEY => match inner.as_str() {
            Some(s) if s.len() <= usize::from(u8::MAX) => Ok(FieldValue::ShortString(s.to_string())),
            Some(s) => Err(CliError::data_invalid(format!(
                "{SHORT_STRING_KEY} at {path} is {} bytes, at most 255 fit",
                s.len()
            ))),
            None => Err(CliError::data_invalid(format!(
                "{SHORT_STRING_KEY} at {path} must be a string"
            ))),
        },
        LONG_STRING_KEY => long_string_from_json(inner, path),
        TABLE_KEY => match inner {
            Value::Object(map) => object_to_table(map, path).map(FieldValue::Table),
            other => Err(CliError::data_invalid(format!(
                "{TABLE_KEY} at {path} must be an object, found {}",
                kind(other)
            ))),
        },
        other => Err(CliError::data_invalid(format!(
            "unknown tagged type {other:?} at {path}"
        ))),
    }
}

fn long_string_from_json(inner: &Value, path: &str) -> CliResult<FieldValue> {
    if let Some(text) = inner.as_str() {
        return Ok(FieldValue::LongString(LongString::from(text)));
    }
    match inner.get("hex").and_then(Value::as_str) {
        Some(hex) => hex_decode(hex)
            .map(|bytes| FieldValue::LongString(LongString::from(bytes)))
            .map_err(|err| {
                CliError::data_invalid(format!("{LONG_STRING_KEY} at {path}: {}", err.message))
            }),
        None => Err(CliError::data_invalid(format!(
            "{LONG_STRING_KEY} at {path} must be a string or {{\"hex\": ...}}"
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
