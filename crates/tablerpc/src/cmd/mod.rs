use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use tablerpc_codec::{CodecConfig, DuplicateKeys, DEFAULT_MAX_DEPTH, DEFAULT_MAX_FRAME_SIZE};

use crate::exit::{io_error, CliResult};
use crate::output::OutputFormat;

pub mod decode;
pub mod echo;
pub mod encode;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode a JSON object as a field table.
    Encode(EncodeArgs),
    /// Decode a field table and print its fields.
    Decode(DecodeArgs),
    /// Send a table through an in-process echo transport and print the reply.
    Echo(EchoArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args),
        Command::Decode(args) => decode::run(args, format),
        Command::Echo(args) => echo::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Codec limits shared by every subcommand that decodes.
#[derive(Args, Debug, Clone)]
pub struct LimitArgs {
    /// Maximum nesting depth of tables and arrays.
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,
    /// Maximum size in bytes of any single frame.
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME_SIZE)]
    pub max_frame_size: usize,
    /// Fail on repeated keys instead of keeping the last value.
    #[arg(long)]
    pub reject_duplicates: bool,
}

impl LimitArgs {
    pub fn codec_config(&self) -> CodecConfig {
        let duplicate_keys = if self.reject_duplicates {
            DuplicateKeys::Reject
        } else {
            DuplicateKeys::LastWins
        };
        CodecConfig::default()
            .with_max_depth(self.max_depth)
            .with_max_frame_size(self.max_frame_size)
            .with_duplicate_keys(duplicate_keys)
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// JSON object to encode.
    #[arg(long, conflicts_with = "file")]
    pub json: Option<String>,
    /// Read the JSON object from a file. Default: stdin.
    #[arg(long, conflicts_with = "json")]
    pub file: Option<PathBuf>,
    /// Write the encoded bytes instead of hex text.
    #[arg(long)]
    pub raw: bool,
    #[command(flatten)]
    pub limits: LimitArgs,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Encoded table as hex text.
    #[arg(long, conflicts_with = "file")]
    pub hex: Option<String>,
    /// Read the encoded table from a file. Default: stdin.
    #[arg(long, conflicts_with = "hex")]
    pub file: Option<PathBuf>,
    /// Treat file or stdin input as hex text rather than raw bytes.
    #[arg(long)]
    pub hex_input: bool,
    /// Ignore bytes after the table instead of failing.
    #[arg(long)]
    pub allow_trailing: bool,
    #[command(flatten)]
    pub limits: LimitArgs,
}

#[derive(Args, Debug)]
pub struct EchoArgs {
    /// JSON object to send.
    #[arg(long, conflicts_with = "file")]
    pub json: Option<String>,
    /// Read the JSON object from a file. Default: stdin.
    #[arg(long, conflicts_with = "json")]
    pub file: Option<PathBuf>,
    /// Destination passed to the transport.
    #[arg(long, default_value = "")]
    pub destination: String,
    /// Routing key passed to the transport.
    #[arg(long, default_value = "echo")]
    pub routing_key: String,
    #[command(flatten)]
    pub limits: LimitArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Inline text, then file contents, then stdin.
pub(crate) fn read_input(inline: Option<&str>, file: Option<&Path>) -> CliResult<Vec<u8>> {
    if let Some(text) = inline {
        return Ok(text.as_bytes().to_vec());
    }
    if let Some(path) = file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    let mut buf = Vec::new();
    std::io::stdin()
        .read_to_end(&mut buf)
        .map_err(|err| io_error("failed reading stdin", err))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_match_codec_defaults() {
        let limits = LimitArgs {
            max_depth: DEFAULT_MAX_DEPTH,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            reject_duplicates: false,
        };
        assert_eq!(limits.codec_config(), CodecConfig::default());
    }

    #[test]
    fn reject_duplicates_sets_policy() {
        let limits = LimitArgs {
            max_depth: 4,
            max_frame_size: 128,
            reject_duplicates: true,
        };
        let config = limits.codec_config();
        assert_eq!(config.duplicate_keys, DuplicateKeys::Reject);
        assert_eq!(config.max_depth, 4);
        assert_eq!(config.max_frame_size, 128);
    }

    #[test]
    fn inline_input_wins() {
        let data = read_input(Some("{}"), None).unwrap();
        assert_eq!(data, b"{}");
    }

    #[test]
    fn missing_file_is_reported() {
        let err = read_input(None, Some(Path::new("/nonexistent/tablerpc-input"))).unwrap_err();
        assert!(err.message.starts_with("failed reading /nonexistent/tablerpc-input"));
    }
}
