mod cmd;
mod exit;
mod json;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "tablerpc", version, about = "Field table codec and RPC CLI")]
struct Cli {
    /// Output format for decoded tables.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr). Overridden by TABLERPC_LOG.
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_encode_subcommand() {
        let cli = Cli::try_parse_from(["tablerpc", "encode", "--json", "{\"a\":1}", "--raw"])
            .expect("encode args should parse");

        match cli.command {
            Command::Encode(args) => {
                assert_eq!(args.json.as_deref(), Some("{\"a\":1}"));
                assert!(args.raw);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_conflicting_input_args() {
        let err = Cli::try_parse_from([
            "tablerpc",
            "decode",
            "--hex",
            "00000000",
            "--file",
            "frame.bin",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_decode_limits() {
        let cli = Cli::try_parse_from([
            "tablerpc",
            "--format",
            "pretty",
            "decode",
            "--max-depth",
            "3",
            "--reject-duplicates",
            "--allow-trailing",
        ])
        .expect("decode args should parse");

        assert_eq!(cli.format, Some(OutputFormat::Pretty));
        match cli.command {
            Command::Decode(args) => {
                assert_eq!(args.limits.max_depth, 3);
                assert!(args.limits.reject_duplicates);
                assert!(args.allow_trailing);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_echo_routing() {
        let cli = Cli::try_parse_from([
            "tablerpc",
            "echo",
            "--json",
            "{}",
            "--destination",
            "amq.direct",
            "--routing-key",
            "svc.status",
        ])
        .expect("echo args should parse");
        assert!(matches!(
            cli.command,
            Command::Echo(ref args) if args.destination == "amq.direct" && args.routing_key == "svc.status"
        ));
    }
}
