mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "beamlink", version, about = "IDN laser streaming CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
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
    fn parses_scan_subcommand() {
        let cli = Cli::try_parse_from(["beamlink", "scan", "10.0.0.255", "--timeout", "2s"])
            .expect("scan args should parse");
        assert!(matches!(cli.command, Command::Scan(_)));
    }

    #[test]
    fn parses_stream_subcommand() {
        let cli = Cli::try_parse_from([
            "beamlink",
            "stream",
            "10.0.0.9",
            "--fps",
            "60",
            "--channel",
            "3",
            "--duration",
            "5s",
        ])
        .expect("stream args should parse");
        assert!(matches!(cli.command, Command::Stream(_)));
    }

    #[test]
    fn rejects_decode_hex_and_file_together() {
        let err = Cli::try_parse_from(["beamlink", "decode", "8002", "--file", "/tmp/pkt.bin"])
            .expect_err("conflicting args should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}
