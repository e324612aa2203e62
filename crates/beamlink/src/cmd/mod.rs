use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod scan;
pub mod stream;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Discover IDN units on the network.
    Scan(ScanArgs),
    /// Stream a test pattern to a unit.
    Stream(StreamArgs),
    /// Decode and validate a captured packet.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Scan(args) => scan::run(args, format),
        Command::Stream(args) => stream::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Broadcast address to scan.
    #[arg(default_value = "255.255.255.255")]
    pub broadcast: String,
    /// UDP port the units listen on.
    #[arg(long, default_value_t = beamlink_protocol::IDN_PORT)]
    pub port: u16,
    /// How long to collect scan replies (e.g. 2s, 500ms).
    #[arg(long, default_value = "500ms")]
    pub timeout: String,
    /// Skip the per-unit service map query.
    #[arg(long)]
    pub no_services: bool,
    /// Measure round-trip latency to each unit.
    #[arg(long)]
    pub ping: bool,
}

#[derive(Args, Debug)]
pub struct StreamArgs {
    /// Host name or address of the unit.
    pub host: String,
    /// UDP port the unit listens on.
    #[arg(long, default_value_t = beamlink_protocol::IDN_PORT)]
    pub port: u16,
    /// Frames per second.
    #[arg(long, default_value = "30")]
    pub fps: u32,
    /// IDN channel to stream on (0-63).
    #[arg(long, short = 'c', default_value = "0")]
    pub channel: u8,
    /// Stop after this long (e.g. 10s). Default: run until Ctrl-C.
    #[arg(long)]
    pub duration: Option<String>,
    /// Points per test pattern frame.
    #[arg(long, default_value = "120")]
    pub points: usize,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Packet bytes as a hex string (whitespace allowed).
    #[arg(conflicts_with = "file")]
    pub hex: Option<String>,
    /// Read packet bytes from a binary file.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn parse_duration_arg(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds() {
        assert_eq!(parse_duration_arg("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration_arg("2").unwrap(), Duration::from_secs(2));
    }

    #[test]
    fn parse_duration_millis() {
        assert_eq!(
            parse_duration_arg("150ms").unwrap(),
            Duration::from_millis(150)
        );
    }

    #[test]
    fn parse_duration_invalid() {
        assert!(parse_duration_arg("0s").is_err());
        assert!(parse_duration_arg("bad").is_err());
    }
}
