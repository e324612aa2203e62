use std::fmt;
use std::io;

use beamlink_discovery::DiscoveryError;
use beamlink_protocol::ProtocolError;
use beamlink_stream::StreamError;

// Exit code constants aligned with sysexits conventions.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const NETWORK_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => FAILURE,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused => FAILURE,
        _ => NETWORK_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn protocol_error(context: &str, err: ProtocolError) -> CliError {
    match err {
        ProtocolError::ChannelOutOfRange { .. } => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn stream_error(context: &str, err: StreamError) -> CliError {
    match err {
        StreamError::Io(source) => io_error(context, source),
        StreamError::Protocol(source) => protocol_error(context, source),
        StreamError::ZeroFrameRate => CliError::new(USAGE, format!("{context}: {err}")),
    }
}

pub fn discovery_error(context: &str, err: DiscoveryError) -> CliError {
    match err {
        DiscoveryError::Io(source) => io_error(context, source),
        DiscoveryError::Protocol(source) => protocol_error(context, source),
        DiscoveryError::Timeout { .. } => CliError::new(TIMEOUT, format!("{context}: {err}")),
    }
}
