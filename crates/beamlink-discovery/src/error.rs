use std::time::Duration;

/// Errors that can occur during discovery exchanges.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// An I/O error on the discovery socket.
    #[error("discovery I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A reply could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] beamlink_protocol::ProtocolError),

    /// No reply arrived within the budget (unicast exchanges only; the
    /// broadcast scan treats silence as an empty result).
    #[error("no reply within {waited:?}")]
    Timeout { waited: Duration },
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;
