/// Errors that can occur in streaming engine operations.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// An I/O error while opening or using the engine socket.
    #[error("engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A packet could not be encoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] beamlink_protocol::ProtocolError),

    /// The configured frame rate is zero.
    #[error("frame rate must be greater than zero")]
    ZeroFrameRate,
}

pub type Result<T> = std::result::Result<T, StreamError>;
