/// Errors that can occur while encoding or decoding wire packets.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The channel id does not fit in the 6-bit CNL field.
    #[error("channel id {id} out of range (0-63)")]
    ChannelOutOfRange { id: u8 },

    /// The buffer is shorter than the structure it claims to hold.
    #[error("truncated packet ({len} bytes, need at least {need})")]
    Truncated { len: usize, need: usize },

    /// The declared total size does not match the actual byte length.
    #[error("total size mismatch (declared {declared}, actual {actual})")]
    SizeMismatch { declared: u16, actual: usize },

    /// The chunk type byte is not a known value.
    #[error("unknown chunk type 0x{0:02x}")]
    UnknownChunkType(u8),

    /// The CNL byte does not mark a channel message.
    #[error("not a channel message (CNL bit 7 clear)")]
    NotChannelMessage,

    /// A hello response carried an unexpected command byte.
    #[error("unexpected hello command 0x{got:02x} (expected 0x{expected:02x})")]
    UnexpectedCommand { got: u8, expected: u8 },

    /// A hello response payload was malformed.
    #[error("malformed hello response: {0}")]
    MalformedResponse(&'static str),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
