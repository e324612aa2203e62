//! Wire codecs for the ILDA Digital Network protocols.
//!
//! This is the pure layer of beamlink: everything in here turns values into
//! bytes and back. No sockets, no clocks, no state.
//!
//! - [`codec`] — IDN-Stream channel messages (frame samples, config
//!   headers, close requests)
//! - [`hello`] — IDN-Hello request/response framing (scan, service map,
//!   ping)
//! - [`config`] — per-point sample layout ([`OutputConfig`])
//! - [`frame`] — normalized point/frame value types

pub mod codec;
pub mod config;
pub mod error;
pub mod frame;
pub mod hello;

pub use codec::{
    decode_packet_info, encode_close_packet, encode_frame_packet, packet_size, validate,
    ChunkType, FramePacketParams, PacketInfo, Validation, CHANNEL_MESSAGE_HEADER_SIZE,
    CONFIG_HEADER_SIZE, FRAME_CHUNK_HEADER_SIZE, IDN_PORT, MAX_CHANNEL_ID,
};
pub use config::{OutputConfig, SampleDepth};
pub use error::{ProtocolError, Result};
pub use frame::{Frame, Point};
