//! IDN-Stream channel message codec.
//!
//! One encoded packet is one UDP datagram. Layout (all multi-byte fields
//! big-endian):
//!
//! ```text
//! ┌────────────────┬──────┬────────────┬──────────────┐
//! │ total_size (2) │ CNL  │ chunk_type │ timestamp (4)│  channel message header
//! ├────────────────┴──────┴────────────┴──────────────┤
//! │ SCWC │ CFL │ service_id │ service_mode │ tags...  │  config header (iff CCLF)
//! ├───────────────────────────────────────────────────┤
//! │ flags │ duration (3) │ point samples...           │  frame chunk (iff FRAME_SAMPLES)
//! └───────────────────────────────────────────────────┘
//! ```
//!
//! The CNL byte packs three things: bit 7 marks a channel message and is
//! always set, bit 6 (CCLF) marks a trailing config header, bits 0-5 carry
//! the channel id.

use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::config::OutputConfig;
use crate::error::{ProtocolError, Result};
use crate::frame::Frame;

/// Default IDN UDP port.
pub const IDN_PORT: u16 = 7255;

/// Channel message header: total_size (2) + CNL + chunk_type + timestamp (4).
pub const CHANNEL_MESSAGE_HEADER_SIZE: usize = 8;

/// Config header before the tag words: SCWC + CFL + service_id + service_mode.
pub const CONFIG_HEADER_SIZE: usize = 4;

/// Frame chunk header: flags + 24-bit duration.
pub const FRAME_CHUNK_HEADER_SIZE: usize = 4;

/// Highest channel id representable in the 6-bit CNL field.
pub const MAX_CHANNEL_ID: u8 = 63;

/// CNL bit 7: this is a channel message.
pub const CNL_CHANNEL_MESSAGE: u8 = 0x80;
/// CNL bit 6 (CCLF): a config header follows the channel message header.
pub const CNL_CONFIG_FOLLOWS: u8 = 0x40;

/// CFL bit 0: routing by service id.
pub const CFL_ROUTING: u8 = 0x01;
/// CFL bit 1: close the channel.
pub const CFL_CLOSE: u8 = 0x02;

/// Service mode: discrete graphic frames.
pub const SERVICE_MODE_GRAPHIC_DISCRETE: u8 = 0x02;

/// Frame chunk flag bit 0: scan the frame exactly once instead of looping.
pub const CHUNK_FLAG_ONCE: u8 = 0x01;

/// Chunk type carried in the channel message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ChunkType {
    /// No payload; used for config-only and close messages.
    Void = 0x00,
    /// A frame of point samples follows.
    FrameSamples = 0x02,
}

impl ChunkType {
    /// Parse a chunk type byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(ChunkType::Void),
            0x02 => Some(ChunkType::FrameSamples),
            _ => None,
        }
    }
}

/// Per-packet parameters for [`encode_frame_packet`].
#[derive(Debug, Clone, Copy)]
pub struct FramePacketParams {
    /// Channel id (0-63), packed into CNL bits 0-5.
    pub channel_id: u8,
    /// Service id announced in the config header.
    pub service_id: u8,
    /// Sender timestamp in microseconds.
    pub timestamp_us: u32,
    /// Time the DAC should spend scanning the frame, in microseconds.
    pub duration_us: u32,
    /// Attach the channel configuration header.
    pub with_config: bool,
    /// Scan the frame once instead of looping at the DAC.
    pub single_scan: bool,
}

/// Decoded header summary of one packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketInfo {
    pub channel_id: u8,
    pub timestamp_us: u32,
    pub chunk_type: ChunkType,
    pub has_config: bool,
}

/// Validation report for a received or about-to-be-sent packet.
#[derive(Debug, Clone, Default)]
pub struct Validation {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Total encoded size of a frame packet.
pub fn packet_size(point_count: usize, config: OutputConfig, with_config: bool) -> usize {
    let mut size = CHANNEL_MESSAGE_HEADER_SIZE;
    if with_config {
        size += CONFIG_HEADER_SIZE + 2 * config.scwc() as usize;
    }
    size + FRAME_CHUNK_HEADER_SIZE + point_count * config.bytes_per_point()
}

/// Encode a FRAME_SAMPLES packet for one frame.
pub fn encode_frame_packet(
    frame: &Frame,
    config: OutputConfig,
    params: &FramePacketParams,
) -> Result<Bytes> {
    check_channel(params.channel_id)?;

    let total = packet_size(frame.len(), config, params.with_config);
    let mut buf = BytesMut::with_capacity(total);

    put_message_header(
        &mut buf,
        total,
        params.channel_id,
        params.with_config,
        ChunkType::FrameSamples,
        params.timestamp_us,
    );

    if params.with_config {
        put_config_header(&mut buf, config, params.service_id, CFL_ROUTING);
    }

    let flags = if params.single_scan { CHUNK_FLAG_ONCE } else { 0 };
    buf.put_u8(flags);
    put_u24(&mut buf, params.duration_us);

    for point in frame.points() {
        put_xy(&mut buf, point.x, config);
        put_xy(&mut buf, point.y, config);
        put_color(&mut buf, point.r, config);
        put_color(&mut buf, point.g, config);
        put_color(&mut buf, point.b, config);
    }

    debug_assert_eq!(buf.len(), total);
    Ok(buf.freeze())
}

/// Encode a close-channel packet: VOID chunk, config header with the close
/// flag set, no frame payload.
pub fn encode_close_packet(
    channel_id: u8,
    service_id: u8,
    timestamp_us: u32,
    config: OutputConfig,
) -> Result<Bytes> {
    check_channel(channel_id)?;

    let total = CHANNEL_MESSAGE_HEADER_SIZE + CONFIG_HEADER_SIZE + 2 * config.scwc() as usize;
    let mut buf = BytesMut::with_capacity(total);

    put_message_header(&mut buf, total, channel_id, true, ChunkType::Void, timestamp_us);
    put_config_header(&mut buf, config, service_id, CFL_ROUTING | CFL_CLOSE);

    debug_assert_eq!(buf.len(), total);
    Ok(buf.freeze())
}

/// Decode the header summary of a packet.
///
/// Only the channel message header is inspected; the config header and
/// sample payload are left untouched.
pub fn decode_packet_info(bytes: &[u8]) -> Result<PacketInfo> {
    if bytes.len() < CHANNEL_MESSAGE_HEADER_SIZE {
        return Err(ProtocolError::Truncated {
            len: bytes.len(),
            need: CHANNEL_MESSAGE_HEADER_SIZE,
        });
    }

    let cnl = bytes[2];
    if cnl & CNL_CHANNEL_MESSAGE == 0 {
        return Err(ProtocolError::NotChannelMessage);
    }

    let chunk_type =
        ChunkType::from_u8(bytes[3]).ok_or(ProtocolError::UnknownChunkType(bytes[3]))?;
    let timestamp_us = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);

    Ok(PacketInfo {
        channel_id: cnl & MAX_CHANNEL_ID,
        timestamp_us,
        chunk_type,
        has_config: cnl & CNL_CONFIG_FOLLOWS != 0,
    })
}

/// Check a packet without failing: every problem found is reported.
pub fn validate(bytes: &[u8]) -> Validation {
    let mut errors = Vec::new();

    if bytes.len() < CHANNEL_MESSAGE_HEADER_SIZE {
        errors.push(format!(
            "truncated packet ({} bytes, need at least {CHANNEL_MESSAGE_HEADER_SIZE})",
            bytes.len()
        ));
        return Validation {
            valid: false,
            errors,
        };
    }

    let declared = u16::from_be_bytes([bytes[0], bytes[1]]);
    if declared as usize != bytes.len() {
        errors.push(format!(
            "total size mismatch (declared {declared}, actual {})",
            bytes.len()
        ));
    }

    if bytes[2] & CNL_CHANNEL_MESSAGE == 0 {
        errors.push("not a channel message (CNL bit 7 clear)".to_string());
    }

    if ChunkType::from_u8(bytes[3]).is_none() {
        errors.push(format!("unknown chunk type 0x{:02x}", bytes[3]));
    }

    if !errors.is_empty() {
        debug!(count = errors.len(), "packet failed validation");
    }
    Validation {
        valid: errors.is_empty(),
        errors,
    }
}

fn check_channel(channel_id: u8) -> Result<()> {
    if channel_id > MAX_CHANNEL_ID {
        return Err(ProtocolError::ChannelOutOfRange { id: channel_id });
    }
    Ok(())
}

fn put_message_header(
    buf: &mut BytesMut,
    total_size: usize,
    channel_id: u8,
    with_config: bool,
    chunk_type: ChunkType,
    timestamp_us: u32,
) {
    let mut cnl = CNL_CHANNEL_MESSAGE | (channel_id & MAX_CHANNEL_ID);
    if with_config {
        cnl |= CNL_CONFIG_FOLLOWS;
    }
    buf.put_u16(total_size as u16);
    buf.put_u8(cnl);
    buf.put_u8(chunk_type as u8);
    buf.put_u32(timestamp_us);
}

fn put_config_header(buf: &mut BytesMut, config: OutputConfig, service_id: u8, cfl: u8) {
    buf.put_u8(config.scwc());
    buf.put_u8(cfl);
    buf.put_u8(service_id);
    buf.put_u8(SERVICE_MODE_GRAPHIC_DISCRETE);
    for tag in config.descriptor_tags() {
        buf.put_u16(tag);
    }
}

fn put_u24(buf: &mut BytesMut, value: u32) {
    let clamped = value.min(0x00FF_FFFF);
    buf.put_u8((clamped >> 16) as u8);
    buf.put_u8((clamped >> 8) as u8);
    buf.put_u8(clamped as u8);
}

fn put_xy(buf: &mut BytesMut, value: f32, config: OutputConfig) {
    let v = value.clamp(-1.0, 1.0);
    match config.xy {
        crate::config::SampleDepth::Bits8 => buf.put_i8((v * i8::MAX as f32).round() as i8),
        crate::config::SampleDepth::Bits16 => buf.put_i16((v * i16::MAX as f32).round() as i16),
    }
}

fn put_color(buf: &mut BytesMut, value: f32, config: OutputConfig) {
    let v = value.clamp(0.0, 1.0);
    match config.color {
        crate::config::SampleDepth::Bits8 => buf.put_u8((v * u8::MAX as f32).round() as u8),
        crate::config::SampleDepth::Bits16 => buf.put_u16((v * u16::MAX as f32).round() as u16),
    }
}
