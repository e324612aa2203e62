//! IDN-Hello request/response framing.
//!
//! Hello is the management side of IDN: a 4-byte packet header followed by a
//! command-specific payload. Discovery sends scan and service-map requests
//! and decodes the responses here; the actual socket work lives in the
//! discovery crate.

use bytes::{BufMut, BytesMut};

use crate::error::{ProtocolError, Result};

/// Hello packet header: command + flags + 16-bit sequence.
pub const HELLO_HEADER_SIZE: usize = 4;

/// Ping request command.
pub const CMD_PING_REQUEST: u8 = 0x08;
/// Ping response command.
pub const CMD_PING_RESPONSE: u8 = 0x09;
/// Unit scan request (broadcast).
pub const CMD_SCAN_REQUEST: u8 = 0x10;
/// Unit scan response.
pub const CMD_SCAN_RESPONSE: u8 = 0x11;
/// Service map request (unicast).
pub const CMD_SERVICEMAP_REQUEST: u8 = 0x12;
/// Service map response.
pub const CMD_SERVICEMAP_RESPONSE: u8 = 0x13;

/// Service entry flag bit 0: this is the unit's default service.
pub const SERVICE_FLAG_DEFAULT: u8 = 0x01;

const UNIT_ID_LEN: usize = 16;
const NAME_LEN: usize = 20;
const SCAN_RESPONSE_LEN: usize = HELLO_HEADER_SIZE + 4 + UNIT_ID_LEN + NAME_LEN;
const MAP_HEADER_LEN: usize = 4;
const MAP_ENTRY_LEN: usize = 24;

/// The 4-byte header every hello datagram starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelloHeader {
    pub command: u8,
    pub flags: u8,
    pub sequence: u16,
}

impl HelloHeader {
    /// Decode a header from the start of a datagram.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HELLO_HEADER_SIZE {
            return Err(ProtocolError::Truncated {
                len: bytes.len(),
                need: HELLO_HEADER_SIZE,
            });
        }
        Ok(Self {
            command: bytes[0],
            flags: bytes[1],
            sequence: u16::from_be_bytes([bytes[2], bytes[3]]),
        })
    }

    fn encode(self) -> [u8; HELLO_HEADER_SIZE] {
        let seq = self.sequence.to_be_bytes();
        [self.command, self.flags, seq[0], seq[1]]
    }
}

/// A unit's answer to a scan request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResponse {
    pub sequence: u16,
    pub protocol_version: u8,
    pub status: u8,
    pub unit_id: [u8; UNIT_ID_LEN],
    pub host_name: String,
}

/// One entry of a unit's service map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceMapEntry {
    pub service_id: u8,
    pub service_type: u8,
    pub flags: u8,
    pub relay_number: u8,
    pub name: String,
}

impl ServiceMapEntry {
    /// True if the unit marked this as its default service.
    pub fn is_default(&self) -> bool {
        self.flags & SERVICE_FLAG_DEFAULT != 0
    }
}

/// Decoded service map: relay entries first, then service entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceMap {
    pub relays: Vec<ServiceMapEntry>,
    pub services: Vec<ServiceMapEntry>,
}

/// Encode a broadcast scan request.
pub fn encode_scan_request(sequence: u16) -> [u8; HELLO_HEADER_SIZE] {
    HelloHeader {
        command: CMD_SCAN_REQUEST,
        flags: 0,
        sequence,
    }
    .encode()
}

/// Encode a unicast service map request.
pub fn encode_servicemap_request(sequence: u16) -> [u8; HELLO_HEADER_SIZE] {
    HelloHeader {
        command: CMD_SERVICEMAP_REQUEST,
        flags: 0,
        sequence,
    }
    .encode()
}

/// Encode a ping request.
pub fn encode_ping_request(sequence: u16) -> [u8; HELLO_HEADER_SIZE] {
    HelloHeader {
        command: CMD_PING_REQUEST,
        flags: 0,
        sequence,
    }
    .encode()
}

/// Encode a scan response (used by tests and device emulators).
pub fn encode_scan_response(
    sequence: u16,
    protocol_version: u8,
    status: u8,
    unit_id: [u8; UNIT_ID_LEN],
    host_name: &str,
) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(SCAN_RESPONSE_LEN);
    buf.put_slice(
        &HelloHeader {
            command: CMD_SCAN_RESPONSE,
            flags: 0,
            sequence,
        }
        .encode(),
    );
    buf.put_u8((SCAN_RESPONSE_LEN - HELLO_HEADER_SIZE) as u8);
    buf.put_u8(protocol_version);
    buf.put_u8(status);
    buf.put_u8(0); // reserved
    buf.put_slice(&unit_id);
    buf.put_slice(&pad_name(host_name));
    buf.to_vec()
}

/// Encode a service map response (used by tests and device emulators).
pub fn encode_servicemap_response(
    sequence: u16,
    relays: &[ServiceMapEntry],
    services: &[ServiceMapEntry],
) -> Vec<u8> {
    let entries = relays.len() + services.len();
    let mut buf =
        BytesMut::with_capacity(HELLO_HEADER_SIZE + MAP_HEADER_LEN + entries * MAP_ENTRY_LEN);
    buf.put_slice(
        &HelloHeader {
            command: CMD_SERVICEMAP_RESPONSE,
            flags: 0,
            sequence,
        }
        .encode(),
    );
    buf.put_u8(MAP_HEADER_LEN as u8);
    buf.put_u8(MAP_ENTRY_LEN as u8);
    buf.put_u8(relays.len() as u8);
    buf.put_u8(services.len() as u8);
    for entry in relays.iter().chain(services) {
        buf.put_u8(entry.service_id);
        buf.put_u8(entry.service_type);
        buf.put_u8(entry.flags);
        buf.put_u8(entry.relay_number);
        buf.put_slice(&pad_name(&entry.name));
    }
    buf.to_vec()
}

/// Decode a scan response datagram.
pub fn decode_scan_response(bytes: &[u8]) -> Result<ScanResponse> {
    let header = HelloHeader::decode(bytes)?;
    if header.command != CMD_SCAN_RESPONSE {
        return Err(ProtocolError::UnexpectedCommand {
            got: header.command,
            expected: CMD_SCAN_RESPONSE,
        });
    }
    if bytes.len() < SCAN_RESPONSE_LEN {
        return Err(ProtocolError::Truncated {
            len: bytes.len(),
            need: SCAN_RESPONSE_LEN,
        });
    }

    let payload = &bytes[HELLO_HEADER_SIZE..];
    let mut unit_id = [0u8; UNIT_ID_LEN];
    unit_id.copy_from_slice(&payload[4..4 + UNIT_ID_LEN]);

    Ok(ScanResponse {
        sequence: header.sequence,
        protocol_version: payload[1],
        status: payload[2],
        unit_id,
        host_name: parse_name(&payload[4 + UNIT_ID_LEN..4 + UNIT_ID_LEN + NAME_LEN]),
    })
}

/// Decode a service map response datagram.
pub fn decode_servicemap_response(bytes: &[u8]) -> Result<ServiceMap> {
    let header = HelloHeader::decode(bytes)?;
    if header.command != CMD_SERVICEMAP_RESPONSE {
        return Err(ProtocolError::UnexpectedCommand {
            got: header.command,
            expected: CMD_SERVICEMAP_RESPONSE,
        });
    }
    if bytes.len() < HELLO_HEADER_SIZE + MAP_HEADER_LEN {
        return Err(ProtocolError::Truncated {
            len: bytes.len(),
            need: HELLO_HEADER_SIZE + MAP_HEADER_LEN,
        });
    }

    let payload = &bytes[HELLO_HEADER_SIZE..];
    let entry_size = payload[1] as usize;
    let relay_count = payload[2] as usize;
    let service_count = payload[3] as usize;

    if entry_size < MAP_ENTRY_LEN {
        return Err(ProtocolError::MalformedResponse("entry size too small"));
    }
    let need = HELLO_HEADER_SIZE + MAP_HEADER_LEN + (relay_count + service_count) * entry_size;
    if bytes.len() < need {
        return Err(ProtocolError::Truncated {
            len: bytes.len(),
            need,
        });
    }

    let mut map = ServiceMap::default();
    let entries = &payload[MAP_HEADER_LEN..];
    for i in 0..relay_count + service_count {
        let raw = &entries[i * entry_size..i * entry_size + MAP_ENTRY_LEN];
        let entry = ServiceMapEntry {
            service_id: raw[0],
            service_type: raw[1],
            flags: raw[2],
            relay_number: raw[3],
            name: parse_name(&raw[4..4 + NAME_LEN]),
        };
        if i < relay_count {
            map.relays.push(entry);
        } else {
            map.services.push(entry);
        }
    }
    Ok(map)
}

/// Decode a ping response, returning its sequence number.
pub fn decode_ping_response(bytes: &[u8]) -> Result<u16> {
    let header = HelloHeader::decode(bytes)?;
    if header.command != CMD_PING_RESPONSE {
        return Err(ProtocolError::UnexpectedCommand {
            got: header.command,
            expected: CMD_PING_RESPONSE,
        });
    }
    Ok(header.sequence)
}

fn pad_name(name: &str) -> [u8; NAME_LEN] {
    let mut out = [0u8; NAME_LEN];
    let bytes = name.as_bytes();
    let len = bytes.len().min(NAME_LEN);
    out[..len].copy_from_slice(&bytes[..len]);
    out
}

fn parse_name(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_request_frames_header() {
        let req = encode_scan_request(0x1234);
        assert_eq!(req, [CMD_SCAN_REQUEST, 0x00, 0x12, 0x34]);

        let header = HelloHeader::decode(&req).unwrap();
        assert_eq!(header.command, CMD_SCAN_REQUEST);
        assert_eq!(header.sequence, 0x1234);
    }

    #[test]
    fn scan_response_round_trips() {
        let unit_id = [0xAB; 16];
        let raw = encode_scan_response(7, 1, 0, unit_id, "garage-dac");
        let decoded = decode_scan_response(&raw).unwrap();

        assert_eq!(decoded.sequence, 7);
        assert_eq!(decoded.protocol_version, 1);
        assert_eq!(decoded.unit_id, unit_id);
        assert_eq!(decoded.host_name, "garage-dac");
    }

    #[test]
    fn scan_response_rejects_wrong_command() {
        let raw = encode_scan_response(1, 1, 0, [0; 16], "x");
        let mut bad = raw.clone();
        bad[0] = CMD_PING_RESPONSE;
        assert!(matches!(
            decode_scan_response(&bad),
            Err(ProtocolError::UnexpectedCommand { .. })
        ));
    }

    #[test]
    fn scan_response_rejects_truncation() {
        let raw = encode_scan_response(1, 1, 0, [0; 16], "x");
        assert!(matches!(
            decode_scan_response(&raw[..20]),
            Err(ProtocolError::Truncated { .. })
        ));
    }

    #[test]
    fn host_name_longer_than_field_is_truncated() {
        let raw = encode_scan_response(0, 1, 0, [0; 16], "a-very-long-host-name-indeed");
        let decoded = decode_scan_response(&raw).unwrap();
        assert_eq!(decoded.host_name.len(), 20);
    }

    #[test]
    fn servicemap_round_trips_with_relays() {
        let relays = vec![ServiceMapEntry {
            service_id: 0,
            service_type: 0,
            flags: 0,
            relay_number: 1,
            name: "relay-1".to_string(),
        }];
        let services = vec![
            ServiceMapEntry {
                service_id: 1,
                service_type: 0x80,
                flags: SERVICE_FLAG_DEFAULT,
                relay_number: 0,
                name: "head-a".to_string(),
            },
            ServiceMapEntry {
                service_id: 2,
                service_type: 0x80,
                flags: 0,
                relay_number: 0,
                name: "head-b".to_string(),
            },
        ];

        let raw = encode_servicemap_response(3, &relays, &services);
        let map = decode_servicemap_response(&raw).unwrap();

        assert_eq!(map.relays.len(), 1);
        assert_eq!(map.services.len(), 2);
        assert_eq!(map.services[0].name, "head-a");
        assert!(map.services[0].is_default());
        assert!(!map.services[1].is_default());
    }

    #[test]
    fn servicemap_rejects_short_entry_table() {
        let services = vec![ServiceMapEntry {
            service_id: 1,
            service_type: 0x80,
            flags: 0,
            relay_number: 0,
            name: "head".to_string(),
        }];
        let raw = encode_servicemap_response(0, &[], &services);
        assert!(matches!(
            decode_servicemap_response(&raw[..raw.len() - 4]),
            Err(ProtocolError::Truncated { .. })
        ));
    }

    #[test]
    fn ping_response_returns_sequence() {
        let mut raw = encode_ping_request(42).to_vec();
        raw[0] = CMD_PING_RESPONSE;
        assert_eq!(decode_ping_response(&raw).unwrap(), 42);
    }
}
