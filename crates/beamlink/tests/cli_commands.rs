#![cfg(feature = "cli")]

use std::net::UdpSocket;
use std::process::Command;
use std::thread;

use beamlink::protocol::hello::{encode_scan_response, HelloHeader, CMD_SCAN_REQUEST};
use beamlink::protocol::{encode_frame_packet, Frame, FramePacketParams, OutputConfig, Point};

fn packet_hex(with_config: bool, truncate: bool) -> String {
    let frame = Frame::new(vec![Point::new(0.5, -0.5, 1.0, 0.0, 0.0)]);
    let params = FramePacketParams {
        channel_id: 3,
        service_id: 3,
        timestamp_us: 1_000,
        duration_us: 33_333,
        with_config,
        single_scan: false,
    };
    let packet =
        encode_frame_packet(&frame, OutputConfig::default(), &params).expect("packet should encode");
    let end = if truncate {
        packet.len() - 1
    } else {
        packet.len()
    };
    packet[..end].iter().map(|b| format!("{b:02x}")).collect()
}

fn spawn_scan_responder(host_name: &'static str) -> u16 {
    let socket = UdpSocket::bind("127.0.0.1:0").expect("responder should bind");
    let port = socket.local_addr().expect("local addr").port();

    thread::spawn(move || {
        let mut buf = [0u8; 256];
        while let Ok((len, from)) = socket.recv_from(&mut buf) {
            let Ok(header) = HelloHeader::decode(&buf[..len]) else {
                continue;
            };
            if header.command == CMD_SCAN_REQUEST {
                let reply = encode_scan_response(header.sequence, 1, 0, [9; 16], host_name);
                let _ = socket.send_to(&reply, from);
            }
        }
    });

    port
}

#[test]
fn decode_reports_valid_packet_as_json() {
    let output = Command::new(env!("CARGO_BIN_EXE_beamlink"))
        .arg("--format")
        .arg("json")
        .arg("decode")
        .arg(packet_hex(true, false))
        .output()
        .expect("decode should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let report: serde_json::Value =
        serde_json::from_str(stdout.trim()).expect("decode should emit json");
    assert_eq!(report.get("valid").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(report.get("channel_id").and_then(|v| v.as_u64()), Some(3));
    assert_eq!(
        report.get("chunk_type").and_then(|v| v.as_str()),
        Some("FRAME_SAMPLES")
    );
    assert_eq!(report.get("has_config").and_then(|v| v.as_bool()), Some(true));
}

#[test]
fn decode_flags_truncated_packet_with_data_invalid_exit() {
    let output = Command::new(env!("CARGO_BIN_EXE_beamlink"))
        .arg("--format")
        .arg("json")
        .arg("decode")
        .arg(packet_hex(false, true))
        .output()
        .expect("decode should run");

    assert_eq!(output.status.code(), Some(60));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let report: serde_json::Value =
        serde_json::from_str(stdout.trim()).expect("decode should emit json");
    assert_eq!(report.get("valid").and_then(|v| v.as_bool()), Some(false));
}

#[test]
fn decode_rejects_bad_hex_with_usage_exit() {
    let output = Command::new(env!("CARGO_BIN_EXE_beamlink"))
        .arg("decode")
        .arg("zz")
        .output()
        .expect("decode should run");

    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn scan_finds_a_loopback_unit() {
    let port = spawn_scan_responder("cli-test-dac");

    let output = Command::new(env!("CARGO_BIN_EXE_beamlink"))
        .arg("--log-level")
        .arg("error")
        .arg("--format")
        .arg("json")
        .arg("scan")
        .arg("127.0.0.1")
        .arg("--port")
        .arg(port.to_string())
        .arg("--no-services")
        .arg("--timeout")
        .arg("300ms")
        .output()
        .expect("scan should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let device: serde_json::Value = serde_json::from_str(
        stdout
            .lines()
            .next()
            .expect("scan should print the discovered unit"),
    )
    .expect("scan should emit json rows");
    assert_eq!(
        device.get("host_name").and_then(|v| v.as_str()),
        Some("cli-test-dac")
    );
    assert_eq!(
        device.get("unit_id").and_then(|v| v.as_str()),
        Some("09090909090909090909090909090909")
    );
}

#[test]
fn scan_with_no_units_prints_nothing_and_succeeds() {
    // Bind-then-drop gives a port with no listener.
    let throwaway = UdpSocket::bind("127.0.0.1:0").expect("bind");
    let port = throwaway.local_addr().expect("addr").port();
    drop(throwaway);

    let output = Command::new(env!("CARGO_BIN_EXE_beamlink"))
        .arg("--log-level")
        .arg("error")
        .arg("--format")
        .arg("json")
        .arg("scan")
        .arg("127.0.0.1")
        .arg("--port")
        .arg(port.to_string())
        .arg("--no-services")
        .arg("--timeout")
        .arg("150ms")
        .output()
        .expect("scan should run");

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn version_reports_package_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_beamlink"))
        .arg("version")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn extended_version_reports_protocol_details() {
    let output = Command::new(env!("CARGO_BIN_EXE_beamlink"))
        .arg("version")
        .arg("--extended")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("idn_port: 7255"));
    assert!(stdout.contains("bytes per point"));
}
