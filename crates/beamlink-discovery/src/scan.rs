//! Broadcast scan and per-unit service queries.

use std::net::IpAddr;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tokio::net::UdpSocket;
use tokio::task::JoinSet;
use tracing::{debug, info};

use beamlink_protocol::hello::{
    decode_ping_response, decode_scan_response, decode_servicemap_response, encode_ping_request,
    encode_scan_request, encode_servicemap_request,
};
use beamlink_protocol::IDN_PORT;

use crate::device::DiscoveredDevice;
use crate::error::{DiscoveryError, Result};

const RECV_BUFFER_SIZE: usize = 1024;

/// Timing and addressing knobs for a discovery run.
#[derive(Debug, Clone, Copy)]
pub struct DiscoveryConfig {
    /// UDP port units listen on.
    pub port: u16,
    /// How long to collect scan replies.
    pub hello_timeout: Duration,
    /// Per-unit budget for the service map query.
    pub service_timeout: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            port: IDN_PORT,
            hello_timeout: Duration::from_millis(500),
            service_timeout: Duration::from_millis(300),
        }
    }
}

/// Broadcast a scan request and collect unit replies until the timeout
/// elapses. Replies are de-duplicated by `(address, unit_id)`; malformed
/// replies are skipped. The returned devices carry empty service lists.
pub async fn discover_devices(
    broadcast_address: IpAddr,
    config: &DiscoveryConfig,
) -> Result<Vec<DiscoveredDevice>> {
    let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
    socket.set_broadcast(true)?;

    let request = encode_scan_request(next_sequence());
    socket
        .send_to(&request, (broadcast_address, config.port))
        .await?;

    let deadline = Instant::now() + config.hello_timeout;
    let mut devices: Vec<DiscoveredDevice> = Vec::new();
    let mut buf = [0u8; RECV_BUFFER_SIZE];

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }

        // Socket errors end collection but never discard what was already
        // found: a scan degrades to partial results, it does not fail.
        let (len, addr) = match tokio::time::timeout(remaining, socket.recv_from(&mut buf)).await {
            Ok(Ok(received)) => received,
            Ok(Err(err)) => {
                debug!(error = %err, "scan receive failed; keeping devices found so far");
                break;
            }
            Err(_elapsed) => break,
        };

        match decode_scan_response(&buf[..len]) {
            Ok(response) => {
                let duplicate = devices
                    .iter()
                    .any(|d| d.address == addr.ip() && d.unit_id == response.unit_id);
                if duplicate {
                    continue;
                }
                debug!(address = %addr.ip(), host_name = %response.host_name, "unit found");
                devices.push(DiscoveredDevice::from_scan(
                    addr.ip(),
                    config.port,
                    response,
                ));
            }
            Err(err) => {
                debug!(address = %addr, error = %err, "skipping malformed scan reply");
            }
        }
    }

    info!(devices = devices.len(), "scan finished");
    Ok(devices)
}

/// Discover units, then query each one's service map with its own budget.
/// A unit that fails or times out its service query is still returned,
/// with empty services — one unresponsive device never fails the call.
pub async fn discover_devices_with_services(
    broadcast_address: IpAddr,
    config: &DiscoveryConfig,
) -> Result<Vec<DiscoveredDevice>> {
    let devices = discover_devices(broadcast_address, config).await?;

    let mut queries = JoinSet::new();
    for (index, device) in devices.iter().enumerate() {
        let address = device.address;
        let port = device.port;
        let budget = config.service_timeout;
        queries.spawn(async move { (index, query_service_map(address, port, budget).await) });
    }

    let mut devices = devices;
    while let Some(joined) = queries.join_next().await {
        let Ok((index, result)) = joined else {
            continue;
        };
        match result {
            Ok(map) => devices[index].apply_service_map(map),
            Err(err) => {
                debug!(address = %devices[index].address, error = %err,
                       "service map query failed; returning unit without services");
            }
        }
    }

    Ok(devices)
}

/// Round-trip probe to a single unit.
pub async fn ping(address: IpAddr, port: u16, timeout: Duration) -> Result<Duration> {
    let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
    socket.connect((address, port)).await?;

    let sequence = next_sequence();
    let started = Instant::now();
    socket.send(&encode_ping_request(sequence)).await?;

    let mut buf = [0u8; RECV_BUFFER_SIZE];
    let deadline = started + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(DiscoveryError::Timeout { waited: timeout });
        }
        let len = match tokio::time::timeout(remaining, socket.recv(&mut buf)).await {
            Ok(received) => received?,
            Err(_elapsed) => return Err(DiscoveryError::Timeout { waited: timeout }),
        };
        match decode_ping_response(&buf[..len]) {
            Ok(seq) if seq == sequence => return Ok(started.elapsed()),
            Ok(_) | Err(_) => continue,
        }
    }
}

async fn query_service_map(
    address: IpAddr,
    port: u16,
    timeout: Duration,
) -> Result<beamlink_protocol::hello::ServiceMap> {
    let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
    socket.connect((address, port)).await?;
    socket.send(&encode_servicemap_request(next_sequence())).await?;

    let deadline = Instant::now() + timeout;
    let mut buf = [0u8; RECV_BUFFER_SIZE];
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(DiscoveryError::Timeout { waited: timeout });
        }
        let len = match tokio::time::timeout(remaining, socket.recv(&mut buf)).await {
            Ok(received) => received?,
            Err(_elapsed) => return Err(DiscoveryError::Timeout { waited: timeout }),
        };
        match decode_servicemap_response(&buf[..len]) {
            Ok(map) => return Ok(map),
            Err(err) => {
                debug!(%address, error = %err, "skipping malformed service map reply");
            }
        }
    }
}

fn next_sequence() -> u16 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| (d.subsec_micros() & 0xFFFF) as u16)
        .unwrap_or(0)
}
