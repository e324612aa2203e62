use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use beamlink_discovery::DiscoveredDevice;
use beamlink_protocol::{ChunkType, PacketInfo, Validation};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct DeviceOutput<'a> {
    address: String,
    port: u16,
    host_name: &'a str,
    unit_id: String,
    protocol_version: u8,
    status: u8,
    services: Vec<ServiceOutput<'a>>,
    ping_ms: Option<f64>,
}

#[derive(Serialize)]
struct ServiceOutput<'a> {
    service_id: u8,
    name: &'a str,
    default: bool,
}

pub fn print_devices(devices: &[DiscoveredDevice], pings: &[Option<f64>], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for (i, dev) in devices.iter().enumerate() {
                let out = DeviceOutput {
                    address: dev.address.to_string(),
                    port: dev.port,
                    host_name: &dev.host_name,
                    unit_id: unit_id_hex(&dev.unit_id),
                    protocol_version: dev.protocol_version,
                    status: dev.status,
                    services: dev
                        .services
                        .iter()
                        .map(|s| ServiceOutput {
                            service_id: s.service_id,
                            name: &s.name,
                            default: s.default_service,
                        })
                        .collect(),
                    ping_ms: pings.get(i).copied().flatten(),
                };
                println!(
                    "{}",
                    serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ADDRESS", "NAME", "UNIT ID", "SERVICES", "PING"]);
            for (i, dev) in devices.iter().enumerate() {
                table.add_row(vec![
                    format!("{}:{}", dev.address, dev.port),
                    dev.host_name.clone(),
                    unit_id_hex(&dev.unit_id),
                    services_summary(dev),
                    match pings.get(i).copied().flatten() {
                        Some(ms) => format!("{ms:.2}ms"),
                        None => "-".to_string(),
                    },
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (i, dev) in devices.iter().enumerate() {
                println!(
                    "{}:{} name={} unit={} services=[{}]",
                    dev.address,
                    dev.port,
                    dev.host_name,
                    unit_id_hex(&dev.unit_id),
                    services_summary(dev)
                );
                if let Some(ms) = pings.get(i).copied().flatten() {
                    println!("  ping: {ms:.2}ms");
                }
            }
        }
    }
}

#[derive(Serialize)]
struct PacketOutput {
    size: usize,
    channel_id: u8,
    timestamp_us: u32,
    chunk_type: String,
    has_config: bool,
    valid: bool,
    errors: Vec<String>,
}

pub fn print_packet(size: usize, info: &PacketInfo, validation: &Validation, format: OutputFormat) {
    let chunk_type = chunk_type_name(info.chunk_type).to_string();
    match format {
        OutputFormat::Json => {
            let out = PacketOutput {
                size,
                channel_id: info.channel_id,
                timestamp_us: info.timestamp_us,
                chunk_type,
                has_config: info.has_config,
                valid: validation.valid,
                errors: validation.errors.clone(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"])
                .add_row(vec!["size".to_string(), size.to_string()])
                .add_row(vec!["channel".to_string(), info.channel_id.to_string()])
                .add_row(vec![
                    "timestamp_us".to_string(),
                    info.timestamp_us.to_string(),
                ])
                .add_row(vec!["chunk_type".to_string(), chunk_type])
                .add_row(vec!["has_config".to_string(), info.has_config.to_string()])
                .add_row(vec!["valid".to_string(), validation.valid.to_string()]);
            for err in &validation.errors {
                table.add_row(vec!["error".to_string(), err.clone()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "size={size} channel={} timestamp_us={} chunk={} config={} valid={}",
                info.channel_id, info.timestamp_us, chunk_type, info.has_config, validation.valid
            );
            for err in &validation.errors {
                println!("  error: {err}");
            }
        }
    }
}

pub fn chunk_type_name(chunk: ChunkType) -> &'static str {
    match chunk {
        ChunkType::Void => "VOID",
        ChunkType::FrameSamples => "FRAME_SAMPLES",
    }
}

fn services_summary(dev: &DiscoveredDevice) -> String {
    if dev.services.is_empty() {
        return "-".to_string();
    }
    dev.services
        .iter()
        .map(|s| {
            if s.default_service {
                format!("{}:{}*", s.service_id, s.name)
            } else {
                format!("{}:{}", s.service_id, s.name)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn unit_id_hex(unit_id: &[u8; 16]) -> String {
    unit_id.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_id_renders_as_lowercase_hex() {
        let mut id = [0u8; 16];
        id[0] = 0xAB;
        id[15] = 0x01;
        let hex = unit_id_hex(&id);
        assert_eq!(hex.len(), 32);
        assert!(hex.starts_with("ab"));
        assert!(hex.ends_with("01"));
    }
}
