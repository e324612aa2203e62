use std::net::IpAddr;
use std::time::Duration;

use tracing::info;

use beamlink_discovery::{discover_devices, discover_devices_with_services, ping, DiscoveryConfig};

use crate::cmd::{parse_duration_arg, ScanArgs};
use crate::exit::{discovery_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_devices, OutputFormat};

pub fn run(args: ScanArgs, format: OutputFormat) -> CliResult<i32> {
    let broadcast: IpAddr = args
        .broadcast
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid broadcast address: {}", args.broadcast)))?;
    let timeout = parse_duration_arg(&args.timeout)?;

    let config = DiscoveryConfig {
        port: args.port,
        hello_timeout: timeout,
        ..DiscoveryConfig::default()
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| CliError::new(crate::exit::INTERNAL, format!("runtime setup failed: {err}")))?;

    let devices = runtime
        .block_on(async {
            if args.no_services {
                discover_devices(broadcast, &config).await
            } else {
                discover_devices_with_services(broadcast, &config).await
            }
        })
        .map_err(|err| discovery_error("scan failed", err))?;

    info!(count = devices.len(), "scan complete");

    let pings = if args.ping {
        runtime.block_on(async {
            let mut out = Vec::with_capacity(devices.len());
            for dev in &devices {
                let latency = ping(dev.address, dev.port, Duration::from_secs(1))
                    .await
                    .ok()
                    .map(|d| (d.as_secs_f64() * 1000.0 * 100.0).round() / 100.0);
                out.push(latency);
            }
            out
        })
    } else {
        vec![None; devices.len()]
    };

    print_devices(&devices, &pings, format);
    Ok(SUCCESS)
}
