use beamlink_protocol::{OutputConfig, IDN_PORT};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("beamlink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    let output = OutputConfig::default();
    println!("name: beamlink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("idn_port: {IDN_PORT}");
    println!(
        "default_layout: {}-bit xy / {}-bit color, {} bytes per point",
        output.xy.bits(),
        output.color.bits(),
        output.bytes_per_point()
    );
    println!(
        "features: stream={}, discovery={}, cli=true",
        cfg!(feature = "stream"),
        cfg!(feature = "discovery")
    );
    println!(
        "target: {}-{}",
        std::env::consts::ARCH,
        std::env::consts::OS
    );

    Ok(SUCCESS)
}
