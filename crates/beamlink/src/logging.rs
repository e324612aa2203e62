use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Wire tracing to stderr. `RUST_LOG` takes precedence over the level flag,
/// so per-crate directives like `beamlink_stream=trace` remain available
/// when chasing one engine's send loop.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.directive()));

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_map_to_filter_directives() {
        assert_eq!(LogLevel::Error.directive(), "error");
        assert_eq!(LogLevel::Warn.directive(), "warn");
        assert_eq!(LogLevel::Trace.directive(), "trace");
    }

    #[test]
    fn directives_parse_as_env_filters() {
        for level in [LogLevel::Error, LogLevel::Info, LogLevel::Debug] {
            assert!(level.directive().parse::<EnvFilter>().is_ok());
        }
    }
}
