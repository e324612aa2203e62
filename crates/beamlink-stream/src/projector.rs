//! Logical projector configuration.
//!
//! Projectors are owned by the hosting application; the orchestrator only
//! reads them. A projector with a blank host or `enabled = false` simply
//! produces no engine.

use beamlink_protocol::{OutputConfig, IDN_PORT};

/// One logical output target.
#[derive(Debug, Clone, PartialEq)]
pub struct Projector {
    /// Target host. May be blank, in which case no engine is created.
    pub host: String,
    /// Target UDP port.
    pub port: u16,
    /// Service id on the device; doubles as the engine's channel id, which
    /// keeps channels collision-free on multi-head devices.
    pub service_id: u8,
    /// Disabled projectors get no engine.
    pub enabled: bool,
    /// Zone groups routed to this projector (consumed by the animation
    /// layer, carried here for configuration completeness).
    pub zone_groups: Vec<String>,
    /// Per-point sample layout for this output.
    pub output: OutputConfig,
}

impl Default for Projector {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: IDN_PORT,
            service_id: 0,
            enabled: true,
            zone_groups: Vec::new(),
            output: OutputConfig::default(),
        }
    }
}

impl Projector {
    /// The host with surrounding whitespace removed, or `None` if blank.
    pub fn trimmed_host(&self) -> Option<&str> {
        let host = self.host.trim();
        (!host.is_empty()).then_some(host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_whitespace_hosts_are_rejected() {
        for host in ["", "   ", "\t\n"] {
            let projector = Projector {
                host: host.to_string(),
                ..Projector::default()
            };
            assert_eq!(projector.trimmed_host(), None);
        }
    }

    #[test]
    fn host_is_trimmed() {
        let projector = Projector {
            host: "  192.168.1.50  ".to_string(),
            ..Projector::default()
        };
        assert_eq!(projector.trimmed_host(), Some("192.168.1.50"));
    }
}
