//! Descriptions of discovered units and their outputs.

use std::net::IpAddr;

use beamlink_protocol::hello::{ScanResponse, ServiceMap};

/// One addressable output on a unit (for example, one laser head).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub service_id: u8,
    pub name: String,
    /// The unit marked this as its default service.
    pub default_service: bool,
}

/// A relay entry from the unit's service map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relay {
    pub relay_number: u8,
    pub name: String,
}

/// A unit found on the network. Transient: discovery builds these per call
/// and does not persist them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    pub address: IpAddr,
    pub port: u16,
    pub host_name: String,
    pub unit_id: [u8; 16],
    pub status: u8,
    pub protocol_version: u8,
    pub services: Vec<Service>,
    pub relays: Vec<Relay>,
}

impl DiscoveredDevice {
    pub(crate) fn from_scan(address: IpAddr, port: u16, response: ScanResponse) -> Self {
        Self {
            address,
            port,
            host_name: response.host_name,
            unit_id: response.unit_id,
            status: response.status,
            protocol_version: response.protocol_version,
            services: Vec::new(),
            relays: Vec::new(),
        }
    }

    pub(crate) fn apply_service_map(&mut self, map: ServiceMap) {
        self.relays = map
            .relays
            .into_iter()
            .map(|entry| Relay {
                relay_number: entry.relay_number,
                name: entry.name,
            })
            .collect();
        self.services = map
            .services
            .into_iter()
            .map(|entry| Service {
                service_id: entry.service_id,
                default_service: entry.is_default(),
                name: entry.name,
            })
            .collect();
    }

    /// The unit's default service, if it announced one.
    pub fn default_service(&self) -> Option<&Service> {
        self.services
            .iter()
            .find(|s| s.default_service)
            .or_else(|| self.services.first())
    }
}
