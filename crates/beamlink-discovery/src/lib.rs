//! IDN-Hello device and service discovery.
//!
//! Discovery is a pair of bounded request/response exchanges: a broadcast
//! scan that units answer with their identity, and an optional per-unit
//! service map query listing the outputs each unit exposes. Everything here
//! degrades gracefully — timeouts produce partial results, malformed
//! replies are skipped, and one slow device never blocks the scan.

pub mod device;
pub mod error;
pub mod scan;

pub use device::{DiscoveredDevice, Relay, Service};
pub use error::{DiscoveryError, Result};
pub use scan::{discover_devices, discover_devices_with_services, ping, DiscoveryConfig};
