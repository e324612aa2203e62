//! Laser frame streaming over the ILDA Digital Network protocols.
//!
//! beamlink speaks IDN-Stream (frame delivery over UDP) and IDN-Hello
//! (device discovery) to network-attached laser DACs.
//!
//! # Crate Structure
//!
//! - [`protocol`] — IDN-Stream packet codec and IDN-Hello message layouts
//! - [`stream`] — Per-projector streaming engines and the orchestrator
//!   (behind the `stream` feature)
//! - [`discovery`] — Broadcast scan and service map queries (behind the
//!   `discovery` feature)

/// Re-export packet codec types.
pub mod protocol {
    pub use beamlink_protocol::*;
}

/// Re-export streaming types (requires `stream` feature).
#[cfg(feature = "stream")]
pub mod stream {
    pub use beamlink_stream::*;
}

/// Re-export discovery types (requires `discovery` feature).
#[cfg(feature = "discovery")]
pub mod discovery {
    pub use beamlink_discovery::*;
}
