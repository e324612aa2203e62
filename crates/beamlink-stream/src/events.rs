//! Diagnostic events emitted by a streaming engine.
//!
//! The hook is an injected observer: installing one must never change how
//! the engine behaves, and engines work fine without one.

use std::sync::Arc;

/// Observer invoked from the engine task on notable events.
pub type EventHook = Arc<dyn Fn(&EngineEvent) + Send + Sync>;

/// A notable event in an engine's send loop.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A frame packet went out.
    Sent {
        /// Target host the packet was sent to.
        target_host: String,
        /// Encoded packet size in bytes.
        packet_bytes: usize,
        /// Number of points in the frame.
        point_count: usize,
        /// Time since the previous successful send, in microseconds.
        /// Zero for the first send after start.
        interval_us: u64,
    },
    /// A send cycle failed; the loop continues on the next tick.
    SendFailed {
        /// Target host of the failed send.
        target_host: String,
        /// Description of what went wrong.
        error: String,
    },
}
