//! Fixed-rate streaming engines for IDN laser projectors.
//!
//! One [`StreamingEngine`] owns one UDP socket and one background task that
//! pulls frames from a caller-supplied source at a fixed rate and sends them
//! as IDN-Stream packets. The [`Orchestrator`] reconciles a set of logical
//! projectors onto a registry of engines, one per projector, with
//! collision-free channel ids.

pub mod engine;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod projector;
pub mod stats;

pub use engine::{EngineConfig, FrameSource, StreamingEngine, CONFIG_RESEND_INTERVAL};
pub use error::{Result, StreamError};
pub use events::{EngineEvent, EventHook};
pub use orchestrator::{Orchestrator, SourceFactory};
pub use projector::Projector;
pub use stats::EngineStats;
