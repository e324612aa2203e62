//! Reconciliation of projector configuration onto live engines.
//!
//! The orchestrator owns the engine registry and is its single writer. It
//! holds no business state of its own: every operation is a diff between
//! the desired set (current projector configs) and the actual set (the live
//! registry).

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info, warn};

use beamlink_protocol::MAX_CHANNEL_ID;

use crate::engine::{EngineConfig, FrameSource, StreamingEngine};
use crate::projector::Projector;

/// Builds a frame source for a projector. Supplied by the animation or
/// zone-routing layer; invoked once per engine creation.
pub type SourceFactory = Box<dyn Fn(&str, &Projector) -> Box<dyn FrameSource> + Send>;

/// Owns one engine per enabled, valid projector.
pub struct Orchestrator {
    sources: SourceFactory,
    fps: u32,
    registry: HashMap<String, StreamingEngine>,
}

impl Orchestrator {
    /// Create an orchestrator with a frame-source factory.
    pub fn new(sources: SourceFactory) -> Self {
        Self {
            sources,
            fps: EngineConfig::default().fps,
            registry: HashMap::new(),
        }
    }

    /// Override the frame rate used for new engines.
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Build an engine for a projector, or `None` if the projector is
    /// disabled or has a blank host. Not an error: invalid projectors are
    /// skipped, never fatal.
    ///
    /// The engine's channel id is the projector's service id, which is what
    /// keeps channels collision-free when several projectors share one
    /// physical multi-head device.
    pub fn engine_for_projector(&self, id: &str, projector: &Projector) -> Option<StreamingEngine> {
        if !projector.enabled {
            debug!(projector = id, "projector disabled; skipping");
            return None;
        }
        let Some(host) = projector.trimmed_host() else {
            debug!(projector = id, "projector has no host; skipping");
            return None;
        };

        let config = EngineConfig {
            port: projector.port,
            fps: self.fps,
            channel_id: projector.service_id & MAX_CHANNEL_ID,
            output: projector.output,
        };
        Some(StreamingEngine::new(
            host,
            (self.sources)(id, projector),
            config,
        ))
    }

    /// Create and start an engine for every enabled, valid projector.
    /// Invalid projectors are skipped. Returns the number of running
    /// engines.
    pub async fn start_engines(&mut self, projectors: &BTreeMap<String, Projector>) -> usize {
        for (id, projector) in projectors {
            if self.registry.contains_key(id) {
                continue;
            }
            if let Some(engine) = self.engine_for_projector(id, projector) {
                self.start_and_register(id.clone(), engine).await;
            }
        }
        info!(engines = self.registry.len(), "streaming started");
        self.registry.len()
    }

    /// Stop and discard every engine.
    pub async fn stop_engines(&mut self) {
        let registry = std::mem::take(&mut self.registry);
        for (id, mut engine) in registry {
            debug!(projector = %id, "stopping engine");
            engine.stop().await;
        }
        info!("streaming stopped");
    }

    /// Reconcile the registry against the current projector set: start
    /// engines for newly desired projectors, stop engines whose projector
    /// went away, and leave matching engines running untouched. No-op when
    /// streaming is not running.
    pub async fn refresh_engines(&mut self, projectors: &BTreeMap<String, Projector>) {
        if !self.is_streaming() {
            return;
        }

        let desired: Vec<&String> = projectors
            .iter()
            .filter(|(_, p)| p.enabled && p.trimmed_host().is_some())
            .map(|(id, _)| id)
            .collect();

        // Readers only ever see complete registries: the map is taken,
        // rebuilt, and swapped back in.
        let mut next = HashMap::with_capacity(desired.len());
        let current = std::mem::take(&mut self.registry);
        for (id, mut engine) in current {
            if desired.iter().any(|d| **d == id) {
                next.insert(id, engine);
            } else {
                debug!(projector = %id, "projector removed; stopping engine");
                engine.stop().await;
            }
        }

        for (id, projector) in projectors {
            if next.contains_key(id) {
                continue;
            }
            if let Some(mut engine) = self.engine_for_projector(id, projector) {
                debug!(projector = %id, "projector added; starting engine");
                match engine.start().await {
                    Ok(()) => {
                        next.insert(id.clone(), engine);
                    }
                    Err(err) => {
                        warn!(projector = %id, error = %err, "engine failed to start during refresh; skipping");
                    }
                }
            }
        }

        self.registry = next;
    }

    /// True iff at least one engine is registered.
    pub fn is_streaming(&self) -> bool {
        !self.registry.is_empty()
    }

    /// The live engines, keyed by projector id, for stats polling.
    pub fn engines(&self) -> &HashMap<String, StreamingEngine> {
        &self.registry
    }

    async fn start_and_register(&mut self, id: String, mut engine: StreamingEngine) {
        match engine.start().await {
            Ok(()) => {
                self.registry.insert(id, engine);
            }
            Err(err) => {
                warn!(projector = %id, error = %err, "engine failed to start; skipping");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use beamlink_protocol::Frame;

    use super::*;

    fn empty_sources() -> SourceFactory {
        Box::new(|_, _| Box::new(Frame::empty) as Box<dyn FrameSource>)
    }

    fn projector(host: &str, service_id: u8, port: u16) -> Projector {
        Projector {
            host: host.to_string(),
            service_id,
            port,
            ..Projector::default()
        }
    }

    fn configs(entries: Vec<(&str, Projector)>) -> BTreeMap<String, Projector> {
        entries
            .into_iter()
            .map(|(id, p)| (id.to_string(), p))
            .collect()
    }

    #[test]
    fn no_engine_for_blank_or_disabled_projectors() {
        let orch = Orchestrator::new(empty_sources());

        for host in ["", "   "] {
            assert!(orch
                .engine_for_projector("p", &projector(host, 0, 7255))
                .is_none());
        }

        let disabled = Projector {
            enabled: false,
            ..projector("10.0.0.5", 0, 7255)
        };
        assert!(orch.engine_for_projector("p", &disabled).is_none());
    }

    #[test]
    fn channel_id_follows_service_id() {
        let orch = Orchestrator::new(empty_sources());

        let engine = orch
            .engine_for_projector("p", &projector("10.0.0.5", 9, 7255))
            .expect("valid projector should produce an engine");
        assert_eq!(engine.channel_id(), 9);

        // Default service id maps to channel 0.
        let engine = orch
            .engine_for_projector("p", &projector("10.0.0.5", 0, 7255))
            .expect("valid projector should produce an engine");
        assert_eq!(engine.channel_id(), 0);
    }

    #[test]
    fn shared_host_gets_distinct_channels() {
        let orch = Orchestrator::new(empty_sources());

        let a = orch
            .engine_for_projector("a", &projector("10.0.0.5", 1, 7255))
            .expect("engine a");
        let b = orch
            .engine_for_projector("b", &projector("10.0.0.5", 2, 7255))
            .expect("engine b");

        assert_eq!(a.channel_id(), 1);
        assert_eq!(b.channel_id(), 2);
        assert_ne!(a.channel_id(), b.channel_id());
    }

    #[tokio::test]
    async fn start_engines_skips_invalid_projectors() {
        let mut orch = Orchestrator::new(empty_sources());
        let projectors = configs(vec![
            ("good", projector("127.0.0.1", 1, 7255)),
            ("blank", projector("", 2, 7255)),
            (
                "off",
                Projector {
                    enabled: false,
                    ..projector("127.0.0.1", 3, 7255)
                },
            ),
        ]);

        let count = orch.start_engines(&projectors).await;
        assert_eq!(count, 1);
        assert!(orch.is_streaming());
        assert!(orch.engines().contains_key("good"));

        orch.stop_engines().await;
        assert!(!orch.is_streaming());
    }

    #[tokio::test]
    async fn refresh_is_idempotent_and_keeps_engine_identity() {
        let mut orch = Orchestrator::new(empty_sources());
        let projectors = configs(vec![
            ("a", projector("127.0.0.1", 1, 7255)),
            ("b", projector("127.0.0.1", 2, 7255)),
        ]);

        orch.start_engines(&projectors).await;
        let before = orch.engines()["a"].stats_cell().clone();

        orch.refresh_engines(&projectors).await;
        orch.refresh_engines(&projectors).await;

        assert_eq!(orch.engines().len(), 2);
        let after = orch.engines()["a"].stats_cell().clone();
        assert!(
            before.ptr_eq(&after),
            "unchanged projector must keep its engine instance"
        );
        assert!(orch.engines().values().all(|e| e.running()));

        orch.stop_engines().await;
    }

    #[tokio::test]
    async fn refresh_adds_and_removes_engines() {
        let mut orch = Orchestrator::new(empty_sources());
        let initial = configs(vec![
            ("a", projector("127.0.0.1", 1, 7255)),
            ("b", projector("127.0.0.1", 2, 7255)),
        ]);
        orch.start_engines(&initial).await;

        let updated = configs(vec![
            ("b", projector("127.0.0.1", 2, 7255)),
            ("c", projector("127.0.0.1", 3, 7255)),
        ]);
        orch.refresh_engines(&updated).await;

        assert!(!orch.engines().contains_key("a"));
        assert!(orch.engines().contains_key("b"));
        assert!(orch.engines().contains_key("c"));
        assert_eq!(orch.engines().len(), 2);

        orch.stop_engines().await;
    }

    #[tokio::test]
    async fn refresh_is_a_noop_when_not_streaming() {
        let mut orch = Orchestrator::new(empty_sources());
        let projectors = configs(vec![("a", projector("127.0.0.1", 1, 7255))]);

        orch.refresh_engines(&projectors).await;
        assert!(!orch.is_streaming());
        assert!(orch.engines().is_empty());
    }

    #[tokio::test]
    async fn refresh_skips_engines_that_fail_to_start() {
        // Zero fps makes every new engine fail start; the seeded running
        // engine must survive the refresh and the failed one must not
        // appear in the registry.
        let mut orch = Orchestrator::new(empty_sources()).with_fps(0);

        let mut seeded = StreamingEngine::new(
            "127.0.0.1",
            Frame::empty,
            EngineConfig {
                fps: 100,
                ..EngineConfig::default()
            },
        );
        seeded.start().await.expect("seed engine should start");
        orch.registry.insert("a".to_string(), seeded);

        let projectors = configs(vec![
            ("a", projector("127.0.0.1", 1, 7255)),
            ("b", projector("127.0.0.1", 2, 7255)),
        ]);
        orch.refresh_engines(&projectors).await;

        assert!(orch.engines().contains_key("a"));
        assert!(!orch.engines().contains_key("b"));
        assert_eq!(orch.engines().len(), 1);

        orch.stop_engines().await;
    }

    #[tokio::test]
    async fn out_of_range_service_id_is_masked() {
        let orch = Orchestrator::new(empty_sources());
        let engine = orch
            .engine_for_projector("p", &projector("127.0.0.1", 200, 7255))
            .expect("engine");
        assert_eq!(engine.channel_id(), 200 & MAX_CHANNEL_ID);
    }
}
