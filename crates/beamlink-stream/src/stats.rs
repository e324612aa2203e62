//! Engine statistics, readable from any task as a consistent snapshot.

use std::sync::{Arc, Mutex};
use std::time::SystemTime;

/// Counters mutated only by an engine's own background task.
#[derive(Debug, Clone, Default)]
pub struct EngineStats {
    /// Frames successfully handed to the socket.
    pub frames_sent: u64,
    /// Wall-clock time of the last successful send.
    pub last_send_time: Option<SystemTime>,
    /// Description of the most recent failed cycle, if any.
    pub last_error: Option<String>,
}

/// Shared cell the engine task writes and readers snapshot.
#[derive(Clone, Default)]
pub(crate) struct StatsCell(Arc<Mutex<EngineStats>>);

impl StatsCell {
    pub(crate) fn snapshot(&self) -> EngineStats {
        self.lock().clone()
    }

    pub(crate) fn record_send(&self) {
        let mut stats = self.lock();
        stats.frames_sent += 1;
        stats.last_send_time = Some(SystemTime::now());
    }

    pub(crate) fn record_error(&self, error: String) {
        self.lock().last_error = Some(error);
    }

    #[cfg(test)]
    pub(crate) fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, EngineStats> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
