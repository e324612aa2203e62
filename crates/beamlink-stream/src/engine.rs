//! One streaming engine per network target.
//!
//! State machine: `Created → Running → Stopped`. Created and Stopped are
//! both inert — no socket, no task. `start` opens a send-only UDP socket and
//! spawns exactly one background task; `stop` cancels it cooperatively,
//! waits for it to finish, and the task sends the close-channel packet on
//! its way out.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use beamlink_protocol::{
    encode_close_packet, encode_frame_packet, Frame, FramePacketParams, OutputConfig, IDN_PORT,
};

use crate::error::{Result, StreamError};
use crate::events::{EngineEvent, EventHook};
use crate::stats::{EngineStats, StatsCell};

/// The config header is reattached every this many frames, and always on
/// the first frame after start. At the default 30 fps that is once per
/// second, enough for late-joining or lossy receivers to resynchronize.
pub const CONFIG_RESEND_INTERVAL: u64 = 30;

/// Source of frames for one engine.
///
/// Called synchronously on the engine's own task, once per cycle, never
/// concurrently with itself. It gates the cycle, so it must return quickly.
pub trait FrameSource: Send + 'static {
    fn next_frame(&mut self) -> Frame;
}

impl<F> FrameSource for F
where
    F: FnMut() -> Frame + Send + 'static,
{
    fn next_frame(&mut self) -> Frame {
        (self)()
    }
}

impl FrameSource for Box<dyn FrameSource> {
    fn next_frame(&mut self) -> Frame {
        (**self).next_frame()
    }
}

/// Engine configuration, fixed for the engine's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Target UDP port.
    pub port: u16,
    /// Frames per second.
    pub fps: u32,
    /// Channel id (0-63) stamped into every packet.
    pub channel_id: u8,
    /// Per-point sample layout.
    pub output: OutputConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            port: IDN_PORT,
            fps: 30,
            channel_id: 0,
            output: OutputConfig::default(),
        }
    }
}

type SharedSource = Arc<Mutex<Box<dyn FrameSource>>>;

/// A streaming connection to one laser projector output.
pub struct StreamingEngine {
    host: String,
    config: EngineConfig,
    source: SharedSource,
    stats: StatsCell,
    hook: Option<EventHook>,
    task: Option<(CancellationToken, JoinHandle<()>)>,
}

impl StreamingEngine {
    /// Create an engine in the inert `Created` state. No I/O happens here.
    pub fn new(host: impl Into<String>, source: impl FrameSource, config: EngineConfig) -> Self {
        Self {
            host: host.into(),
            config,
            source: Arc::new(Mutex::new(Box::new(source))),
            stats: StatsCell::default(),
            hook: None,
            task: None,
        }
    }

    /// Install a diagnostic observer. Purely informational; the engine
    /// behaves identically without one.
    pub fn set_event_hook(&mut self, hook: EventHook) {
        self.hook = Some(hook);
    }

    /// Target host this engine streams to.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Channel id stamped into this engine's packets.
    pub fn channel_id(&self) -> u8 {
        self.config.channel_id
    }

    /// The engine's configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// True while the background task is alive.
    pub fn running(&self) -> bool {
        self.task.is_some()
    }

    /// Consistent snapshot of the engine's counters.
    pub fn stats(&self) -> EngineStats {
        self.stats.snapshot()
    }

    /// Open the socket and start the send loop. No-op if already running.
    pub async fn start(&mut self) -> Result<()> {
        if self.task.is_some() {
            return Ok(());
        }
        if self.config.fps == 0 {
            return Err(StreamError::ZeroFrameRate);
        }

        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect((self.host.as_str(), self.config.port)).await?;

        let token = CancellationToken::new();
        let handle = tokio::spawn(run_loop(
            socket,
            self.host.clone(),
            self.config,
            self.source.clone(),
            self.stats.clone(),
            self.hook.clone(),
            token.clone(),
        ));
        self.task = Some((token, handle));

        info!(host = %self.host, port = self.config.port, channel = self.config.channel_id,
              fps = self.config.fps, "streaming engine started");
        Ok(())
    }

    /// Request the send loop to exit after its current cycle and wait for
    /// it. The close-channel packet goes out from the task before it ends.
    /// Idempotent — stopping a stopped engine is a no-op.
    pub async fn stop(&mut self) {
        if let Some((token, handle)) = self.task.take() {
            token.cancel();
            if let Err(err) = handle.await {
                warn!(host = %self.host, error = %err, "engine task did not join cleanly");
            }
            info!(host = %self.host, channel = self.config.channel_id, "streaming engine stopped");
        }
    }

    #[cfg(test)]
    pub(crate) fn stats_cell(&self) -> &StatsCell {
        &self.stats
    }
}

async fn run_loop(
    socket: UdpSocket,
    host: String,
    config: EngineConfig,
    source: SharedSource,
    stats: StatsCell,
    hook: Option<EventHook>,
    token: CancellationToken,
) {
    let period = Duration::from_micros(1_000_000 / config.fps as u64);
    let duration_us = (1_000_000 / config.fps) as u32;

    // Burst semantics: an overrun cycle fires the next tick immediately
    // instead of compounding drift, and only the latest frame is ever sent.
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

    let epoch = Instant::now();
    let mut frames_sent: u64 = 0;
    let mut last_send: Option<Instant> = None;

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let frame = {
            let mut src = source.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            src.next_frame()
        };

        let params = FramePacketParams {
            channel_id: config.channel_id,
            service_id: config.channel_id,
            timestamp_us: epoch.elapsed().as_micros() as u32,
            duration_us,
            with_config: frames_sent % CONFIG_RESEND_INTERVAL == 0,
            single_scan: false,
        };

        let packet = match encode_frame_packet(&frame, config.output, &params) {
            Ok(packet) => packet,
            Err(err) => {
                report_failure(&stats, &hook, &host, err.to_string());
                continue;
            }
        };

        match socket.send(&packet).await {
            Ok(_) => {
                frames_sent += 1;
                stats.record_send();
                if let Some(hook) = &hook {
                    let interval_us = last_send
                        .map(|t| t.elapsed().as_micros() as u64)
                        .unwrap_or(0);
                    hook(&EngineEvent::Sent {
                        target_host: host.clone(),
                        packet_bytes: packet.len(),
                        point_count: frame.len(),
                        interval_us,
                    });
                }
                last_send = Some(Instant::now());
            }
            Err(err) => {
                report_failure(&stats, &hook, &host, err.to_string());
            }
        }
    }

    close_channel(&socket, &host, config, epoch).await;
}

async fn close_channel(socket: &UdpSocket, host: &str, config: EngineConfig, epoch: Instant) {
    let timestamp_us = epoch.elapsed().as_micros() as u32;
    match encode_close_packet(config.channel_id, config.channel_id, timestamp_us, config.output) {
        Ok(packet) => {
            if let Err(err) = socket.send(&packet).await {
                debug!(host, error = %err, "close packet send failed");
            }
        }
        Err(err) => debug!(host, error = %err, "close packet encode failed"),
    }
}

fn report_failure(stats: &StatsCell, hook: &Option<EventHook>, host: &str, error: String) {
    warn!(host, %error, "send cycle failed; continuing");
    stats.record_error(error.clone());
    if let Some(hook) = hook {
        hook(&EngineEvent::SendFailed {
            target_host: host.to_string(),
            error,
        });
    }
}
