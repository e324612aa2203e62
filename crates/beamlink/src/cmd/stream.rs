use std::f32::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use beamlink_protocol::{Frame, Point};
use beamlink_stream::{EngineConfig, EngineEvent, StreamingEngine};

use crate::cmd::{parse_duration_arg, StreamArgs};
use crate::exit::{stream_error, CliError, CliResult, SUCCESS};
use crate::output::OutputFormat;

pub fn run(args: StreamArgs, format: OutputFormat) -> CliResult<i32> {
    let duration = args
        .duration
        .as_deref()
        .map(parse_duration_arg)
        .transpose()?;

    let config = EngineConfig {
        port: args.port,
        fps: args.fps,
        channel_id: args.channel,
        ..EngineConfig::default()
    };

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| CliError::new(crate::exit::INTERNAL, format!("runtime setup failed: {err}")))?;

    let mut engine = StreamingEngine::new(args.host.clone(), test_pattern(args.points), config);
    engine.set_event_hook(Arc::new(|event| {
        if let EngineEvent::Sent {
            packet_bytes,
            interval_us,
            ..
        } = event
        {
            debug!(packet_bytes, interval_us, "frame sent");
        }
    }));

    let started = Instant::now();
    runtime.block_on(async {
        engine
            .start()
            .await
            .map_err(|err| stream_error("stream start failed", err))?;

        loop {
            if !running.load(Ordering::SeqCst) {
                break;
            }
            if duration.is_some_and(|d| started.elapsed() >= d) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        engine.stop().await;
        Ok::<(), CliError>(())
    })?;

    let stats = engine.stats();
    print_summary(
        &StreamSummary {
            host: &args.host,
            channel: args.channel,
            frames_sent: stats.frames_sent,
            elapsed_s: (started.elapsed().as_secs_f64() * 100.0).round() / 100.0,
            last_error: stats.last_error,
        },
        format,
    );
    Ok(SUCCESS)
}

/// A rotating ring with the hue sweeping around it. Enough structure to see
/// on a real projector, cheap enough to generate every cycle.
fn test_pattern(points: usize) -> impl FnMut() -> Frame {
    let points = points.max(2);
    let mut phase = 0.0f32;
    move || {
        phase = (phase + TAU / 180.0) % TAU;
        (0..points)
            .map(|i| {
                let theta = i as f32 / points as f32 * TAU;
                let (r, g, b) = hue(theta + phase);
                Point::new(0.8 * theta.cos(), 0.8 * theta.sin(), r, g, b)
            })
            .collect()
    }
}

fn hue(theta: f32) -> (f32, f32, f32) {
    let third = TAU / 3.0;
    let lobe = |offset: f32| {
        let d = (theta - offset).rem_euclid(TAU);
        let d = d.min(TAU - d);
        (1.0 - d / third).clamp(0.0, 1.0)
    };
    (lobe(0.0), lobe(third), lobe(2.0 * third))
}

#[derive(Serialize)]
struct StreamSummary<'a> {
    host: &'a str,
    channel: u8,
    frames_sent: u64,
    elapsed_s: f64,
    last_error: Option<String>,
}

fn print_summary(summary: &StreamSummary<'_>, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(summary).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!(
                "streamed {} frames to {} (channel {}) in {:.2}s",
                summary.frames_sent, summary.host, summary.channel, summary.elapsed_s
            );
            if let Some(err) = &summary.last_error {
                println!("last error: {err}");
            }
        }
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_points_stay_in_range() {
        let mut source = test_pattern(60);
        let frame = source();
        assert_eq!(frame.len(), 60);
        for p in frame.points() {
            assert!(p.x.abs() <= 1.0 && p.y.abs() <= 1.0);
            assert!((0.0..=1.0).contains(&p.r));
            assert!((0.0..=1.0).contains(&p.g));
            assert!((0.0..=1.0).contains(&p.b));
        }
    }

    #[test]
    fn pattern_rotates_between_frames() {
        let mut source = test_pattern(8);
        let first = source();
        let second = source();
        assert_ne!(first.points()[0].r, second.points()[0].r);
    }
}
