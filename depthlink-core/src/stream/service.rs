//! Sender-side capture service.
//!
//! Orchestrates the full pipeline each iteration:
//!
//! 1. Drain one receiver ack from the [`FrameLink`].
//! 2. Pull a synchronized capture from the [`DepthSensor`].
//! 3. Ask the [`FrameSkipController`] whether to emit or discard.
//! 4. Reproject color into the depth camera's frame.
//! 5. Encode color and depth independently.
//! 6. Transmit via [`FrameLink::send_frame`].
//!
//! The loop never waits on the network: a slow receiver shows up only
//! as growing lag in the skip decision. Capture timeouts and captures
//! missing an image retry the iteration without advancing the frame id.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::watch;

use crate::error::{DeviceError, LinkError};
use crate::stream::codec::{ColorEncoder, DepthEncoder};
use crate::stream::pacing::FrameSkipController;
use crate::stream::sensor::{DepthSensor, Reprojector};
use crate::stream::transport::{FrameLink, SendOutcome};
use crate::stream::types::{Calibration, EncodedFrame};

// ── ServiceConfig ────────────────────────────────────────────────

/// Configuration for [`CaptureService`].
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Backoff between iterations that produced nothing (capture
    /// timeout, missing image, skipped frame). Zero yields the task
    /// without sleeping, preserving the busy-poll scheduling model.
    pub idle_backoff: Duration,
    /// Publish a throughput summary every this many sent frames.
    pub summary_every: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            idle_backoff: Duration::ZERO,
            summary_every: 100,
        }
    }
}

// ── ThroughputSummary ────────────────────────────────────────────

/// Rolling throughput numbers, reset every summary window.
///
/// Observability only — nothing in the pipeline keys off these.
#[derive(Debug, Clone, Default)]
pub struct ThroughputSummary {
    /// Frame id at the end of the window.
    pub frame_id: i32,
    /// Frames sent in the window.
    pub frames: u32,
    /// Payload bytes that left the socket in the window.
    pub bytes: u64,
    /// Wall-clock duration of the window.
    pub window: Duration,
}

impl ThroughputSummary {
    /// Frames per second over the window.
    pub fn fps(&self) -> f64 {
        let secs = self.window.as_secs_f64();
        if secs > 0.0 { self.frames as f64 / secs } else { 0.0 }
    }

    /// Megabits per second over the window.
    pub fn mbps(&self) -> f64 {
        let secs = self.window.as_secs_f64();
        if secs > 0.0 {
            self.bytes as f64 * 8.0 / (secs * 1_000_000.0)
        } else {
            0.0
        }
    }
}

// ── CaptureService ───────────────────────────────────────────────

/// Sender-side capture/encode/send loop.
///
/// # Lifetime
///
/// Call [`run`](Self::run) to start. It transmits the calibration
/// first, then loops until [`stop`](Self::stop) is called or an
/// unrecoverable error occurs.
pub struct CaptureService<S, R, C, D> {
    sensor: S,
    reprojector: R,
    color_encoder: C,
    depth_encoder: D,
    link: FrameLink,
    skip: FrameSkipController,
    calibration: Calibration,
    config: ServiceConfig,
    running: Arc<AtomicBool>,
    summary_tx: watch::Sender<ThroughputSummary>,
    summary_rx: watch::Receiver<ThroughputSummary>,
}

impl<S, R, C, D> CaptureService<S, R, C, D>
where
    S: DepthSensor,
    R: Reprojector,
    C: ColorEncoder,
    D: DepthEncoder,
{
    pub fn new(
        sensor: S,
        reprojector: R,
        color_encoder: C,
        depth_encoder: D,
        link: FrameLink,
        skip: FrameSkipController,
        calibration: Calibration,
        config: ServiceConfig,
    ) -> Self {
        let (summary_tx, summary_rx) = watch::channel(ThroughputSummary::default());
        Self {
            sensor,
            reprojector,
            color_encoder,
            depth_encoder,
            link,
            skip,
            calibration,
            config,
            running: Arc::new(AtomicBool::new(false)),
            summary_tx,
            summary_rx,
        }
    }

    /// A cloneable handle that can stop the service from another task.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Obtain a receiver for throughput summaries.
    pub fn summary_receiver(&self) -> watch::Receiver<ThroughputSummary> {
        self.summary_rx.clone()
    }

    /// Signal the service to stop.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether the loop is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run the capture loop.
    ///
    /// Intended to be spawned on the Tokio runtime. The calibration is
    /// transmitted before the first iteration.
    pub async fn run(&mut self) -> Result<(), LinkError> {
        self.running.store(true, Ordering::SeqCst);

        self.link.send_calibration(&self.calibration).await?;

        let mut frame_id: i32 = 0;
        let mut window_start = Instant::now();
        let mut window_frames: u32 = 0;
        let mut window_bytes: u64 = 0;

        while self.running.load(Ordering::SeqCst) {
            // 1. Opportunistic receiver progress. Most recent wins.
            if let Some(ack) = self.link.poll_ack() {
                self.skip.record_ack(ack.receiver_frame_id);
            }

            // 2. Capture, bounded wait.
            let capture = match self.sensor.capture() {
                Ok(c) => c,
                Err(DeviceError::Timeout(_)) => {
                    self.idle().await;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let Some(color) = capture.color else {
                self.idle().await;
                continue;
            };

            // 3. Accept/skip. Skipped captures mutate nothing.
            if !self.skip.should_send(frame_id, capture.timestamp_ms) {
                self.idle().await;
                continue;
            }

            let Some(depth) = capture.depth else {
                self.idle().await;
                continue;
            };

            // 4. Reproject + encode.
            let projected = self
                .reprojector
                .color_to_depth(&self.calibration, &color, &depth);
            let color_payload = self.color_encoder.encode(&projected)?;
            let depth_payload = self.depth_encoder.encode(&depth)?;

            // 5. Transmit. A would-block drop still consumed this id:
            // fragments may already be on the wire under it.
            let frame = EncodedFrame {
                frame_id,
                timestamp_ms: capture.timestamp_ms,
                color: color_payload,
                depth: depth_payload,
            };
            let outcome = self.link.send_frame(&frame)?;

            self.skip.record_sent(capture.timestamp_ms);
            frame_id += 1;

            // 6. Throughput window.
            window_frames += 1;
            if let SendOutcome::Sent { bytes } = outcome {
                window_bytes += bytes as u64;
            }
            if window_frames >= self.config.summary_every {
                let _ = self.summary_tx.send(ThroughputSummary {
                    frame_id,
                    frames: window_frames,
                    bytes: window_bytes,
                    window: window_start.elapsed(),
                });
                window_start = Instant::now();
                window_frames = 0;
                window_bytes = 0;
            }
        }

        Ok(())
    }

    /// Let other tasks run after an empty iteration.
    async fn idle(&self) {
        if self.config.idle_backoff.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.config.idle_backoff).await;
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_rates() {
        let summary = ThroughputSummary {
            frame_id: 100,
            frames: 30,
            bytes: 1_000_000,
            window: Duration::from_secs(1),
        };
        assert!((summary.fps() - 30.0).abs() < 1e-9);
        assert!((summary.mbps() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn empty_summary_is_zero_rate() {
        let summary = ThroughputSummary::default();
        assert_eq!(summary.fps(), 0.0);
        assert_eq!(summary.mbps(), 0.0);
    }
}
