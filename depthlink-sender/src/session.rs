//! One streaming session: device start through capture loop exit.

use tokio::net::UdpSocket;
use tracing::info;

use depthlink_core::{
    CaptureService, DepthResolution, DepthSensor, FrameLink, FrameSkipController,
    IdentityReprojector, LinkError, TemporalDepthEncoder, ZstdColorEncoder,
};

use crate::config::SenderConfig;
use crate::sensor::SyntheticSensor;

/// Run a single session on `port` at the chosen depth resolution.
///
/// Returns when the capture loop stops or any session-fatal error
/// occurs; the caller decides whether to prompt again.
pub async fn run(
    config: &SenderConfig,
    port: u16,
    resolution: DepthResolution,
) -> Result<(), LinkError> {
    println!("Start sending frames (port: {port}, resolution: {resolution:?})");

    let mut sensor = SyntheticSensor::new();
    sensor.start(&config.to_sensor_config(resolution))?;
    let calibration = sensor.calibration()?;

    let color_encoder = ZstdColorEncoder::new(config.codec.color_level);
    let depth_encoder = TemporalDepthEncoder::new(
        config.codec.change_threshold,
        config.codec.invalid_debounce,
        config.codec.depth_level,
    );

    let socket = UdpSocket::bind(("0.0.0.0", port)).await?;
    println!("Waiting for a receiver probe on port {port}...");
    let link = FrameLink::handshake(socket).await?.with_mtu(config.network.mtu);
    println!("Found a receiver at {}", link.endpoint());

    let skip = FrameSkipController::with_policy(
        config.capture.frame_interval_ms,
        config.to_skip_policy(),
    );

    let mut service = CaptureService::new(
        sensor,
        IdentityReprojector,
        color_encoder,
        depth_encoder,
        link,
        skip,
        calibration,
        config.to_service_config(),
    );

    // Periodic throughput summaries, logged off the capture path.
    let mut summaries = service.summary_receiver();
    tokio::spawn(async move {
        while summaries.changed().await.is_ok() {
            let s = summaries.borrow().clone();
            info!(
                "frame {}: {:.1} fps, {:.2} Mbps over the last {} frames",
                s.frame_id,
                s.fps(),
                s.mbps(),
                s.frames,
            );
        }
    });

    service.run().await
}
