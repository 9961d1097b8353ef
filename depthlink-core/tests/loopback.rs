//! Integration tests — session bootstrap and first-frame delivery over
//! a real UDP socket pair on localhost.

use std::time::Duration;

use depthlink_core::{
    Calibration, CaptureService, ColorImage, DepthImage, DepthSensor, DeviceError,
    FragmentAssembler, FrameLink, FrameSkipController, IdentityReprojector, SensorConfig,
    ServiceConfig, SyncedCapture, TemporalDepthEncoder, ZstdColorEncoder, decode_calibration,
};
use tokio::net::UdpSocket;

// ── Helpers ──────────────────────────────────────────────────────

/// Deterministic stand-in for the depth camera: 8×8 images, one capture
/// every 33 device-milliseconds.
struct TestSensor {
    captures: u64,
}

impl TestSensor {
    fn new() -> Self {
        Self { captures: 0 }
    }
}

impl DepthSensor for TestSensor {
    fn start(&mut self, _config: &SensorConfig) -> Result<(), DeviceError> {
        Ok(())
    }

    fn calibration(&self) -> Result<Calibration, DeviceError> {
        Ok(Calibration {
            depth_width: 8,
            depth_height: 8,
            color_width: 8,
            color_height: 8,
            intrinsics: vec![0xAA; 32],
        })
    }

    fn capture(&mut self) -> Result<SyncedCapture, DeviceError> {
        let n = self.captures;
        self.captures += 1;
        Ok(SyncedCapture {
            timestamp_ms: n as f32 * 33.0,
            color: Some(ColorImage {
                width: 8,
                height: 8,
                stride: 32,
                data: vec![(n % 256) as u8; 32 * 8],
            }),
            depth: Some(DepthImage {
                width: 8,
                height: 8,
                data: vec![1000 + (n % 50) as u16; 64],
            }),
        })
    }
}

/// Bind the sender socket, probe it from a receiver socket, and finish
/// the handshake.
async fn bootstrap() -> (FrameLink, UdpSocket) {
    let sender_sock = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let sender_addr = sender_sock.local_addr().unwrap();
    let receiver_sock = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    receiver_sock.send_to(&[0u8], sender_addr).await.unwrap();
    let link = FrameLink::handshake(sender_sock).await.unwrap();
    (link, receiver_sock)
}

fn test_service(
    link: FrameLink,
) -> CaptureService<TestSensor, IdentityReprojector, ZstdColorEncoder, TemporalDepthEncoder> {
    let mut sensor = TestSensor::new();
    sensor.start(&SensorConfig::default()).unwrap();
    let calibration = sensor.calibration().unwrap();
    CaptureService::new(
        sensor,
        IdentityReprojector,
        ZstdColorEncoder::new(1),
        TemporalDepthEncoder::new(10, 2, 1),
        link,
        FrameSkipController::new(33.0),
        calibration,
        ServiceConfig::default(),
    )
}

// ── Session bootstrap ────────────────────────────────────────────

#[tokio::test]
async fn probe_establishes_endpoint_and_calibration_arrives_first() {
    let (link, receiver_sock) = bootstrap().await;
    assert_eq!(link.endpoint(), receiver_sock.local_addr().unwrap());

    let mut service = test_service(link);
    let stop = service.stop_handle();
    let task = tokio::spawn(async move { service.run().await });

    // The first datagram out of the sender is the calibration.
    let mut buf = vec![0u8; 65_536];
    let (len, _) = tokio::time::timeout(
        Duration::from_secs(5),
        receiver_sock.recv_from(&mut buf),
    )
    .await
    .expect("timed out waiting for calibration")
    .unwrap();

    let calibration = decode_calibration(&buf[..len]).unwrap();
    assert_eq!(calibration.depth_width, 8);
    assert_eq!(calibration.intrinsics, vec![0xAA; 32]);

    stop.store(false, std::sync::atomic::Ordering::SeqCst);
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn first_frame_is_id_zero_without_any_ack() {
    let (link, receiver_sock) = bootstrap().await;

    let mut service = test_service(link);
    let stop = service.stop_handle();
    let task = tokio::spawn(async move { service.run().await });

    // Never send an ack; frame 0 must still arrive, unconditionally.
    let mut assembler = FragmentAssembler::new();
    let mut buf = vec![0u8; 65_536];
    let assembled = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let (len, _) = receiver_sock.recv_from(&mut buf).await.unwrap();
            if let Some(frame) = assembler.insert(&buf[..len]) {
                break frame;
            }
        }
    })
    .await
    .expect("timed out waiting for the first frame");

    assert_eq!(assembled.frame_id, 0);
    assert_eq!(assembled.timestamp_ms, 0.0);
    assert!(!assembled.color.is_empty());
    assert!(!assembled.depth.is_empty());

    stop.store(false, std::sync::atomic::Ordering::SeqCst);
    task.await.unwrap().unwrap();
}
