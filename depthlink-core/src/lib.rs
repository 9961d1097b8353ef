//! # depthlink-core
//!
//! Core library for depthlink: adaptive streaming of a depth camera's
//! synchronized color+depth frames, plus a companion microphone feed,
//! over unreliable unicast UDP under real-time constraints.
//!
//! This crate contains:
//! - **Stream pipeline**: sensor/codec seams, UDP framing and handshake,
//!   receiver-feedback frame pacing, the capture loop orchestrator
//! - **Audio path**: lock-free SPSC ring buffer, datagram relay, and
//!   output-device playback
//! - **Error**: `LinkError` — typed, `thiserror`-based error hierarchy,
//!   with device-SDK codes normalized into `DeviceError` at the boundary
//!
//! Losses are absorbed by policy — skip, drop, ignore — never corrected:
//! there is no retransmission anywhere in this crate.

pub mod audio;
pub mod error;
pub mod stream;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use audio::{AudioFormat, AudioRelay, PlaybackStream, RingBuffer, RingConsumer, RingProducer};
pub use error::{DeviceError, LinkError};
pub use stream::{
    Ack, Calibration, CaptureService, ColorEncoder, ColorImage, DepthDelta, DepthEncoder,
    DepthImage, DepthResolution, DepthSensor, EncodedFrame, FragmentAssembler, FragmentHeader,
    FrameLink, FrameSkipController, IdentityReprojector, Reprojector, SendOutcome, SensorConfig,
    ServiceConfig, SkipPolicy, SyncedCapture, TemporalDepthEncoder, ThroughputSummary,
    ZstdColorEncoder, decode_calibration, pow_of_two,
};
