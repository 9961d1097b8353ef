//! # depthlink stream — adaptive depth-camera streaming
//!
//! Sender-side pipeline for streaming synchronized color+depth frames
//! to a single receiver over unreliable UDP.
//!
//! ## Architecture
//!
//! ```text
//! SENDER                                       RECEIVER
//! ┌─────────────────────────┐                 ┌──────────────────────┐
//! │ DepthSensor             │                 │ FragmentAssembler    │
//! │   ↓                     │                 │   ↓                  │
//! │ Reprojector             │      UDP        │ decode / render      │
//! │   ↓                     │  ──────────►    │                      │
//! │ ColorEncoder,           │                 │                      │
//! │ DepthEncoder            │  ◄──────────    │                      │
//! │   ↓                     │   Ack (id)      │                      │
//! │ FrameLink::send_frame   │                 │                      │
//! └─────────────────────────┘                 └──────────────────────┘
//!
//! FrameSkipController turns receiver lag into per-capture skip
//! decisions — the only form of congestion control on this link.
//! ```
//!
//! ## Sub-modules
//!
//! | Module      | Purpose                                             |
//! |-------------|-----------------------------------------------------|
//! | `types`     | Pipeline image/frame/calibration types              |
//! | `sensor`    | Capability traits over the camera and reprojection  |
//! | `delta`     | Temporal delta pass over depth pixels               |
//! | `codec`     | Encoder seams + zstd implementations                |
//! | `transport` | UDP framing, handshake, acks, reassembly            |
//! | `pacing`    | Exponential skip policy from receiver feedback      |
//! | `service`   | Capture/encode/send loop orchestrator               |

pub mod codec;
pub mod delta;
pub mod pacing;
pub mod sensor;
pub mod service;
pub mod transport;
pub mod types;

// ── Re-exports ───────────────────────────────────────────────────

pub use codec::{ColorEncoder, DepthEncoder, TemporalDepthEncoder, ZstdColorEncoder};
pub use delta::DepthDelta;
pub use pacing::{FrameSkipController, SkipPolicy, pow_of_two};
pub use sensor::{DepthResolution, DepthSensor, IdentityReprojector, Reprojector, SensorConfig};
pub use service::{CaptureService, ServiceConfig, ThroughputSummary};
pub use transport::{
    Ack, AssembledFrame, Channel, FragmentAssembler, FragmentHeader, FrameLink, SendOutcome,
    decode_calibration,
};
pub use types::{Calibration, ColorImage, DepthImage, EncodedFrame, SyncedCapture};
