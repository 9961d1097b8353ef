//! Shared types for the capture/encode/send pipeline.
//!
//! These are **internal** frame representations used between pipeline
//! stages. The wire layout of what eventually leaves the socket lives in
//! [`crate::stream::transport`].

use bytes::Bytes;
use serde::{Deserialize, Serialize};

// ── ColorImage ───────────────────────────────────────────────────

/// A raw BGRA color image as delivered by the sensor.
///
/// The `data` buffer holds `height` rows of `stride` bytes each.
/// `stride` may exceed `width * 4` due to row-alignment padding from
/// the device SDK.
#[derive(Debug, Clone)]
pub struct ColorImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row pitch in **bytes** (may exceed `width * 4`).
    pub stride: u32,
    /// Raw BGRA pixel data — `stride * height` bytes.
    pub data: Vec<u8>,
}

impl ColorImage {
    /// Bytes per pixel (BGRA).
    pub const BYTES_PER_PIXEL: usize = 4;

    /// Returns a row slice (including possible padding bytes).
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride as usize;
        let end = start + self.stride as usize;
        &self.data[start..end]
    }
}

// ── DepthImage ───────────────────────────────────────────────────

/// A raw depth image: one `u16` millimeter reading per pixel.
///
/// A value of `0` marks an invalid pixel (no return from the sensor).
#[derive(Debug, Clone)]
pub struct DepthImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major depth values, `width * height` entries.
    pub data: Vec<u16>,
}

impl DepthImage {
    /// Number of depth pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

// ── SyncedCapture ────────────────────────────────────────────────

/// One synchronized capture from the sensor.
///
/// Either image may be absent — the device can deliver a capture with
/// only one of the two streams populated, which the capture loop treats
/// as a retry condition.
#[derive(Debug, Clone)]
pub struct SyncedCapture {
    /// Device timestamp in milliseconds.
    pub timestamp_ms: f32,
    /// Color image, if the capture contains one.
    pub color: Option<ColorImage>,
    /// Depth image, if the capture contains one.
    pub depth: Option<DepthImage>,
}

// ── Calibration ──────────────────────────────────────────────────

/// Per-session camera calibration, sent to the receiver once before any
/// frame.
///
/// The intrinsics/extrinsics blob is opaque to the protocol layer; only
/// the resolutions are interpreted (they size the encoders, since color
/// pixels are reprojected into the depth camera's frame).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calibration {
    /// Depth camera width in pixels.
    pub depth_width: u32,
    /// Depth camera height in pixels.
    pub depth_height: u32,
    /// Color camera width in pixels.
    pub color_width: u32,
    /// Color camera height in pixels.
    pub color_height: u32,
    /// Opaque intrinsics/extrinsics blob from the device SDK.
    pub intrinsics: Vec<u8>,
}

// ── EncodedFrame ─────────────────────────────────────────────────

/// A fully encoded frame ready for transmission.
///
/// Both payloads are opaque codec output; the transport only looks at
/// their byte lengths.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    /// Sender-assigned monotonic frame id.
    pub frame_id: i32,
    /// Device timestamp in milliseconds.
    pub timestamp_ms: f32,
    /// Compressed color payload.
    pub color: Bytes,
    /// Compressed depth payload.
    pub depth: Bytes,
}

impl EncodedFrame {
    /// Combined payload size in bytes.
    pub fn byte_len(&self) -> usize {
        self.color.len() + self.depth.len()
    }
}
