//! Sensor capability interface.
//!
//! The capture loop talks to the depth camera exclusively through
//! [`DepthSensor`], so it can be driven by the real device SDK or by a
//! deterministic fake in tests. The reprojection of color pixels into
//! the depth camera's frame is likewise behind a seam, since the
//! calibration math belongs to the device SDK.

use std::time::Duration;

use crate::error::DeviceError;
use crate::stream::types::{Calibration, ColorImage, DepthImage, SyncedCapture};

// ── DepthResolution ──────────────────────────────────────────────

/// Depth mode selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthResolution {
    /// Unbinned narrow field of view (640×576).
    #[default]
    Full,
    /// 2×2 binned narrow field of view (320×288).
    Half,
}

impl DepthResolution {
    /// Depth image dimensions for this mode.
    pub const fn dimensions(self) -> (u32, u32) {
        match self {
            DepthResolution::Full => (640, 576),
            DepthResolution::Half => (320, 288),
        }
    }
}

// ── SensorConfig ─────────────────────────────────────────────────

/// Device start-up configuration.
#[derive(Debug, Clone)]
pub struct SensorConfig {
    /// Depth mode to run the camera in.
    pub resolution: DepthResolution,
    /// Bounded wait for one capture before reporting a timeout.
    pub capture_timeout: Duration,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            resolution: DepthResolution::Full,
            capture_timeout: Duration::from_millis(1000),
        }
    }
}

// ── DepthSensor ──────────────────────────────────────────────────

/// Capability interface over a synchronized color+depth camera.
///
/// `capture` blocks for at most the configured timeout and reports
/// [`DeviceError::Timeout`] when no capture arrived in time — the loop
/// treats that as a retry, never a failure.
pub trait DepthSensor {
    /// Open the camera streams with the given configuration.
    fn start(&mut self, config: &SensorConfig) -> Result<(), DeviceError>;

    /// The session calibration. Valid after [`start`](Self::start).
    fn calibration(&self) -> Result<Calibration, DeviceError>;

    /// Pull the next synchronized capture, waiting at most the
    /// configured timeout.
    fn capture(&mut self) -> Result<SyncedCapture, DeviceError>;
}

// ── Reprojector ──────────────────────────────────────────────────

/// Reprojects a color image into the depth camera's frame.
pub trait Reprojector {
    /// Produce a color image aligned with `depth`'s geometry.
    fn color_to_depth(
        &self,
        calibration: &Calibration,
        color: &ColorImage,
        depth: &DepthImage,
    ) -> ColorImage;
}

/// Pass-through reprojector for sources that already produce color in
/// the depth camera's geometry (fakes, pre-aligned recordings).
pub struct IdentityReprojector;

impl Reprojector for IdentityReprojector {
    fn color_to_depth(
        &self,
        _calibration: &Calibration,
        color: &ColorImage,
        _depth: &DepthImage,
    ) -> ColorImage {
        color.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_dimensions() {
        assert_eq!(DepthResolution::Full.dimensions(), (640, 576));
        assert_eq!(DepthResolution::Half.dimensions(), (320, 288));
    }

    #[test]
    fn identity_reprojector_passes_color_through() {
        let calibration = Calibration {
            depth_width: 2,
            depth_height: 2,
            color_width: 2,
            color_height: 2,
            intrinsics: Vec::new(),
        };
        let color = ColorImage {
            width: 2,
            height: 2,
            stride: 8,
            data: vec![7; 16],
        };
        let depth = DepthImage {
            width: 2,
            height: 2,
            data: vec![100; 4],
        };
        let projected = IdentityReprojector.color_to_depth(&calibration, &color, &depth);
        assert_eq!(projected.data, color.data);
    }
}
