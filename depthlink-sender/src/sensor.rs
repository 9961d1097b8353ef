//! Synthetic depth sensor.
//!
//! Stands in for the real camera SDK behind the [`DepthSensor`] seam:
//! a moving gradient for color and a sweeping ramp for depth, produced
//! at the device's native cadence. Color is generated directly in the
//! depth camera's geometry, so the identity reprojector applies.

use std::time::{Duration, Instant};

use depthlink_core::{
    Calibration, ColorImage, DepthImage, DepthSensor, DeviceError, SensorConfig, SyncedCapture,
};

/// Device capture interval (30 Hz).
const FRAME_INTERVAL: Duration = Duration::from_micros(33_000);

/// Deterministic sensor producing one capture every 33 ms.
pub struct SyntheticSensor {
    config: Option<SensorConfig>,
    epoch: Option<Instant>,
    captures: u64,
}

impl SyntheticSensor {
    pub fn new() -> Self {
        Self {
            config: None,
            epoch: None,
            captures: 0,
        }
    }

    fn dims(&self) -> Result<(u32, u32), DeviceError> {
        self.config
            .as_ref()
            .map(|c| c.resolution.dimensions())
            .ok_or(DeviceError::DeviceUnavailable)
    }
}

impl Default for SyntheticSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl DepthSensor for SyntheticSensor {
    fn start(&mut self, config: &SensorConfig) -> Result<(), DeviceError> {
        self.config = Some(config.clone());
        self.epoch = None;
        self.captures = 0;
        Ok(())
    }

    fn calibration(&self) -> Result<Calibration, DeviceError> {
        let (width, height) = self.dims()?;
        Ok(Calibration {
            depth_width: width,
            depth_height: height,
            color_width: width,
            color_height: height,
            // Stand-in intrinsics blob; a real device hands back its
            // factory calibration here.
            intrinsics: (0..128).map(|i| (i * 7 % 256) as u8).collect(),
        })
    }

    fn capture(&mut self) -> Result<SyncedCapture, DeviceError> {
        let config = self
            .config
            .as_ref()
            .ok_or(DeviceError::DeviceUnavailable)?;
        let (width, height) = config.resolution.dimensions();

        // Hold to the device cadence.
        let epoch = *self.epoch.get_or_insert_with(Instant::now);
        let due = epoch + FRAME_INTERVAL * self.captures as u32;
        let now = Instant::now();
        if due > now {
            let wait = due - now;
            if wait > config.capture_timeout {
                return Err(DeviceError::Timeout(config.capture_timeout));
            }
            std::thread::sleep(wait);
        }

        let n = self.captures;
        self.captures += 1;

        Ok(SyncedCapture {
            timestamp_ms: n as f32 * 33.0,
            color: Some(color_pattern(width, height, n)),
            depth: Some(depth_pattern(width, height, n)),
        })
    }
}

/// BGRA gradient that shifts one pixel per frame.
fn color_pattern(width: u32, height: u32, phase: u64) -> ColorImage {
    let stride = width * ColorImage::BYTES_PER_PIXEL as u32;
    let mut data = vec![0u8; (stride * height) as usize];
    for y in 0..height {
        for x in 0..width {
            let offset = (y * stride + x * 4) as usize;
            data[offset] = ((x as u64 + phase) % 256) as u8; // B
            data[offset + 1] = ((y as u64 + phase) % 256) as u8; // G
            data[offset + 2] = (phase % 256) as u8; // R
            data[offset + 3] = 0xFF; // A
        }
    }
    ColorImage {
        width,
        height,
        stride,
        data,
    }
}

/// Depth ramp sweeping between 500 mm and ~4500 mm, with an invalid
/// stripe to exercise the dropout path.
fn depth_pattern(width: u32, height: u32, phase: u64) -> DepthImage {
    let mut data = vec![0u16; (width * height) as usize];
    for y in 0..height {
        for x in 0..width {
            let idx = (y * width + x) as usize;
            if (x as u64 + phase / 8) % 97 == 0 {
                data[idx] = 0; // no return
            } else {
                data[idx] = 500 + (((x + y) as u64 + phase * 4) % 4000) as u16;
            }
        }
    }
    DepthImage {
        width,
        height,
        data,
    }
}

// ── Tests ────────────────────────────────────────────────────────
