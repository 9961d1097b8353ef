//! Frame encoders.
//!
//! The protocol layer treats codec output as opaque bytes; these traits
//! are the seam. The built-in implementations compress with zstd:
//!
//! - **Color**: rows packed tightly (stride padding dropped) → zstd.
//! - **Depth**: temporal delta pass ([`DepthDelta`]) → zstd.

use bytes::Bytes;

use crate::error::LinkError;
use crate::stream::delta::DepthDelta;
use crate::stream::types::{ColorImage, DepthImage};

// ── Encoder traits ───────────────────────────────────────────────

/// Converts a reprojected color image into an opaque payload.
pub trait ColorEncoder {
    fn encode(&mut self, image: &ColorImage) -> Result<Bytes, LinkError>;
}

/// Converts a depth image into an opaque payload.
pub trait DepthEncoder {
    fn encode(&mut self, image: &DepthImage) -> Result<Bytes, LinkError>;
}

// ── ZstdColorEncoder ─────────────────────────────────────────────

/// Color encoder: tight row packing followed by zstd.
pub struct ZstdColorEncoder {
    /// zstd compression level (1 = fast, 19 = max).
    level: i32,
}

impl ZstdColorEncoder {
    /// Create an encoder at the given zstd level.
    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

impl ColorEncoder for ZstdColorEncoder {
    fn encode(&mut self, image: &ColorImage) -> Result<Bytes, LinkError> {
        let row_len = image.width as usize * ColorImage::BYTES_PER_PIXEL;
        let mut packed = Vec::with_capacity(row_len * image.height as usize);
        for y in 0..image.height {
            packed.extend_from_slice(&image.row(y)[..row_len]);
        }

        let compressed = zstd::encode_all(packed.as_slice(), self.level)
            .map_err(|e| LinkError::Encoding(format!("zstd color encode failed: {e}")))?;
        Ok(Bytes::from(compressed))
    }
}

// ── TemporalDepthEncoder ─────────────────────────────────────────

/// Depth encoder: temporal delta pass, little-endian packing, zstd.
pub struct TemporalDepthEncoder {
    delta: DepthDelta,
    level: i32,
}

impl TemporalDepthEncoder {
    /// Create an encoder with the given delta thresholds and zstd level.
    pub fn new(change_threshold: u16, invalid_debounce: u32, level: i32) -> Self {
        Self {
            delta: DepthDelta::new(change_threshold, invalid_debounce),
            level,
        }
    }

    /// Force the next frame to encode as a keyframe.
    pub fn reset(&mut self) {
        self.delta.reset();
    }
}

impl DepthEncoder for TemporalDepthEncoder {
    fn encode(&mut self, image: &DepthImage) -> Result<Bytes, LinkError> {
        let deltas = self.delta.encode(&image.data);

        let mut packed = Vec::with_capacity(deltas.len() * 2);
        for value in &deltas {
            packed.extend_from_slice(&value.to_le_bytes());
        }

        let compressed = zstd::encode_all(packed.as_slice(), self.level)
            .map_err(|e| LinkError::Encoding(format!("zstd depth encode failed: {e}")))?;
        Ok(Bytes::from(compressed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_color(w: u32, h: u32) -> ColorImage {
        let stride = w * 4 + 8; // padded rows
        ColorImage {
            width: w,
            height: h,
            stride,
            data: vec![0xAB; (stride * h) as usize],
        }
    }

    fn test_depth(values: &[u16], w: u32, h: u32) -> DepthImage {
        DepthImage {
            width: w,
            height: h,
            data: values.to_vec(),
        }
    }

    #[test]
    fn color_encode_compresses_repetitive_data() {
        let mut enc = ZstdColorEncoder::new(1);
        let image = test_color(64, 64);
        let payload = enc.encode(&image).unwrap();
        assert!(payload.len() < 64 * 64 * 4);
    }

    #[test]
    fn color_encode_drops_stride_padding() {
        let mut enc = ZstdColorEncoder::new(1);
        let image = test_color(4, 4);
        let payload = enc.encode(&image).unwrap();
        let raw = zstd::decode_all(payload.as_ref()).unwrap();
        assert_eq!(raw.len(), 4 * 4 * 4);
        assert!(raw.iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn depth_static_scene_shrinks_after_keyframe() {
        let values: Vec<u16> = (0..320u32 * 288).map(|i| (i * 37 % 4096) as u16).collect();
        let image = test_depth(&values, 320, 288);

        let mut enc = TemporalDepthEncoder::new(10, 2, 1);
        let keyframe = enc.encode(&image).unwrap();
        let second = enc.encode(&image).unwrap();
        // Second frame is all zero deltas — dramatically smaller.
        assert!(second.len() < keyframe.len());
    }

    #[test]
    fn depth_keyframe_roundtrips_values() {
        let values = vec![500u16, 1000, 0, 65535];
        let image = test_depth(&values, 4, 1);

        let mut enc = TemporalDepthEncoder::new(10, 2, 1);
        let payload = enc.encode(&image).unwrap();
        let raw = zstd::decode_all(payload.as_ref()).unwrap();
        let decoded: Vec<u16> = raw
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        assert_eq!(decoded, values);
    }

    #[test]
    fn depth_reset_reemits_keyframe() {
        let values = vec![900u16; 16];
        let image = test_depth(&values, 4, 4);

        let mut enc = TemporalDepthEncoder::new(10, 2, 1);
        let first = enc.encode(&image).unwrap();
        enc.reset();
        let again = enc.encode(&image).unwrap();
        assert_eq!(first, again);
    }
}
