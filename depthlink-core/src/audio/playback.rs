//! Output-device playback fed from the ring buffer.
//!
//! The device drives its own callback thread; the callback is the
//! ring's single consumer. When the ring runs dry the callback emits
//! silence instead of stalling — an underflow is audible, never fatal.
//!
//! All backend errors are normalized into [`DeviceError`] at this
//! boundary; nothing above it sees cpal types.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::audio::ring::RingConsumer;
use crate::error::DeviceError;

// ── AudioFormat ──────────────────────────────────────────────────

/// Output stream format. Samples are little-endian `f32` on the wire
/// and in the ring.
#[derive(Debug, Clone, Copy)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioFormat {
    /// Bytes per `f32` sample.
    pub const fn bytes_per_sample(&self) -> usize {
        4
    }

    /// Bytes per interleaved sample frame.
    pub const fn bytes_per_frame(&self) -> usize {
        self.bytes_per_sample() * self.channels as usize
    }
}

impl Default for AudioFormat {
    /// Stereo at 48 kHz — generic, and what game-engine receivers
    /// default to.
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 2,
        }
    }
}

// ── Device enumeration ───────────────────────────────────────────

/// Names of the host's output devices, for operator-facing status.
pub fn output_device_names() -> Result<Vec<String>, DeviceError> {
    let host = cpal::default_host();
    let devices = host
        .output_devices()
        .map_err(|_| DeviceError::DeviceUnavailable)?;
    Ok(devices
        .map(|d| d.name().unwrap_or_else(|_| "<unnamed>".into()))
        .collect())
}

// ── PlaybackStream ───────────────────────────────────────────────

/// A running output stream. Dropping it stops playback.
pub struct PlaybackStream {
    _stream: cpal::Stream,
}

/// Open the default output device and start pulling from `consumer`.
///
/// The callback converts ring bytes to `f32` samples; any shortfall is
/// filled with silence.
pub fn start(mut consumer: RingConsumer, format: AudioFormat) -> Result<PlaybackStream, DeviceError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or(DeviceError::DeviceUnavailable)?;

    let config = cpal::StreamConfig {
        channels: format.channels,
        sample_rate: cpal::SampleRate(format.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let mut byte_buf: Vec<u8> = Vec::new();
    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let wanted = data.len() * 4;
                byte_buf.clear();
                byte_buf.resize(wanted, 0);
                // Bytes past what the ring delivers stay zero: silence
                // on underflow.
                consumer.read(&mut byte_buf);

                for (sample, chunk) in data.iter_mut().zip(byte_buf.chunks_exact(4)) {
                    *sample = f32::from_le_bytes(chunk.try_into().unwrap());
                }
            },
            |err| {
                eprintln!("playback stream error: {err}");
            },
            None,
        )
        .map_err(map_build_error)?;

    stream.play().map_err(|e| match e {
        cpal::PlayStreamError::DeviceNotAvailable => DeviceError::DeviceUnavailable,
        cpal::PlayStreamError::BackendSpecific { err } => {
            DeviceError::StreamOpenFailed(err.to_string())
        }
    })?;

    Ok(PlaybackStream { _stream: stream })
}

fn map_build_error(e: cpal::BuildStreamError) -> DeviceError {
    match e {
        cpal::BuildStreamError::DeviceNotAvailable => DeviceError::DeviceUnavailable,
        cpal::BuildStreamError::StreamConfigNotSupported
        | cpal::BuildStreamError::InvalidArgument => {
            DeviceError::StreamOpenFailed("unsupported stream configuration".into())
        }
        cpal::BuildStreamError::StreamIdOverflow => DeviceError::OutOfMemory,
        cpal::BuildStreamError::BackendSpecific { err } => {
            DeviceError::StreamOpenFailed(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_byte_arithmetic() {
        let format = AudioFormat::default();
        assert_eq!(format.sample_rate, 48_000);
        assert_eq!(format.channels, 2);
        assert_eq!(format.bytes_per_sample(), 4);
        assert_eq!(format.bytes_per_frame(), 8);
    }
}
