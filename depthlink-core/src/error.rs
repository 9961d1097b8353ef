//! Domain-specific error types for the depthlink protocol.
//!
//! All fallible operations return `Result<T, LinkError>`.
//! No panics on invalid input — every error is typed and recoverable.

use std::time::Duration;
use thiserror::Error;

/// The canonical error type for the depthlink protocol.
#[derive(Debug, Error)]
pub enum LinkError {
    // ── Protocol Errors ──────────────────────────────────────────
    /// A field in a wire header could not be parsed.
    #[error("invalid header: {0}")]
    InvalidHeader(&'static str),

    /// A payload cannot be expressed within the fragment count limit.
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A caller passed a value outside the valid domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    // ── Transport Errors ─────────────────────────────────────────
    /// The UDP/IO layer reported an error.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    // ── Device Errors ────────────────────────────────────────────
    /// A sensor or audio device reported an error at the SDK boundary.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    // ── Serialization Errors ─────────────────────────────────────
    /// Encoding or decoding of a payload failed.
    #[error("encoding error: {0}")]
    Encoding(String),
}

// ── DeviceError ──────────────────────────────────────────────────

/// Normalized device-boundary error kinds.
///
/// Raw numeric codes from sensor or audio backends are mapped into this
/// set at the boundary so internal logic never branches on raw codes.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// No matching device is present or it refused to open.
    #[error("device unavailable")]
    DeviceUnavailable,

    /// The backend failed to allocate a device, stream, or buffer.
    #[error("out of memory")]
    OutOfMemory,

    /// The device produced nothing within the bounded wait.
    #[error("device timed out after {0:?}")]
    Timeout(Duration),

    /// The output or capture stream could not be opened.
    #[error("failed to open stream: {0}")]
    StreamOpenFailed(String),

    /// A backend code with no normalized equivalent.
    #[error("device backend error code {0}")]
    Unknown(i32),
}

// ── Convenient From implementations ──────────────────────────────

impl From<String> for LinkError {
    fn from(s: String) -> Self {
        LinkError::Encoding(s)
    }
}

impl From<Box<bincode::ErrorKind>> for LinkError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        LinkError::Encoding(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = LinkError::InvalidArgument("negative exponent");
        assert!(e.to_string().contains("negative exponent"));

        let e = LinkError::PayloadTooLarge {
            size: 1000,
            max: 500,
        };
        assert!(e.to_string().contains("1000"));
        assert!(e.to_string().contains("500"));
    }

    #[test]
    fn from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broke");
        let e: LinkError = io_err.into();
        assert!(matches!(e, LinkError::Transport(_)));
    }

    #[test]
    fn from_device() {
        let e: LinkError = DeviceError::Unknown(-7).into();
        assert!(e.to_string().contains("-7"));
    }

    #[test]
    fn device_timeout_display() {
        let e = DeviceError::Timeout(Duration::from_millis(1000));
        assert!(e.to_string().contains("1s"));
    }
}
