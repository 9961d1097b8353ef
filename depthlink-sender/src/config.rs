//! Configuration for the sender.
//!
//! The port and depth resolution come from the interactive prompt; this
//! file holds the tunables an operator rarely touches.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use depthlink_core::{SensorConfig, ServiceConfig, SkipPolicy};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Network settings.
    pub network: NetworkConfig,
    /// Capture settings.
    pub capture: CaptureConfig,
    /// Encoder settings.
    pub codec: CodecConfig,
    /// Frame skip policy and loop scheduling.
    pub pacing: PacingConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// UDP port offered as the prompt default.
    pub port: u16,
    /// Datagram payload budget.
    pub mtu: usize,
}

/// Capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Bounded wait for one capture, in milliseconds.
    pub timeout_ms: u64,
    /// Expected device capture interval, in milliseconds.
    pub frame_interval_ms: f32,
}

/// Encoder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// zstd level for the color payload (1 = fast, 19 = max).
    pub color_level: i32,
    /// zstd level for the depth payload.
    pub depth_level: i32,
    /// Depth delta noise threshold in millimeters.
    pub change_threshold: u16,
    /// Consecutive invalid readings before an invalidation propagates.
    pub invalid_debounce: u32,
}

/// Frame skip policy and loop scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Divisor of the exponential skip threshold.
    pub skip_divisor: i64,
    /// Exponent offset of the exponential skip threshold.
    pub skip_exponent_offset: i32,
    /// Backoff after an empty iteration, in milliseconds. 0 = yield
    /// only (busy poll).
    pub idle_backoff_ms: u64,
    /// Log a throughput summary every this many sent frames.
    pub summary_every: u32,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            capture: CaptureConfig::default(),
            codec: CodecConfig::default(),
            pacing: PacingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            port: 7777,
            mtu: 1400,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 1000,
            frame_interval_ms: 33.0,
        }
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            color_level: 1,
            depth_level: 1,
            change_threshold: 10,
            invalid_debounce: 2,
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            skip_divisor: 4,
            skip_exponent_offset: -1,
            idle_backoff_ms: 0,
            summary_every: 100,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl SenderConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Sensor start-up settings for a prompt-chosen resolution.
    pub fn to_sensor_config(&self, resolution: depthlink_core::DepthResolution) -> SensorConfig {
        SensorConfig {
            resolution,
            capture_timeout: Duration::from_millis(self.capture.timeout_ms),
        }
    }

    /// Skip policy constants.
    pub fn to_skip_policy(&self) -> SkipPolicy {
        SkipPolicy {
            divisor: self.pacing.skip_divisor.max(1),
            exponent_offset: self.pacing.skip_exponent_offset,
        }
    }

    /// Capture loop settings.
    pub fn to_service_config(&self) -> ServiceConfig {
        ServiceConfig {
            idle_backoff: Duration::from_millis(self.pacing.idle_backoff_ms),
            summary_every: self.pacing.summary_every.max(1),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let cfg = SenderConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        assert!(text.contains("port"));
        assert!(text.contains("skip_divisor"));
    }

    #[test]
    fn roundtrip_config() {
        let cfg = SenderConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed: SenderConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.network.port, 7777);
        assert_eq!(parsed.codec.change_threshold, 10);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let parsed: SenderConfig = toml::from_str("[network]\nport = 9000\n").unwrap();
        assert_eq!(parsed.network.port, 9000);
        assert_eq!(parsed.capture.timeout_ms, 1000);
        assert_eq!(parsed.pacing.skip_divisor, 4);
    }

    #[test]
    fn to_skip_policy_guards_zero_divisor() {
        let mut cfg = SenderConfig::default();
        cfg.pacing.skip_divisor = 0;
        assert_eq!(cfg.to_skip_policy().divisor, 1);
    }
}
