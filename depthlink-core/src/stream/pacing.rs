//! Receiver-feedback-driven frame pacing.
//!
//! The sender compares its own frame counter against the newest id the
//! receiver has reported back. One or two frames of lag never trigger a
//! skip; each additional frame of lag doubles how much device time must
//! elapse before the sender may emit again. Backlog growth stays bounded
//! at the cost of short-term smoothness.

use crate::error::LinkError;

// ── pow_of_two ───────────────────────────────────────────────────

/// `2^exp` for `exp ≥ 0`.
///
/// Negative exponents are a caller bug and fail explicitly; exponents
/// beyond the `i64` range saturate rather than overflow.
pub fn pow_of_two(exp: i32) -> Result<i64, LinkError> {
    if exp < 0 {
        return Err(LinkError::InvalidArgument("pow_of_two: negative exponent"));
    }
    if exp >= 63 {
        return Ok(i64::MAX);
    }
    Ok(1i64 << exp)
}

// ── SkipPolicy ───────────────────────────────────────────────────

/// Tunable constants of the exponential back-off.
///
/// With the defaults, a lag of `n` frames requires `2^(n-1)/4` capture
/// intervals (integer division) to elapse before the next send.
#[derive(Debug, Clone, Copy)]
pub struct SkipPolicy {
    /// Divisor applied to the power-of-two threshold.
    pub divisor: i64,
    /// Offset added to the lag before exponentiation.
    pub exponent_offset: i32,
}

impl Default for SkipPolicy {
    fn default() -> Self {
        Self {
            divisor: 4,
            exponent_offset: -1,
        }
    }
}

// ── FrameSkipController ──────────────────────────────────────────

/// Per-capture accept/skip decision state.
///
/// Tracks the device timestamp of the last *sent* frame and the newest
/// receiver progress report. Receiver updates are last-writer-wins and
/// never awaited.
pub struct FrameSkipController {
    policy: SkipPolicy,
    /// Expected device capture interval in milliseconds.
    frame_interval_ms: f32,
    receiver_frame_id: i32,
    last_sent_timestamp_ms: f32,
}

impl FrameSkipController {
    /// Create a controller for a device capturing every
    /// `frame_interval_ms` milliseconds, with the default policy.
    pub fn new(frame_interval_ms: f32) -> Self {
        Self::with_policy(frame_interval_ms, SkipPolicy::default())
    }

    /// Create a controller with explicit policy constants.
    pub fn with_policy(frame_interval_ms: f32, policy: SkipPolicy) -> Self {
        assert!(frame_interval_ms > 0.0, "frame interval must be positive");
        Self {
            policy,
            frame_interval_ms,
            receiver_frame_id: 0,
            last_sent_timestamp_ms: 0.0,
        }
    }

    /// Record a receiver progress report. Most recent wins.
    pub fn record_ack(&mut self, receiver_frame_id: i32) {
        self.receiver_frame_id = receiver_frame_id;
    }

    /// The newest receiver progress seen so far.
    pub fn receiver_frame_id(&self) -> i32 {
        self.receiver_frame_id
    }

    /// Native capture cycles elapsed since the last sent frame, rounded
    /// to the nearest whole cycle.
    pub fn device_frame_diff(&self, timestamp_ms: f32) -> i64 {
        let elapsed = timestamp_ms - self.last_sent_timestamp_ms;
        (elapsed / self.frame_interval_ms + 0.5) as i64
    }

    /// Decide whether the capture stamped `timestamp_ms` should be sent
    /// as frame `frame_id`.
    ///
    /// The very first frame is always sent. Afterwards the capture is
    /// skipped iff fewer capture intervals have elapsed than the
    /// exponential threshold derived from the receiver's lag.
    pub fn should_send(&self, frame_id: i32, timestamp_ms: f32) -> bool {
        if frame_id == 0 {
            return true;
        }

        let lag = frame_id.saturating_sub(self.receiver_frame_id);
        let exp = lag.saturating_add(self.policy.exponent_offset);
        let threshold = match pow_of_two(exp) {
            Ok(p) => p / self.policy.divisor,
            // Negative exponent (receiver ahead of or current with the
            // sender) never skips.
            Err(_) => return true,
        };

        self.device_frame_diff(timestamp_ms) >= threshold
    }

    /// Record that a frame stamped `timestamp_ms` was sent.
    pub fn record_sent(&mut self, timestamp_ms: f32) {
        self.last_sent_timestamp_ms = timestamp_ms;
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: f32 = 33.0;

    /// Controller where the receiver lags by `lag` frames and
    /// `cycles` capture intervals have passed since the last send.
    fn controller_at(lag: i32, cycles: i32) -> (FrameSkipController, i32, f32) {
        let mut ctl = FrameSkipController::new(INTERVAL);
        let frame_id = 100;
        ctl.record_ack(frame_id - lag);
        ctl.record_sent(1000.0);
        let timestamp = 1000.0 + cycles as f32 * INTERVAL;
        (ctl, frame_id, timestamp)
    }

    #[test]
    fn pow_of_two_zero_is_one() {
        assert_eq!(pow_of_two(0).unwrap(), 1);
    }

    #[test]
    fn pow_of_two_matches_powers() {
        for exp in 0..20 {
            assert_eq!(pow_of_two(exp).unwrap(), 1i64 << exp);
        }
    }

    #[test]
    fn pow_of_two_negative_fails() {
        assert!(matches!(
            pow_of_two(-1),
            Err(LinkError::InvalidArgument(_))
        ));
    }

    #[test]
    fn pow_of_two_saturates_instead_of_overflowing() {
        assert_eq!(pow_of_two(63).unwrap(), i64::MAX);
        assert_eq!(pow_of_two(i32::MAX).unwrap(), i64::MAX);
    }

    #[test]
    fn first_frame_is_always_sent() {
        let mut ctl = FrameSkipController::new(INTERVAL);
        // Even with absurd receiver lag state, frame 0 goes out.
        ctl.record_ack(-1000);
        assert!(ctl.should_send(0, 0.0));
    }

    #[test]
    fn lag_of_one_or_two_never_skips() {
        for lag in [1, 2] {
            for cycles in 0..10 {
                let (ctl, frame_id, ts) = controller_at(lag, cycles);
                assert!(
                    ctl.should_send(frame_id, ts),
                    "lag {lag}, cycles {cycles} should send"
                );
            }
        }
    }

    #[test]
    fn lag_of_five_requires_four_cycles() {
        let (ctl, frame_id, ts) = controller_at(5, 3);
        assert!(!ctl.should_send(frame_id, ts));

        let (ctl, frame_id, ts) = controller_at(5, 4);
        assert!(ctl.should_send(frame_id, ts));
    }

    #[test]
    fn lag_of_six_requires_eight_cycles() {
        let (ctl, frame_id, ts) = controller_at(6, 2);
        assert!(!ctl.should_send(frame_id, ts));

        let (ctl, frame_id, ts) = controller_at(6, 8);
        assert!(ctl.should_send(frame_id, ts));
    }

    #[test]
    fn receiver_ahead_never_skips() {
        // Receiver reported an id at or past the sender's counter.
        let (mut ctl, frame_id, ts) = controller_at(0, 0);
        assert!(ctl.should_send(frame_id, ts));
        ctl.record_ack(frame_id + 5);
        assert!(ctl.should_send(frame_id, ts));
    }

    #[test]
    fn huge_lag_does_not_overflow() {
        let mut ctl = FrameSkipController::new(INTERVAL);
        ctl.record_ack(0);
        ctl.record_sent(0.0);
        // Threshold saturates; one interval of elapsed time cannot
        // reach it.
        assert!(!ctl.should_send(i32::MAX, 33.0));
    }

    #[test]
    fn acks_are_last_writer_wins() {
        let mut ctl = FrameSkipController::new(INTERVAL);
        ctl.record_ack(5);
        ctl.record_ack(3);
        assert_eq!(ctl.receiver_frame_id(), 3);
    }

    #[test]
    fn device_frame_diff_rounds_to_nearest() {
        let mut ctl = FrameSkipController::new(INTERVAL);
        ctl.record_sent(0.0);
        assert_eq!(ctl.device_frame_diff(16.0), 0);
        assert_eq!(ctl.device_frame_diff(17.0), 1);
        assert_eq!(ctl.device_frame_diff(33.0), 1);
        assert_eq!(ctl.device_frame_diff(66.0), 2);
    }
}
