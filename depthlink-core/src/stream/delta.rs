//! Temporal delta pass over consecutive depth images.
//!
//! Depth pixels are compared against the previous frame and emitted as
//! wrapping `u16` differences, so a mostly-static scene reduces to long
//! runs of zeros that the downstream compressor collapses. Two knobs
//! shape the output:
//!
//! - **change threshold**: differences at or below this magnitude (in
//!   millimeters) are treated as sensor noise and emitted as zero.
//! - **invalidation debounce**: a pixel must read invalid (`0`) for this
//!   many consecutive frames before the invalidation propagates,
//!   suppressing single-frame dropouts.

// ── DepthDelta ───────────────────────────────────────────────────

/// Stateful delta pass that remembers the previously emitted depth
/// frame.
///
/// The first call (or the call after [`reset`](Self::reset)) produces a
/// keyframe: the raw values themselves, since the reference frame is
/// all zeros.
pub struct DepthDelta {
    change_threshold: u16,
    invalid_debounce: u32,
    previous: Option<Vec<u16>>,
    invalid_streak: Vec<u32>,
}

impl DepthDelta {
    /// Create a delta pass with the given noise threshold (mm) and
    /// invalidation debounce (frames).
    pub fn new(change_threshold: u16, invalid_debounce: u32) -> Self {
        Self {
            change_threshold,
            invalid_debounce,
            previous: None,
            invalid_streak: Vec::new(),
        }
    }

    /// Reset the pass, forcing the next frame to be a keyframe.
    pub fn reset(&mut self) {
        self.previous = None;
        self.invalid_streak.clear();
    }

    /// Whether the next [`encode`](Self::encode) emits a keyframe.
    pub fn is_keyframe_pending(&self) -> bool {
        self.previous.is_none()
    }

    /// Emit wrapping differences against the retained reference frame,
    /// updating the reference for pixels that changed meaningfully.
    pub fn encode(&mut self, depth: &[u16]) -> Vec<u16> {
        let previous = match &mut self.previous {
            Some(prev) if prev.len() == depth.len() => prev,
            _ => {
                // Keyframe: reference is implicitly all zeros.
                self.previous = Some(depth.to_vec());
                self.invalid_streak = vec![0; depth.len()];
                return depth.to_vec();
            }
        };

        let mut out = Vec::with_capacity(depth.len());
        for (i, (&current, prev)) in depth.iter().zip(previous.iter_mut()).enumerate() {
            if current == 0 && *prev != 0 {
                // Candidate invalidation — only propagate after the
                // debounce streak.
                self.invalid_streak[i] += 1;
                if self.invalid_streak[i] < self.invalid_debounce {
                    out.push(0);
                    continue;
                }
            } else {
                self.invalid_streak[i] = 0;
            }

            let diff = current.wrapping_sub(*prev);
            if wrapping_magnitude(diff) <= self.change_threshold as u32 {
                out.push(0);
            } else {
                out.push(diff);
                *prev = current;
            }
        }
        out
    }
}

/// Magnitude of a wrapping `u16` difference.
fn wrapping_magnitude(diff: u16) -> u32 {
    let d = diff as u32;
    d.min(0x1_0000 - d)
}
