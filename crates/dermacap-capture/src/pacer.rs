//! Frame delivery pacing
//!
//! The camera can produce frames faster than downstream consumers want them.
//! The pacer enforces the configured delivery cap: frames arriving closer than
//! one interval apart are dropped, never queued.

/// Rate limiter over presentation timestamps.
#[derive(Debug)]
pub struct FramePacer {
    interval_us: u64,
    last_emitted_us: Option<u64>,
}

impl FramePacer {
    /// Create a pacer for the given delivery cap. `fps = 0` disables pacing.
    pub fn new(fps: u32) -> Self {
        let interval_us = if fps == 0 { 0 } else { 1_000_000 / fps as u64 };
        Self {
            interval_us,
            last_emitted_us: None,
        }
    }

    /// Decide whether a frame with this timestamp should be delivered.
    ///
    /// Advances the pacer state only when the answer is yes, so a burst of
    /// early frames is dropped without shifting the cadence.
    pub fn should_emit(&mut self, timestamp_us: u64) -> bool {
        match self.last_emitted_us {
            Some(last) if timestamp_us.saturating_sub(last) < self.interval_us => false,
            _ => {
                self.last_emitted_us = Some(timestamp_us);
                true
            }
        }
    }

    /// Forget the last delivery, so the next frame passes unconditionally.
    pub fn reset(&mut self) {
        self.last_emitted_us = None;
    }
}
