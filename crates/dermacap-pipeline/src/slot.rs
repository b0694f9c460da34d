//! Single-slot latest-frame cache
//!
//! The camera thread publishes into the slot; the capture controller reads
//! from it. Only the most recent frame matters, so the slot keeps exactly one
//! and every publish replaces it. Freezing the slot is what keeps the held
//! frame stable while it is cropped: while frozen, incoming frames are
//! dropped entirely, not buffered.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use dermacap_core::Frame;

/// Shared single-slot holder for the most recent frame.
///
/// The frame is an immutable snapshot replaced by reference, so publisher and
/// reader never contend on pixel data. The freeze flag only needs eventual
/// visibility; a frame of drift around a freeze toggle is acceptable.
#[derive(Default)]
pub struct FrameSlot {
    slot: Mutex<Option<Frame>>,
    frozen: AtomicBool,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a frame, replacing any held one. Returns `false` when the slot
    /// is frozen and the frame was dropped.
    pub fn publish(&self, frame: Frame) -> bool {
        if self.frozen.load(Ordering::Relaxed) {
            return false;
        }
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(frame);
            true
        } else {
            false
        }
    }

    /// The most recently published frame, if any.
    pub fn current(&self) -> Option<Frame> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }

    /// Stop accepting new frames; the held frame stays put.
    pub fn freeze(&self) {
        self.frozen.store(true, Ordering::Relaxed);
    }

    /// Resume accepting frames.
    pub fn unfreeze(&self) {
        self.frozen.store(false, Ordering::Relaxed);
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(seq: u64) -> Frame {
        Frame::new(vec![0u8; 4], 1, 1, seq)
    }

    #[test]
    fn test_latest_frame_wins() {
        let slot = FrameSlot::new();
        assert!(slot.current().is_none());

        for seq in 1..=5 {
            assert!(slot.publish(frame(seq)));
        }
        assert_eq!(slot.current().unwrap().sequence, 5);
    }

    #[test]
    fn test_frozen_slot_drops_frames() {
        let slot = FrameSlot::new();
        slot.publish(frame(1));
        slot.freeze();

        assert!(!slot.publish(frame(2)));
        assert!(!slot.publish(frame(3)));
        assert_eq!(slot.current().unwrap().sequence, 1);
    }

    #[test]
    fn test_unfreeze_resumes_ingestion() {
        let slot = FrameSlot::new();
        slot.publish(frame(1));
        slot.freeze();
        slot.publish(frame(2));
        slot.unfreeze();

        assert!(slot.publish(frame(3)));
        assert_eq!(slot.current().unwrap().sequence, 3);
    }
}
