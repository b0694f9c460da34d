//! Capture state machine
//!
//! Two states for the lifetime of a capture session:
//!
//! - **Live**: frames flow into the slot; nothing is held.
//! - **Frozen**: ingestion is suspended and the cropped still (if the crop
//!   succeeded) is held until the session restarts.
//!
//! A failed crop leaves the controller frozen with no still; the operator
//! decides whether to restart, never the controller.

use std::sync::Arc;

use dermacap_core::{Error, Region, Result, StillImage, Viewport};
use tracing::{debug, warn};

use crate::crop;
use crate::slot::FrameSlot;

/// Capture session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Live,
    Frozen,
}

/// Drives the freeze/crop/restart cycle over a shared frame slot.
pub struct CaptureController {
    slot: Arc<FrameSlot>,
    region: Region,
    viewport: Viewport,
    state: CaptureState,
    still: Option<StillImage>,
}

impl CaptureController {
    /// A controller starts live, ingesting, with nothing held.
    pub fn new(slot: Arc<FrameSlot>, region: Region, viewport: Viewport) -> Self {
        Self {
            slot,
            region,
            viewport,
            state: CaptureState::Live,
            still: None,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// The still from the last successful capture, while frozen.
    pub fn still(&self) -> Option<&StillImage> {
        self.still.as_ref()
    }

    /// Freeze ingestion and crop the held frame.
    ///
    /// With no frame available this is a no-op that reports the error; state
    /// is unchanged. A crop failure leaves the controller frozen with no
    /// still.
    pub fn capture(&mut self) -> Result<&StillImage> {
        if self.state == CaptureState::Frozen {
            return Err(Error::AlreadyFrozen);
        }

        // Freeze before reading so the frame we crop is the frame we hold.
        self.slot.freeze();
        let Some(frame) = self.slot.current() else {
            self.slot.unfreeze();
            warn!("Capture requested with no frame available");
            return Err(Error::NoFrame);
        };
        self.state = CaptureState::Frozen;

        match crop::crop_frame(&frame, self.region, self.viewport) {
            Ok(still) => {
                debug!(
                    "Captured frame {} -> {}x{} still",
                    frame.sequence, still.width, still.height
                );
                Ok(self.still.insert(still))
            }
            Err(e) => {
                warn!("Crop failed, session stays frozen: {}", e);
                Err(e)
            }
        }
    }

    /// Discard the held still and resume ingestion unconditionally.
    pub fn restart(&mut self) {
        self.still = None;
        self.state = CaptureState::Live;
        self.slot.unfreeze();
        debug!("Capture session restarted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dermacap_core::Frame;

    fn filled_frame(width: u32, height: u32, seq: u64) -> Frame {
        Frame::new(vec![128u8; (width * height * 4) as usize], width, height, seq)
    }

    fn controller_with(slot: Arc<FrameSlot>) -> CaptureController {
        let viewport = Viewport::new(8.0, 8.0);
        let region = Region::new(2.0, 2.0, 4.0, 4.0);
        CaptureController::new(slot, region, viewport)
    }

    #[test]
    fn test_capture_without_frame_is_noop() {
        let slot = Arc::new(FrameSlot::new());
        let mut controller = controller_with(slot.clone());

        let err = controller.capture().unwrap_err();
        assert!(matches!(err, Error::NoFrame));
        assert_eq!(controller.state(), CaptureState::Live);
        assert!(controller.still().is_none());
        // Ingestion must still be possible afterwards.
        assert!(!slot.is_frozen());
        assert!(slot.publish(filled_frame(8, 8, 1)));
    }

    #[test]
    fn test_capture_freezes_and_holds_still() {
        let slot = Arc::new(FrameSlot::new());
        slot.publish(filled_frame(8, 8, 1));
        let mut controller = controller_with(slot.clone());

        let still = controller.capture().unwrap();
        assert_eq!((still.width, still.height), (4, 4));
        assert_eq!(controller.state(), CaptureState::Frozen);
        assert!(slot.is_frozen());

        // Frames arriving post-capture are dropped.
        assert!(!slot.publish(filled_frame(8, 8, 2)));
        assert_eq!(slot.current().unwrap().sequence, 1);
    }

    #[test]
    fn test_second_capture_while_frozen_rejected() {
        let slot = Arc::new(FrameSlot::new());
        slot.publish(filled_frame(8, 8, 1));
        let mut controller = controller_with(slot);

        controller.capture().unwrap();
        assert!(matches!(
            controller.capture().unwrap_err(),
            Error::AlreadyFrozen
        ));
    }

    #[test]
    fn test_restart_resumes_live() {
        let slot = Arc::new(FrameSlot::new());
        slot.publish(filled_frame(8, 8, 1));
        let mut controller = controller_with(slot.clone());

        controller.capture().unwrap();
        controller.restart();

        assert_eq!(controller.state(), CaptureState::Live);
        assert!(controller.still().is_none());
        assert!(!slot.is_frozen());
        assert!(slot.publish(filled_frame(8, 8, 2)));
    }

    #[test]
    fn test_failed_crop_stays_frozen_without_still() {
        let slot = Arc::new(FrameSlot::new());
        slot.publish(filled_frame(8, 8, 1));
        // Region with no extent: the crop must fail after freezing.
        let viewport = Viewport::new(8.0, 8.0);
        let region = Region::new(0.0, 0.0, 0.0, 0.0);
        let mut controller = CaptureController::new(slot.clone(), region, viewport);

        let err = controller.capture().unwrap_err();
        assert!(matches!(err, Error::Transform(_)));
        assert_eq!(controller.state(), CaptureState::Frozen);
        assert!(controller.still().is_none());
        assert!(slot.is_frozen());

        // Recovery is explicit.
        controller.restart();
        assert_eq!(controller.state(), CaptureState::Live);
    }
}
