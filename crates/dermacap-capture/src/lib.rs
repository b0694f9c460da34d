//! Dermacap Capture - Camera frame source
//!
//! This crate owns the camera device: opening and configuring it, pulling
//! frames, and the session controls (zoom, torch, flip, focus). Frame
//! delivery pacing lives here too, so downstream consumers only ever see
//! frames at the configured cap.

pub mod camera;
pub mod pacer;
pub mod zoom;

pub use camera::CameraSource;
pub use pacer::FramePacer;
pub use zoom::ZoomControl;

// Re-export Frame so consumers of the capture API don't need dermacap-core
// just for the frame type.
pub use dermacap_core::Frame;
