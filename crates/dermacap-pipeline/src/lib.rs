//! Dermacap Pipeline - capture-to-still pipeline state
//!
//! This crate holds the stateful heart of the capture flow: the single-slot
//! frame holder the camera thread publishes into, the LIVE/FROZEN capture
//! controller, and the crop transform that turns the held frame into a
//! still image.

pub mod controller;
pub mod crop;
pub mod slot;

pub use controller::{CaptureController, CaptureState};
pub use crop::{crop_frame, map_region};
pub use slot::FrameSlot;
