//! Dermacap Store - image persistence and path handoff
//!
//! Saved captures are PNG files under `study_<folderKey>` with append-only
//! `skinimage_<N>_<baseName>` numbering; the absolute path of each saved
//! file is handed off to a single registered receiver.

pub mod handoff;
pub mod store;

pub use handoff::{handoff_channel, HandoffReceiver, HandoffSender, ImagePathEvent};
pub use store::{ImageStore, SaveError, SaveResult, FOLDER_PREFIX, IMAGE_PREFIX};
