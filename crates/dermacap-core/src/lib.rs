//! Dermacap Core - Shared types for the capture pipeline
//!
//! This crate provides the foundational types used across all Dermacap
//! components: frames, geometry, configuration and errors.

pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;

pub use config::Config;
pub use error::{Error, Result};
pub use frame::{Frame, StillImage};
pub use geometry::{PixelRect, Region, Viewport};
