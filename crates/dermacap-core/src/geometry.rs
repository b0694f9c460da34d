//! Preview-space and frame-space geometry
//!
//! The capture region lives in preview coordinates (origin top-left, y-down);
//! camera frames index pixels from a bottom-left origin. The crop transform in
//! `dermacap-pipeline` maps between the two using these types.

use serde::{Deserialize, Serialize};

/// Size of the on-screen preview surface the capture region is laid out in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// True when both extents are finite and positive.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// The fixed capture rectangle, in preview coordinates (origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Region {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A region centered in the viewport covering the given fractions of its
    /// width and height. The capture screen uses 0.8 x 0.4.
    pub fn centered_in(viewport: Viewport, width_frac: f32, height_frac: f32) -> Self {
        let width = viewport.width * width_frac;
        let height = viewport.height * height_frac;
        Self {
            x: (viewport.width - width) / 2.0,
            y: (viewport.height - height) / 2.0,
            width,
            height,
        }
    }

    pub fn max_y(&self) -> f32 {
        self.y + self.height
    }

    /// True when all components are finite and the extent is positive.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }
}

/// An integer pixel rectangle in frame space, guaranteed non-empty by its
/// producers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_region_matches_capture_overlay() {
        let viewport = Viewport::new(400.0, 800.0);
        let region = Region::centered_in(viewport, 0.8, 0.4);

        assert_eq!(region.x, 40.0);
        assert_eq!(region.y, 240.0);
        assert_eq!(region.width, 320.0);
        assert_eq!(region.height, 320.0);
        assert_eq!(region.max_y(), 560.0);
    }

    #[test]
    fn test_region_validity() {
        assert!(Region::new(0.0, 0.0, 10.0, 10.0).is_valid());
        assert!(!Region::new(0.0, 0.0, 0.0, 10.0).is_valid());
        assert!(!Region::new(0.0, 0.0, -5.0, 10.0).is_valid());
        assert!(!Region::new(f32::NAN, 0.0, 10.0, 10.0).is_valid());
        assert!(!Region::new(0.0, 0.0, f32::INFINITY, 10.0).is_valid());
    }

    #[test]
    fn test_viewport_validity() {
        assert!(Viewport::new(640.0, 480.0).is_valid());
        assert!(!Viewport::new(0.0, 480.0).is_valid());
        assert!(!Viewport::new(f32::NAN, 480.0).is_valid());
    }
}
