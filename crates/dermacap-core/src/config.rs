//! Configuration types for Dermacap

use serde::{Deserialize, Serialize};

use crate::geometry::{Region, Viewport};

/// Fraction of the preview width covered by the capture rectangle.
pub const REGION_WIDTH_FRAC: f32 = 0.8;
/// Fraction of the preview height covered by the capture rectangle.
pub const REGION_HEIGHT_FRAC: f32 = 0.4;

/// Main configuration for a capture session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Preferred capture width in pixels
    pub width: u32,
    /// Preferred capture height in pixels
    pub height: u32,
    /// Frame delivery cap (frames arriving faster are dropped)
    pub fps: u32,
    /// Camera device index
    pub camera_index: u32,
    /// Study folder key; images land under `study_<folder_key>`
    pub folder_key: String,
    /// Base name for saved images
    pub base_name: String,
    /// Inference endpoint URL
    pub endpoint: String,
    /// Model name sent with upload requests
    pub model: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 30,
            camera_index: 0,
            folder_key: "default".to_string(),
            base_name: "capture".to_string(),
            endpoint: "http://localhost:8000/predict".to_string(),
            model: "Adversarial Model".to_string(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: set capture width
    pub fn with_width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    /// Builder pattern: set capture height
    pub fn with_height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    /// Builder pattern: set frame rate cap
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Builder pattern: set camera device index
    pub fn with_camera_index(mut self, index: u32) -> Self {
        self.camera_index = index;
        self
    }

    /// Builder pattern: set study folder key
    pub fn with_folder_key(mut self, key: impl Into<String>) -> Self {
        self.folder_key = key.into();
        self
    }

    /// Builder pattern: set image base name
    pub fn with_base_name(mut self, name: impl Into<String>) -> Self {
        self.base_name = name.into();
        self
    }

    /// Builder pattern: set inference endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Builder pattern: set model name
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// The preview viewport the capture region is laid out in. The preview
    /// surface matches the requested capture size.
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width as f32, self.height as f32)
    }

    /// The fixed capture rectangle, centered in the viewport.
    pub fn capture_region(&self) -> Region {
        Region::centered_in(self.viewport(), REGION_WIDTH_FRAC, REGION_HEIGHT_FRAC)
    }

    /// Minimum spacing between delivered frames, in microseconds.
    pub fn frame_interval_us(&self) -> u64 {
        if self.fps == 0 {
            0
        } else {
            1_000_000 / self.fps as u64
        }
    }
}
