//! Raster types shared across the capture pipeline
//!
//! A [`Frame`] is one decoded camera image; a [`StillImage`] is the cropped
//! capture produced once per capture event.

use std::sync::Arc;

/// Bytes per pixel for the RGBA8 layout used throughout the pipeline.
pub const BYTES_PER_PIXEL: usize = 4;

/// An immutable snapshot of one camera frame.
///
/// Pixel data is RGBA8, row-major, tightly packed. The buffer is shared, so
/// cloning a frame is cheap and the slot holder can replace the current frame
/// by reference without copying pixels.
#[derive(Clone)]
pub struct Frame {
    /// Raw pixel data in RGBA format
    data: Arc<Vec<u8>>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Frame sequence number, monotonic per source
    pub sequence: u64,
    /// Presentation timestamp in microseconds
    pub timestamp_us: u64,
}

impl Frame {
    /// Create a new frame from RGBA pixel data, stamped with the current time.
    pub fn new(data: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        let timestamp_us = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0);

        Self::with_timestamp(data, width, height, sequence, timestamp_us)
    }

    /// Create a frame with an explicit presentation timestamp.
    pub fn with_timestamp(
        data: Vec<u8>,
        width: u32,
        height: u32,
        sequence: u64,
        timestamp_us: u64,
    ) -> Self {
        Self {
            data: Arc::new(data),
            width,
            height,
            sequence,
            timestamp_us,
        }
    }

    /// Get the raw pixel data as a slice
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the number of bytes per row (stride)
    pub fn stride(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    /// One row of pixels, or `None` when `y` is out of bounds.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let stride = self.stride();
        let start = y as usize * stride;
        self.data.get(start..start + stride)
    }

    /// Check if the buffer is large enough for the declared dimensions
    pub fn is_valid(&self) -> bool {
        let expected_size = self.width as usize * self.height as usize * BYTES_PER_PIXEL;
        self.data.len() >= expected_size && self.width > 0 && self.height > 0
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("timestamp_us", &self.timestamp_us)
            .finish()
    }
}

/// The cropped still produced by a capture event.
///
/// Owns its pixels (RGBA8, row-major); immutable after creation.
#[derive(Clone, PartialEq, Eq)]
pub struct StillImage {
    data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl StillImage {
    /// Build a still from RGBA pixel data. Returns `None` when the buffer
    /// does not match the declared dimensions.
    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> Option<Self> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if data.len() != expected || width == 0 || height == 0 {
            return None;
        }
        Some(Self {
            data,
            width,
            height,
        })
    }

    /// Get the raw pixel data as a slice
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the still, yielding the pixel buffer.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

impl std::fmt::Debug for StillImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StillImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_validity() {
        let frame = Frame::new(vec![0u8; 4 * 4 * 4], 4, 4, 1);
        assert!(frame.is_valid());
        assert_eq!(frame.stride(), 16);

        let short = Frame::new(vec![0u8; 8], 4, 4, 2);
        assert!(!short.is_valid());
    }

    #[test]
    fn test_frame_row_access() {
        let mut data = vec![0u8; 2 * 2 * 4];
        data[8] = 7; // first byte of row 1
        let frame = Frame::new(data, 2, 2, 1);

        assert_eq!(frame.row(1).unwrap()[0], 7);
        assert!(frame.row(2).is_none());
    }

    #[test]
    fn test_still_rejects_mismatched_buffer() {
        assert!(StillImage::from_rgba(vec![0u8; 15], 2, 2).is_none());
        assert!(StillImage::from_rgba(vec![0u8; 16], 2, 2).is_some());
        assert!(StillImage::from_rgba(vec![], 0, 0).is_none());
    }
}
