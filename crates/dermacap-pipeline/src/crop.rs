//! Crop transform: preview rectangle to frame pixels
//!
//! The capture region is expressed against the preview surface (origin
//! top-left, y-down); the frame's native coordinate space has its origin at
//! the bottom-left. Mapping therefore scales both axes independently and
//! flips the vertical axis. No perspective correction: this is a plain
//! affine crop.

use dermacap_core::{Error, Frame, PixelRect, Region, Result, StillImage, Viewport};

/// Map a preview-space region into frame pixel space.
///
/// The returned rectangle is in the frame's native space (origin
/// bottom-left) and has been clamped to the frame bounds. Non-finite or
/// non-positive mapped extents, and regions whose clamped intersection with
/// the frame is empty, are transform errors.
pub fn map_region(
    region: Region,
    viewport: Viewport,
    frame_width: u32,
    frame_height: u32,
) -> Result<PixelRect> {
    if !viewport.is_valid() {
        return Err(Error::Transform(format!(
            "invalid viewport {}x{}",
            viewport.width, viewport.height
        )));
    }
    if !region.is_valid() {
        return Err(Error::Transform(format!("invalid capture region {region:?}")));
    }

    let sx = frame_width as f32 / viewport.width;
    let sy = frame_height as f32 / viewport.height;

    let x = region.x * sx;
    let width = region.width * sx;
    // Vertical flip: the frame origin is bottom-left, the preview's top-left.
    let y = (viewport.height - region.max_y()) * sy;
    let height = region.height * sy;

    if !(x.is_finite() && y.is_finite() && width.is_finite() && height.is_finite()) {
        return Err(Error::Transform("mapped region is not finite".to_string()));
    }
    if width <= 0.0 || height <= 0.0 {
        return Err(Error::Transform("mapped region has no extent".to_string()));
    }

    // Clamp to the frame bounds; reject an empty intersection.
    let x0 = x.max(0.0);
    let y0 = y.max(0.0);
    let x1 = (x + width).min(frame_width as f32);
    let y1 = (y + height).min(frame_height as f32);
    if x1 <= x0 || y1 <= y0 {
        return Err(Error::Transform(
            "capture region maps outside the frame".to_string(),
        ));
    }

    let px = x0.floor() as u32;
    let py = y0.floor() as u32;
    let pw = (x1.ceil() as u32).min(frame_width) - px;
    let ph = (y1.ceil() as u32).min(frame_height) - py;

    Ok(PixelRect::new(px, py, pw, ph))
}

/// Crop a frame to the capture region, producing the still image.
///
/// Deterministic: identical (region, frame, viewport) inputs always yield
/// pixel-identical output.
pub fn crop_frame(frame: &Frame, region: Region, viewport: Viewport) -> Result<StillImage> {
    if !frame.is_valid() {
        return Err(Error::Transform(format!(
            "frame buffer does not match {}x{}",
            frame.width, frame.height
        )));
    }

    let rect = map_region(region, viewport, frame.width, frame.height)?;

    // The rect is in bottom-left-origin frame space; the pixel buffer stores
    // rows top-down, so the first buffer row of the crop sits at
    // height - (rect.y + rect.height).
    let top_row = frame.height - rect.y - rect.height;
    let x_start = rect.x as usize * 4;
    let x_end = (rect.x + rect.width) as usize * 4;

    let mut data = Vec::with_capacity(rect.width as usize * rect.height as usize * 4);
    for r in 0..rect.height {
        let row = frame
            .row(top_row + r)
            .ok_or_else(|| Error::Transform("crop row out of bounds".to_string()))?;
        data.extend_from_slice(&row[x_start..x_end]);
    }

    StillImage::from_rgba(data, rect.width, rect.height)
        .ok_or_else(|| Error::Transform("cropped buffer size mismatch".to_string()))
}
