//! Camera device capture via nokhwa

use dermacap_core::{Config, Error, Frame, Result};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, ControlValueSetter, FrameFormat, KnownCameraControl,
    RequestedFormat, RequestedFormatType, Resolution,
};
use nokhwa::Camera;
use tracing::{debug, info, warn};

use crate::zoom::{ZoomControl, DEFAULT_MAX_ZOOM};

/// Camera frame source.
///
/// Owns the device handle and its configuration state (zoom, torch, facing).
/// Device configuration failure is fatal to `open`; there is no retry policy,
/// the caller re-invokes `open`. Control mutations after open are best-effort:
/// failures are logged and leave prior state unchanged.
pub struct CameraSource {
    camera: Camera,
    index: u32,
    preferred: CameraFormat,
    zoom: ZoomControl,
    torch_on: bool,
    sequence: u64,
}

impl CameraSource {
    /// Open and configure the camera described by `config`.
    pub fn open(config: &Config) -> Result<Self> {
        let preferred = CameraFormat::new(
            Resolution::new(config.width, config.height),
            FrameFormat::MJPEG,
            config.fps,
        );
        Self::open_index(config.camera_index, preferred)
    }

    fn open_index(index: u32, preferred: CameraFormat) -> Result<Self> {
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(preferred));
        let camera = Camera::new(CameraIndex::Index(index), requested)
            .map_err(|e| Error::Configure(format!("no usable camera at index {index}: {e}")))?;

        info!(
            "Camera {} opened: {:?}",
            index,
            camera.camera_format()
        );

        let mut source = Self {
            camera,
            index,
            preferred,
            zoom: ZoomControl::new(DEFAULT_MAX_ZOOM),
            torch_on: false,
            sequence: 0,
        };
        source.apply_continuous_autofocus();
        Ok(source)
    }

    /// Start frame delivery.
    pub fn start(&mut self) -> Result<()> {
        if self.camera.is_stream_open() {
            return Ok(());
        }
        self.camera
            .open_stream()
            .map_err(|e| Error::Camera(format!("failed to open stream: {e}")))
    }

    /// Stop frame delivery. Best-effort, as on session teardown.
    pub fn stop(&mut self) {
        if self.camera.is_stream_open() {
            if let Err(e) = self.camera.stop_stream() {
                warn!("Failed to stop camera stream: {}", e);
            }
        }
    }

    /// Pull one frame from the device and decode it to RGBA.
    pub fn capture(&mut self) -> Result<Frame> {
        let buffer = self
            .camera
            .frame()
            .map_err(|e| Error::Camera(format!("frame read failed: {e}")))?;

        let width = buffer.resolution().width_x;
        let height = buffer.resolution().height_y;
        let bytes = buffer.buffer_bytes();

        let rgba = decode_to_rgba(&bytes, width, height)?;

        self.sequence += 1;
        Ok(Frame::new(rgba, width, height, self.sequence))
    }

    /// Native capture dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        let res = self.camera.resolution();
        (res.width_x, res.height_y)
    }

    /// Apply an incremental pinch scale. The effective factor composes with
    /// the zoom already in effect and is clamped to the device range; pushing
    /// it to the device is best-effort.
    pub fn update_zoom(&mut self, scale: f32) -> f32 {
        let factor = self.zoom.apply_scale(scale);
        let value = (factor * 100.0) as i64;
        if let Err(e) = self
            .camera
            .set_camera_control(KnownCameraControl::Zoom, ControlValueSetter::Integer(value))
        {
            warn!("Failed to update zoom factor: {}", e);
        }
        factor
    }

    /// Current effective zoom factor.
    pub fn zoom_factor(&self) -> f32 {
        self.zoom.current()
    }

    /// Toggle the torch. UVC-class devices expose no torch control, so this
    /// is best-effort: an unsupported device logs a warning and keeps prior
    /// state.
    pub fn toggle_torch(&mut self) -> bool {
        warn!("torch control not supported by this camera backend");
        self.torch_on
    }

    /// Switch to the other camera (front/back on phones, next device here).
    ///
    /// Failure to open the other device is logged and leaves the current
    /// device untouched.
    pub fn flip_camera(&mut self) {
        let other = self.index ^ 1;
        let was_streaming = self.camera.is_stream_open();

        match Self::open_index(other, self.preferred.clone()) {
            Ok(mut replacement) => {
                if was_streaming {
                    if let Err(e) = replacement.start() {
                        warn!("Flipped camera failed to start: {}", e);
                        return;
                    }
                }
                self.stop();
                *self = replacement;
                debug!("Switched to camera {}", self.index);
            }
            Err(e) => {
                warn!("Error flipping camera: {}", e);
            }
        }
    }

    /// Nudge focus and exposure toward a preview point.
    ///
    /// The control set has no point-of-interest; the tap re-triggers
    /// autofocus, best-effort.
    pub fn focus_at(&mut self, x: f32, y: f32) {
        debug!("focus requested at ({:.2}, {:.2})", x, y);
        if let Err(e) = self
            .camera
            .set_camera_control(KnownCameraControl::Focus, ControlValueSetter::Boolean(true))
        {
            warn!("Failed to update focus and exposure: {}", e);
        }
    }

    fn apply_continuous_autofocus(&mut self) {
        if let Err(e) = self
            .camera
            .set_camera_control(KnownCameraControl::Focus, ControlValueSetter::Boolean(true))
        {
            debug!("Continuous autofocus not available: {}", e);
        }
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        self.stop();
        debug!("Camera {} released", self.index);
    }
}

/// Decode a device buffer to tightly packed RGBA8.
///
/// Compressed streams (MJPEG) carry a JPEG magic; anything else is treated as
/// packed RGB24, which is what the requested format yields on raw devices.
fn decode_to_rgba(bytes: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    if bytes.len() >= 3 && bytes[0] == 0xFF && bytes[1] == 0xD8 {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| Error::Decode(format!("MJPEG decode failed: {e}")))?;
        return Ok(decoded.into_rgba8().into_raw());
    }

    let expected = width as usize * height as usize * 3;
    if bytes.len() < expected {
        return Err(Error::Decode(format!(
            "raw frame too short: {} bytes for {}x{}",
            bytes.len(),
            width,
            height
        )));
    }

    let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
    for px in bytes[..expected].chunks_exact(3) {
        rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
    }
    Ok(rgba)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_rgb_gains_opaque_alpha() {
        let rgb = vec![10u8, 20, 30, 40, 50, 60];
        let rgba = decode_to_rgba(&rgb, 2, 1).unwrap();
        assert_eq!(rgba, vec![10, 20, 30, 255, 40, 50, 60, 255]);
    }

    #[test]
    fn test_short_raw_buffer_rejected() {
        let err = decode_to_rgba(&[0u8; 5], 2, 2).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_invalid_jpeg_rejected() {
        // JPEG magic with garbage payload
        let err = decode_to_rgba(&[0xFF, 0xD8, 0xFF, 0x00, 0x01], 2, 2).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
