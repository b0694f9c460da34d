//! Inference endpoint client
//!
//! One unary POST per screening request: the saved capture goes up as a
//! base64 JPEG, the response carries the risk classification plus two
//! base64-PNG visualizations. A response missing any field, or whose
//! embedded images fail to decode, fails as a whole; nothing is applied
//! partially. No retries, no cancellation.

use std::io::Cursor;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use dermacap_core::StillImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Model names the inference service accepts.
pub const MODELS: [&str; 2] = ["Adversarial Model", "Contrastive learning Model"];

/// Upload errors
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Image not found or invalid: {0}")]
    Image(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Server error: unexpected status {0}")]
    Status(u16),
    #[error("Malformed response: {0}")]
    Format(String),
    #[error("Failed to decode {field} image: {reason}")]
    EmbeddedImage {
        field: &'static str,
        reason: String,
    },
}

/// Result type for upload operations
pub type UploadResult<T> = Result<T, UploadError>;

/// Request body for the `/predict` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionRequest {
    pub model: String,
    #[serde(rename = "standardImage")]
    pub standard_image: String,
}

/// Wire response. Every field is required; a missing one fails the parse.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionResponse {
    pub output: String,
    pub probability: f64,
    pub overlay_image: String,
    pub risk_image: String,
}

/// Fully decoded screening outcome.
#[derive(Debug, Clone)]
pub struct ScreeningResult {
    /// Predicted risk class
    pub output: String,
    /// Raw probability from the model
    pub probability: f64,
    /// Heatmap overlay for the uploaded capture
    pub overlay: StillImage,
    /// Risk visualization image
    pub risk: StillImage,
}

impl ScreeningResult {
    /// Probability rounded to two decimals, as presented to the user.
    pub fn rounded_probability(&self) -> f64 {
        (self.probability * 100.0).round() / 100.0
    }
}

/// Client for the remote risk-screening service.
pub struct InferenceClient {
    endpoint: String,
    client: reqwest::Client,
}

impl InferenceClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Upload the saved capture at `image_path` and decode the screening
    /// response.
    pub async fn screen_image(
        &self,
        model: &str,
        image_path: &Path,
    ) -> UploadResult<ScreeningResult> {
        let payload = build_payload(model, image_path)?;

        info!("Uploading capture to {}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Status(status.as_u16()));
        }

        let body: PredictionResponse = response
            .json()
            .await
            .map_err(|e| UploadError::Format(e.to_string()))?;

        let result = decode_response(body)?;
        info!(
            "Screening complete: {} (probability {:.2})",
            result.output,
            result.rounded_probability()
        );
        Ok(result)
    }
}

/// Load the saved PNG and re-encode it as the base64 JPEG the service
/// expects.
fn build_payload(model: &str, image_path: &Path) -> UploadResult<PredictionRequest> {
    let img = image::open(image_path).map_err(|e| UploadError::Image(e.to_string()))?;

    // JPEG carries no alpha channel; flatten before encoding.
    let rgb = img.into_rgb8();
    let mut jpeg = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
        .map_err(|e| UploadError::Image(format!("JPEG encode failed: {e}")))?;
    debug!("Upload payload: {} JPEG bytes", jpeg.len());

    Ok(PredictionRequest {
        model: model.to_string(),
        standard_image: BASE64.encode(&jpeg),
    })
}

fn decode_response(body: PredictionResponse) -> UploadResult<ScreeningResult> {
    let overlay = decode_embedded_image(&body.overlay_image, "overlay")?;
    let risk = decode_embedded_image(&body.risk_image, "risk")?;
    Ok(ScreeningResult {
        output: body.output,
        probability: body.probability,
        overlay,
        risk,
    })
}

fn decode_embedded_image(encoded: &str, field: &'static str) -> UploadResult<StillImage> {
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| UploadError::EmbeddedImage {
            field,
            reason: e.to_string(),
        })?;
    let img = image::load_from_memory(&bytes)
        .map_err(|e| UploadError::EmbeddedImage {
            field,
            reason: e.to_string(),
        })?
        .into_rgba8();

    let (width, height) = img.dimensions();
    StillImage::from_rgba(img.into_raw(), width, height).ok_or(UploadError::EmbeddedImage {
        field,
        reason: "empty image".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A 2x2 PNG, base64-encoded the way the service embeds images.
    fn embedded_png() -> String {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255]));
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        BASE64.encode(&png)
    }

    fn full_response_json() -> String {
        format!(
            r#"{{"output":"High risk","probability":0.8765,"overlay_image":"{0}","risk_image":"{0}"}}"#,
            embedded_png()
        )
    }

    #[test]
    fn test_full_response_decodes() {
        let body: PredictionResponse = serde_json::from_str(&full_response_json()).unwrap();
        let result = decode_response(body).unwrap();

        assert_eq!(result.output, "High risk");
        assert_eq!(result.rounded_probability(), 0.88);
        assert_eq!((result.overlay.width, result.overlay.height), (2, 2));
        assert_eq!(&result.risk.data()[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_missing_field_fails_whole_response() {
        let json = format!(
            r#"{{"output":"High risk","probability":0.5,"overlay_image":"{}"}}"#,
            embedded_png()
        );
        assert!(serde_json::from_str::<PredictionResponse>(&json).is_err());
    }

    #[test]
    fn test_bad_embedded_image_fails_decode() {
        let body = PredictionResponse {
            output: "Low risk".to_string(),
            probability: 0.1,
            overlay_image: embedded_png(),
            risk_image: "not-base64!!".to_string(),
        };
        let err = decode_response(body).unwrap_err();
        assert!(matches!(
            err,
            UploadError::EmbeddedImage { field: "risk", .. }
        ));
    }

    #[test]
    fn test_request_body_field_names() {
        let request = PredictionRequest {
            model: "Adversarial Model".to_string(),
            standard_image: "abcd".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "Adversarial Model");
        assert_eq!(json["standardImage"], "abcd");
    }

    #[test]
    fn test_payload_from_saved_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skinimage_1_a.png");
        let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([1, 2, 3, 255]));
        img.save(&path).unwrap();

        let payload = build_payload(MODELS[0], &path).unwrap();
        let jpeg = BASE64.decode(payload.standard_image.as_bytes()).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.width(), 4);

        let missing = build_payload(MODELS[0], dir.path().join("absent.png").as_path());
        assert!(matches!(missing.unwrap_err(), UploadError::Image(_)));
    }
}
