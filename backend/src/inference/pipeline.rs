use std::path::Path;

use image::{ImageReader, RgbImage};
use shared::PredictionResponse;

use super::RawPrediction;
use crate::error::PredictError;
use crate::state::Providers;

/// Shaped prediction; confidence is `0.0` when the head does not report one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionResult {
    pub latitude: f64,
    pub longitude: f64,
    pub confidence: f64,
}

impl From<RawPrediction> for PredictionResult {
    fn from(raw: RawPrediction) -> Self {
        Self {
            latitude: raw.latitude,
            longitude: raw.longitude,
            confidence: raw.confidence.unwrap_or(0.0),
        }
    }
}

impl From<PredictionResult> for PredictionResponse {
    fn from(result: PredictionResult) -> Self {
        PredictionResponse::success(result.latitude, result.longitude, result.confidence)
    }
}

/// Decodes the image at `path` (format sniffed from content) into RGB.
pub fn decode_rgb(path: &Path) -> Result<RgbImage, PredictError> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    Ok(reader.decode()?.to_rgb8())
}

impl Providers {
    /// Blocking: decode, embed and predict. Run off the async workers.
    pub fn locate(&self, path: &Path) -> Result<PredictionResult, PredictError> {
        let image = decode_rgb(path)?;
        log::debug!("Decoded {}x{} image", image.width(), image.height());

        let embedding = self.embedder.embed_single(&image)?;
        let raw = self.guessr.predict(&embedding)?;
        Ok(PredictionResult::from(raw))
    }
}
