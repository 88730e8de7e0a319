pub mod config;
pub mod pipeline;
pub mod preprocess;

#[cfg(feature = "torch")]
pub mod clip;
#[cfg(feature = "torch")]
pub mod guessr;

use std::path::PathBuf;

use image::RgbImage;
use ndarray::Array1;

use crate::config::AppConfig;
use crate::state::Providers;
use self::config::PreprocessConfig;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("preprocessing failed: {0}")]
    Preprocessing(String),
    #[error("model error: {0}")]
    Model(String),
    #[error("invalid model output: {0}")]
    InvalidOutput(String),
}

#[cfg(feature = "torch")]
impl From<tch::TchError> for ProviderError {
    fn from(err: tch::TchError) -> Self {
        ProviderError::Model(err.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("model artifact not found: {}", .0.display())]
    MissingArtifact(PathBuf),
    #[error("binary was built without the `torch` feature")]
    BackendUnavailable,
    #[error("invalid preprocessing config: {0}")]
    Config(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Fixed-size feature vector for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding(Array1<f32>);

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self(Array1::from(values))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        // Built from a Vec or a mean over standard-layout arrays, so always contiguous.
        self.0.as_slice().unwrap_or(&[])
    }

    /// Element-wise mean of several views of the same scene.
    pub fn mean(views: Vec<Embedding>) -> Result<Self, ProviderError> {
        let mut iter = views.into_iter();
        let first = iter
            .next()
            .ok_or_else(|| ProviderError::InvalidOutput("no embeddings to average".into()))?;
        let dim = first.len();
        let mut sum = first.0;
        let mut count = 1usize;

        for view in iter {
            if view.len() != dim {
                return Err(ProviderError::InvalidOutput(format!(
                    "embedding dimension mismatch: {} vs {}",
                    dim,
                    view.len()
                )));
            }
            sum += &view.0;
            count += 1;
        }

        Ok(Self(sum / count as f32))
    }
}

/// Location head output before shaping into a response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPrediction {
    pub latitude: f64,
    pub longitude: f64,
    pub confidence: Option<f64>,
}

impl RawPrediction {
    /// Interprets a flat head output as `[lat, lng]` or `[lat, lng, confidence, ..]`.
    pub fn from_output(values: &[f32]) -> Result<Self, ProviderError> {
        let (latitude, longitude) = match values {
            [lat, lng, ..] => (f64::from(*lat), f64::from(*lng)),
            _ => {
                return Err(ProviderError::InvalidOutput(format!(
                    "expected at least 2 values, got {}",
                    values.len()
                )));
            }
        };

        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(ProviderError::InvalidOutput(format!(
                "non-finite coordinate ({}, {})",
                latitude, longitude
            )));
        }

        Ok(Self {
            latitude,
            longitude,
            confidence: values.get(2).map(|c| f64::from(*c)),
        })
    }
}

pub trait EmbeddingProvider: Send + Sync {
    fn embed_single(&self, image: &RgbImage) -> Result<Embedding, ProviderError>;
}

pub trait PredictionProvider: Send + Sync {
    fn predict(&self, embedding: &Embedding) -> Result<RawPrediction, ProviderError>;
}

#[cfg(feature = "torch")]
pub fn load_providers(config: &AppConfig) -> Result<Providers, LoadError> {
    use std::sync::Arc;

    use clip::{ClipEmbedding, EmbeddingOptions};
    use guessr::SuperGuessr;

    let preprocess = PreprocessConfig::load_or_default(&config.preprocess_config)?;
    let options = EmbeddingOptions {
        load_checkpoint: config.load_checkpoint,
        panorama: config.panorama,
    };

    let embedder = ClipEmbedding::new(&config.embedding_artifact(), options, preprocess)?;
    let guessr = SuperGuessr::from_pretrained(&config.head_artifact())?;

    Ok(Providers::new(Arc::new(embedder), Arc::new(guessr)))
}

#[cfg(not(feature = "torch"))]
pub fn load_providers(config: &AppConfig) -> Result<Providers, LoadError> {
    // Still validate the preprocessing file so misconfiguration shows up in logs.
    PreprocessConfig::load_or_default(&config.preprocess_config)?;
    Err(LoadError::BackendUnavailable)
}
