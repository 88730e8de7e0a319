use std::path::Path;

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use super::LoadError;

// CLIP ViT-L/14-336 input statistics.
const CLIP_IMAGE_SIZE: u32 = 336;
const CLIP_MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];
const CLIP_STD: [f32; 3] = [0.268_629_54, 0.261_302_6, 0.275_777_1];
const DEFAULT_PANORAMA_VIEWS: u32 = 4;

/// Image preprocessing for the embedding model, read from
/// `config/preprocess.yaml` when present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub image: ImageConfig,
    pub normalization: NormalizationConfig,
    pub panorama: PanoramaConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub size: u32,
    pub resize_method: ResizeMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanoramaConfig {
    pub views: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeMethod {
    Nearest,
    Bilinear,
    Bicubic,
    Lanczos,
}

impl ResizeMethod {
    pub fn filter(self) -> FilterType {
        match self {
            ResizeMethod::Nearest => FilterType::Nearest,
            ResizeMethod::Bilinear => FilterType::Triangle,
            ResizeMethod::Bicubic => FilterType::CatmullRom,
            ResizeMethod::Lanczos => FilterType::Lanczos3,
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            size: CLIP_IMAGE_SIZE,
            resize_method: ResizeMethod::Bicubic,
        }
    }
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            mean: CLIP_MEAN,
            std: CLIP_STD,
        }
    }
}

impl Default for PanoramaConfig {
    fn default() -> Self {
        Self {
            views: DEFAULT_PANORAMA_VIEWS,
        }
    }
}

impl PreprocessConfig {
    /// Reads the YAML file at `path`, or returns the CLIP defaults if it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, LoadError> {
        if !path.exists() {
            log::info!(
                "No preprocessing config at {}, using CLIP defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|e| LoadError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, LoadError> {
        let config: PreprocessConfig =
            serde_yaml::from_str(raw).map_err(|e| LoadError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), LoadError> {
        if self.image.size == 0 {
            return Err(LoadError::Config("image.size must be positive".into()));
        }
        if self.panorama.views == 0 {
            return Err(LoadError::Config("panorama.views must be positive".into()));
        }
        if self.normalization.std.iter().any(|s| *s <= 0.0) {
            return Err(LoadError::Config(
                "normalization.std entries must be positive".into(),
            ));
        }
        Ok(())
    }
}
