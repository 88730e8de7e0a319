use std::path::PathBuf;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::inference::{EmbeddingProvider, LoadError, PredictionProvider, load_providers};

/// Both inference collaborators. Held together so one cannot be present without the other.
#[derive(Clone)]
pub struct Providers {
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub guessr: Arc<dyn PredictionProvider>,
}

impl Providers {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, guessr: Arc<dyn PredictionProvider>) -> Self {
        Self { embedder, guessr }
    }
}

/// Model lifecycle: populated once before the server starts, read-only afterwards.
pub struct ModelState {
    providers: Option<Providers>,
}

impl ModelState {
    pub fn unavailable() -> Self {
        Self { providers: None }
    }

    pub fn load(config: &AppConfig) -> Self {
        log::info!(
            "Loading model {} with head {} from {}",
            config.clip_model,
            config.pretrained_head,
            config.model_dir.display()
        );
        Self::load_with(|| load_providers(config))
    }

    /// Runs `loader` once. A failure is logged and leaves the state unavailable;
    /// there is no retry.
    pub fn load_with<F>(loader: F) -> Self
    where
        F: FnOnce() -> Result<Providers, LoadError>,
    {
        match loader() {
            Ok(providers) => {
                log::info!("Model loaded successfully");
                Self {
                    providers: Some(providers),
                }
            }
            Err(e) => {
                log::error!("Error loading model: {}", e);
                Self::unavailable()
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.providers.is_some()
    }

    pub fn providers(&self) -> Option<&Providers> {
        self.providers.as_ref()
    }
}

pub struct AppState {
    pub models: ModelState,
    pub upload_dir: PathBuf,
}

impl AppState {
    pub fn new(models: ModelState, upload_dir: PathBuf) -> Self {
        Self { models, upload_dir }
    }
}
