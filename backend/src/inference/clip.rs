use std::path::Path;
use std::sync::{Arc, Mutex};

use image::RgbImage;
use tch::{CModule, Device, Kind, Tensor};

use super::config::PreprocessConfig;
use super::preprocess::{panorama_views, to_model_input};
use super::{Embedding, EmbeddingProvider, LoadError, ProviderError};

#[derive(Debug, Clone, Copy)]
pub struct EmbeddingOptions {
    /// Use the geolocation fine-tuned checkpoint rather than the base encoder.
    pub load_checkpoint: bool,
    /// Embed equal-width strips separately and average them.
    pub panorama: bool,
}

/// CLIP image encoder exported as TorchScript.
#[derive(Clone)]
pub struct ClipEmbedding {
    model: Arc<Mutex<CModule>>,
    device: Device,
    options: EmbeddingOptions,
    preprocess: PreprocessConfig,
}

impl ClipEmbedding {
    pub fn new(
        model_path: &Path,
        options: EmbeddingOptions,
        preprocess: PreprocessConfig,
    ) -> Result<Self, LoadError> {
        if !model_path.exists() {
            return Err(LoadError::MissingArtifact(model_path.to_path_buf()));
        }

        let device = Device::cuda_if_available();
        let mut model = CModule::load_on_device(model_path, device).map_err(ProviderError::from)?;
        model.set_eval();

        log::info!(
            "Loaded image encoder from {} on {:?} (checkpoint: {}, panorama: {})",
            model_path.display(),
            device,
            options.load_checkpoint,
            options.panorama
        );

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
            device,
            options,
            preprocess,
        })
    }

    fn embed_view(&self, view: &RgbImage) -> Result<Embedding, ProviderError> {
        let input = to_model_input(view, &self.preprocess)?;
        let shape: Vec<i64> = input.shape().iter().map(|d| *d as i64).collect();
        let data = input
            .as_slice()
            .ok_or_else(|| ProviderError::Preprocessing("input tensor is not contiguous".into()))?;
        let tensor = Tensor::from_slice(data).view(shape.as_slice()).to_device(self.device);

        let model = self
            .model
            .lock()
            .map_err(|_| ProviderError::Model("image encoder lock poisoned".into()))?;
        let output = tch::no_grad(|| model.forward_ts(&[tensor]))?;

        let output_flat = output.to_kind(Kind::Float).to_device(Device::Cpu).view([-1]);
        let num_elements = output_flat.size()[0] as usize;
        let mut values = vec![0.0f32; num_elements];
        output_flat.copy_data(&mut values, num_elements);
        Ok(Embedding::new(values))
    }
}

impl EmbeddingProvider for ClipEmbedding {
    fn embed_single(&self, image: &RgbImage) -> Result<Embedding, ProviderError> {
        if !self.options.panorama {
            return self.embed_view(image);
        }

        let views = panorama_views(image, self.preprocess.panorama.views)
            .iter()
            .map(|view| self.embed_view(view))
            .collect::<Result<Vec<_>, _>>()?;
        Embedding::mean(views)
    }
}
