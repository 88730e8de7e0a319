use std::path::Path;
use std::sync::{Arc, Mutex};

use tch::{CModule, Device, Kind, Tensor};

use super::{Embedding, LoadError, PredictionProvider, ProviderError, RawPrediction};

/// Location head mapping an image embedding to `[lat, lng, confidence?]`.
#[derive(Clone)]
pub struct SuperGuessr {
    model: Arc<Mutex<CModule>>,
    device: Device,
}

impl SuperGuessr {
    pub fn from_pretrained(model_path: &Path) -> Result<Self, LoadError> {
        if !model_path.exists() {
            return Err(LoadError::MissingArtifact(model_path.to_path_buf()));
        }

        let device = Device::cuda_if_available();
        let mut model = CModule::load_on_device(model_path, device).map_err(ProviderError::from)?;
        model.set_eval();
        log::info!("Loaded location head from {}", model_path.display());

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
            device,
        })
    }
}

impl PredictionProvider for SuperGuessr {
    fn predict(&self, embedding: &Embedding) -> Result<RawPrediction, ProviderError> {
        if embedding.is_empty() {
            return Err(ProviderError::InvalidOutput("empty embedding".into()));
        }

        let tensor = Tensor::from_slice(embedding.as_slice())
            .view([1, embedding.len() as i64])
            .to_device(self.device);

        let model = self
            .model
            .lock()
            .map_err(|_| ProviderError::Model("location head lock poisoned".into()))?;
        let output = tch::no_grad(|| model.forward_ts(&[tensor]))?;

        let output_flat = output.to_kind(Kind::Float).to_device(Device::Cpu).view([-1]);
        let num_elements = output_flat.size()[0] as usize;
        let mut values = vec![0.0f32; num_elements];
        output_flat.copy_data(&mut values, num_elements);
        RawPrediction::from_output(&values)
    }
}
