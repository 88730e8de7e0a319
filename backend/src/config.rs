use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_CLIP_MODEL: &str = "geolocal/StreetCLIP";
pub const DEFAULT_PRETRAINED_HEAD: &str = "geolocal/super-guessr";

const DEFAULT_MODEL_DIR: &str = "models";
const DEFAULT_PREPROCESS_CONFIG: &str = "config/preprocess.yaml";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;

/// Process-wide settings, read once in `main` and never mutated.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub clip_model: String,
    pub pretrained_head: String,
    pub model_dir: PathBuf,
    pub load_checkpoint: bool,
    pub panorama: bool,
    pub preprocess_config: PathBuf,
    pub upload_dir: PathBuf,
    pub frontend_dir: Option<PathBuf>,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                log::warn!("Ignoring invalid PORT value {:?}, using {}", raw, DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        Self {
            clip_model: var("CLIP_MODEL").unwrap_or_else(|| DEFAULT_CLIP_MODEL.to_string()),
            pretrained_head: var("CLIP_PRETRAINED_HEAD")
                .unwrap_or_else(|| DEFAULT_PRETRAINED_HEAD.to_string()),
            model_dir: var("MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_DIR)),
            load_checkpoint: var("LOAD_CHECKPOINT").map_or(true, |v| parse_flag(&v)),
            panorama: var("PANORAMA").map_or(true, |v| parse_flag(&v)),
            preprocess_config: var("PREPROCESS_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PREPROCESS_CONFIG)),
            upload_dir: var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
            frontend_dir: var("FRONTEND_DIR").map(PathBuf::from),
            host: var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// TorchScript file holding the image encoder.
    pub fn embedding_artifact(&self) -> PathBuf {
        let stem = artifact_stem(&self.clip_model);
        if self.load_checkpoint {
            artifact_path(&self.model_dir, &format!("{}-checkpoint", stem))
        } else {
            artifact_path(&self.model_dir, &stem)
        }
    }

    /// TorchScript file holding the location head.
    pub fn head_artifact(&self) -> PathBuf {
        artifact_path(&self.model_dir, &artifact_stem(&self.pretrained_head))
    }
}

fn artifact_stem(identifier: &str) -> String {
    identifier.trim_matches('/').replace('/', "--")
}

fn artifact_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{}.pt", stem))
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
