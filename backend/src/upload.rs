use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use actix_multipart::Multipart;
use futures::{StreamExt, TryStreamExt};
use uuid::Uuid;

use crate::error::PredictError;

const UPLOAD_SUFFIX: &str = "jpg";

/// Reads the `file` field of a multipart body into memory. Other fields are drained.
pub async fn read_upload(mut payload: Multipart) -> Result<Vec<u8>, PredictError> {
    let mut upload = None;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| PredictError::Upload(e.to_string()))?
    {
        let wanted = upload.is_none() && field.name() == Some(shared::UPLOAD_FIELD);
        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| PredictError::Upload(e.to_string()))?;
            if wanted {
                data.extend_from_slice(&chunk);
            }
        }
        if wanted {
            upload = Some(data);
        }
    }

    upload.ok_or(PredictError::MissingUpload)
}

/// A uniquely named file that is removed when the guard is dropped.
#[derive(Debug)]
pub struct ScopedUpload {
    path: PathBuf,
}

impl ScopedUpload {
    pub fn create(dir: &Path, contents: &[u8]) -> io::Result<Self> {
        let path = dir.join(format!("upload-{}.{}", Uuid::new_v4(), UPLOAD_SUFFIX));
        let mut file = OpenOptions::new().write(true).create_new(true).open(&path)?;
        // Owned from here on, so a failed write still cleans up.
        let upload = Self { path };
        file.write_all(contents)?;
        file.flush()?;
        log::debug!("Wrote {} upload bytes to {}", contents.len(), upload.path.display());
        Ok(upload)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScopedUpload {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Removed upload {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove upload {}: {}", self.path.display(), e),
        }
    }
}
