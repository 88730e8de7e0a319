use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use shared::{ErrorKind, ErrorResponse};

use crate::inference::ProviderError;

const FAILURE_PREFIX: &str = "Prediction failed";

#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("Model not loaded")]
    Unavailable,
    #[error("no `{}` field in upload", shared::UPLOAD_FIELD)]
    MissingUpload,
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Upload(String),
    #[error("{0}")]
    Decode(#[from] image::ImageError),
    #[error("{0}")]
    Inference(#[from] ProviderError),
    #[error("inference worker failed: {0}")]
    Worker(String),
}

impl From<BlockingError> for PredictError {
    fn from(err: BlockingError) -> Self {
        PredictError::Worker(err.to_string())
    }
}

impl PredictError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PredictError::Unavailable => ErrorKind::Unavailable,
            PredictError::MissingUpload => ErrorKind::MissingUpload,
            PredictError::Io(_) | PredictError::Upload(_) => ErrorKind::Io,
            PredictError::Decode(_) => ErrorKind::Decode,
            PredictError::Inference(_) => ErrorKind::Inference,
            PredictError::Worker(_) => ErrorKind::Worker,
        }
    }

    pub fn detail(&self) -> String {
        match self {
            PredictError::Unavailable => self.to_string(),
            _ => format!("{}: {}", FAILURE_PREFIX, self),
        }
    }
}

impl ResponseError for PredictError {
    fn status_code(&self) -> StatusCode {
        match self {
            PredictError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            PredictError::MissingUpload => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            detail: self.detail(),
            kind: Some(self.kind()),
        })
    }
}
