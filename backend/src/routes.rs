use std::path::PathBuf;

use actix_files::Files;
use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use log::{error, info};
use shared::{HealthResponse, PredictionResponse, RootResponse};

use crate::error::PredictError;
use crate::state::{AppState, Providers};
use crate::upload::{ScopedUpload, read_upload};

pub fn configure_routes(cfg: &mut web::ServiceConfig, frontend_dir: Option<PathBuf>) {
    cfg.service(web::resource("/").route(web::get().to(root)))
        .service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/predict").route(web::post().to(predict)));

    if let Some(dir) = frontend_dir {
        cfg.service(Files::new("/static", dir).index_file("index.html"));
    }
}

async fn root() -> HttpResponse {
    HttpResponse::Ok().json(RootResponse {
        message: "Geolocation API is running".into(),
    })
}

async fn health(state: web::Data<AppState>) -> HttpResponse {
    if state.models.is_ready() {
        HttpResponse::Ok().json(HealthResponse::healthy())
    } else {
        HttpResponse::ServiceUnavailable().json(HealthResponse::unavailable(
            PredictError::Unavailable.to_string(),
        ))
    }
}

async fn predict(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, PredictError> {
    let providers = state
        .models
        .providers()
        .cloned()
        .ok_or(PredictError::Unavailable)?;

    let response = run_prediction(&state, providers, payload)
        .await
        .inspect_err(|e| error!("Prediction failed ({}): {}", e.kind(), e))?;

    info!(
        "Predicted ({:.4}, {:.4}) with confidence {:.3}",
        response.latitude, response.longitude, response.confidence
    );
    Ok(HttpResponse::Ok().json(response))
}

async fn run_prediction(
    state: &AppState,
    providers: Providers,
    payload: Multipart,
) -> Result<PredictionResponse, PredictError> {
    let contents = read_upload(payload).await?;
    let upload = ScopedUpload::create(&state.upload_dir, &contents)?;
    let path = upload.path().to_path_buf();

    // `upload` outlives the blocking call and is dropped on every return path below.
    let result = web::block(move || providers.locate(&path)).await??;
    drop(upload);

    Ok(result.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{
        Embedding, EmbeddingProvider, LoadError, PredictionProvider, ProviderError, RawPrediction,
    };
    use crate::state::ModelState;
    use actix_web::http::{StatusCode, header};
    use actix_web::{App, test};
    use image::{ImageFormat, Rgb, RgbImage};
    use std::fs;
    use std::io::Cursor;
    use std::ops::Deref;
    use std::path::Path;
    use std::sync::Arc;
    use uuid::Uuid;

    const BOUNDARY: &str = "geolocation-test-boundary";

    struct FixedEmbedding;

    impl EmbeddingProvider for FixedEmbedding {
        fn embed_single(&self, image: &RgbImage) -> Result<Embedding, ProviderError> {
            let (w, h) = image.dimensions();
            Ok(Embedding::new(vec![w as f32, h as f32, 0.5]))
        }
    }

    struct FixedGuessr {
        confidence: Option<f64>,
    }

    impl PredictionProvider for FixedGuessr {
        fn predict(&self, _embedding: &Embedding) -> Result<RawPrediction, ProviderError> {
            Ok(RawPrediction {
                latitude: 37.0,
                longitude: -122.0,
                confidence: self.confidence,
            })
        }
    }

    struct FailingGuessr;

    impl PredictionProvider for FailingGuessr {
        fn predict(&self, _embedding: &Embedding) -> Result<RawPrediction, ProviderError> {
            Err(ProviderError::Model("head exploded".into()))
        }
    }

    struct PanickingEmbedding;

    impl EmbeddingProvider for PanickingEmbedding {
        fn embed_single(&self, _image: &RgbImage) -> Result<Embedding, ProviderError> {
            panic!("encoder crashed");
        }
    }

    /// Per-test upload directory, removed with its contents on drop.
    struct UploadDir(PathBuf);

    impl Deref for UploadDir {
        type Target = Path;

        fn deref(&self) -> &Path {
            &self.0
        }
    }

    impl Drop for UploadDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    fn upload_dir() -> UploadDir {
        let dir = std::env::temp_dir().join(format!("predict-test-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        UploadDir(dir)
    }

    fn dir_is_empty(dir: &Path) -> bool {
        fs::read_dir(dir).unwrap().next().is_none()
    }

    fn ready(guessr: Arc<dyn PredictionProvider>) -> ModelState {
        ModelState::load_with(|| Ok(Providers::new(Arc::new(FixedEmbedding), guessr)))
    }

    fn ready_with(embedder: Arc<dyn EmbeddingProvider>) -> ModelState {
        ModelState::load_with(|| {
            Ok(Providers::new(embedder, Arc::new(FixedGuessr { confidence: Some(0.9) })))
        })
    }

    fn failed() -> ModelState {
        ModelState::load_with(|| Err(LoadError::BackendUnavailable))
    }

    fn jpeg_fixture() -> Vec<u8> {
        let fixture = RgbImage::from_fn(16, 12, |x, y| Rgb([(x * 10) as u8, (y * 20) as u8, 128]));
        let mut bytes = Cursor::new(Vec::new());
        fixture.write_to(&mut bytes, ImageFormat::Jpeg).unwrap();
        bytes.into_inner()
    }

    fn multipart_body(field: &str, filename: &str, contents: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(contents);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn predict_request(body: Vec<u8>) -> test::TestRequest {
        raw_predict_request(format!("multipart/form-data; boundary={}", BOUNDARY), body)
    }

    fn raw_predict_request(content_type: String, body: Vec<u8>) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/predict")
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
    }

    /// Opens the `file` part but ends the stream before its closing boundary.
    fn truncated_body() -> Vec<u8> {
        let mut body = multipart_body("file", "photo.jpg", &jpeg_fixture());
        let closing = format!("\r\n--{}--\r\n", BOUNDARY).len();
        body.truncate(body.len() - closing - 10);
        body
    }

    macro_rules! service {
        ($models:expr, $dir:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(AppState::new($models, $dir.to_path_buf())))
                    .configure(|cfg| configure_routes(cfg, None)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn root_always_answers() {
        let dir = upload_dir();
        let app = service!(failed(), dir);
        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body, serde_json::json!({"message": "Geolocation API is running"}));
    }

    #[actix_web::test]
    async fn health_reports_failed_load_as_unavailable() {
        let dir = upload_dir();
        let app = service!(failed(), dir);
        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(
            body,
            serde_json::json!({"status": "unavailable", "message": "Model not loaded"})
        );
    }

    #[actix_web::test]
    async fn health_reports_loaded_model() {
        let dir = upload_dir();
        let app = service!(ready(Arc::new(FixedGuessr { confidence: Some(0.9) })), dir);
        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body, serde_json::json!({"status": "healthy", "model_loaded": true}));
    }

    #[actix_web::test]
    async fn predict_when_unavailable_is_503_and_writes_nothing() {
        let dir = upload_dir();
        let app = service!(failed(), dir);
        let resp = test::call_service(
            &app,
            predict_request(multipart_body("file", "photo.jpg", &jpeg_fixture())).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["detail"], "Model not loaded");
        assert!(dir_is_empty(&dir));
    }

    #[actix_web::test]
    async fn predict_returns_exact_body_and_cleans_up() {
        let dir = upload_dir();
        let app = service!(ready(Arc::new(FixedGuessr { confidence: Some(0.9) })), dir);
        let resp = test::call_service(
            &app,
            predict_request(multipart_body("file", "photo.jpg", &jpeg_fixture())).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(
            body.as_ref(),
            br#"{"latitude":37.0,"longitude":-122.0,"confidence":0.9,"status":"success"}"#
        );
        assert!(dir_is_empty(&dir));
    }

    #[actix_web::test]
    async fn missing_confidence_is_reported_as_zero() {
        let dir = upload_dir();
        let app = service!(ready(Arc::new(FixedGuessr { confidence: None })), dir);
        let resp = test::call_service(
            &app,
            predict_request(multipart_body("file", "photo.jpg", &jpeg_fixture())).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: PredictionResponse = test::read_body_json(resp).await;
        assert_eq!(body.confidence, 0.0);
    }

    #[actix_web::test]
    async fn non_image_upload_is_500_and_cleans_up() {
        let dir = upload_dir();
        let app = service!(ready(Arc::new(FixedGuessr { confidence: Some(0.9) })), dir);
        let resp = test::call_service(
            &app,
            predict_request(multipart_body("file", "notes.txt", b"this is not an image"))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: shared::ErrorResponse = test::read_body_json(resp).await;
        assert!(body.detail.starts_with("Prediction failed"), "{}", body.detail);
        assert_eq!(body.kind, Some(shared::ErrorKind::Decode));
        assert!(dir_is_empty(&dir));
    }

    #[actix_web::test]
    async fn provider_failure_is_500_and_cleans_up() {
        let dir = upload_dir();
        let app = service!(ready(Arc::new(FailingGuessr)), dir);
        let resp = test::call_service(
            &app,
            predict_request(multipart_body("file", "photo.jpg", &jpeg_fixture())).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: shared::ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.detail, "Prediction failed: model error: head exploded");
        assert_eq!(body.kind, Some(shared::ErrorKind::Inference));
        assert!(dir_is_empty(&dir));
    }

    #[actix_web::test]
    async fn upload_without_file_field_is_422() {
        let dir = upload_dir();
        let app = service!(ready(Arc::new(FixedGuessr { confidence: Some(0.9) })), dir);
        let resp = test::call_service(
            &app,
            predict_request(multipart_body("image", "photo.jpg", &jpeg_fixture())).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: shared::ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.kind, Some(shared::ErrorKind::MissingUpload));
        assert!(dir_is_empty(&dir));
    }

    #[actix_web::test]
    async fn repeated_predictions_are_identical() {
        let dir = upload_dir();
        let app = service!(ready(Arc::new(FixedGuessr { confidence: Some(0.9) })), dir);
        let fixture = jpeg_fixture();

        let mut bodies = Vec::new();
        for _ in 0..3 {
            let resp = test::call_service(
                &app,
                predict_request(multipart_body("file", "photo.jpg", &fixture)).to_request(),
            )
            .await;
            assert_eq!(resp.status(), StatusCode::OK);
            bodies.push(test::read_body(resp).await);
        }
        assert!(bodies.windows(2).all(|pair| pair[0] == pair[1]));
        assert!(dir_is_empty(&dir));
    }

    #[actix_web::test]
    async fn inference_panic_is_500_worker_and_cleans_up() {
        let dir = upload_dir();
        let app = service!(ready_with(Arc::new(PanickingEmbedding)), dir);
        let resp = test::call_service(
            &app,
            predict_request(multipart_body("file", "photo.jpg", &jpeg_fixture())).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: shared::ErrorResponse = test::read_body_json(resp).await;
        assert!(body.detail.starts_with("Prediction failed: "), "{}", body.detail);
        assert_eq!(body.kind, Some(shared::ErrorKind::Worker));
        assert!(dir_is_empty(&dir));

        // The service keeps answering after a worker panic.
        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn truncated_multipart_is_500_io_and_writes_nothing() {
        let dir = upload_dir();
        let app = service!(ready(Arc::new(FixedGuessr { confidence: Some(0.9) })), dir);
        let resp = test::call_service(&app, predict_request(truncated_body()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: shared::ErrorResponse = test::read_body_json(resp).await;
        assert!(body.detail.starts_with("Prediction failed: "), "{}", body.detail);
        assert_eq!(body.kind, Some(shared::ErrorKind::Io));
        assert!(dir_is_empty(&dir));
    }

    #[actix_web::test]
    async fn multipart_without_boundary_is_500_io() {
        let dir = upload_dir();
        let app = service!(ready(Arc::new(FixedGuessr { confidence: Some(0.9) })), dir);
        let resp = test::call_service(
            &app,
            raw_predict_request("multipart/form-data".into(), jpeg_fixture()).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: shared::ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.kind, Some(shared::ErrorKind::Io));
        assert!(dir_is_empty(&dir));
    }

    #[actix_web::test]
    async fn readiness_is_checked_before_a_malformed_body() {
        let dir = upload_dir();
        let app = service!(failed(), dir);
        let resp = test::call_service(&app, predict_request(truncated_body()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: shared::ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.kind, Some(shared::ErrorKind::Unavailable));
        assert!(dir_is_empty(&dir));
    }
}
