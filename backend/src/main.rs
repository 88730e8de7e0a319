mod config;
mod error;
#[cfg_attr(not(feature = "torch"), allow(dead_code))]
mod inference;
mod routes;
mod state;
mod upload;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use config::AppConfig;
use routes::configure_routes;
use state::{AppState, ModelState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env();
    log::info!("Upload directory: {}", config.upload_dir.display());
    match &config.frontend_dir {
        Some(dir) => log::info!("Serving frontend from {}", dir.display()),
        None => log::info!("FRONTEND_DIR not set, static files disabled"),
    }

    // Load before binding so no request observes a half-loaded state.
    let models = ModelState::load(&config);
    if !models.is_ready() {
        log::warn!("Model unavailable; /predict will answer 503 until the process is restarted");
    }

    let state = web::Data::new(AppState::new(models, config.upload_dir.clone()));
    let frontend_dir = config.frontend_dir.clone();
    let bind_address = config.bind_address();

    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .app_data(state.clone())
            .configure(|cfg| configure_routes(cfg, frontend_dir.clone()))
    })
    .bind(&bind_address)?
    .run()
    .await
}
