use poem::listener::TcpListener;
use qr_renderer::core::renderer::RenderingEngine;
use qr_renderer::settings::get_config;
use qr_renderer::{AppState, init_openapi_route};
use tracing::Level;

use std::sync::Arc;

#[tokio::main]
async fn main() {
    let log_level = Level::DEBUG;
    // Logging to File
    let file_appender = tracing_appender::rolling::daily("./logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(log_level)
        .init();

    tracing::info!("Initializing QR Rendering Service...");

    let config = get_config();
    tracing::info!("run with config: {:?}", config);

    let engine = Arc::new(RenderingEngine::new(&config));
    if !engine.health_check().optimizer_available {
        tracing::warn!("optimizer binary not found, `optimize` requests will fall back");
    }

    // Init App State
    let app_state = Arc::new(AppState { engine });

    tracing::info!("Rendering engine initialized successfully");

    let app = init_openapi_route(app_state.clone(), &config);
    tracing::info!("run server on {}:{}", config.host, config.port);
    poem::Server::new(TcpListener::bind(format!(
        "{}:{}",
        config.host, config.port
    )))
    .run(app)
    .await
    .unwrap()
}
