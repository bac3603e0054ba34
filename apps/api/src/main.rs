mod config;
mod errors;
mod llm_client;
mod ocr;
mod proposal;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::ocr::tesseract::TesseractDetector;
use crate::routes::{build_router, cors_layer};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting UpFreelance API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize text-generation client
    let llm = LlmClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        Duration::from_secs(config.llm_timeout_secs),
    )?;
    info!("LLM client initialized (model: {})", llm.model());

    // Initialize the OCR engine once; every request shares it read-only
    let detector = TesseractDetector::initialize(&config.ocr_command, &config.ocr_languages)
        .await
        .with_context(|| format!("OCR engine '{}' is not usable", config.ocr_command))?;

    let cors = cors_layer(&config.cors_allowed_origins)?;
    info!("CORS origins: {:?}", config.cors_allowed_origins);

    // Build app state
    let state = AppState {
        config: config.clone(),
        generator: Arc::new(llm),
        detector: Arc::new(detector),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
