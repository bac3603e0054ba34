use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::TextGenerator;
use crate::ocr::detector::TextDetector;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Text-generation backend. Default: Gemini `LlmClient`.
    pub generator: Arc<dyn TextGenerator>,
    /// Text-detection engine, initialized once at startup and shared read-only.
    pub detector: Arc<dyn TextDetector>,
}
