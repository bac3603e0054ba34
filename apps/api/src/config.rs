use anyhow::{Context, Result};

const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;
const DEFAULT_OCR_COMMAND: &str = "tesseract";
const DEFAULT_OCR_LANGUAGES: &str = "eng";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:4000";
const DEFAULT_PORT: u16 = 8000;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub llm_timeout_secs: u64,
    /// Tesseract binary, resolved through PATH unless absolute.
    pub ocr_command: String,
    /// Tesseract language set, e.g. `eng` or `eng+deu`.
    pub ocr_languages: String,
    pub max_upload_bytes: usize,
    pub cors_allowed_origins: Vec<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };
        let or_default =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            gemini_api_key: require("GEMINI_API_KEY")?,
            gemini_model: or_default("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            llm_timeout_secs: parse_or(
                "LLM_TIMEOUT_SECS",
                lookup("LLM_TIMEOUT_SECS"),
                DEFAULT_LLM_TIMEOUT_SECS,
            )?,
            ocr_command: or_default("OCR_COMMAND", DEFAULT_OCR_COMMAND),
            ocr_languages: or_default("OCR_LANGUAGES", DEFAULT_OCR_LANGUAGES),
            max_upload_bytes: parse_or(
                "MAX_UPLOAD_BYTES",
                lookup("MAX_UPLOAD_BYTES"),
                DEFAULT_MAX_UPLOAD_BYTES,
            )?,
            cors_allowed_origins: parse_origins(&or_default(
                "CORS_ALLOWED_ORIGINS",
                DEFAULT_CORS_ORIGINS,
            )),
            port: parse_or("PORT", lookup("PORT"), DEFAULT_PORT)?,
            rust_log: or_default("RUST_LOG", "info"),
        })
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{value}'")),
        None => Ok(default),
    }
}

/// Splits a comma-separated origin list, dropping blanks.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}
