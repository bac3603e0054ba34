use serde::Serialize;

pub const NO_TEXT_ERROR: &str = "No text could be extracted from the image";

/// Response body of the OCR endpoint. Every key is always present; absent values are `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResult {
    pub success: bool,
    pub text: Option<String>,
    /// Mean region confidence; `None` when nothing was detected.
    pub confidence: Option<f64>,
    pub low_confidence_words: Vec<String>,
    pub error: Option<String>,
}

impl OcrResult {
    /// A processing failure: nothing about the image is reported.
    pub fn failed(error: String) -> Self {
        Self {
            success: false,
            text: None,
            confidence: None,
            low_confidence_words: Vec::new(),
            error: Some(error),
        }
    }
}
