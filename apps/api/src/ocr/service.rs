//! OCR Extractor — decode, normalize to RGB, detect, aggregate.
//!
//! Aggregation rules:
//! 1. text = region texts joined by single spaces, in detection order
//! 2. confidence = arithmetic mean of region confidences (`None` for zero regions)
//! 3. low_confidence_words = texts with confidence < 0.70, in detection order
//! 4. success iff the trimmed text is non-empty

use std::sync::Arc;

use bytes::Bytes;
use image::{DynamicImage, RgbImage};
use thiserror::Error;
use tracing::{error, info, trace};

use crate::ocr::detector::{DetectedRegion, DetectionError, TextDetector};
use crate::ocr::models::{OcrResult, NO_TEXT_ERROR};

/// Regions strictly below this confidence are reported as low-confidence words.
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.7;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("{0}")]
    Decode(#[from] image::ImageError),

    #[error("{0}")]
    Detection(#[from] DetectionError),

    #[error("decode worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Runs the full extraction for one uploaded image. Never fails: every error
/// is folded into an `OcrResult` with `success: false`.
pub async fn extract_text(image_data: Bytes, detector: &dyn TextDetector) -> OcrResult {
    info!("Received image data of size: {} bytes", image_data.len());

    match run_extraction(image_data, detector).await {
        Ok(result) => result,
        Err(e) => {
            error!("Error in OCR processing: {e}");
            OcrResult::failed(format!("Failed to process image: {e}"))
        }
    }
}

async fn run_extraction(
    image_data: Bytes,
    detector: &dyn TextDetector,
) -> Result<OcrResult, OcrError> {
    // CPU-bound decode and colour conversion, kept off the async executor.
    let rgb = tokio::task::spawn_blocking(move || decode_rgb(&image_data)).await??;
    let regions = detector.detect(Arc::new(rgb)).await?;
    for r in &regions {
        let b = r.bounding_region;
        trace!(
            "Region at ({}, {}) {}x{}: {:?} ({:.3})",
            b.left,
            b.top,
            b.width,
            b.height,
            r.text,
            r.confidence
        );
    }
    let result = aggregate_regions(&regions);

    info!(
        "Extracted text length: {}",
        result.text.as_deref().map(str::len).unwrap_or(0)
    );
    Ok(result)
}

/// Decodes any supported format and converts it to 8-bit RGB.
pub fn decode_rgb(image_data: &[u8]) -> Result<RgbImage, image::ImageError> {
    let format = image::guess_format(image_data)?;
    let image = image::load_from_memory_with_format(image_data, format)?;
    info!(
        "Image format: {:?}, Size: {}x{}, Color: {:?}",
        format,
        image.width(),
        image.height(),
        image.color()
    );

    Ok(match image {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => other.to_rgb8(),
    })
}

/// Folds detected regions into the endpoint's result shape.
pub fn aggregate_regions(regions: &[DetectedRegion]) -> OcrResult {
    let combined = regions
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let confidence = if regions.is_empty() {
        None
    } else {
        Some(regions.iter().map(|r| r.confidence).sum::<f64>() / regions.len() as f64)
    };

    let low_confidence_words = regions
        .iter()
        .filter(|r| r.confidence < LOW_CONFIDENCE_THRESHOLD)
        .map(|r| r.text.clone())
        .collect();

    let trimmed = combined.trim();
    if trimmed.is_empty() {
        return OcrResult {
            success: false,
            text: None,
            confidence,
            low_confidence_words,
            error: Some(NO_TEXT_ERROR.to_string()),
        };
    }

    OcrResult {
        success: true,
        text: Some(trimmed.to_string()),
        confidence,
        low_confidence_words,
        error: None,
    }
}
