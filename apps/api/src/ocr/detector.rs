//! Text detection seam — pluggable engine that maps RGB pixels to text regions.
//!
//! `AppState` holds an `Arc<dyn TextDetector>`, built once at startup and shared
//! read-only by every request.

use std::sync::Arc;

use async_trait::async_trait;
use image::RgbImage;
use thiserror::Error;

/// Axis-aligned pixel box around a detected region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingRegion {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// One detected piece of text. Order within a batch is detection order.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedRegion {
    pub bounding_region: BoundingRegion,
    pub text: String,
    /// 0.0 – 1.0
    pub confidence: f64,
}

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to stage image for OCR: {0}")]
    Staging(#[from] image::ImageError),

    #[error("OCR worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("OCR engine failed: {0}")]
    Engine(String),

    #[error("Unreadable OCR engine output: {0}")]
    Output(String),
}

/// The detection trait. Implement this to swap engines without touching the
/// service, handler, or caller code. An empty result is a valid outcome.
#[async_trait]
pub trait TextDetector: Send + Sync {
    async fn detect(&self, image: Arc<RgbImage>) -> Result<Vec<DetectedRegion>, DetectionError>;
}
