//! Tesseract-backed `TextDetector`.
//!
//! Drives the `tesseract` CLI in TSV mode and keeps word-level rows only.
//! TSV columns: level page_num block_num par_num line_num word_num left top width height conf text

use std::process::Output;
use std::sync::Arc;

use async_trait::async_trait;
use image::{ImageFormat, RgbImage};
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, info};

use crate::ocr::detector::{BoundingRegion, DetectedRegion, DetectionError, TextDetector};

const WORD_LEVEL: u8 = 5;
const TSV_COLUMNS: usize = 12;

/// Tesseract CLI detector, verified once at startup for a fixed language set.
#[derive(Debug, Clone)]
pub struct TesseractDetector {
    command: String,
    languages: String,
}

impl TesseractDetector {
    /// Checks the engine is installed and records its version.
    pub async fn initialize(command: &str, languages: &str) -> Result<Self, DetectionError> {
        let output = Command::new(command)
            .arg("--version")
            .kill_on_drop(true)
            .output()
            .await?;
        ensure_success(&output)?;

        // Older releases print the banner on stderr.
        let banner = if output.stdout.is_empty() {
            &output.stderr
        } else {
            &output.stdout
        };
        let version = String::from_utf8_lossy(banner)
            .lines()
            .next()
            .unwrap_or("unknown version")
            .trim()
            .to_string();
        info!("OCR engine ready: {version} (languages: {languages})");

        Ok(Self {
            command: command.to_string(),
            languages: languages.to_string(),
        })
    }
}

#[async_trait]
impl TextDetector for TesseractDetector {
    async fn detect(&self, image: Arc<RgbImage>) -> Result<Vec<DetectedRegion>, DetectionError> {
        // PNG encoding is CPU-bound; keep it off the async executor.
        let staged = tokio::task::spawn_blocking(move || stage_png(&image)).await??;

        let output = Command::new(&self.command)
            .arg(staged.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.languages)
            .arg("tsv")
            .kill_on_drop(true)
            .output()
            .await?;
        ensure_success(&output)?;

        let tsv = String::from_utf8(output.stdout)
            .map_err(|e| DetectionError::Output(format!("non UTF-8 output: {e}")))?;
        let regions = parse_tsv(&tsv)?;
        debug!("Tesseract detected {} word regions", regions.len());
        Ok(regions)
    }
}

/// Writes the image to a temporary PNG, removed when the handle drops.
fn stage_png(image: &RgbImage) -> Result<NamedTempFile, DetectionError> {
    let staged = tempfile::Builder::new()
        .prefix("ocr-")
        .suffix(".png")
        .tempfile()?;
    image.save_with_format(staged.path(), ImageFormat::Png)?;
    Ok(staged)
}

fn ensure_success(output: &Output) -> Result<(), DetectionError> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(DetectionError::Engine(format!(
        "exited with {}: {}",
        output.status,
        stderr.trim()
    )))
}

/// Parses Tesseract TSV into word regions, in output order.
///
/// Rows above word level, rows with negative confidence, and blank words are skipped.
/// Confidence is rescaled from 0–100 to 0.0–1.0.
pub fn parse_tsv(tsv: &str) -> Result<Vec<DetectedRegion>, DetectionError> {
    let mut lines = tsv.lines().filter(|l| !l.trim().is_empty());

    match lines.next() {
        None => return Ok(Vec::new()),
        Some(header) if header.starts_with("level") => {}
        Some(other) => {
            return Err(DetectionError::Output(format!(
                "missing TSV header, got '{other}'"
            )))
        }
    }

    let mut regions = Vec::new();
    for line in lines {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < TSV_COLUMNS - 1 {
            return Err(DetectionError::Output(format!("short TSV row: '{line}'")));
        }

        if parse_field::<u8>(&fields, 0)? != WORD_LEVEL {
            continue;
        }

        let confidence = parse_field::<f64>(&fields, 10)?;
        let text = fields.get(11).map(|t| t.trim()).unwrap_or_default();
        if confidence < 0.0 || text.is_empty() {
            continue;
        }

        regions.push(DetectedRegion {
            bounding_region: BoundingRegion {
                left: parse_field(&fields, 6)?,
                top: parse_field(&fields, 7)?,
                width: parse_field(&fields, 8)?,
                height: parse_field(&fields, 9)?,
            },
            text: text.to_string(),
            confidence: (confidence / 100.0).clamp(0.0, 1.0),
        });
    }

    Ok(regions)
}

fn parse_field<T: std::str::FromStr>(fields: &[&str], index: usize) -> Result<T, DetectionError> {
    let raw = fields[index].trim();
    raw.parse::<T>()
        .map_err(|_| DetectionError::Output(format!("bad value '{raw}' in column {index}")))
}
