//! Axum route handlers for the OCR API.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use bytes::Bytes;
use tracing::debug;

use crate::errors::AppError;
use crate::ocr::models::OcrResult;
use crate::ocr::service::extract_text;
use crate::state::AppState;

/// Multipart field carrying the uploaded image.
pub const UPLOAD_FIELD: &str = "file";

/// POST /api/ocr/extract
///
/// Accepts `multipart/form-data` with the image in the `file` field.
/// Processing failures come back as `success: false` in the body; only a
/// missing or unreadable upload produces an error status.
pub async fn handle_extract_text(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<OcrResult>, AppError> {
    let mut multipart = multipart?;
    let image_data = read_upload(&mut multipart).await?;
    let result = extract_text(image_data, state.detector.as_ref()).await;
    Ok(Json(result))
}

/// Returns the bytes of the first `file` field, skipping any other fields.
async fn read_upload(multipart: &mut Multipart) -> Result<Bytes, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!("Ignoring multipart field {:?}", field.name());
            continue;
        }
        debug!(
            "Upload received: file_name={:?}, content_type={:?}",
            field.file_name(),
            field.content_type()
        );
        return Ok(field.bytes().await?);
    }

    Err(AppError::Validation(format!(
        "Missing multipart field '{UPLOAD_FIELD}'"
    )))
}
