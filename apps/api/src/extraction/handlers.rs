//! Axum route handler for resume file uploads.

use axum::extract::Multipart;
use axum::Json;
use bytes::Bytes;
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::extraction::extract_text;

#[derive(Debug, Serialize)]
pub struct ParseResumeResponse {
    pub text: String,
}

/// POST /api/parse-resume
///
/// Accepts a multipart upload (field `file`) and returns its plain text.
pub async fn handle_parse_resume(
    multipart: Multipart,
) -> Result<Json<ParseResumeResponse>, AppError> {
    let (filename, data) = read_upload(multipart).await?;

    let extracted = extract_text(data, &filename).await?;
    info!(
        filename = %filename,
        kind = extracted.kind.as_str(),
        truncated = extracted.truncated,
        "Resume text extracted"
    );

    Ok(Json(ParseResumeResponse {
        text: extracted.text,
    }))
}

/// Returns the first field carrying a filename (normally `file`).
async fn read_upload(mut multipart: Multipart) -> Result<(String, Bytes), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read multipart field: {e}")))?
    {
        let is_file_field = field.name() == Some("file");
        let Some(filename) = field.file_name().map(str::to_string) else {
            if is_file_field {
                return Err(AppError::Validation(
                    "Uploaded file is missing a filename".to_string(),
                ));
            }
            continue;
        };

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read file data: {e}")))?;
        return Ok((filename, data));
    }

    Err(AppError::Validation(
        "Missing file in request (expected multipart field 'file')".to_string(),
    ))
}
