//! Axum route handler for the Tailoring API.

use axum::{extract::State, Json};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::tailoring::models::{TailorRequest, TailorResponse};
use crate::tailoring::tailor::tailor_resume;

/// POST /api/tailor
///
/// Rate limited per client address (see `rate_limit`). Returns a complete,
/// shape-checked `TailorResponse` or an error; never a partial result.
pub async fn handle_tailor(
    State(state): State<AppState>,
    Json(request): Json<TailorRequest>,
) -> Result<Json<TailorResponse>, AppError> {
    if request.resume_text.trim().is_empty() {
        return Err(AppError::Validation(
            "resume_text cannot be empty".to_string(),
        ));
    }
    if request.job_text.trim().is_empty() {
        return Err(AppError::Validation("job_text cannot be empty".to_string()));
    }

    let request_id = Uuid::new_v4().simple().to_string()[..8].to_string();
    let span = info_span!("tailor", request_id = %request_id);

    async {
        info!(
            resume_chars = request.resume_text.chars().count(),
            job_chars = request.job_text.chars().count(),
            target_title = request.target_title(),
            "Tailoring request received"
        );

        let response = tailor_resume(state.completion.as_ref(), &request).await?;

        info!(sections = response.sections.len(), "Tailoring request completed");
        Ok::<_, AppError>(Json(response))
    }
    .instrument(span)
    .await
}
