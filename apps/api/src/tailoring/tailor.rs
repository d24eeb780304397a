//! Tailoring flow — one schema-constrained attempt, then one JSON-object fallback.
//!
//! Flow: build messages → Attempt Primary (json_schema) → on any failure
//!       Attempt Fallback (json_object, same messages) → on failure Fail.
//!
//! Every failure kind is treated the same: transport errors, API errors,
//! malformed JSON and shape violations all move to the next state. There is
//! no retry beyond the fallback and no backoff.

use serde_json::error::Category;
use thiserror::Error;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::{
    strip_json_fences, ChatMessage, CompletionOutput, CompletionService, LlmError, ResponseMode,
};
use crate::tailoring::models::{ShapeError, TailorRequest, TailorResponse};
use crate::tailoring::prompts::build_messages;
use crate::tailoring::schema::tailor_response_format;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Primary,
    Fallback,
}

impl Attempt {
    pub fn mode(self) -> ResponseMode {
        match self {
            Attempt::Primary => ResponseMode::JsonSchema(tailor_response_format()),
            Attempt::Fallback => ResponseMode::JsonObject,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Attempt::Primary => "primary",
            Attempt::Fallback => "fallback",
        }
    }
}

/// Why a single attempt failed.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error(transparent)]
    Completion(#[from] LlmError),

    #[error("{0}")]
    Decode(#[source] serde_json::Error),

    #[error("{0}")]
    Shape(#[from] ShapeError),
}

impl AttemptError {
    pub fn kind(&self) -> &'static str {
        match self {
            AttemptError::Completion(e) => e.kind(),
            AttemptError::Decode(e) => match e.classify() {
                Category::Syntax | Category::Eof => "JsonDecodeError",
                Category::Data | Category::Io => "ValidationError",
            },
            AttemptError::Shape(_) => "ValidationError",
        }
    }
}

/// Both attempts failed. The fallback failure is what callers see.
#[derive(Debug, Error)]
#[error("primary attempt failed ({primary}); fallback attempt failed ({fallback})")]
pub struct TailorFailure {
    pub primary: AttemptError,
    pub fallback: AttemptError,
}

impl From<TailorFailure> for AppError {
    fn from(failure: TailorFailure) -> Self {
        AppError::Ai {
            kind: failure.fallback.kind(),
            message: failure.fallback.to_string(),
        }
    }
}

/// Runs the two-state tailoring sequence against `completion`.
///
/// Makes one outbound call on success of the primary attempt, two otherwise.
pub async fn tailor_resume(
    completion: &dyn CompletionService,
    request: &TailorRequest,
) -> Result<TailorResponse, TailorFailure> {
    let messages = build_messages(request);

    let primary = match run_attempt(completion, &messages, Attempt::Primary).await {
        Ok(response) => return Ok(response),
        Err(err) => err,
    };
    warn!(
        attempt = Attempt::Primary.label(),
        kind = primary.kind(),
        error = %primary,
        "Tailoring attempt failed, falling back to JSON-object mode"
    );

    let fallback = match run_attempt(completion, &messages, Attempt::Fallback).await {
        Ok(response) => return Ok(response),
        Err(err) => err,
    };
    warn!(
        attempt = Attempt::Fallback.label(),
        kind = fallback.kind(),
        error = %fallback,
        "Tailoring attempt failed"
    );

    Err(TailorFailure { primary, fallback })
}

async fn run_attempt(
    completion: &dyn CompletionService,
    messages: &[ChatMessage],
    attempt: Attempt,
) -> Result<TailorResponse, AttemptError> {
    let output = completion.complete(messages, &attempt.mode()).await?;
    let response = decode_output(output)?;
    response.check_shape()?;

    info!(
        attempt = attempt.label(),
        sections = response.sections.len(),
        "Tailoring attempt succeeded"
    );
    Ok(response)
}

/// Uses pre-parsed output directly; otherwise parses the text as JSON.
fn decode_output(output: CompletionOutput) -> Result<TailorResponse, AttemptError> {
    match output {
        CompletionOutput::Parsed(value) => {
            serde_json::from_value(value).map_err(AttemptError::Decode)
        }
        CompletionOutput::Text(text) => {
            serde_json::from_str(strip_json_fences(&text)).map_err(AttemptError::Decode)
        }
    }
}
