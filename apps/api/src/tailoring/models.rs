use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_TONE: &str = "Professional";
pub const DEFAULT_TARGET_TITLE: &str = "the target role";

pub const MIN_SECTIONS: usize = 3;
pub const MIN_BULLETS_PER_SECTION: usize = 2;

/// Request body for POST /api/tailor.
#[derive(Debug, Clone, Deserialize)]
pub struct TailorRequest {
    pub resume_text: String,
    pub job_text: String,
    #[serde(default)]
    pub target_title: Option<String>,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
}

impl TailorRequest {
    pub fn target_title(&self) -> &str {
        non_blank(&self.target_title).unwrap_or(DEFAULT_TARGET_TITLE)
    }

    pub fn tone(&self) -> &str {
        non_blank(&self.tone).unwrap_or(DEFAULT_TONE)
    }

    pub fn instructions(&self) -> &str {
        non_blank(&self.instructions).unwrap_or("")
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailoredSection {
    pub heading: String,
    pub bullets: Vec<String>,
}

/// The tailoring result. Either every field is present and the shape holds,
/// or the caller gets an error; partial results are never returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailorResponse {
    pub summary: String,
    pub improved_resume: String,
    pub cover_letter: String,
    pub sections: Vec<TailoredSection>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ShapeError {
    #[error("summary is empty")]
    EmptySummary,

    #[error("expected at least 3 sections, got {found}")]
    TooFewSections { found: usize },

    #[error("section '{heading}' has {found} bullets, expected at least 2")]
    TooFewBullets { heading: String, found: usize },
}

impl TailorResponse {
    /// Checks the cardinality rules the JSON schema expresses with `minItems`.
    /// JSON-object mode does not enforce them, so both paths run this.
    pub fn check_shape(&self) -> Result<(), ShapeError> {
        if self.summary.trim().is_empty() {
            return Err(ShapeError::EmptySummary);
        }
        if self.sections.len() < MIN_SECTIONS {
            return Err(ShapeError::TooFewSections {
                found: self.sections.len(),
            });
        }
        if let Some(section) = self
            .sections
            .iter()
            .find(|s| s.bullets.len() < MIN_BULLETS_PER_SECTION)
        {
            return Err(ShapeError::TooFewBullets {
                heading: section.heading.clone(),
                found: section.bullets.len(),
            });
        }
        Ok(())
    }
}
