//! Plain-text extraction from uploaded resumes.
//!
//! Dispatches on the file extension and hands the bytes to the matching parser.
//! Parser failures are not recovered here; callers see them as server errors.

pub mod docx;
pub mod handlers;

use std::path::Path;

use thiserror::Error;
use tracing::debug;

/// Upper bound on extracted text, in characters.
pub const MAX_EXTRACTED_CHARS: usize = 200_000;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported file type for '{filename}'. Please upload a .pdf, .docx, or .txt file.")]
    UnsupportedFileType { filename: String },

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("DOCX extraction failed: {0}")]
    Docx(String),

    #[error("Extraction worker failed: {0}")]
    Worker(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Docx,
    Txt,
}

impl FileKind {
    /// Resolves the kind from the filename's extension, ignoring case.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = Path::new(filename).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(FileKind::Pdf),
            "docx" => Some(FileKind::Docx),
            "txt" => Some(FileKind::Txt),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Docx => "docx",
            FileKind::Txt => "txt",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub text: String,
    pub kind: FileKind,
    /// True when the source produced more than `MAX_EXTRACTED_CHARS`.
    pub truncated: bool,
}

/// Extracts text from `bytes`, dispatching on `filename`'s extension.
///
/// Unsupported extensions are rejected before any parsing. PDF and DOCX parsing
/// is CPU-bound, so it runs on the blocking pool; a panic inside a parser is
/// reported as `ExtractError::Worker`.
pub async fn extract_text(bytes: bytes::Bytes, filename: &str) -> Result<ExtractedText, ExtractError> {
    let kind = FileKind::from_filename(filename).ok_or_else(|| ExtractError::UnsupportedFileType {
        filename: filename.to_string(),
    })?;

    let raw = match kind {
        FileKind::Txt => decode_utf8_ignoring_invalid(&bytes),
        FileKind::Pdf | FileKind::Docx => {
            tokio::task::spawn_blocking(move || extract_with(kind, &bytes))
                .await
                .map_err(|e| ExtractError::Worker(e.to_string()))??
        }
    };

    let (text, truncated) = truncate_chars(raw, MAX_EXTRACTED_CHARS);
    debug!(
        kind = kind.as_str(),
        chars = text.chars().count(),
        truncated,
        "Extracted text"
    );

    Ok(ExtractedText {
        text,
        kind,
        truncated,
    })
}

fn extract_with(kind: FileKind, bytes: &[u8]) -> Result<String, ExtractError> {
    match kind {
        FileKind::Pdf => {
            pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
        }
        FileKind::Docx => docx::extract_docx_text(bytes),
        FileKind::Txt => Ok(decode_utf8_ignoring_invalid(bytes)),
    }
}

/// Decodes UTF-8, dropping undecodable byte sequences instead of replacing them.
fn decode_utf8_ignoring_invalid(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

/// Keeps the first `max_chars` characters. Never splits a character.
fn truncate_chars(mut text: String, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            text.truncate(byte_idx);
            (text, true)
        }
        None => (text, false),
    }
}
