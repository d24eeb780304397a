//! DOCX text extraction: paragraphs from `word/document.xml`, one per line.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use super::{ExtractError, MAX_EXTRACTED_CHARS};

const DOCUMENT_PART: &str = "word/document.xml";

/// Ceiling on the decompressed size of the document part.
const MAX_DOCUMENT_XML_BYTES: u64 = 32 * 1024 * 1024;

/// Reads the main document part of a DOCX package and returns its paragraphs
/// joined by newlines, in document order.
///
/// Stops collecting once `MAX_EXTRACTED_CHARS` characters have been read.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let xml = read_document_part(bytes, MAX_DOCUMENT_XML_BYTES)?;
    let paragraphs = paragraphs_from_document_xml(&xml, MAX_EXTRACTED_CHARS)?;
    Ok(paragraphs.join("\n"))
}

/// Decompresses the document part, refusing anything larger than `limit` bytes.
/// The declared size is checked first, then the read itself is bounded.
fn read_document_part(bytes: &[u8], limit: u64) -> Result<String, ExtractError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractError::Docx(format!("not a DOCX package: {e}")))?;

    let part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractError::Docx(format!("missing {DOCUMENT_PART}: {e}")))?;

    let too_large =
        || ExtractError::Docx(format!("{DOCUMENT_PART} exceeds the {limit}-byte limit"));

    if part.size() > limit {
        return Err(too_large());
    }

    let mut raw = Vec::new();
    part.take(limit + 1)
        .read_to_end(&mut raw)
        .map_err(|e| ExtractError::Docx(format!("unreadable {DOCUMENT_PART}: {e}")))?;
    if raw.len() as u64 > limit {
        return Err(too_large());
    }

    String::from_utf8(raw)
        .map_err(|e| ExtractError::Docx(format!("{DOCUMENT_PART} is not UTF-8: {e}")))
}

/// Collects the text of every `w:p`. Paragraphs nested inside another
/// paragraph (text boxes) are folded into the outer one.
///
/// Parsing ends early once the joined output passes `max_chars` characters.
fn paragraphs_from_document_xml(xml: &str, max_chars: usize) -> Result<Vec<String>, ExtractError> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_text = false;
    // Characters of the joined output so far, separators included.
    let mut collected = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:p" => {
                    if depth == 0 && !paragraphs.is_empty() {
                        collected += 1;
                    }
                    depth += 1;
                }
                b"w:t" => in_text = depth > 0,
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:p" if depth > 0 => {
                    depth -= 1;
                    if depth == 0 {
                        paragraphs.push(std::mem::take(&mut current));
                    }
                }
                b"w:t" => in_text = false,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:p" if depth == 0 => {
                    if !paragraphs.is_empty() {
                        collected += 1;
                    }
                    paragraphs.push(String::new());
                }
                b"w:tab" if depth > 0 => {
                    current.push('\t');
                    collected += 1;
                }
                b"w:br" | b"w:cr" if depth > 0 => {
                    current.push('\n');
                    collected += 1;
                }
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| ExtractError::Docx(format!("bad text run: {e}")))?;
                collected += text.chars().count();
                current.push_str(&text);
            }
            Ok(Event::CData(t)) if in_text => {
                let text = String::from_utf8_lossy(&t);
                collected += text.chars().count();
                current.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ExtractError::Docx(format!(
                    "malformed XML at position {}: {e}",
                    reader.buffer_position()
                )))
            }
        }

        if collected > max_chars {
            if depth > 0 {
                paragraphs.push(current);
            }
            break;
        }
    }

    Ok(paragraphs)
}
