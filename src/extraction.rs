//! Text extraction from paginated PDF documents.
//!
//! Returns the concatenation of all pages' text in page order, with each
//! page's discrete fragments space-joined. Parsing itself is delegated to
//! lopdf; this module only classifies failures and normalizes output.

use lopdf::Document;
use tracing::{debug, warn};

use crate::errors::ExtractionError;

/// A trimmed result shorter than this is treated as "no extractable text".
const MIN_EXTRACTED_TEXT_LEN: usize = 10;

/// Extract all text from a PDF given its raw bytes.
pub fn extract_document_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    if !bytes.starts_with(b"%PDF-") {
        return Err(ExtractionError::InvalidFormat);
    }

    let doc = match Document::load_mem(bytes) {
        Ok(doc) => doc,
        Err(e) => {
            // Encrypted documents frequently fail to parse outright; the
            // /Encrypt trailer entry still distinguishes them from plain
            // corruption.
            if contains_encrypt_marker(bytes) {
                return Err(ExtractionError::PasswordProtected);
            }
            return Err(ExtractionError::ParseFailure(e.to_string()));
        }
    };

    if doc.is_encrypted() {
        return Err(ExtractionError::PasswordProtected);
    }

    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    debug!(page_count = pages.len(), "Extracting text from document");

    let mut page_texts = Vec::with_capacity(pages.len());
    for page_number in pages {
        match doc.extract_text(&[page_number]) {
            Ok(text) => {
                // Space-join the page's fragments into a single line.
                let joined = text.split_whitespace().collect::<Vec<_>>().join(" ");
                page_texts.push(joined);
            }
            Err(e) => {
                warn!(
                    page_number,
                    error = %e,
                    "Failed to extract text from page"
                );
                return Err(ExtractionError::ParseFailure(e.to_string()));
            }
        }
    }

    let full_text = page_texts.join("\n");
    if full_text.trim().len() < MIN_EXTRACTED_TEXT_LEN {
        return Err(ExtractionError::EmptyText);
    }

    Ok(full_text)
}

fn contains_encrypt_marker(bytes: &[u8]) -> bool {
    bytes.windows(b"/Encrypt".len()).any(|w| w == b"/Encrypt")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_bytes_are_invalid_format() {
        let result = extract_document_text(&[]);
        assert_eq!(result.unwrap_err(), ExtractionError::InvalidFormat);
    }

    #[test]
    fn test_non_pdf_bytes_are_invalid_format() {
        let result = extract_document_text(b"hello, not a pdf at all");
        assert_eq!(result.unwrap_err(), ExtractionError::InvalidFormat);
    }

    #[test]
    fn test_truncated_pdf_is_parse_failure() {
        let result = extract_document_text(b"%PDF-1.4\ngarbage with no xref");
        assert!(matches!(
            result.unwrap_err(),
            ExtractionError::ParseFailure(_)
        ));
    }

    #[test]
    fn test_encrypted_stub_is_password_protected_not_generic() {
        // A broken document carrying an /Encrypt trailer entry must be
        // reported as password protected, not as a generic parse failure.
        let stub = b"%PDF-1.4\n1 0 obj\n<< /Encrypt 2 0 R >>\nendobj\n";
        let result = extract_document_text(stub);
        assert_eq!(result.unwrap_err(), ExtractionError::PasswordProtected);
    }

    #[test]
    fn test_encrypt_marker_scan() {
        assert!(contains_encrypt_marker(b"trailer << /Encrypt 5 0 R >>"));
        assert!(!contains_encrypt_marker(b"trailer << /Root 1 0 R >>"));
    }
}
