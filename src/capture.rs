//! Ephemeral input collection for a single generation request.
//!
//! Gathers typed text, zero or more captured/uploaded images and zero or
//! more documents (reduced to extracted text) before they are handed to
//! the generation client. Device APIs themselves (camera stream, file
//! picker) live in the surrounding application; only their outputs pass
//! through here.

use tracing::{debug, info};

use crate::errors::ExtractionError;
use crate::extraction::extract_document_text;

/// Text extracted from one uploaded document.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub name: String,
    pub text: String,
}

/// Accumulates the raw inputs of one generation request.
#[derive(Debug, Default)]
pub struct InputCollector {
    text: String,
    images: Vec<Vec<u8>>,
    documents: Vec<ExtractedDocument>,
}

impl InputCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Add one captured or uploaded image (encoded JPEG bytes).
    pub fn add_image(&mut self, bytes: Vec<u8>) {
        debug!(image_bytes = bytes.len(), "Collected image input");
        self.images.push(bytes);
    }

    /// Add one uploaded document; its text is extracted immediately so
    /// extraction failures surface before any network call is made.
    pub fn add_document(&mut self, name: &str, bytes: &[u8]) -> Result<(), ExtractionError> {
        let text = extract_document_text(bytes)?;
        info!(
            document = %name,
            text_length = text.len(),
            "Extracted document text"
        );
        self.documents.push(ExtractedDocument {
            name: name.to_string(),
            text,
        });
        Ok(())
    }

    /// Typed text plus all extracted document texts, in collection order.
    pub fn combined_content(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if !self.text.trim().is_empty() {
            parts.push(self.text.trim());
        }
        for doc in &self.documents {
            parts.push(&doc.text);
        }
        parts.join("\n\n")
    }

    pub fn images(&self) -> &[Vec<u8>] {
        &self.images
    }

    /// True when there is nothing to generate from. Callers must not
    /// invoke the generation client in this state.
    pub fn is_empty(&self) -> bool {
        self.combined_content().is_empty() && self.images.is_empty()
    }

    /// Release all collected inputs, on success and on every exit path.
    pub fn clear(&mut self) {
        self.text.clear();
        self.images.clear();
        self.documents.clear();
    }
}
