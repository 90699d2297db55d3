//! PDF Core - Low-level PDF manipulation
//!
//! This crate provides functionality for:
//! - Opening PDF templates from bytes
//! - Standard (base-14) and embedded TrueType fonts
//! - Inserting text at top-origin coordinates with alignment
//! - Inserting images (JPEG, PNG)
//! - Appending blank pages and pages of other PDFs
//! - Serializing to bytes or a `data:` URI
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{Align, PdfDocument, StandardFont};
//!
//! let mut doc = PdfDocument::open_from_bytes(&template)?;
//! doc.use_standard_font("body", StandardFont::Helvetica)?;
//! doc.set_font("body", 12.0)?;
//! doc.insert_text("Hello, World!", 1, 100.0, 90.0, Align::Left)?;
//! let bytes = doc.to_bytes()?;
//! ```

mod document;
mod font;
mod image;
mod pages;
mod text;

pub use document::PdfDocument;
pub use font::{FontData, LoadedFont, StandardFont, TextMeasure};
pub use image::{fit_centered, get_dimensions, ImageDimensions};
pub use pages::PageSelection;

use base64::Engine;
use thiserror::Error;

/// MIME type of every document this crate produces
pub const PDF_MIME: &str = "application/pdf";

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to open PDF: {0}")]
    OpenError(String),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Font not found: {0}")]
    FontNotFound(String),

    #[error("Font already exists: {0}")]
    FontAlreadyExists(String),

    #[error("Failed to parse font: {0}")]
    FontParseError(String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("Character '{character}' cannot be drawn with {font}; embed a TrueType font")]
    UnencodableText { character: char, font: String },

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("PDF parsing error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Text alignment options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Encode PDF bytes as a `data:application/pdf;base64,` URI
pub fn data_uri(bytes: &[u8]) -> String {
    format!(
        "data:{PDF_MIME};base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_default() {
        assert_eq!(Align::default(), Align::Left);
    }

    #[test]
    fn test_data_uri() {
        assert_eq!(data_uri(b"%PDF"), "data:application/pdf;base64,JVBERg==");
        assert_eq!(data_uri(b""), "data:application/pdf;base64,");
    }
}
