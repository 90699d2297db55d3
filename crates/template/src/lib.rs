//! Template filling for reimbursement forms
//!
//! This crate provides:
//! - The versioned rectangle catalogue for the template page
//! - Text fitting (word wrap + font shrinking) inside a rectangle
//! - The fill engine: draws fields and appends receipt and statement pages
//! - A generate session tracking fill state and the latest output
//!
//! # Example
//!
//! ```ignore
//! use form::{Category, LineItem, StaticField};
//! use template::Session;
//!
//! let mut session = Session::new(std::fs::read("template.pdf")?)?;
//! session.form_mut().set_field(StaticField::Name, "Ada Lovelace");
//! session.form_mut().items_mut().push(LineItem::new("Pens", Category::Operations, "12.50"))?;
//! let output = session.generate()?;
//! std::fs::write(output.file_name(), output.bytes())?;
//! ```

mod catalogue;
mod engine;
mod fit;
mod session;

pub use catalogue::{Catalogue, FieldKind, FieldName, MissingRect, Rect, BUILTIN_CATALOGUE};
pub use engine::{DrawnField, FillEngine, FillOptions, FillReport, SkippedAttachment};
pub use fit::{fit_text, wrap_words, FitOptions, FittedText, PlacedLine};
pub use session::{FillState, GeneratedDocument, Session};

use form::ValidationError;
use pdf_core::PdfError;
use thiserror::Error;

/// Errors in catalogue or configuration data
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to parse catalogue: {0}")]
    ParseError(String),

    #[error("Unsupported catalogue version: {0}")]
    UnsupportedVersion(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Field listed twice: {0}")]
    DuplicateField(String),

    #[error("Field {0} is in the wrong catalogue section")]
    MisplacedField(String),

    #[error("Catalogue has no rectangle for {0}")]
    MissingField(String),

    #[error("Column {field} has {rows} rows, expected {expected}")]
    IncompleteColumn {
        field: String,
        rows: usize,
        expected: usize,
    },

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type for catalogue and configuration operations
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Errors that end a fill
#[derive(Debug, Error)]
pub enum FillError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to load template: {0}")]
    TemplateLoad(#[source] PdfError),

    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    #[error("No rectangle for field {0}")]
    MissingRect(FieldName),
}

#[cfg(test)]
mod tests {
    use super::*;
    use form::Problem;

    #[test]
    fn test_validation_message_passes_through() {
        let err = FillError::from(ValidationError {
            problems: vec![Problem::NoItems],
        });
        assert_eq!(
            err.to_string(),
            "Please fix the following: at least one line item is required"
        );
    }

    #[test]
    fn test_missing_rect_message() {
        let err = FillError::MissingRect(FieldName::row(FieldKind::Item, 12));
        assert_eq!(err.to_string(), "No rectangle for field Item12");
    }
}
