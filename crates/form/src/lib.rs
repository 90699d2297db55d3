//! Form state for a reimbursement request
//!
//! This crate holds everything the user enters before a fill:
//! - Named scalar fields (date, name, email, ...)
//! - Up to [`MAX_LINE_ITEMS`] line items with a category and an amount
//! - Receipt and bank statement attachments, classified by signature
//! - Validation of the whole snapshot into a single user-facing message
//!
//! # Example
//!
//! ```ignore
//! use form::{Category, FormState, LineItem, StaticField, ValidationRules};
//!
//! let mut form = FormState::new();
//! form.set_field(StaticField::Name, "Ada Lovelace");
//! form.items_mut().push(LineItem::new("Pens", Category::Operations, "12.50"))?;
//! form::validate(&form, &ValidationRules::default())?;
//! assert_eq!(form.total().to_string(), "12.50");
//! ```

mod amount;
mod attachment;
mod field;
mod item;
mod state;
mod validate;

pub use amount::{Amount, AmountError};
pub use attachment::{classify, Attachment, AttachmentKind, AttachmentSlot, ImageKind};
pub use field::StaticField;
pub use item::{Category, LineItem, LineItems, MAX_LINE_ITEMS};
pub use state::FormState;
pub use validate::{parse_date, validate, Problem, ValidationError, ValidationRules};

use thiserror::Error;

/// Errors raised while editing a form
#[derive(Debug, Error, PartialEq)]
pub enum FormError {
    #[error("A form holds at most {max} line items")]
    TooManyItems { max: usize },

    #[error("Line item {0} does not exist")]
    NoSuchItem(usize),

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Unknown attachment slot: {0}")]
    UnknownSlot(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Result type for form operations
pub type Result<T> = std::result::Result<T, FormError>;

/// Lowercase a user-supplied key and drop separators, so `student_number`,
/// `studentNumber` and `Student number` all compare equal
pub(crate) fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("studentNumber"), "studentnumber");
        assert_eq!(normalize_key("Student number"), "studentnumber");
        assert_eq!(normalize_key("bank-statements"), "bankstatements");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            FormError::TooManyItems { max: 11 }.to_string(),
            "A form holds at most 11 line items"
        );
        assert_eq!(FormError::NoSuchItem(4).to_string(), "Line item 4 does not exist");
    }
}
