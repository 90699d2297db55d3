//! Form validation
//!
//! Every problem is collected before reporting, so the user sees one message
//! listing all of them rather than fixing them one at a time.

use crate::{AmountError, FormState, StaticField};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Date formats accepted for the date field
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

/// What validation enforces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationRules {
    /// Fields that must be non-blank
    pub required_fields: Vec<StaticField>,
    /// Require the confirm-email field. A mismatch is rejected whenever
    /// the confirm-email field has a value, regardless of this flag.
    pub confirm_email: bool,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            required_fields: vec![
                StaticField::Date,
                StaticField::Name,
                StaticField::Email,
                StaticField::Phone,
                StaticField::StudentNumber,
            ],
            confirm_email: false,
        }
    }
}

/// A single validation finding
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Problem {
    #[error("{0} is required")]
    MissingField(StaticField),

    #[error("at least one line item is required")]
    NoItems,

    #[error("item {row} needs a description")]
    MissingDescription { row: usize },

    #[error("item {row} has an invalid amount ({reason})")]
    InvalidAmount { row: usize, reason: AmountError },

    #[error("date '{0}' is not a valid date (use YYYY-MM-DD or DD/MM/YYYY)")]
    InvalidDate(String),

    #[error("email '{0}' is not a valid address")]
    InvalidEmail(String),

    #[error("email and confirm email do not match")]
    EmailMismatch,
}

/// All problems found in a form snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub problems: Vec<Problem>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Please fix the following: ")?;
        for (i, problem) in self.problems.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{problem}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Parse a date in any accepted format
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

/// Check a form snapshot against the rules
pub fn validate(form: &FormState, rules: &ValidationRules) -> Result<(), ValidationError> {
    let mut problems = Vec::new();

    let mut required = rules.required_fields.clone();
    if rules.confirm_email && !required.contains(&StaticField::ConfirmEmail) {
        required.push(StaticField::ConfirmEmail);
    }
    for field in required {
        if form.field(field).trim().is_empty() {
            problems.push(Problem::MissingField(field));
        }
    }

    let date = form.field(StaticField::Date);
    if !date.trim().is_empty() && parse_date(date).is_none() {
        problems.push(Problem::InvalidDate(date.to_string()));
    }

    let email = form.field(StaticField::Email).trim();
    if !email.is_empty() && !looks_like_email(email) {
        problems.push(Problem::InvalidEmail(email.to_string()));
    }

    let confirm = form.field(StaticField::ConfirmEmail).trim();
    if !confirm.is_empty() && confirm != email {
        problems.push(Problem::EmailMismatch);
    }

    if form.items().is_empty() {
        problems.push(Problem::NoItems);
    }
    for (i, item) in form.items().iter().enumerate() {
        let row = i + 1;
        if item.description.trim().is_empty() {
            problems.push(Problem::MissingDescription { row });
        }
        if let Err(reason) = item.amount() {
            problems.push(Problem::InvalidAmount { row, reason });
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { problems })
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Category, LineItem};
    use pretty_assertions::assert_eq;

    fn complete_form() -> FormState {
        let mut form = FormState::new();
        form.set_field(StaticField::Date, "2024-03-01");
        form.set_field(StaticField::Name, "Ada Lovelace");
        form.set_field(StaticField::Email, "ada@example.org");
        form.set_field(StaticField::Phone, "0400 000 000");
        form.set_field(StaticField::StudentNumber, "s1234567");
        form.items_mut()
            .push(LineItem::new("Pens", Category::Operations, "12.50"))
            .unwrap();
        form
    }

    #[test]
    fn test_complete_form_passes() {
        assert_eq!(validate(&complete_form(), &ValidationRules::default()), Ok(()));
    }

    #[test]
    fn test_each_required_field_is_enforced() {
        let rules = ValidationRules::default();
        for field in rules.required_fields.clone() {
            let mut form = complete_form();
            form.set_field(field, "   ");
            let err = validate(&form, &rules).unwrap_err();
            assert_eq!(err.problems, vec![Problem::MissingField(field)]);
        }
    }

    #[test]
    fn test_problems_are_collected() {
        let mut form = FormState::new();
        form.items_mut()
            .push(LineItem::new("", Category::Other, "1.234"))
            .unwrap();
        let err = validate(&form, &ValidationRules::default()).unwrap_err();

        assert_eq!(err.problems.len(), 7);
        assert!(err.problems.contains(&Problem::MissingDescription { row: 1 }));
        assert!(err.problems.contains(&Problem::InvalidAmount {
            row: 1,
            reason: AmountError::TooManyDecimals
        }));
    }

    #[test]
    fn test_no_items() {
        let mut form = complete_form();
        form.items_mut().clear();
        let err = validate(&form, &ValidationRules::default()).unwrap_err();
        assert_eq!(err.problems, vec![Problem::NoItems]);
    }

    #[test]
    fn test_email_mismatch_rejected() {
        let mut form = complete_form();
        form.set_field(StaticField::ConfirmEmail, "ada@example.com");
        let err = validate(&form, &ValidationRules::default()).unwrap_err();
        assert_eq!(err.problems, vec![Problem::EmailMismatch]);

        form.set_field(StaticField::ConfirmEmail, " ada@example.org ");
        assert_eq!(validate(&form, &ValidationRules::default()), Ok(()));
    }

    #[test]
    fn test_email_confirmation_is_case_sensitive() {
        let mut form = complete_form();
        form.set_field(StaticField::Email, "Grace@example.edu");
        form.set_field(StaticField::ConfirmEmail, "grace@example.edu");
        let err = validate(&form, &ValidationRules::default()).unwrap_err();
        assert_eq!(err.problems, vec![Problem::EmailMismatch]);
    }

    #[test]
    fn test_confirm_email_required_when_enabled() {
        let rules = ValidationRules {
            confirm_email: true,
            ..ValidationRules::default()
        };
        let err = validate(&complete_form(), &rules).unwrap_err();
        assert_eq!(err.problems, vec![Problem::MissingField(StaticField::ConfirmEmail)]);
    }

    #[test]
    fn test_dates() {
        assert_eq!(parse_date("2024-03-01"), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(parse_date("01/03/2024"), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(parse_date("2024-02-30"), None);
        assert_eq!(parse_date("yesterday"), None);

        let mut form = complete_form();
        form.set_field(StaticField::Date, "31/31/2024");
        let err = validate(&form, &ValidationRules::default()).unwrap_err();
        assert_eq!(err.problems, vec![Problem::InvalidDate("31/31/2024".to_string())]);
    }

    #[test]
    fn test_invalid_email() {
        let mut form = complete_form();
        form.set_field(StaticField::Email, "ada.example.org");
        let err = validate(&form, &ValidationRules::default()).unwrap_err();
        assert_eq!(
            err.problems,
            vec![Problem::InvalidEmail("ada.example.org".to_string())]
        );
    }

    #[test]
    fn test_message_lists_everything() {
        let err = ValidationError {
            problems: vec![Problem::MissingField(StaticField::Name), Problem::NoItems],
        };
        assert_eq!(
            err.to_string(),
            "Please fix the following: Name is required; at least one line item is required"
        );
    }
}
