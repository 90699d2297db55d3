//! Named scalar fields

use crate::{normalize_key, FormError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A user-entered scalar field of the form
///
/// The total is not listed here: it is computed from the line items.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum StaticField {
    Date,
    Name,
    Email,
    ConfirmEmail,
    Phone,
    StudentNumber,
    AccountCode,
}

impl StaticField {
    /// Every field, in form order
    pub const ALL: [StaticField; 7] = [
        StaticField::Date,
        StaticField::Name,
        StaticField::Email,
        StaticField::ConfirmEmail,
        StaticField::Phone,
        StaticField::StudentNumber,
        StaticField::AccountCode,
    ];

    /// Human-readable label, used in validation messages
    pub fn label(&self) -> &'static str {
        match self {
            StaticField::Date => "Date",
            StaticField::Name => "Name",
            StaticField::Email => "Email",
            StaticField::ConfirmEmail => "Confirm email",
            StaticField::Phone => "Phone",
            StaticField::StudentNumber => "Student number",
            StaticField::AccountCode => "Account code",
        }
    }
}

impl fmt::Display for StaticField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StaticField {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize_key(s);
        StaticField::ALL
            .into_iter()
            .find(|field| normalize_key(field.label()) == key)
            .ok_or_else(|| FormError::UnknownField(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_accepts_common_spellings() {
        assert_eq!("name".parse::<StaticField>().unwrap(), StaticField::Name);
        assert_eq!(
            "studentNumber".parse::<StaticField>().unwrap(),
            StaticField::StudentNumber
        );
        assert_eq!(
            "confirm_email".parse::<StaticField>().unwrap(),
            StaticField::ConfirmEmail
        );
        assert_eq!(
            "Account code".parse::<StaticField>().unwrap(),
            StaticField::AccountCode
        );
    }

    #[test]
    fn test_from_str_unknown() {
        assert_eq!(
            "address".parse::<StaticField>(),
            Err(FormError::UnknownField("address".to_string()))
        );
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&StaticField::StudentNumber).unwrap();
        assert_eq!(json, "\"studentNumber\"");
        let field: StaticField = serde_json::from_str("\"confirmEmail\"").unwrap();
        assert_eq!(field, StaticField::ConfirmEmail);
    }
}
