//! Rectangle catalogue
//!
//! A versioned, read-only table mapping every drawable field to its box on
//! the template page. [`FieldKind`] is the only list of field names: both
//! rectangle lookup and alignment derive from it.

use crate::{Result, TemplateError};
use form::{StaticField, MAX_LINE_ITEMS};
use pdf_core::Align;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Built-in catalogue for the bundled template
pub const BUILTIN_CATALOGUE: &str = include_str!("../data/catalogue.json");

/// Catalogue format versions this crate reads
const SUPPORTED_VERSIONS: [&str; 1] = ["1"];

/// A box on the template page, in points, `y` measured from the top edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Every kind of field drawn on the template
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum FieldKind {
    Date,
    Name,
    Email,
    Phone,
    StudentNumber,
    AccountCode,
    Total,
    Item,
    Category,
    Amount,
}

impl FieldKind {
    /// Kinds drawn once per form, in default draw order
    pub const STATIC: [FieldKind; 7] = [
        FieldKind::Date,
        FieldKind::Name,
        FieldKind::Email,
        FieldKind::Phone,
        FieldKind::StudentNumber,
        FieldKind::AccountCode,
        FieldKind::Total,
    ];

    /// Kinds drawn once per line item, in column order
    pub const REPEATING: [FieldKind; 4] = [
        FieldKind::Item,
        FieldKind::Category,
        FieldKind::Amount,
        FieldKind::AccountCode,
    ];

    /// Field name, or the prefix of a repeating field name
    pub fn prefix(&self) -> &'static str {
        match self {
            FieldKind::Date => "Date",
            FieldKind::Name => "Name",
            FieldKind::Email => "Email",
            FieldKind::Phone => "Phone",
            FieldKind::StudentNumber => "StudentNumber",
            FieldKind::AccountCode => "AccountCode",
            FieldKind::Total => "Total",
            FieldKind::Item => "Item",
            FieldKind::Category => "Category",
            FieldKind::Amount => "Amount",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        Self::STATIC
            .into_iter()
            .chain(Self::REPEATING)
            .find(|kind| kind.prefix() == prefix)
    }

    pub fn is_static(&self) -> bool {
        Self::STATIC.contains(self)
    }

    pub fn is_repeating(&self) -> bool {
        Self::REPEATING.contains(self)
    }

    /// Horizontal alignment inside the rectangle
    ///
    /// Money and codes are centered, identity fields are right-aligned and
    /// free-text descriptions are left-aligned.
    pub fn align(&self) -> Align {
        match self {
            FieldKind::Category | FieldKind::Amount | FieldKind::Total | FieldKind::AccountCode => {
                Align::Center
            }
            FieldKind::Date
            | FieldKind::Name
            | FieldKind::Email
            | FieldKind::Phone
            | FieldKind::StudentNumber => Align::Right,
            FieldKind::Item => Align::Left,
        }
    }

    /// Form field supplying the value of a static kind
    pub fn static_field(&self) -> Option<StaticField> {
        match self {
            FieldKind::Date => Some(StaticField::Date),
            FieldKind::Name => Some(StaticField::Name),
            FieldKind::Email => Some(StaticField::Email),
            FieldKind::Phone => Some(StaticField::Phone),
            FieldKind::StudentNumber => Some(StaticField::StudentNumber),
            FieldKind::AccountCode => Some(StaticField::AccountCode),
            FieldKind::Total | FieldKind::Item | FieldKind::Category | FieldKind::Amount => None,
        }
    }
}

/// Name of one drawable field: a kind plus a 1-based row for repeating fields
///
/// Written as `Name`, `Item3` or `AccountCode7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldName {
    pub kind: FieldKind,
    pub row: Option<usize>,
}

impl FieldName {
    pub fn single(kind: FieldKind) -> Self {
        Self { kind, row: None }
    }

    pub fn row(kind: FieldKind, row: usize) -> Self {
        Self {
            kind,
            row: Some(row),
        }
    }

    pub fn align(&self) -> Align {
        self.kind.align()
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(row) => write!(f, "{}{}", self.kind.prefix(), row),
            None => f.write_str(self.kind.prefix()),
        }
    }
}

impl FromStr for FieldName {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self> {
        let unknown = || TemplateError::UnknownField(s.to_string());

        let digits_at = s
            .rfind(|c: char| !c.is_ascii_digit())
            .map(|i| i + 1)
            .ok_or_else(unknown)?;
        let (prefix, digits) = s.split_at(digits_at);
        let kind = FieldKind::from_prefix(prefix).ok_or_else(unknown)?;

        if digits.is_empty() {
            return if kind.is_static() {
                Ok(FieldName::single(kind))
            } else {
                Err(unknown())
            };
        }

        let row: usize = digits.parse().map_err(|_| unknown())?;
        if row == 0 || !kind.is_repeating() {
            return Err(unknown());
        }
        Ok(FieldName::row(kind, row))
    }
}

impl Serialize for FieldName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// What to do when a field has no rectangle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MissingRect {
    /// Log a warning and leave the field out
    #[default]
    Skip,
    /// Abort the fill
    Error,
}

#[derive(Debug, Serialize, Deserialize)]
struct CatalogueFile {
    version: String,
    #[serde(default = "default_page")]
    page: usize,
    #[serde(rename = "static", default)]
    static_fields: Vec<StaticEntry>,
    #[serde(default)]
    repeating: Vec<RepeatingEntry>,
}

fn default_page() -> usize {
    1
}

#[derive(Debug, Serialize, Deserialize)]
struct StaticEntry {
    field: FieldKind,
    #[serde(flatten)]
    rect: Rect,
}

#[derive(Debug, Serialize, Deserialize)]
struct RepeatingEntry {
    field: FieldKind,
    rows: Vec<Rect>,
}

/// Read-only field rectangle lookup
#[derive(Debug, Clone, PartialEq)]
pub struct Catalogue {
    version: String,
    page: usize,
    statics: Vec<(FieldKind, Rect)>,
    columns: BTreeMap<FieldKind, Vec<Rect>>,
}

impl Catalogue {
    /// The catalogue for the bundled template
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOGUE)
    }

    /// Load a catalogue, requiring a rectangle for every static field and for
    /// every row of every column
    ///
    /// The AccountCode rectangles are optional: they are only drawn when
    /// [`FillOptions::account_codes`](crate::FillOptions::account_codes) is on.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::load(json, true)
    }

    /// Load a catalogue that may leave fields or rows without a rectangle
    ///
    /// Fields the catalogue does not cover fall under the fill's
    /// [`MissingRect`] policy.
    pub fn from_json_lenient(json: &str) -> Result<Self> {
        Self::load(json, false)
    }

    fn load(json: &str, require_complete: bool) -> Result<Self> {
        let file: CatalogueFile =
            serde_json::from_str(json).map_err(|e| TemplateError::ParseError(e.to_string()))?;

        if !SUPPORTED_VERSIONS.contains(&file.version.as_str()) {
            return Err(TemplateError::UnsupportedVersion(file.version));
        }
        if file.page == 0 {
            return Err(TemplateError::ParseError(
                "catalogue page numbers start at 1".to_string(),
            ));
        }

        let mut statics: Vec<(FieldKind, Rect)> = Vec::with_capacity(file.static_fields.len());
        for entry in file.static_fields {
            if !entry.field.is_static() {
                return Err(TemplateError::MisplacedField(entry.field.prefix().to_string()));
            }
            if statics.iter().any(|(kind, _)| *kind == entry.field) {
                return Err(TemplateError::DuplicateField(entry.field.prefix().to_string()));
            }
            statics.push((entry.field, entry.rect));
        }

        let mut columns = BTreeMap::new();
        for entry in file.repeating {
            if !entry.field.is_repeating() {
                return Err(TemplateError::MisplacedField(entry.field.prefix().to_string()));
            }
            if require_complete && entry.rows.len() < MAX_LINE_ITEMS {
                return Err(TemplateError::IncompleteColumn {
                    field: entry.field.prefix().to_string(),
                    rows: entry.rows.len(),
                    expected: MAX_LINE_ITEMS,
                });
            }
            if columns.insert(entry.field, entry.rows).is_some() {
                return Err(TemplateError::DuplicateField(entry.field.prefix().to_string()));
            }
        }

        if require_complete {
            let required = |kind: &FieldKind| *kind != FieldKind::AccountCode;
            if let Some(kind) = FieldKind::STATIC
                .into_iter()
                .filter(required)
                .find(|kind| !statics.iter().any(|(listed, _)| listed == kind))
            {
                return Err(TemplateError::MissingField(kind.prefix().to_string()));
            }
            if let Some(kind) = FieldKind::REPEATING
                .into_iter()
                .filter(required)
                .find(|kind| !columns.contains_key(kind))
            {
                return Err(TemplateError::IncompleteColumn {
                    field: kind.prefix().to_string(),
                    rows: 0,
                    expected: MAX_LINE_ITEMS,
                });
            }
        }

        Ok(Self {
            version: file.version,
            page: file.page,
            statics,
            columns,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Template page (1-indexed) the fields are drawn on
    pub fn page(&self) -> usize {
        self.page
    }

    /// Look up a rectangle by field name such as `"Item3"`
    pub fn lookup(&self, name: &str) -> Option<Rect> {
        name.parse().ok().and_then(|name| self.lookup_field(name))
    }

    pub fn lookup_field(&self, name: FieldName) -> Option<Rect> {
        match name.row {
            None => self
                .statics
                .iter()
                .find(|(kind, _)| *kind == name.kind)
                .map(|(_, rect)| *rect),
            Some(row) => self
                .columns
                .get(&name.kind)
                .and_then(|rows| rows.get(row.checked_sub(1)?))
                .copied(),
        }
    }

    /// Static fields with rectangles, in catalogue order
    pub fn static_fields(&self) -> impl Iterator<Item = (FieldKind, Rect)> + '_ {
        self.statics.iter().copied()
    }
}
