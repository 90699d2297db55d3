//! Line items and their categories

use crate::{normalize_key, Amount, AmountError, FormError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Most line items the template has rows for
pub const MAX_LINE_ITEMS: usize = 11;

/// Expense category of a line item
///
/// Each category books to a fixed ledger account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[default]
    Operations,
    Events,
    Marketing,
    Travel,
    Equipment,
    Other,
}

impl Category {
    /// Every category, in the order a picker lists them
    pub const ALL: [Category; 6] = [
        Category::Operations,
        Category::Events,
        Category::Marketing,
        Category::Travel,
        Category::Equipment,
        Category::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Operations => "Operations",
            Category::Events => "Events",
            Category::Marketing => "Marketing",
            Category::Travel => "Travel",
            Category::Equipment => "Equipment",
            Category::Other => "Other",
        }
    }

    /// Ledger account the category books to
    pub fn account_code(&self) -> &'static str {
        match self {
            Category::Operations => "5100",
            Category::Events => "5200",
            Category::Marketing => "5300",
            Category::Travel => "5400",
            Category::Equipment => "5500",
            Category::Other => "5900",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = FormError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let key = normalize_key(s);
        Category::ALL
            .into_iter()
            .find(|category| normalize_key(category.label()) == key)
            .ok_or_else(|| FormError::UnknownCategory(s.to_string()))
    }
}

/// One expense row
///
/// The amount is kept as typed so the form can hold half-entered values;
/// [`LineItem::amount`] parses it on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineItem {
    #[serde(alias = "item")]
    pub description: String,
    pub category: Category,
    #[serde(rename = "amount")]
    pub amount_text: String,
}

impl LineItem {
    pub fn new(
        description: impl Into<String>,
        category: Category,
        amount: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            category,
            amount_text: amount.into(),
        }
    }

    /// Parsed amount
    pub fn amount(&self) -> std::result::Result<Amount, AmountError> {
        self.amount_text.parse()
    }
}

/// Ordered line items, never more than [`MAX_LINE_ITEMS`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LineItem>", into = "Vec<LineItem>")]
pub struct LineItems(Vec<LineItem>);

impl LineItems {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item
    ///
    /// Fails once the list is full; the list is left unchanged.
    pub fn push(&mut self, item: LineItem) -> Result<()> {
        self.ensure_room()?;
        self.0.push(item);
        Ok(())
    }

    /// Insert an item before `index` (0-based)
    pub fn insert(&mut self, index: usize, item: LineItem) -> Result<()> {
        self.ensure_room()?;
        if index > self.0.len() {
            return Err(FormError::NoSuchItem(index));
        }
        self.0.insert(index, item);
        Ok(())
    }

    /// Remove and return the item at `index` (0-based)
    pub fn remove(&mut self, index: usize) -> Result<LineItem> {
        if index >= self.0.len() {
            return Err(FormError::NoSuchItem(index));
        }
        Ok(self.0.remove(index))
    }

    pub fn get(&self, index: usize) -> Option<&LineItem> {
        self.0.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut LineItem> {
        self.0.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.0.len() >= MAX_LINE_ITEMS
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LineItem> {
        self.0.iter()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    fn ensure_room(&self) -> Result<()> {
        if self.is_full() {
            return Err(FormError::TooManyItems {
                max: MAX_LINE_ITEMS,
            });
        }
        Ok(())
    }
}

impl TryFrom<Vec<LineItem>> for LineItems {
    type Error = FormError;

    fn try_from(items: Vec<LineItem>) -> Result<Self> {
        if items.len() > MAX_LINE_ITEMS {
            return Err(FormError::TooManyItems {
                max: MAX_LINE_ITEMS,
            });
        }
        Ok(Self(items))
    }
}

impl From<LineItems> for Vec<LineItem> {
    fn from(items: LineItems) -> Self {
        items.0
    }
}

impl<'a> IntoIterator for &'a LineItems {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pens() -> LineItem {
        LineItem::new("Pens", Category::Operations, "12.50")
    }

    #[test]
    fn test_category_codes_are_distinct() {
        let mut codes: Vec<_> = Category::ALL.iter().map(|c| c.account_code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), Category::ALL.len());
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("travel".parse::<Category>().unwrap(), Category::Travel);
        assert_eq!("Operations".parse::<Category>().unwrap(), Category::Operations);
        assert!(matches!(
            "Food".parse::<Category>(),
            Err(FormError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_push_until_full() {
        let mut items = LineItems::new();
        for _ in 0..MAX_LINE_ITEMS {
            items.push(pens()).unwrap();
        }
        assert!(items.is_full());

        assert_eq!(
            items.push(pens()),
            Err(FormError::TooManyItems { max: 11 })
        );
        assert_eq!(
            items.insert(0, pens()),
            Err(FormError::TooManyItems { max: 11 })
        );
        assert_eq!(items.len(), 11);
    }

    #[test]
    fn test_insert_remove_keep_order() {
        let mut items = LineItems::new();
        items.push(LineItem::new("a", Category::Other, "1")).unwrap();
        items.push(LineItem::new("c", Category::Other, "3")).unwrap();
        items.insert(1, LineItem::new("b", Category::Other, "2")).unwrap();

        let names: Vec<_> = items.iter().map(|i| i.description.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        let removed = items.remove(0).unwrap();
        assert_eq!(removed.description, "a");
        assert_eq!(items.get(0).unwrap().description, "b");
        assert_eq!(items.remove(5), Err(FormError::NoSuchItem(5)));
        assert_eq!(items.insert(9, pens()), Err(FormError::NoSuchItem(9)));
    }

    #[test]
    fn test_get_mut_edits_in_place() {
        let mut items = LineItems::new();
        items.push(pens()).unwrap();
        items.get_mut(0).unwrap().amount_text = "3".to_string();
        assert_eq!(items.get(0).unwrap().amount().unwrap().to_string(), "3.00");
    }

    #[test]
    fn test_deserialize_enforces_cap() {
        let one = r#"[{"item": "Pens", "category": "Operations", "amount": "12.50"}]"#;
        let items: LineItems = serde_json::from_str(one).unwrap();
        assert_eq!(items.get(0), Some(&pens()));

        let twelve = format!(
            "[{}]",
            vec![r#"{"description": "x", "category": "Other", "amount": "1"}"#; 12].join(",")
        );
        assert!(serde_json::from_str::<LineItems>(&twelve).is_err());
    }
}
