//! The form snapshot held for a session

use crate::{Amount, Attachment, AttachmentSlot, LineItems, StaticField};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything the user has entered
///
/// Serializes as `{ "fields": { "name": .. }, "items": [..] }`. Attachments
/// are raw file bytes and stay out of the serialized snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormState {
    fields: BTreeMap<StaticField, String>,
    items: LineItems,
    #[serde(skip)]
    receipts: Vec<Attachment>,
    #[serde(skip)]
    bank_statements: Vec<Attachment>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a field, empty when never set
    pub fn field(&self, field: StaticField) -> &str {
        self.fields.get(&field).map(String::as_str).unwrap_or("")
    }

    /// Whether the field was ever given a value (even an empty one)
    pub fn has_field(&self, field: StaticField) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn set_field(&mut self, field: StaticField, value: impl Into<String>) {
        self.fields.insert(field, value.into());
    }

    pub fn items(&self) -> &LineItems {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut LineItems {
        &mut self.items
    }

    /// Sum of every line item amount that parses
    ///
    /// Unparseable amounts count as zero here; validation reports them.
    pub fn total(&self) -> Amount {
        self.items.iter().filter_map(|item| item.amount().ok()).sum()
    }

    pub fn attachments(&self, slot: AttachmentSlot) -> &[Attachment] {
        match slot {
            AttachmentSlot::Receipts => &self.receipts,
            AttachmentSlot::BankStatements => &self.bank_statements,
        }
    }

    pub fn attach(&mut self, slot: AttachmentSlot, attachment: Attachment) {
        self.slot_mut(slot).push(attachment);
    }

    /// Remove the attachment at `index` of a slot, if present
    pub fn detach(&mut self, slot: AttachmentSlot, index: usize) -> Option<Attachment> {
        let attachments = self.slot_mut(slot);
        (index < attachments.len()).then(|| attachments.remove(index))
    }

    pub fn clear_attachments(&mut self, slot: AttachmentSlot) {
        self.slot_mut(slot).clear();
    }

    fn slot_mut(&mut self, slot: AttachmentSlot) -> &mut Vec<Attachment> {
        match slot {
            AttachmentSlot::Receipts => &mut self.receipts,
            AttachmentSlot::BankStatements => &mut self.bank_statements,
        }
    }
}
