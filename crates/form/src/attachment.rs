//! Uploaded attachments and byte-signature classification

use crate::{normalize_key, FormError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Image flavours that can be placed on a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
}

/// What an attachment turned out to be, judged by its first four bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image(ImageKind),
    Document,
    Unknown,
}

const PNG: [u8; 4] = [0x89, 0x50, 0x4E, 0x47];
const JPEG_JFIF: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xE0];
const JPEG_EXIF: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xE1];
const JPEG_SPIFF: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xE2];
const PDF: [u8; 4] = *b"%PDF";

/// Classify attachment bytes by their leading signature
///
/// Only the first four bytes are inspected. Anything shorter, or any other
/// prefix, is [`AttachmentKind::Unknown`].
pub fn classify(bytes: &[u8]) -> AttachmentKind {
    let Some(head) = bytes.get(..4) else {
        return AttachmentKind::Unknown;
    };

    match <[u8; 4]>::try_from(head) {
        Ok(PNG) => AttachmentKind::Image(ImageKind::Png),
        Ok(JPEG_JFIF | JPEG_EXIF | JPEG_SPIFF) => AttachmentKind::Image(ImageKind::Jpeg),
        Ok(PDF) => AttachmentKind::Document,
        _ => AttachmentKind::Unknown,
    }
}

/// Upload slot an attachment was added to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttachmentSlot {
    Receipts,
    BankStatements,
}

impl AttachmentSlot {
    /// Slots in the order their pages are appended
    pub const ORDER: [AttachmentSlot; 2] = [AttachmentSlot::Receipts, AttachmentSlot::BankStatements];

    pub fn label(&self) -> &'static str {
        match self {
            AttachmentSlot::Receipts => "Receipts",
            AttachmentSlot::BankStatements => "Bank statements",
        }
    }
}

impl fmt::Display for AttachmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AttachmentSlot {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_key(s).as_str() {
            "receipt" | "receipts" => Ok(AttachmentSlot::Receipts),
            "bankstatement" | "bankstatements" => Ok(AttachmentSlot::BankStatements),
            _ => Err(FormError::UnknownSlot(s.to_string())),
        }
    }
}

/// A user-supplied file
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn kind(&self) -> AttachmentKind {
        classify(&self.bytes)
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}
