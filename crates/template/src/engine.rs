//! Fill engine
//!
//! Draws every field of a validated form onto the template page, then
//! appends attachment pages: receipts first, bank statements second.

use crate::catalogue::{Catalogue, FieldKind, FieldName, MissingRect, Rect};
use crate::fit::{fit_text, FitOptions};
use crate::session::GeneratedDocument;
use crate::{FillError, Result};
use form::{
    parse_date, validate, AttachmentKind, AttachmentSlot, FormState, LineItem, StaticField,
    ValidationError, ValidationRules,
};
use pdf_core::{fit_centered, get_dimensions, PageSelection, PdfDocument, StandardFont};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// Font identifier registered on every filled document
const BODY_FONT: &str = "body";

#[derive(Serialize, Deserialize)]
#[serde(remote = "PageSelection", rename_all = "camelCase")]
enum PageSelectionDef {
    All,
    FirstOnly,
}

/// Knobs for a fill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FillOptions {
    /// Pages taken from each PDF attachment
    #[serde(with = "PageSelectionDef")]
    pub page_selection: PageSelection,
    /// Draw the per-row account code column
    pub account_codes: bool,
    /// Handling of fields without a rectangle
    pub missing_rect: MissingRect,
    pub fit: FitOptions,
    pub validation: ValidationRules,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            page_selection: PageSelection::All,
            account_codes: false,
            missing_rect: MissingRect::Skip,
            fit: FitOptions::default(),
            validation: ValidationRules::default(),
        }
    }
}

impl FillOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A field whose text was placed on the page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawnField {
    pub name: FieldName,
    pub font_size: f32,
    pub lines: Vec<String>,
    pub overflows: bool,
}

/// An attachment left out of the output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedAttachment {
    pub slot: AttachmentSlot,
    pub file_name: String,
    pub reason: String,
}

/// What a fill did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FillReport {
    /// Fields drawn, in draw order
    pub drawn: Vec<DrawnField>,
    /// Fields without a rectangle in the catalogue
    pub skipped_fields: Vec<FieldName>,
    pub skipped_attachments: Vec<SkippedAttachment>,
    /// Pages added after the template
    pub appended_pages: usize,
}

impl FillReport {
    /// Drawn entries belonging to line item rows
    pub fn drawn_rows(&self) -> impl Iterator<Item = &DrawnField> {
        self.drawn.iter().filter(|field| field.name.row.is_some())
    }
}

/// Fills the template from a form snapshot
#[derive(Debug, Clone)]
pub struct FillEngine {
    catalogue: Catalogue,
    options: FillOptions,
    font: Option<Vec<u8>>,
}

impl FillEngine {
    pub fn new(catalogue: Catalogue, options: FillOptions) -> Self {
        Self {
            catalogue,
            options,
            font: None,
        }
    }

    /// Engine with the built-in catalogue and default options
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(Catalogue::builtin()?, FillOptions::default()))
    }

    /// Draw with an embedded TrueType font instead of Helvetica
    pub fn with_font(mut self, ttf_data: Vec<u8>) -> Self {
        self.font = Some(ttf_data);
        self
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn options(&self) -> &FillOptions {
        &self.options
    }

    pub fn validate(&self, form: &FormState) -> std::result::Result<(), ValidationError> {
        validate(form, &self.options.validation)
    }

    /// Fill the template with a form that already passed validation
    pub fn fill(
        &self,
        template: &[u8],
        form: &FormState,
    ) -> std::result::Result<GeneratedDocument, FillError> {
        info!(
            items = form.items().len(),
            receipts = form.attachments(AttachmentSlot::Receipts).len(),
            bank_statements = form.attachments(AttachmentSlot::BankStatements).len(),
            "fill started"
        );

        let mut doc = PdfDocument::open_from_bytes(template).map_err(FillError::TemplateLoad)?;
        match &self.font {
            Some(ttf_data) => doc.add_font(BODY_FONT, ttf_data)?,
            None => doc.use_standard_font(BODY_FONT, StandardFont::Helvetica)?,
        }
        doc.set_font(BODY_FONT, self.options.fit.max_size)?;

        let mut report = FillReport::default();

        self.draw_static_fields(&mut doc, form, &mut report)?;
        for (i, item) in form.items().iter().enumerate() {
            self.draw_row(&mut doc, i + 1, item, &mut report)?;
        }
        self.append_attachments(&mut doc, form, &mut report)?;

        let page_count = doc.page_count();
        let bytes = doc.to_bytes()?;

        info!(
            pages = page_count,
            bytes = bytes.len(),
            drawn = report.drawn.len(),
            skipped_attachments = report.skipped_attachments.len(),
            "fill finished"
        );

        Ok(GeneratedDocument::new(bytes, page_count, report))
    }

    fn draw_static_fields(
        &self,
        doc: &mut PdfDocument,
        form: &FormState,
        report: &mut FillReport,
    ) -> std::result::Result<(), FillError> {
        for kind in FieldKind::STATIC {
            let name = FieldName::single(kind);
            if self.catalogue.lookup_field(name).is_none() {
                self.missing_rect(name, report)?;
            }
        }

        for (kind, rect) in self.catalogue.static_fields() {
            let value = static_value(kind, form);
            self.draw_field(doc, FieldName::single(kind), &rect, &value, report)?;
        }

        Ok(())
    }

    fn draw_row(
        &self,
        doc: &mut PdfDocument,
        row: usize,
        item: &LineItem,
        report: &mut FillReport,
    ) -> std::result::Result<(), FillError> {
        let amount = item
            .amount()
            .map(|amount| amount.to_string())
            .unwrap_or_else(|_| item.amount_text.clone());

        let mut columns = vec![
            (FieldKind::Item, item.description.clone()),
            (FieldKind::Category, item.category.label().to_string()),
            (FieldKind::Amount, amount),
        ];
        if self.options.account_codes {
            columns.push((FieldKind::AccountCode, item.category.account_code().to_string()));
        }

        for (kind, value) in columns {
            let name = FieldName::row(kind, row);
            match self.catalogue.lookup_field(name) {
                Some(rect) => self.draw_field(doc, name, &rect, &value, report)?,
                None => self.missing_rect(name, report)?,
            }
        }

        Ok(())
    }

    fn draw_field(
        &self,
        doc: &mut PdfDocument,
        name: FieldName,
        rect: &Rect,
        value: &str,
        report: &mut FillReport,
    ) -> std::result::Result<(), FillError> {
        let fitted = fit_text(value, rect, doc.current_font()?, &self.options.fit);
        if fitted.lines.is_empty() {
            return Ok(());
        }

        doc.set_font_size(fitted.font_size)?;
        let page = self.catalogue.page();
        for line in fitted.place(rect, name.align(), self.options.fit.padding) {
            doc.insert_text(&line.text, page, line.x, line.y, name.align())?;
        }

        if fitted.overflows {
            debug!(field = %name, size = fitted.font_size, "text overflows its rectangle");
        }
        debug!(field = %name, size = fitted.font_size, lines = fitted.lines.len(), "field drawn");

        report.drawn.push(DrawnField {
            name,
            font_size: fitted.font_size,
            lines: fitted.lines,
            overflows: fitted.overflows,
        });
        Ok(())
    }

    fn missing_rect(
        &self,
        name: FieldName,
        report: &mut FillReport,
    ) -> std::result::Result<(), FillError> {
        match self.options.missing_rect {
            MissingRect::Skip => {
                warn!(field = %name, "no rectangle for field, skipping");
                report.skipped_fields.push(name);
                Ok(())
            }
            MissingRect::Error => Err(FillError::MissingRect(name)),
        }
    }

    fn append_attachments(
        &self,
        doc: &mut PdfDocument,
        form: &FormState,
        report: &mut FillReport,
    ) -> std::result::Result<(), FillError> {
        let (page_width, page_height) = doc.page_size(self.catalogue.page())?;

        for slot in AttachmentSlot::ORDER {
            for attachment in form.attachments(slot) {
                match attachment.kind() {
                    AttachmentKind::Image(kind) => {
                        let page = doc.add_blank_page(page_width, page_height)?;
                        let dims = get_dimensions(&attachment.bytes)?;
                        let (x, y, width, height) = fit_centered(
                            dims.width,
                            dims.height,
                            0.0,
                            0.0,
                            page_width,
                            page_height,
                        );
                        doc.insert_image(&attachment.bytes, page, x, y, width, height)?;
                        report.appended_pages += 1;
                        debug!(%slot, file = %attachment.file_name, ?kind, page, "image page appended");
                    }
                    AttachmentKind::Document => {
                        let added = doc.append_pages(&attachment.bytes, self.options.page_selection)?;
                        report.appended_pages += added;
                        debug!(%slot, file = %attachment.file_name, pages = added, "document pages appended");
                    }
                    AttachmentKind::Unknown => {
                        error!(%slot, file = %attachment.file_name, "unsupported attachment type, skipping");
                        report.skipped_attachments.push(SkippedAttachment {
                            slot,
                            file_name: attachment.file_name.clone(),
                            reason: "unsupported file type".to_string(),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

/// Text drawn for a static field
///
/// Dates are normalized to DD/MM/YYYY; the total is computed from the items.
fn static_value(kind: FieldKind, form: &FormState) -> String {
    match kind {
        FieldKind::Total => form.total().to_string(),
        FieldKind::Date => {
            let raw = form.field(StaticField::Date);
            parse_date(raw)
                .map(|date| date.format("%d/%m/%Y").to_string())
                .unwrap_or_else(|| raw.to_string())
        }
        _ => kind
            .static_field()
            .map(|field| form.field(field).to_string())
            .unwrap_or_default(),
    }
}
