//! WASM bindings for the reimbursement form filler
//!
//! This crate provides a JavaScript-friendly session object for:
//! - Editing form fields, line items and attachments
//! - Generating the filled PDF
//! - Previewing it inline and offering it as a download
//!
//! # Example (JavaScript)
//!
//! ```javascript
//! import init, { ReimbursementSession } from 'reimburse-wasm';
//!
//! await init();
//!
//! const template = new Uint8Array(await (await fetch('template.pdf')).arrayBuffer());
//! const session = new ReimbursementSession(template);
//!
//! session.setField('name', 'Grace Hopper');
//! session.addItem('Pens', 'Operations', '12.50');
//! session.addAttachment('receipts', file.name, new Uint8Array(await file.arrayBuffer()));
//!
//! try {
//!   session.generate();
//!   iframe.src = session.previewDataUri();
//!   link.href = session.downloadUrl();
//!   link.download = session.downloadName();
//! } catch (message) {
//!   alert(message);
//! }
//! ```

use std::fmt::Display;
use std::str::FromStr;

use form::{Attachment, AttachmentSlot, Category, FormState, LineItem, StaticField};
use template::{Catalogue, FillEngine, FillOptions, GeneratedDocument, Session};
use wasm_bindgen::prelude::*;

// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn js_error(err: impl Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// One reimbursement form and its generated PDF
#[wasm_bindgen]
pub struct ReimbursementSession {
    inner: Session,
}

#[wasm_bindgen]
impl ReimbursementSession {
    /// Create a session over the template PDF with default options
    ///
    /// @param template - Template PDF bytes (Uint8Array)
    #[wasm_bindgen(constructor)]
    pub fn new(template: &[u8]) -> Result<ReimbursementSession, JsValue> {
        let inner = Session::new(template.to_vec()).map_err(js_error)?;
        Ok(ReimbursementSession { inner })
    }

    /// Create a session with fill options and an optional catalogue override
    ///
    /// @param template - Template PDF bytes (Uint8Array)
    /// @param options - FillOptions object (camelCase keys)
    /// @param catalogueJson - Rectangle catalogue JSON, or undefined for the built-in one
    #[wasm_bindgen(js_name = withOptions)]
    pub fn with_options(
        template: &[u8],
        options: JsValue,
        catalogue_json: Option<String>,
    ) -> Result<ReimbursementSession, JsValue> {
        let options: FillOptions = if options.is_undefined() || options.is_null() {
            FillOptions::default()
        } else {
            serde_wasm_bindgen::from_value(options)?
        };
        let catalogue = match catalogue_json {
            Some(json) => Catalogue::from_json(&json),
            None => Catalogue::builtin(),
        }
        .map_err(js_error)?;

        let engine = FillEngine::new(catalogue, options);
        Ok(ReimbursementSession {
            inner: Session::with_engine(template.to_vec(), engine),
        })
    }

    /// Draw with a TrueType font instead of the built-in Helvetica
    ///
    /// @param data - TTF file bytes (Uint8Array)
    #[wasm_bindgen(js_name = loadFont)]
    pub fn load_font(&mut self, data: &[u8]) {
        let engine = self.inner.engine().clone().with_font(data.to_vec());
        self.inner.set_engine(engine);
    }

    /// Replace fields and line items from a form object
    ///
    /// Attachments are kept.
    ///
    /// @param form - `{ fields: {...}, items: [{ description, category, amount }] }`
    #[wasm_bindgen(js_name = setForm)]
    pub fn set_form(&mut self, form: JsValue) -> Result<(), JsValue> {
        let incoming: FormState = serde_wasm_bindgen::from_value(form)?;

        let form = self.inner.form_mut();
        for field in StaticField::ALL {
            form.set_field(field, incoming.field(field));
        }
        *form.items_mut() = incoming.items().clone();
        Ok(())
    }

    /// Current fields and line items as a plain object
    #[wasm_bindgen(js_name = getForm)]
    pub fn get_form(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(self.inner.form())?)
    }

    /// @param name - Field name, e.g. "name", "studentNumber", "Confirm Email"
    #[wasm_bindgen(js_name = setField)]
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<(), JsValue> {
        let field = StaticField::from_str(name).map_err(js_error)?;
        self.inner.form_mut().set_field(field, value);
        Ok(())
    }

    #[wasm_bindgen(js_name = getField)]
    pub fn get_field(&self, name: &str) -> Result<String, JsValue> {
        let field = StaticField::from_str(name).map_err(js_error)?;
        Ok(self.inner.form().field(field).to_string())
    }

    /// Append a line item
    ///
    /// @returns Number of items after the append
    #[wasm_bindgen(js_name = addItem)]
    pub fn add_item(
        &mut self,
        description: &str,
        category: &str,
        amount: &str,
    ) -> Result<usize, JsValue> {
        let category = Category::from_str(category).map_err(js_error)?;
        let items = self.inner.form_mut().items_mut();
        items
            .push(LineItem::new(description, category, amount))
            .map_err(js_error)?;
        Ok(items.len())
    }

    /// Replace the line item at `index` (0-based)
    #[wasm_bindgen(js_name = setItem)]
    pub fn set_item(
        &mut self,
        index: usize,
        description: &str,
        category: &str,
        amount: &str,
    ) -> Result<(), JsValue> {
        let category = Category::from_str(category).map_err(js_error)?;
        let item = self
            .inner
            .form_mut()
            .items_mut()
            .get_mut(index)
            .ok_or_else(|| js_error(form::FormError::NoSuchItem(index)))?;
        *item = LineItem::new(description, category, amount);
        Ok(())
    }

    /// Remove the line item at `index` (0-based)
    #[wasm_bindgen(js_name = removeItem)]
    pub fn remove_item(&mut self, index: usize) -> Result<(), JsValue> {
        self.inner
            .form_mut()
            .items_mut()
            .remove(index)
            .map_err(js_error)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = itemCount)]
    pub fn item_count(&self) -> usize {
        self.inner.form().items().len()
    }

    /// Sum of all parseable amounts, e.g. "12.50"
    pub fn total(&self) -> String {
        self.inner.form().total().to_string()
    }

    /// Category labels in display order
    pub fn categories() -> Vec<JsValue> {
        Category::ALL
            .iter()
            .map(|category| JsValue::from_str(category.label()))
            .collect()
    }

    /// @param slot - "receipts" or "bankStatements"
    /// @param fileName - Original file name, kept for the report
    /// @param data - File bytes (Uint8Array)
    #[wasm_bindgen(js_name = addAttachment)]
    pub fn add_attachment(&mut self, slot: &str, file_name: &str, data: &[u8]) -> Result<(), JsValue> {
        let slot = AttachmentSlot::from_str(slot).map_err(js_error)?;
        self.inner
            .form_mut()
            .attach(slot, Attachment::new(file_name, data.to_vec()));
        Ok(())
    }

    #[wasm_bindgen(js_name = removeAttachment)]
    pub fn remove_attachment(&mut self, slot: &str, index: usize) -> Result<bool, JsValue> {
        let slot = AttachmentSlot::from_str(slot).map_err(js_error)?;
        Ok(self.inner.form_mut().detach(slot, index).is_some())
    }

    #[wasm_bindgen(js_name = clearAttachments)]
    pub fn clear_attachments(&mut self, slot: &str) -> Result<(), JsValue> {
        let slot = AttachmentSlot::from_str(slot).map_err(js_error)?;
        self.inner.form_mut().clear_attachments(slot);
        Ok(())
    }

    #[wasm_bindgen(js_name = attachmentCount)]
    pub fn attachment_count(&self, slot: &str) -> Result<usize, JsValue> {
        let slot = AttachmentSlot::from_str(slot).map_err(js_error)?;
        Ok(self.inner.form().attachments(slot).len())
    }

    /// Validate the form and fill the template
    ///
    /// Throws the single validation message when the form is incomplete.
    ///
    /// @returns PDF bytes (Uint8Array)
    pub fn generate(&mut self) -> Result<Vec<u8>, JsValue> {
        let output = self.inner.generate().map_err(js_error)?;
        Ok(output.bytes().to_vec())
    }

    /// "idle", "validating", "filling", "done" or "rejected"
    pub fn state(&self) -> String {
        self.inner.state().to_string()
    }

    /// Fill report of the latest output, or undefined
    pub fn report(&self) -> Result<JsValue, JsValue> {
        match self.inner.output() {
            Some(output) => Ok(serde_wasm_bindgen::to_value(output.report())?),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// `data:application/pdf;base64,...` of the latest output, or undefined
    #[wasm_bindgen(js_name = previewDataUri)]
    pub fn preview_data_uri(&self) -> Option<String> {
        self.inner.output().map(GeneratedDocument::data_uri)
    }

    /// Object URL of a PDF Blob holding the latest output
    ///
    /// The caller owns the URL and should revoke it when done.
    #[wasm_bindgen(js_name = downloadUrl)]
    pub fn download_url(&self) -> Result<String, JsValue> {
        let output = self
            .inner
            .output()
            .ok_or_else(|| JsValue::from_str("Nothing generated yet. Call generate() first."))?;

        let parts = js_sys::Array::of1(&js_sys::Uint8Array::from(output.bytes()));
        let options = web_sys::BlobPropertyBag::new();
        options.set_type(output.mime_type());
        let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;

        web_sys::Url::create_object_url_with_blob(&blob)
    }

    /// File name offered for download
    #[wasm_bindgen(js_name = downloadName)]
    pub fn download_name() -> String {
        GeneratedDocument::FILE_NAME.to_string()
    }
}
