//! Generate session
//!
//! Holds the form, the template bytes and at most one generated document.
//! `generate` is the only entry point into a fill.

use crate::engine::{FillEngine, FillReport};
use crate::{FillError, Result};
use form::FormState;
use pdf_core::{data_uri, PDF_MIME};
use serde::Serialize;
use std::fmt;
use tracing::info;

/// Where a session is in the generate cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FillState {
    #[default]
    Idle,
    Validating,
    Filling,
    /// A generated document is available
    Done,
    /// Last attempt failed validation
    Rejected,
}

impl FillState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FillState::Idle => "idle",
            FillState::Validating => "validating",
            FillState::Filling => "filling",
            FillState::Done => "done",
            FillState::Rejected => "rejected",
        }
    }
}

impl fmt::Display for FillState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of a successful fill
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedDocument {
    bytes: Vec<u8>,
    page_count: usize,
    report: FillReport,
}

impl GeneratedDocument {
    /// Download name offered to the user
    pub const FILE_NAME: &'static str = "generated.pdf";

    pub(crate) fn new(bytes: Vec<u8>, page_count: usize, report: FillReport) -> Self {
        Self {
            bytes,
            page_count,
            report,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// `data:application/pdf;base64,...` for inline preview
    pub fn data_uri(&self) -> String {
        data_uri(&self.bytes)
    }

    pub fn file_name(&self) -> &'static str {
        Self::FILE_NAME
    }

    pub fn mime_type(&self) -> &'static str {
        PDF_MIME
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn report(&self) -> &FillReport {
        &self.report
    }
}

/// One user's form and its latest output
pub struct Session {
    template: Vec<u8>,
    engine: FillEngine,
    form: FormState,
    state: FillState,
    output: Option<GeneratedDocument>,
}

impl Session {
    /// Session over `template` with the built-in catalogue and default options
    pub fn new(template: Vec<u8>) -> Result<Self> {
        Ok(Self::with_engine(template, FillEngine::builtin()?))
    }

    pub fn with_engine(template: Vec<u8>, engine: FillEngine) -> Self {
        Self {
            template,
            engine,
            form: FormState::new(),
            state: FillState::Idle,
            output: None,
        }
    }

    pub fn engine(&self) -> &FillEngine {
        &self.engine
    }

    /// Swap the engine, discarding any generated document
    pub fn set_engine(&mut self, engine: FillEngine) {
        self.discard_output();
        self.engine = engine;
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    /// Mutable access to the form
    ///
    /// Any previously generated document is discarded.
    pub fn form_mut(&mut self) -> &mut FormState {
        self.discard_output();
        &mut self.form
    }

    pub fn replace_form(&mut self, form: FormState) {
        self.discard_output();
        self.form = form;
    }

    pub fn state(&self) -> FillState {
        self.state
    }

    /// The latest generated document, if still current
    pub fn output(&self) -> Option<&GeneratedDocument> {
        self.output.as_ref()
    }

    /// Validate the form and fill the template
    ///
    /// Validation failure leaves the session `Rejected` with no output. A
    /// failure inside the fill returns the session to `Idle`.
    pub fn generate(&mut self) -> std::result::Result<&GeneratedDocument, FillError> {
        self.output = None;

        self.state = FillState::Validating;
        if let Err(err) = self.engine.validate(&self.form) {
            info!(problems = err.problems.len(), "generate rejected");
            self.state = FillState::Rejected;
            return Err(err.into());
        }

        self.state = FillState::Filling;
        match self.engine.fill(&self.template, &self.form) {
            Ok(document) => {
                self.state = FillState::Done;
                Ok(&*self.output.insert(document))
            }
            Err(err) => {
                self.state = FillState::Idle;
                Err(err)
            }
        }
    }

    fn discard_output(&mut self) {
        self.output = None;
        self.state = FillState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use form::{Category, LineItem, StaticField};
    use pretty_assertions::assert_eq;

    fn session() -> Session {
        Session::new(b"not a pdf".to_vec()).unwrap()
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = session();
        assert_eq!(session.state(), FillState::Idle);
        assert!(session.output().is_none());
        assert!(session.form().items().is_empty());
    }

    #[test]
    fn test_invalid_form_is_rejected() {
        let mut session = session();
        let err = session.generate().unwrap_err();

        assert!(matches!(err, FillError::Validation(_)));
        assert_eq!(session.state(), FillState::Rejected);
        assert_eq!(session.state().to_string(), "rejected");
        assert!(session.output().is_none());

        session.form_mut().set_field(StaticField::Name, "Ada");
        assert_eq!(session.state(), FillState::Idle);
    }

    #[test]
    fn test_bad_template_returns_to_idle() {
        let mut session = session();
        let form = session.form_mut();
        form.set_field(StaticField::Date, "2024-03-01");
        form.set_field(StaticField::Name, "Ada");
        form.set_field(StaticField::Email, "ada@example.edu");
        form.set_field(StaticField::Phone, "555-0100");
        form.set_field(StaticField::StudentNumber, "z1234567");
        form.items_mut()
            .push(LineItem::new("Pens", Category::Operations, "12.50"))
            .unwrap();

        let err = session.generate().unwrap_err();

        assert!(matches!(err, FillError::TemplateLoad(_)));
        assert_eq!(session.state(), FillState::Idle);
        assert!(session.output().is_none());
    }

    #[test]
    fn test_generated_document_surface() {
        let doc = GeneratedDocument::new(b"%PDF".to_vec(), 1, FillReport::default());
        assert_eq!(doc.file_name(), "generated.pdf");
        assert_eq!(doc.mime_type(), "application/pdf");
        assert_eq!(doc.data_uri(), "data:application/pdf;base64,JVBERg==");
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.into_bytes(), b"%PDF".to_vec());
    }
}
