//! Reimbursement Form Filler
//!
//! Fills the template PDF from a form snapshot JSON and appends receipt and
//! bank statement files.
//!
//! Usage:
//!   cargo run --example fill_form -- <template.pdf> <form.json> [options]
//!
//! Options:
//!   --receipt <file>     Attach a receipt (PNG, JPEG or PDF), repeatable
//!   --statement <file>   Attach a bank statement, repeatable
//!   --options <json>     FillOptions file
//!   --font <ttf>         Draw with a TrueType font instead of Helvetica
//!   --output <pdf>       Output path (default: generated.pdf)
//!
//! Example:
//!   RUST_LOG=debug cargo run --example fill_form -- template.pdf form.json --receipt pens.jpg

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use form::{Attachment, AttachmentSlot, FormState};
use template::{Catalogue, FillEngine, FillOptions, GeneratedDocument, Session};
use tracing_subscriber::EnvFilter;

fn read_attachment(path: &Path) -> Result<Attachment> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read '{}'", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("attachment")
        .to_string();
    Ok(Attachment::new(file_name, bytes))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!(
            "Usage: {} <template.pdf> <form.json> [--receipt FILE]... [--statement FILE]... [--options JSON] [--font TTF] [--output PDF]",
            args[0]
        );
        std::process::exit(1);
    }

    let template_path = &args[1];
    let form_path = &args[2];

    let mut attachments = Vec::new();
    let mut options_path = None;
    let mut font_path = None;
    let mut output_path = PathBuf::from(GeneratedDocument::FILE_NAME);

    let mut rest = args[3..].iter();
    while let Some(flag) = rest.next() {
        let Some(value) = rest.next() else {
            bail!("Missing value for '{flag}'");
        };
        match flag.as_str() {
            "--receipt" => attachments.push((AttachmentSlot::Receipts, PathBuf::from(value))),
            "--statement" => {
                attachments.push((AttachmentSlot::BankStatements, PathBuf::from(value)))
            }
            "--options" => options_path = Some(value.clone()),
            "--font" => font_path = Some(value.clone()),
            "--output" => output_path = PathBuf::from(value),
            other => bail!("Unknown option '{other}'"),
        }
    }

    let template_bytes = std::fs::read(template_path)
        .with_context(|| format!("Failed to read template '{template_path}'"))?;

    let form_json = std::fs::read_to_string(form_path)
        .with_context(|| format!("Failed to read form '{form_path}'"))?;
    let mut form: FormState = serde_json::from_str(&form_json)
        .with_context(|| format!("Invalid form snapshot '{form_path}'"))?;

    for (slot, path) in &attachments {
        form.attach(*slot, read_attachment(path)?);
    }

    let options = match &options_path {
        Some(path) => FillOptions::from_json(&std::fs::read_to_string(path)?)?,
        None => FillOptions::default(),
    };
    let mut engine = FillEngine::new(Catalogue::builtin()?, options);
    if let Some(path) = &font_path {
        engine = engine.with_font(std::fs::read(path)?);
    }

    let mut session = Session::with_engine(template_bytes, engine);
    session.replace_form(form);

    let output = session.generate()?;
    for skipped in &output.report().skipped_attachments {
        eprintln!("Skipped {} ({}): {}", skipped.file_name, skipped.slot, skipped.reason);
    }

    std::fs::write(&output_path, output.bytes())
        .with_context(|| format!("Failed to write '{}'", output_path.display()))?;

    println!(
        "Generated: {} ({} pages)",
        output_path.display(),
        output.page_count()
    );

    Ok(())
}
