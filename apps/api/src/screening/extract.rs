//! Text extraction from validated uploads. No OCR: image-only PDFs come back
//! empty, which the caller treats as empty content rather than a failure.

use std::panic::{self, AssertUnwindSafe};

use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use tracing::debug;

use crate::errors::AppError;
use crate::screening::upload::{DocumentKind, ValidatedDocument};

/// Extracts plain text from a validated document. CPU-bound; call from a
/// blocking context.
pub fn extract(document: &ValidatedDocument) -> Result<String, AppError> {
    let text = match document.kind {
        DocumentKind::Pdf => extract_pdf(&document.bytes)?,
        DocumentKind::Docx => extract_docx(&document.bytes)?,
    };
    debug!(
        filename = %document.filename,
        chars = text.len(),
        "Extracted text"
    );
    Ok(text)
}

/// Concatenates page text in document order.
fn extract_pdf(bytes: &[u8]) -> Result<String, AppError> {
    // pdf-extract can panic on malformed streams instead of returning an error.
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(bytes)
    }));

    match outcome {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(AppError::Extraction(format!(
            "Error: could not read PDF document: {e}"
        ))),
        Err(_) => Err(AppError::Extraction(
            "Error: could not read PDF document: parser aborted on malformed input".to_string(),
        )),
    }
}

/// Joins paragraph text with newlines, in document order.
fn extract_docx(bytes: &[u8]) -> Result<String, AppError> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| {
        AppError::Extraction(format!("Error: could not read DOCX document: {e:?}"))
    })?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(paragraph) => Some(paragraph_text(paragraph)),
            _ => None,
        })
        .collect();

    Ok(paragraphs.join("\n"))
}

fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                if let RunChild::Text(t) = run_child {
                    text.push_str(&t.text);
                }
            }
        }
    }
    text
}
