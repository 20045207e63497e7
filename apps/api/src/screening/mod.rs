//! Upload screening: validation, text extraction, normalization, and
//! classification of a single document.
//!
//! Everything here is synchronous and CPU-bound; the request handler runs
//! [`screen`] on the blocking pool.

pub mod clean;
pub mod extract;
pub mod upload;

use tracing::info;

use crate::classifier::ClassifierPipeline;
use crate::errors::AppError;
use crate::models::result::ClassificationResult;
use crate::screening::upload::ValidatedDocument;

/// extract → clean → classify. Empty cleaned text is rejected before the
/// classifier sees it.
pub fn screen(
    document: &ValidatedDocument,
    pipeline: &ClassifierPipeline,
) -> Result<ClassificationResult, AppError> {
    let extracted_text = extract::extract(document)?;
    info!(chars = extracted_text.len(), "Extracted text");

    let cleaned_text = clean::clean(&extracted_text);
    info!(chars = cleaned_text.len(), "Cleaned text");
    if cleaned_text.is_empty() {
        return Err(AppError::EmptyContent);
    }

    let prediction = pipeline.classify(&cleaned_text);
    info!(
        code = prediction.code,
        predicted_role = prediction.label,
        "Classified resume"
    );

    Ok(ClassificationResult {
        code: prediction.code,
        predicted_role: prediction.label.to_string(),
        cleaned_text,
        extracted_text,
    })
}
