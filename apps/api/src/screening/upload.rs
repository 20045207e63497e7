//! Upload validation. Checks run in a fixed order and the first failure wins:
//! file part present → filename non-empty → size ≤ 10 MiB → extension
//! whitelisted → declared content-type matches the extension.

use std::path::Path;

use bytes::Bytes;

use crate::errors::AppError;

/// 10 MiB, inclusive.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub const FILE_TOO_LARGE: &str = "File size exceeds 10MB limit";

const PDF_CONTENT_TYPE: &str = "application/pdf";
const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "pdf" => Some(DocumentKind::Pdf),
            "docx" => Some(DocumentKind::Docx),
            _ => None,
        }
    }

    pub fn expected_content_type(self) -> &'static str {
        match self {
            DocumentKind::Pdf => PDF_CONTENT_TYPE,
            DocumentKind::Docx => DOCX_CONTENT_TYPE,
        }
    }

    fn label(self) -> &'static str {
        match self {
            DocumentKind::Pdf => "PDF",
            DocumentKind::Docx => "DOCX",
        }
    }
}

/// A file part as received from the multipart form, before any checks.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadedDocument {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}

/// A document that passed every upload check. Only this type reaches extraction.
#[derive(Debug, Clone)]
pub struct ValidatedDocument {
    pub kind: DocumentKind,
    pub filename: String,
    pub bytes: Bytes,
}

pub fn validate_upload(upload: Option<UploadedDocument>) -> Result<ValidatedDocument, AppError> {
    let upload =
        upload.ok_or_else(|| AppError::Validation("No file part in the request".to_string()))?;

    if upload.filename.is_empty() {
        return Err(AppError::Validation("No selected file".to_string()));
    }

    if upload.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation(FILE_TOO_LARGE.to_string()));
    }

    let extension = Path::new(&upload.filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let kind = DocumentKind::from_extension(&extension).ok_or_else(|| {
        let shown = if extension.is_empty() {
            String::new()
        } else {
            format!(".{extension}")
        };
        AppError::Validation(format!(
            "File type {shown} not supported. Please use PDF or DOCX files."
        ))
    })?;

    if !upload
        .content_type
        .to_ascii_lowercase()
        .starts_with(kind.expected_content_type())
    {
        return Err(AppError::Validation(format!("Invalid {} file", kind.label())));
    }

    Ok(ValidatedDocument {
        kind,
        filename: upload.filename,
        bytes: upload.bytes,
    })
}
