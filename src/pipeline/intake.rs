//! Upload intake: validates buffered uploads before they become documents.
//!
//! Transport-agnostic: the HTTP layer streams multipart parts into
//! `RawUpload`s (stopping at the size limit) and hands them here. Nothing is
//! written to disk.

use thiserror::Error;

use crate::config::MAX_BATCH_DOCUMENTS;
use crate::pipeline::extraction::{Document, DocumentType, JobConfig};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntakeError {
    #[error("No file provided in field '{field}'")]
    MissingFile { field: String },

    #[error("File '{filename}' is empty")]
    EmptyFile { filename: String },

    #[error("File '{filename}' exceeds the {limit_bytes} byte upload limit")]
    FileTooLarge { filename: String, limit_bytes: u64 },

    #[error("Too many files: at most {max} documents per batch")]
    TooManyFiles { max: usize },

    #[error("Unsupported document type '{0}'; expected one of invoice, contract, medical, receipt")]
    UnknownDocumentType(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Malformed upload: {0}")]
    Malformed(String),
}

/// Size and count limits applied at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntakeLimits {
    pub max_file_bytes: u64,
    pub max_batch_documents: usize,
}

impl IntakeLimits {
    pub fn new(max_file_bytes: u64) -> Self {
        Self {
            max_file_bytes,
            max_batch_documents: MAX_BATCH_DOCUMENTS,
        }
    }
}

/// A file part as received, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawUpload {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    /// Set when the part grew past the per-file limit; `bytes` is then partial.
    pub exceeded_limit: bool,
}

/// A batch entry that failed validation. Reported per item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedUpload {
    pub filename: String,
    pub error: IntakeError,
}

pub type IntakeItem = Result<Document, RejectedUpload>;

/// Validate the single file of a single-document request.
pub fn accept_single(
    upload: Option<RawUpload>,
    field: &str,
    limits: &IntakeLimits,
) -> Result<Document, IntakeError> {
    let upload = upload.ok_or_else(|| IntakeError::MissingFile {
        field: field.to_string(),
    })?;
    validate_upload(upload, limits)
}

/// Validate every file of a batch independently.
///
/// Request-level failures: no files at all, or more than the batch maximum.
/// Anything else is recorded against the offending item only.
pub fn accept_batch(
    uploads: Vec<RawUpload>,
    field: &str,
    limits: &IntakeLimits,
) -> Result<Vec<IntakeItem>, IntakeError> {
    if uploads.is_empty() {
        return Err(IntakeError::MissingFile {
            field: field.to_string(),
        });
    }
    check_batch_count(uploads.len(), limits)?;

    Ok(uploads
        .into_iter()
        .map(|upload| {
            let filename = sanitize_filename(upload.filename.as_deref().unwrap_or(""));
            validate_upload(upload, limits).map_err(|error| RejectedUpload { filename, error })
        })
        .collect())
}

/// Fail as soon as a batch holds more files than allowed.
pub fn check_batch_count(count: usize, limits: &IntakeLimits) -> Result<(), IntakeError> {
    if count > limits.max_batch_documents {
        return Err(IntakeError::TooManyFiles {
            max: limits.max_batch_documents,
        });
    }
    Ok(())
}

/// Resolve the `type` form field. Absent or blank means invoice.
pub fn parse_document_type(raw: Option<&str>) -> Result<DocumentType, IntakeError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(DocumentType::default()),
        Some(value) => DocumentType::parse(value)
            .ok_or_else(|| IntakeError::UnknownDocumentType(value.to_string())),
    }
}

/// Resolve the `config` form field: a JSON object, or absent.
pub fn parse_config(raw: Option<&str>) -> Result<JobConfig, IntakeError> {
    let Some(text) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(JobConfig::new());
    };
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(IntakeError::InvalidConfig(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(IntakeError::InvalidConfig(e.to_string())),
    }
}

fn validate_upload(upload: RawUpload, limits: &IntakeLimits) -> Result<Document, IntakeError> {
    let filename = sanitize_filename(upload.filename.as_deref().unwrap_or(""));

    if upload.exceeded_limit || upload.bytes.len() as u64 > limits.max_file_bytes {
        return Err(IntakeError::FileTooLarge {
            filename,
            limit_bytes: limits.max_file_bytes,
        });
    }
    if upload.bytes.is_empty() {
        return Err(IntakeError::EmptyFile { filename });
    }

    let mime_type = resolve_mime(upload.content_type.as_deref(), &filename, &upload.bytes);
    Ok(Document::new(filename, mime_type, upload.bytes))
}

/// Declared content type, else magic bytes, else the filename extension.
pub fn resolve_mime(declared: Option<&str>, filename: &str, bytes: &[u8]) -> String {
    if let Some(declared) = declared
        .map(str::trim)
        .filter(|m| !m.is_empty() && *m != "application/octet-stream")
    {
        return declared.to_string();
    }

    let detected = detect_mime_from_bytes(bytes);
    if detected != "application/octet-stream" {
        return detected;
    }

    mime_guess::from_path(filename)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or(detected)
}

/// Detect MIME type from file magic bytes (not extension or Content-Type header).
pub fn detect_mime_from_bytes(bytes: &[u8]) -> String {
    if bytes.len() < 4 {
        return "application/octet-stream".into();
    }

    // JPEG: FF D8 FF
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return "image/jpeg".into();
    }
    // PNG: 89 50 4E 47
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        return "image/png".into();
    }
    // PDF: %PDF
    if bytes.starts_with(b"%PDF") {
        return "application/pdf".into();
    }
    // TIFF: II*\0 or MM\0*
    if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
        return "image/tiff".into();
    }
    // WebP: RIFF....WEBP
    if bytes.len() >= 12 && bytes[..4] == *b"RIFF" && bytes[8..12] == *b"WEBP" {
        return "image/webp".into();
    }
    // HEIF/HEIC: ....ftyp at offset 4
    if bytes.len() >= 12 && bytes[4..8] == *b"ftyp" {
        if let Ok(brand) = std::str::from_utf8(&bytes[8..12]) {
            if brand.starts_with("heic") || brand.starts_with("heix") || brand.starts_with("mif1") {
                return "image/heic".into();
            }
        }
    }

    "application/octet-stream".into()
}

/// Sanitize a filename. Removes path traversal and special characters.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .filter(|&c| c != '/' && c != '\\' && c != '\0')
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let sanitized = sanitized.replace("..", "");

    let sanitized: String = sanitized.chars().take(100).collect();

    if sanitized.is_empty() {
        "document".into()
    } else {
        sanitized
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
