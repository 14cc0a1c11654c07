//! Streaming multipart reader.
//!
//! Reads file parts chunk by chunk, stops buffering a part as soon as it
//! passes the per-file limit, and collects text fields. Validation of the
//! collected parts happens in `pipeline::intake`.

use std::collections::HashMap;

use axum::extract::multipart::Field;
use axum::extract::Multipart;

use crate::api::error::ApiError;
use crate::pipeline::intake::{check_batch_count, IntakeError, IntakeLimits, RawUpload};

/// Text fields are small JSON or identifiers.
const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

/// Parts of a multipart request relevant to extraction.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub files: Vec<RawUpload>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// The only file of a single-file form.
    pub fn into_single(mut self) -> Option<RawUpload> {
        self.files.pop()
    }
}

/// Read a form carrying exactly one file under `file_field`.
pub async fn read_single(
    multipart: &mut Multipart,
    file_field: &str,
    limits: &IntakeLimits,
) -> Result<UploadForm, ApiError> {
    read_form(multipart, file_field, limits, |form| {
        if form.files.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(format!(
                "Only one file is accepted in field '{file_field}'"
            )))
        }
    })
    .await
}

/// Read a form carrying up to `limits.max_batch_documents` files under
/// `file_field`. One file too many fails the whole request.
pub async fn read_batch(
    multipart: &mut Multipart,
    file_field: &str,
    limits: &IntakeLimits,
) -> Result<UploadForm, ApiError> {
    read_form(multipart, file_field, limits, |form| {
        check_batch_count(form.files.len() + 1, limits).map_err(ApiError::from)
    })
    .await
}

async fn read_form<F>(
    multipart: &mut Multipart,
    file_field: &str,
    limits: &IntakeLimits,
    admit_file: F,
) -> Result<UploadForm, ApiError>
where
    F: Fn(&UploadForm) -> Result<(), ApiError>,
{
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name == file_field {
            admit_file(&form)?;
            let upload = read_file(field, limits.max_file_bytes).await?;
            form.files.push(upload);
        } else if field.file_name().is_some() {
            tracing::debug!(field = %name, "Ignoring file in unexpected field");
        } else if !name.is_empty() {
            let value = read_text(field, &name).await?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

async fn read_file(mut field: Field<'_>, max_bytes: u64) -> Result<RawUpload, ApiError> {
    let filename = field.file_name().map(str::to_string);
    let content_type = field.content_type().map(str::to_string);

    let mut bytes = Vec::new();
    let mut exceeded_limit = false;
    while let Some(chunk) = field.chunk().await? {
        if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
            exceeded_limit = true;
            bytes = Vec::new();
            break;
        }
        bytes.extend_from_slice(&chunk);
    }

    if exceeded_limit {
        tracing::debug!(
            filename = filename.as_deref().unwrap_or(""),
            limit = max_bytes,
            "Upload exceeded size limit"
        );
    }

    Ok(RawUpload {
        filename,
        content_type,
        bytes,
        exceeded_limit,
    })
}

async fn read_text(mut field: Field<'_>, name: &str) -> Result<String, ApiError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await? {
        if bytes.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
            return Err(ApiError::Validation(format!(
                "Form field '{name}' exceeds {MAX_TEXT_FIELD_BYTES} bytes"
            )));
        }
        bytes.extend_from_slice(&chunk);
    }
    String::from_utf8(bytes).map_err(|_| {
        IntakeError::Malformed(format!("form field '{name}' is not valid UTF-8")).into()
    })
}
