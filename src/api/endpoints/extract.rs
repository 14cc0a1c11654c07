//! Document extraction endpoints.
//!
//! `POST /api/extract`: one file under `document`.
//! `POST /api/extract/batch`: up to 10 files under `documents`.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::multipart::{read_batch, read_single};
use crate::api::types::{ApiContext, Success};
use crate::pipeline::batch::{BatchProcessor, BatchResult};
use crate::pipeline::extraction::ExtractionResult;
use crate::pipeline::intake::{accept_batch, accept_single, parse_config, parse_document_type};

pub const DOCUMENT_FIELD: &str = "document";
pub const BATCH_FIELD: &str = "documents";

#[derive(Serialize)]
pub struct ExtractResponse {
    pub job_id: Uuid,
    #[serde(flatten)]
    pub result: ExtractionResult,
}

/// `POST /api/extract`: extract structured fields from one document.
pub async fn single(
    State(ctx): State<ApiContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Success<ExtractResponse>>, ApiError> {
    let mut multipart = multipart?;
    let limits = ctx.intake_limits();

    let form = read_single(&mut multipart, DOCUMENT_FIELD, &limits).await?;
    let document_type = parse_document_type(form.text("type"))?;
    let config = parse_config(form.text("config"))?;
    let document = accept_single(form.into_single(), DOCUMENT_FIELD, &limits)?;

    let job = ctx.coordinator.submit(document, document_type, config).await;
    let job_id = job.id;
    let result = job.into_outcome()?;

    Ok(Json(Success::new(ExtractResponse { job_id, result })))
}

/// `POST /api/extract/batch`: extract every document; per-file failures
/// are reported in place.
pub async fn batch(
    State(ctx): State<ApiContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Success<BatchResult>>, ApiError> {
    let mut multipart = multipart?;
    let limits = ctx.intake_limits();

    let form = read_batch(&mut multipart, BATCH_FIELD, &limits).await?;
    let document_type = parse_document_type(form.text("type"))?;
    let config = parse_config(form.text("config"))?;
    let items = accept_batch(form.files, BATCH_FIELD, &limits)?;

    let processor = BatchProcessor::new(&ctx.coordinator, ctx.config.max_concurrent_extractions);
    let result = processor.run(items, document_type, &config).await;

    Ok(Json(Success::new(result)))
}
