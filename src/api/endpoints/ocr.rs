//! `POST /api/ocr`: plain text recognition for one image under `image`.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::multipart::read_single;
use crate::api::types::{ApiContext, Success};
use crate::pipeline::extraction::OcrOutput;
use crate::pipeline::intake::accept_single;

pub const IMAGE_FIELD: &str = "image";

pub async fn recognize(
    State(ctx): State<ApiContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Success<OcrOutput>>, ApiError> {
    let mut multipart = multipart?;
    let limits = ctx.intake_limits();

    let form = read_single(&mut multipart, IMAGE_FIELD, &limits).await?;
    let document = accept_single(form.into_single(), IMAGE_FIELD, &limits)?;

    let output = ctx.coordinator.recognize(document).await?;
    Ok(Json(Success::new(output)))
}
