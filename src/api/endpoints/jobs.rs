//! `GET /api/jobs/:id`: status lookup for a retained extraction job.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::pipeline::jobs::ExtractionJob;

#[derive(Serialize)]
pub struct JobResponse {
    pub success: bool,
    pub job: ExtractionJob,
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<JobResponse>, ApiError> {
    let job_id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::Validation(format!("Invalid job id '{id}'")))?;

    let job = ctx
        .coordinator
        .job(&job_id)
        .ok_or_else(|| ApiError::NotFound(format!("Job {job_id} not found")))?;

    Ok(Json(JobResponse { success: true, job }))
}
