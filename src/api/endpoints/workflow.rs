//! `POST /api/workflow/execute`: run a declared workflow.
//!
//! A definition that fails validation is a 400 before any step runs. A run
//! that stops on a failed step is reported with 422 and the steps recorded
//! so far.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::pipeline::workflow::{WorkflowDefinition, WorkflowExecutor, WorkflowRun};

#[derive(Deserialize)]
pub struct ExecuteRequest {
    #[serde(default)]
    pub workflow: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct RunResponse {
    success: bool,
    #[serde(flatten)]
    run: WorkflowRun,
}

pub async fn execute(
    State(ctx): State<ApiContext>,
    payload: Result<Json<ExecuteRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let definition =
        WorkflowDefinition::from_value(request.workflow, ctx.config.max_upload_bytes)?;

    let run = WorkflowExecutor::new(&ctx.coordinator)
        .execute(definition)
        .await;

    let status = if run.is_completed() {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    let body = RunResponse {
        success: run.is_completed(),
        run,
    };
    Ok((status, Json(body)).into_response())
}
