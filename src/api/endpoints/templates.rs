//! Template catalog endpoint.

use axum::extract::Path;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::templates::{self, Template};

#[derive(Serialize)]
pub struct TemplatesResponse {
    pub templates: &'static [Template],
}

/// `GET /api/templates`: the supported document types, in catalog order.
pub async fn list() -> Json<TemplatesResponse> {
    Json(TemplatesResponse {
        templates: templates::list(),
    })
}

#[derive(Serialize)]
pub struct TemplateResponse {
    pub success: bool,
    pub template: &'static Template,
}

/// `GET /api/templates/:id`: a single template.
pub async fn detail(Path(id): Path<String>) -> Result<Json<TemplateResponse>, ApiError> {
    templates::get(&id)
        .map(|template| {
            Json(TemplateResponse {
                success: true,
                template,
            })
        })
        .ok_or_else(|| ApiError::NotFound(format!("Template '{id}' not found")))
}
