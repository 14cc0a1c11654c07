//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.

use axum::extract::DefaultBodyLimit;
use axum::http::header::{HeaderValue, CACHE_CONTROL};
use axum::http::Uri;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::error::ApiError;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Build the API router.
///
/// Layers are applied from bottom (innermost) to top (outermost):
///   Access log (outermost) → Cache-Control → CORS → Body limit → Handler
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn api_router(ctx: ApiContext) -> Router {
    let body_limit = ctx.config.body_limit();

    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/extract", post(endpoints::extract::single))
        .route("/extract/batch", post(endpoints::extract::batch))
        .route("/ocr", post(endpoints::ocr::recognize))
        .route("/templates", get(endpoints::templates::list))
        .route("/templates/:id", get(endpoints::templates::detail))
        .route("/workflow/execute", post(endpoints::workflow::execute))
        .route("/jobs/:id", get(endpoints::jobs::detail))
        .with_state(ctx);

    Router::new()
        .nest("/api", api)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(axum::middleware::from_fn(middleware::access_log::log_access))
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}
