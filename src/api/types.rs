//! Shared types for the HTTP API layer.

use std::sync::Arc;

use serde::Serialize;

use crate::config::ServiceConfig;
use crate::pipeline::extraction::{ExtractionBackend, SimulatedBackend, SimulatedTimings};
use crate::pipeline::intake::IntakeLimits;
use crate::pipeline::jobs::JobCoordinator;

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
/// Cheap to clone; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct ApiContext {
    pub config: Arc<ServiceConfig>,
    pub coordinator: Arc<JobCoordinator>,
}

impl ApiContext {
    pub fn new(config: ServiceConfig, backend: Arc<dyn ExtractionBackend>) -> Self {
        let coordinator = JobCoordinator::new(backend, &config);
        Self {
            config: Arc::new(config),
            coordinator: Arc::new(coordinator),
        }
    }

    /// Context backed by the bundled simulated backend.
    pub fn simulated(config: ServiceConfig) -> Self {
        let backend = Arc::new(SimulatedBackend::new(SimulatedTimings::from(&config)));
        Self::new(config, backend)
    }

    pub fn intake_limits(&self) -> IntakeLimits {
        IntakeLimits::new(self.config.max_upload_bytes)
    }
}

// ═══════════════════════════════════════════════════════════
// Response bodies
// ═══════════════════════════════════════════════════════════

/// Wraps a payload with `success: true`, flattening its fields.
#[derive(Debug, Serialize)]
pub struct Success<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
}

impl<T: Serialize> Success<T> {
    pub fn new(body: T) -> Self {
        Self {
            success: true,
            body,
        }
    }
}
