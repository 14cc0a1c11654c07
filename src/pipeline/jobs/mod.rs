//! Extraction job tracking.
//!
//! ```text
//! Document → JobCoordinator::submit → ExtractionBackend (under timeout) → ExtractionJob
//! ```

pub mod types;
pub mod store;
pub mod coordinator;

pub use types::*;
pub use store::JobStore;
pub use coordinator::JobCoordinator;

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error("Invalid transition for job {job_id}: {from} -> {to}")]
    InvalidTransition {
        job_id: Uuid,
        from: JobStatus,
        to: JobStatus,
    },
}
