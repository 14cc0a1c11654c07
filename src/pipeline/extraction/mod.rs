pub mod types;
pub mod confidence;
pub mod backend;
pub mod samples;
pub mod simulated;

pub use types::*;
pub use confidence::*;
pub use backend::*;
pub use simulated::{SimulatedBackend, SimulatedTimings};

use thiserror::Error;

/// Failures reported by an extraction backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Extraction failed: {0}")]
    Failed(String),
}
