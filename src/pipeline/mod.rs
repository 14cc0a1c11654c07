//! Document processing pipeline.
//!
//! ```text
//! RawUpload → intake → Document → JobCoordinator → ExtractionBackend
//!                                      ↑
//!                         BatchProcessor / WorkflowExecutor
//! ```

pub mod extraction;
pub mod intake;
pub mod jobs;
pub mod batch;
pub mod workflow;
