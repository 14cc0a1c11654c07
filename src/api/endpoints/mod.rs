//! API endpoint handlers.
//!
//! Handlers parse and validate the request, hand off to the pipeline and
//! shape the JSON response. No business logic lives here.

pub mod extract;
pub mod health;
pub mod jobs;
pub mod ocr;
pub mod templates;
pub mod workflow;
