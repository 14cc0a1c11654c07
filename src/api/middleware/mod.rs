//! API middleware.
//!
//! Execution order (outermost → innermost):
//! 1. Access logger
//! 2. CORS, `Cache-Control: no-store`
//! 3. Body size limit

pub mod access_log;
