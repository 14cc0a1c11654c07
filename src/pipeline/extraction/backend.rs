use async_trait::async_trait;

use super::types::{Document, DocumentType, ExtractionResult, JobConfig, OcrOutput};
use super::BackendError;

/// Extraction backend abstraction (allows swapping the simulated engine
/// for a real OCR/field-extraction service, and mocking in tests).
///
/// Implementations are cancelled by dropping the returned future; the job
/// coordinator does so when its timeout elapses or the client goes away.
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Extract the fields for `document_type` from `document`.
    async fn extract(
        &self,
        document: &Document,
        document_type: DocumentType,
        config: &JobConfig,
    ) -> Result<ExtractionResult, BackendError>;

    /// Recognize the raw text of an image or scanned page.
    async fn recognize_text(&self, document: &Document) -> Result<OcrOutput, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Verify the trait is object-safe (can be used as `dyn ExtractionBackend`)
    #[test]
    fn backend_is_object_safe() {
        fn _assert_backend(_: &dyn ExtractionBackend) {}
        fn _assert_shared(_: std::sync::Arc<dyn ExtractionBackend>) {}
    }
}
