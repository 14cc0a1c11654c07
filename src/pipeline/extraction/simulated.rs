//! Simulated extraction backend.
//!
//! Stands in for a real OCR/field-extraction engine: waits a fixed delay,
//! then returns the canned payload for the requested document type. Output
//! is deterministic apart from the measured duration.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::backend::ExtractionBackend;
use super::samples;
use super::types::{Document, DocumentType, ExtractionResult, JobConfig, OcrOutput};
use super::BackendError;
use crate::config::ServiceConfig;

/// Config key that makes the simulated backend fail (exercises failure paths).
pub const SIMULATE_FAILURE_KEY: &str = "simulate_failure";

/// Artificial latencies of the simulated backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedTimings {
    pub extract_delay: Duration,
    pub ocr_delay: Duration,
}

impl SimulatedTimings {
    /// No artificial delay (tests).
    pub fn instant() -> Self {
        Self {
            extract_delay: Duration::ZERO,
            ocr_delay: Duration::ZERO,
        }
    }
}

impl From<&ServiceConfig> for SimulatedTimings {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            extract_delay: config.extract_delay,
            ocr_delay: config.ocr_delay,
        }
    }
}

pub struct SimulatedBackend {
    timings: SimulatedTimings,
}

impl SimulatedBackend {
    pub fn new(timings: SimulatedTimings) -> Self {
        Self { timings }
    }
}

#[async_trait]
impl ExtractionBackend for SimulatedBackend {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn extract(
        &self,
        document: &Document,
        document_type: DocumentType,
        config: &JobConfig,
    ) -> Result<ExtractionResult, BackendError> {
        let start = Instant::now();

        if document.is_empty() {
            return Err(empty_input(document));
        }

        if config
            .get(SIMULATE_FAILURE_KEY)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
        {
            return Err(BackendError::Failed(format!(
                "simulated failure for {}",
                document.filename
            )));
        }

        tokio::time::sleep(self.timings.extract_delay).await;

        let (fields, confidence) = samples::for_type(document_type);

        tracing::debug!(
            filename = %document.filename,
            document_type = document_type.as_str(),
            size = document.size(),
            "Simulated extraction complete"
        );

        Ok(ExtractionResult {
            document_type,
            fields,
            confidence,
            duration: start.elapsed(),
        })
    }

    async fn recognize_text(&self, document: &Document) -> Result<OcrOutput, BackendError> {
        if document.is_empty() {
            return Err(empty_input(document));
        }

        tokio::time::sleep(self.timings.ocr_delay).await;

        tracing::debug!(
            filename = %document.filename,
            size = document.size(),
            "Simulated OCR complete"
        );

        Ok(OcrOutput {
            text: samples::OCR_TEXT.to_string(),
            confidence: samples::OCR_CONFIDENCE,
        })
    }
}

fn empty_input(document: &Document) -> BackendError {
    BackendError::MalformedInput(format!("document '{}' has no content", document.filename))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::new("invoice.pdf", "application/pdf", b"%PDF-1.4".to_vec())
    }

    #[tokio::test]
    async fn extract_returns_requested_type() {
        let backend = SimulatedBackend::new(SimulatedTimings::instant());
        let result = backend
            .extract(&doc(), DocumentType::Contract, &JobConfig::new())
            .await
            .unwrap();
        assert_eq!(result.document_type, DocumentType::Contract);
        assert_eq!(result.fields.document_type(), DocumentType::Contract);
        assert!((result.confidence - 0.94).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn extract_honors_failure_flag() {
        let backend = SimulatedBackend::new(SimulatedTimings::instant());
        let mut config = JobConfig::new();
        config.insert(SIMULATE_FAILURE_KEY.into(), serde_json::Value::Bool(true));
        let err = backend
            .extract(&doc(), DocumentType::Invoice, &config)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Failed(_)));
    }

    #[tokio::test]
    async fn empty_document_is_malformed_input() {
        let backend = SimulatedBackend::new(SimulatedTimings::instant());
        let empty = Document::new("blank.pdf", "application/pdf", Vec::new());

        let err = backend
            .extract(&empty, DocumentType::Invoice, &JobConfig::new())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            BackendError::MalformedInput("document 'blank.pdf' has no content".into())
        );
        assert_eq!(err.to_string(), "Malformed input: document 'blank.pdf' has no content");

        let err = backend.recognize_text(&empty).await.unwrap_err();
        assert!(matches!(err, BackendError::MalformedInput(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn extract_waits_configured_delay() {
        let backend = SimulatedBackend::new(SimulatedTimings {
            extract_delay: Duration::from_millis(1000),
            ocr_delay: Duration::ZERO,
        });
        let result = backend
            .extract(&doc(), DocumentType::Invoice, &JobConfig::new())
            .await
            .unwrap();
        assert!(result.duration >= Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn ocr_returns_sample_text() {
        let backend = SimulatedBackend::new(SimulatedTimings::instant());
        let output = backend.recognize_text(&doc()).await.unwrap();
        assert_eq!(output.text, "Sample OCR extracted text from the image...");
        assert!((output.confidence - 0.95).abs() < f32::EPSILON);
    }

    #[test]
    fn timings_from_service_config() {
        let config = ServiceConfig::default();
        let timings = SimulatedTimings::from(&config);
        assert_eq!(timings.extract_delay, Duration::from_millis(1000));
        assert_eq!(timings.ocr_delay, Duration::from_millis(800));
    }
}
