//! BatchProcessor: runs every document of a batch request.
//!
//! Items are submitted with bounded concurrency; results come back in input
//! order. One item failing (at intake or in the backend) never affects the
//! others.

use std::time::Instant;

use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use uuid::Uuid;

use super::extraction::{DocumentType, ExtractionResult, JobConfig};
use super::intake::IntakeItem;
use super::jobs::JobCoordinator;

/// Outcome for one document of a batch. Serialized as a response entry.
#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    /// Positional id: `doc-1`, `doc-2`, …
    pub id: String,
    pub filename: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<Uuid>,
    #[serde(flatten)]
    pub result: Option<ExtractionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchItem {
    fn position_id(index: usize) -> String {
        format!("doc-{}", index + 1)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub count: usize,
    pub results: Vec<BatchItem>,
}

impl BatchResult {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|item| item.success).count()
    }

    pub fn failed(&self) -> usize {
        self.count - self.succeeded()
    }
}

pub struct BatchProcessor<'a> {
    coordinator: &'a JobCoordinator,
    max_concurrency: usize,
}

impl<'a> BatchProcessor<'a> {
    pub fn new(coordinator: &'a JobCoordinator, max_concurrency: usize) -> Self {
        Self {
            coordinator,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Extract every accepted item; rejected items pass straight through
    /// as failures.
    pub async fn run(
        &self,
        items: Vec<IntakeItem>,
        document_type: DocumentType,
        config: &JobConfig,
    ) -> BatchResult {
        let start = Instant::now();
        let coordinator = self.coordinator;

        let results: Vec<BatchItem> = stream::iter(items.into_iter().enumerate())
            .map(|(index, item)| {
                let config = config.clone();
                async move {
                    let id = BatchItem::position_id(index);
                    match item {
                        Err(rejected) => BatchItem {
                            id,
                            filename: rejected.filename,
                            success: false,
                            job_id: None,
                            result: None,
                            error: Some(rejected.error.to_string()),
                        },
                        Ok(document) => {
                            let filename = document.filename.clone();
                            let job = coordinator.submit(document, document_type, config).await;
                            let job_id = Some(job.id);
                            match job.into_outcome() {
                                Ok(result) => BatchItem {
                                    id,
                                    filename,
                                    success: true,
                                    job_id,
                                    result: Some(result),
                                    error: None,
                                },
                                Err(failure) => BatchItem {
                                    id,
                                    filename,
                                    success: false,
                                    job_id,
                                    result: None,
                                    error: Some(failure.message),
                                },
                            }
                        }
                    }
                }
            })
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let batch = BatchResult {
            count: results.len(),
            results,
        };
        tracing::info!(
            count = batch.count,
            succeeded = batch.succeeded(),
            failed = batch.failed(),
            document_type = document_type.as_str(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Batch extraction complete"
        );
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extraction::{
        samples, BackendError, Document, ExtractionBackend, OcrOutput, SimulatedBackend,
        SimulatedTimings,
    };
    use crate::pipeline::intake::{IntakeError, RejectedUpload};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn coordinator() -> JobCoordinator {
        JobCoordinator::with_limits(
            Arc::new(SimulatedBackend::new(SimulatedTimings::instant())),
            Duration::from_secs(5),
            64,
        )
    }

    fn doc(name: &str) -> IntakeItem {
        Ok(Document::new(name, "application/pdf", b"%PDF-1.7".to_vec()))
    }

    /// Delays by filename length so later items finish first; records the
    /// peak number of concurrent calls.
    struct SkewedBackend {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl ExtractionBackend for SkewedBackend {
        fn name(&self) -> &'static str {
            "skewed"
        }

        async fn extract(
            &self,
            document: &Document,
            document_type: DocumentType,
            _config: &JobConfig,
        ) -> Result<ExtractionResult, BackendError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            let delay = Duration::from_millis(200 / document.filename.len() as u64);
            tokio::time::sleep(delay).await;
            self.active.fetch_sub(1, Ordering::SeqCst);

            if document.filename.starts_with("bad") {
                return Err(BackendError::Failed("unreadable scan".into()));
            }
            let (fields, confidence) = samples::for_type(document_type);
            Ok(ExtractionResult {
                document_type,
                fields,
                confidence,
                duration: delay,
            })
        }

        async fn recognize_text(&self, _document: &Document) -> Result<OcrOutput, BackendError> {
            Err(BackendError::Failed("not used".into()))
        }
    }

    #[tokio::test]
    async fn results_keep_input_order_and_ids() {
        let coordinator = coordinator();
        let processor = BatchProcessor::new(&coordinator, 4);
        let batch = processor
            .run(
                vec![doc("a.pdf"), doc("b.pdf"), doc("c.pdf")],
                DocumentType::Receipt,
                &JobConfig::new(),
            )
            .await;

        assert_eq!(batch.count, 3);
        let ids: Vec<_> = batch.results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["doc-1", "doc-2", "doc-3"]);
        let names: Vec<_> = batch.results.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, ["a.pdf", "b.pdf", "c.pdf"]);
        assert!(batch.results.iter().all(|r| r.success && r.job_id.is_some()));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrency_is_bounded_and_order_preserved() {
        let backend = Arc::new(SkewedBackend {
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let coordinator =
            JobCoordinator::with_limits(backend.clone(), Duration::from_secs(5), 64);
        let processor = BatchProcessor::new(&coordinator, 2);

        let items = vec![
            doc("a.pdf"),
            doc("bb.pdf"),
            doc("ccc.pdf"),
            doc("dddd.pdf"),
            doc("eeeee.pdf"),
        ];
        let batch = processor
            .run(items, DocumentType::Invoice, &JobConfig::new())
            .await;

        assert!(backend.peak.load(Ordering::SeqCst) <= 2);
        let names: Vec<_> = batch.results.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, ["a.pdf", "bb.pdf", "ccc.pdf", "dddd.pdf", "eeeee.pdf"]);
    }

    #[tokio::test]
    async fn one_failure_does_not_affect_siblings() {
        let backend = Arc::new(SkewedBackend {
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let coordinator = JobCoordinator::with_limits(backend, Duration::from_secs(5), 64);
        let processor = BatchProcessor::new(&coordinator, 3);

        let batch = processor
            .run(
                vec![doc("one.pdf"), doc("bad.pdf"), doc("three.pdf")],
                DocumentType::Invoice,
                &JobConfig::new(),
            )
            .await;

        assert!(batch.results[0].success);
        assert!(!batch.results[1].success);
        assert_eq!(batch.results[1].error.as_deref(), Some("Extraction failed: unreadable scan"));
        assert!(batch.results[1].job_id.is_some());
        assert!(batch.results[2].success);
        assert_eq!(batch.failed(), 1);
    }

    #[tokio::test]
    async fn rejected_uploads_reported_in_place() {
        let coordinator = coordinator();
        let processor = BatchProcessor::new(&coordinator, 2);
        let rejected: IntakeItem = Err(RejectedUpload {
            filename: "empty.pdf".into(),
            error: IntakeError::EmptyFile {
                filename: "empty.pdf".into(),
            },
        });

        let batch = processor
            .run(
                vec![doc("a.pdf"), rejected],
                DocumentType::Invoice,
                &JobConfig::new(),
            )
            .await;

        assert!(batch.results[0].success);
        let item = &batch.results[1];
        assert_eq!(item.id, "doc-2");
        assert!(!item.success);
        assert!(item.job_id.is_none());
        assert_eq!(item.error.as_deref(), Some("File 'empty.pdf' is empty"));
    }

    #[tokio::test]
    async fn serializes_success_and_failure_entries() {
        let coordinator = coordinator();
        let processor = BatchProcessor::new(&coordinator, 2);
        let mut config = JobConfig::new();
        config.insert("simulate_failure".into(), serde_json::Value::Bool(true));

        let ok = processor
            .run(vec![doc("a.pdf")], DocumentType::Invoice, &JobConfig::new())
            .await;
        let json = serde_json::to_value(&ok).unwrap();
        let entry = &json["results"][0];
        assert_eq!(json["count"], 1);
        assert_eq!(entry["success"], true);
        assert_eq!(entry["document_type"], "invoice");
        assert!(entry["extracted_data"].is_object());
        assert!(entry.get("error").is_none());

        let failed = processor
            .run(vec![doc("a.pdf")], DocumentType::Invoice, &config)
            .await;
        let entry = &serde_json::to_value(&failed).unwrap()["results"][0];
        assert_eq!(entry["success"], false);
        assert!(entry["error"].is_string());
        assert!(entry.get("extracted_data").is_none());
    }
}
