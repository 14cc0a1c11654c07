//! JobCoordinator: runs documents through the extraction backend.
//!
//! `submit` is synchronous from the caller's point of view: it returns once
//! the job is terminal. Every job is also recorded in the `JobStore` so its
//! status can be looked up later by id.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use super::store::JobStore;
use super::types::{ExtractionJob, FailureKind, JobFailure};
use crate::config::ServiceConfig;
use crate::pipeline::extraction::{
    band, is_valid_confidence, Document, DocumentType, ExtractionBackend, ExtractionResult,
    JobConfig, OcrOutput,
};

pub struct JobCoordinator {
    backend: Arc<dyn ExtractionBackend>,
    store: JobStore,
    timeout: Duration,
}

impl JobCoordinator {
    pub fn new(backend: Arc<dyn ExtractionBackend>, config: &ServiceConfig) -> Self {
        Self::with_limits(backend, config.backend_timeout, config.job_retention)
    }

    pub fn with_limits(
        backend: Arc<dyn ExtractionBackend>,
        timeout: Duration,
        job_retention: usize,
    ) -> Self {
        Self {
            backend,
            store: JobStore::new(job_retention),
            timeout,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Look up a job by id (while it is retained).
    pub fn job(&self, id: &Uuid) -> Option<ExtractionJob> {
        self.store.get(id)
    }

    /// Run one document through the backend and return the finished job.
    ///
    /// The document bytes are released as soon as the backend returns. If
    /// this future is dropped mid-flight the job is recorded as cancelled.
    pub async fn submit(
        &self,
        document: Document,
        document_type: DocumentType,
        config: JobConfig,
    ) -> ExtractionJob {
        let mut job = ExtractionJob::new(&document, document_type, config);
        self.store.record(&job);
        let guard = CancelOnDrop::arm(&self.store, job.id);

        let outcome = match job.start() {
            Ok(()) => {
                self.store.record(&job);
                tracing::info!(
                    job_id = %job.id,
                    document_type = document_type.as_str(),
                    filename = %job.document.filename,
                    size = job.document.size_bytes,
                    backend = self.backend.name(),
                    "Extraction job started"
                );
                self.run_extraction(&document, &job).await
            }
            Err(e) => Err(JobFailure::new(FailureKind::Internal, e.to_string())),
        };
        drop(document);

        let settled = match outcome {
            Ok(result) => {
                tracing::info!(
                    job_id = %job.id,
                    confidence = result.confidence,
                    band = ?band(result.confidence),
                    duration_ms = result.duration.as_millis() as u64,
                    "Extraction job succeeded"
                );
                job.succeed(result)
            }
            Err(failure) => {
                tracing::warn!(
                    job_id = %job.id,
                    kind = ?failure.kind,
                    error = %failure.message,
                    "Extraction job failed"
                );
                job.fail(failure)
            }
        };
        if let Err(e) = settled {
            tracing::error!(job_id = %job.id, error = %e, "Extraction job could not be settled");
        }

        self.store.record(&job);
        guard.disarm();
        job
    }

    /// Plain text recognition. Not tracked as a job.
    pub async fn recognize(&self, document: Document) -> Result<OcrOutput, JobFailure> {
        let output = tokio::time::timeout(self.timeout, self.backend.recognize_text(&document))
            .await
            .map_err(|_| JobFailure::timeout(self.timeout))?
            .map_err(JobFailure::backend)?;

        if !is_valid_confidence(output.confidence) {
            return Err(JobFailure::new(
                FailureKind::Backend,
                format!("Backend reported confidence {} outside [0, 1]", output.confidence),
            ));
        }

        tracing::info!(
            filename = %document.filename,
            size = document.size(),
            confidence = output.confidence,
            text_length = output.text.len(),
            "Text recognition complete"
        );
        Ok(output)
    }

    async fn run_extraction(
        &self,
        document: &Document,
        job: &ExtractionJob,
    ) -> Result<ExtractionResult, JobFailure> {
        let result = tokio::time::timeout(
            self.timeout,
            self.backend.extract(document, job.document_type, &job.config),
        )
        .await
        .map_err(|_| JobFailure::timeout(self.timeout))?
        .map_err(JobFailure::backend)?;

        if !is_valid_confidence(result.confidence) {
            return Err(JobFailure::new(
                FailureKind::Backend,
                format!("Backend reported confidence {} outside [0, 1]", result.confidence),
            ));
        }
        if result.document_type != job.document_type
            || result.fields.document_type() != job.document_type
        {
            return Err(JobFailure::new(
                FailureKind::Backend,
                format!(
                    "Backend returned {} fields for a {} request",
                    result.fields.document_type(),
                    job.document_type
                ),
            ));
        }
        Ok(result)
    }
}

/// Marks the job cancelled if `submit` is dropped before it settles
/// (client disconnect, batch aborted).
struct CancelOnDrop<'a> {
    store: &'a JobStore,
    job_id: Uuid,
    armed: bool,
}

impl<'a> CancelOnDrop<'a> {
    fn arm(store: &'a JobStore, job_id: Uuid) -> Self {
        Self {
            store,
            job_id,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancelOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.store.fail_unfinished(&self.job_id, JobFailure::cancelled());
        }
    }
}
