//! Extraction job record and its lifecycle.
//!
//! Status only moves forward: `pending → running → {succeeded, failed}`.
//! Terminal jobs reject every further transition.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::JobError;
use crate::pipeline::extraction::{
    BackendError, Document, DocumentInfo, DocumentType, ExtractionResult, JobConfig,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Allowed edges of the job lifecycle.
    ///
    /// A pending job may fail directly (cancelled before the backend ran).
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Pending, Self::Failed)
                | (Self::Running, Self::Succeeded)
                | (Self::Running, Self::Failed)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classification of a job failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Backend,
    Timeout,
    Cancelled,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct JobFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl JobFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn backend(err: BackendError) -> Self {
        Self::new(FailureKind::Backend, err.to_string())
    }

    pub fn timeout(limit: Duration) -> Self {
        Self::new(
            FailureKind::Timeout,
            format!("Extraction backend timed out after {}s", limit.as_secs_f64()),
        )
    }

    pub fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, "Request cancelled before completion")
    }
}

/// A tracked extraction request.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionJob {
    pub id: Uuid,
    pub document: DocumentInfo,
    pub document_type: DocumentType,
    pub config: JobConfig,
    status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<ExtractionResult>,
    #[serde(rename = "error", skip_serializing_if = "Option::is_none")]
    failure: Option<JobFailure>,
    pub created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl ExtractionJob {
    pub fn new(document: &Document, document_type: DocumentType, config: JobConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            document: document.info(),
            document_type,
            config,
            status: JobStatus::Pending,
            result: None,
            failure: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn result(&self) -> Option<&ExtractionResult> {
        self.result.as_ref()
    }

    pub fn failure(&self) -> Option<&JobFailure> {
        self.failure.as_ref()
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Consume a finished job, yielding its outcome.
    pub fn into_outcome(self) -> Result<ExtractionResult, JobFailure> {
        match (self.result, self.failure) {
            (Some(result), _) => Ok(result),
            (None, Some(failure)) => Err(failure),
            (None, None) => Err(JobFailure::new(
                FailureKind::Internal,
                format!("Job {} has not finished ({})", self.id, self.status),
            )),
        }
    }

    pub fn start(&mut self) -> Result<(), JobError> {
        self.transition(JobStatus::Running)
    }

    pub fn succeed(&mut self, result: ExtractionResult) -> Result<(), JobError> {
        self.transition(JobStatus::Succeeded)?;
        self.result = Some(result);
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn fail(&mut self, failure: JobFailure) -> Result<(), JobError> {
        self.transition(JobStatus::Failed)?;
        self.failure = Some(failure);
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    fn transition(&mut self, next: JobStatus) -> Result<(), JobError> {
        if !self.status.can_transition_to(next) {
            return Err(JobError::InvalidTransition {
                job_id: self.id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}
