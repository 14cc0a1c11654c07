//! WorkflowExecutor: runs a validated definition step by step.
//!
//! Steps execute in declared order. The first fatal step failure stops the
//! run; outputs of the steps that completed are kept in the run record.

use std::time::Instant;

use uuid::Uuid;

use super::types::*;
use crate::pipeline::extraction::{Document, DocumentType, JobConfig};
use crate::pipeline::jobs::JobCoordinator;

pub struct WorkflowExecutor<'a> {
    coordinator: &'a JobCoordinator,
}

/// What a completed step reports.
struct StepDone {
    job_id: Option<Uuid>,
    output: StepOutput,
}

/// Why a step stopped the run.
struct StepFailed {
    job_id: Option<Uuid>,
    message: String,
}

impl StepFailed {
    fn new(message: impl Into<String>) -> Self {
        Self {
            job_id: None,
            message: message.into(),
        }
    }
}

impl<'a> WorkflowExecutor<'a> {
    pub fn new(coordinator: &'a JobCoordinator) -> Self {
        Self { coordinator }
    }

    pub async fn execute(&self, definition: WorkflowDefinition) -> WorkflowRun {
        let start = Instant::now();
        let id = new_workflow_id();
        let label = definition
            .name
            .clone()
            .unwrap_or_else(|| "workflow".to_string());

        let mut output = WorkflowOutput::default();
        let mut steps = Vec::with_capacity(definition.steps.len());
        let mut error = None;

        for (i, step) in definition.steps.into_iter().enumerate() {
            let number = i + 1;
            let kind = step.kind();
            let outcome = match step {
                WorkflowStep::Extract {
                    document_type,
                    content,
                    config,
                } => {
                    let filename = format!("{label}-step-{number}.txt");
                    self.extract(&mut output, filename, document_type, &content, config)
                        .await
                }
                WorkflowStep::Transform(op) => transform(&mut output, &op),
                WorkflowStep::Validate {
                    required_fields,
                    min_confidence,
                } => validate(&output, &required_fields, min_confidence),
            };

            match outcome {
                Ok(done) => steps.push(StepOutcome {
                    step: number,
                    kind,
                    status: StepStatus::Completed,
                    job_id: done.job_id,
                    output: Some(done.output),
                    error: None,
                }),
                Err(failed) => {
                    tracing::warn!(
                        workflow_id = %id,
                        step = number,
                        kind,
                        error = %failed.message,
                        "Workflow step failed"
                    );
                    error = Some(format!("Step {number} ({kind}) failed: {}", failed.message));
                    steps.push(StepOutcome {
                        step: number,
                        kind,
                        status: StepStatus::Failed,
                        job_id: failed.job_id,
                        output: None,
                        error: Some(failed.message),
                    });
                    break;
                }
            }
        }

        let status = if error.is_none() {
            RunStatus::Completed
        } else {
            RunStatus::Failed
        };
        tracing::info!(
            workflow_id = %id,
            name = %label,
            status = ?status,
            steps = steps.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Workflow finished"
        );

        WorkflowRun {
            id,
            name: definition.name,
            status,
            output,
            steps,
            error,
        }
    }

    async fn extract(
        &self,
        output: &mut WorkflowOutput,
        filename: String,
        document_type: Option<String>,
        content: &str,
        config: JobConfig,
    ) -> Result<StepDone, StepFailed> {
        let document_type = match document_type.as_deref() {
            None => DocumentType::default(),
            Some(raw) => DocumentType::parse(raw)
                .ok_or_else(|| StepFailed::new(format!("unsupported document type '{raw}'")))?,
        };

        let document = Document::inline(filename, content);
        let job = self.coordinator.submit(document, document_type, config).await;
        let job_id = job.id;

        let result = job.into_outcome().map_err(|failure| StepFailed {
            job_id: Some(job_id),
            message: failure.message,
        })?;

        output.extracted = true;
        output.document_type = Some(result.document_type);
        output.confidence = Some(result.confidence);
        output.data = result.fields.to_map();

        Ok(StepDone {
            job_id: Some(job_id),
            output: StepOutput::Extract {
                document_type: result.document_type,
                confidence: result.confidence,
                fields: output.data.keys().cloned().collect(),
            },
        })
    }
}

fn transform(output: &mut WorkflowOutput, op: &TransformOp) -> Result<StepDone, StepFailed> {
    if !output.extracted {
        return Err(StepFailed::new("nothing extracted yet"));
    }

    match op {
        TransformOp::Select { fields } => {
            if let Some(missing) = fields.iter().find(|f| !output.data.contains_key(*f)) {
                return Err(StepFailed::new(format!("field '{missing}' not present")));
            }
            output.data.retain(|key, _| fields.contains(key));
        }
        TransformOp::Rename { from, to } => {
            let value = output
                .data
                .remove(from)
                .ok_or_else(|| StepFailed::new(format!("field '{from}' not present")))?;
            output.data.insert(to.clone(), value);
        }
    }

    Ok(StepDone {
        job_id: None,
        output: StepOutput::Transform {
            fields: output.data.keys().cloned().collect(),
        },
    })
}

fn validate(
    output: &WorkflowOutput,
    required_fields: &[String],
    min_confidence: Option<f32>,
) -> Result<StepDone, StepFailed> {
    let missing: Vec<&str> = required_fields
        .iter()
        .filter(|f| !output.data.contains_key(*f))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return Err(StepFailed::new(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    }

    if let Some(min) = min_confidence {
        match output.confidence {
            Some(actual) if actual >= min => {}
            Some(actual) => {
                return Err(StepFailed::new(format!(
                    "confidence {actual} below minimum {min}"
                )))
            }
            None => return Err(StepFailed::new("no confidence to check; nothing extracted yet")),
        }
    }

    Ok(StepDone {
        job_id: None,
        output: StepOutput::Validate {
            checked_fields: required_fields.len(),
            confidence: output.confidence,
        },
    })
}
