use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{WorkflowError, MAX_WORKFLOW_STEPS};
use crate::pipeline::extraction::{is_valid_confidence, DocumentType, JobConfig};

// ═══════════════════════════════════════════
// Definition
// ═══════════════════════════════════════════

/// A declared workflow, as submitted by the client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkflowDefinition {
    #[serde(default)]
    pub name: Option<String>,
    pub steps: Vec<WorkflowStep>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowStep {
    /// Run inline content through the extraction backend.
    Extract {
        #[serde(default)]
        document_type: Option<String>,
        #[serde(default)]
        content: String,
        #[serde(default)]
        config: JobConfig,
    },
    /// Reshape the current data.
    Transform(TransformOp),
    /// Check the current data and confidence.
    Validate {
        #[serde(default)]
        required_fields: Vec<String>,
        #[serde(default)]
        min_confidence: Option<f32>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum TransformOp {
    /// Keep only the listed fields.
    Select { fields: Vec<String> },
    /// Move a field to a new key.
    Rename { from: String, to: String },
}

impl WorkflowStep {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Extract { .. } => "extract",
            Self::Transform(_) => "transform",
            Self::Validate { .. } => "validate",
        }
    }
}

impl WorkflowDefinition {
    /// Parse and validate the `workflow` member of a request body.
    /// Inline extract content is held to `max_content_bytes`, the same limit
    /// as an uploaded file.
    pub fn from_value(value: Option<Value>, max_content_bytes: u64) -> Result<Self, WorkflowError> {
        let value = match value {
            None | Some(Value::Null) => return Err(WorkflowError::MissingDefinition),
            Some(value) => value,
        };
        let definition: Self = serde_json::from_value(value)
            .map_err(|e| WorkflowError::InvalidDefinition(e.to_string()))?;
        definition.validate(max_content_bytes)?;
        Ok(definition)
    }

    /// Structural checks. Nothing runs until the whole definition passes.
    pub fn validate(&self, max_content_bytes: u64) -> Result<(), WorkflowError> {
        if self.steps.is_empty() {
            return Err(WorkflowError::NoSteps);
        }
        if self.steps.len() > MAX_WORKFLOW_STEPS {
            return Err(WorkflowError::TooManySteps {
                count: self.steps.len(),
                max: MAX_WORKFLOW_STEPS,
            });
        }

        for (i, step) in self.steps.iter().enumerate() {
            let index = i + 1;
            let invalid = |reason: String| WorkflowError::InvalidStep { index, reason };
            match step {
                WorkflowStep::Extract {
                    document_type,
                    content,
                    ..
                } => {
                    if let Some(raw) = document_type {
                        if DocumentType::parse(raw).is_none() {
                            return Err(invalid(format!("unsupported document type '{raw}'")));
                        }
                    }
                    if content.trim().is_empty() {
                        return Err(invalid("extract needs non-empty 'content'".into()));
                    }
                    if content.len() as u64 > max_content_bytes {
                        return Err(invalid(format!(
                            "content exceeds the {max_content_bytes} byte upload limit"
                        )));
                    }
                }
                WorkflowStep::Transform(TransformOp::Select { fields }) => {
                    if fields.is_empty() {
                        return Err(invalid("select needs at least one field".into()));
                    }
                }
                WorkflowStep::Transform(TransformOp::Rename { from, to }) => {
                    if from.trim().is_empty() || to.trim().is_empty() {
                        return Err(invalid("rename needs non-empty 'from' and 'to'".into()));
                    }
                }
                WorkflowStep::Validate { min_confidence, .. } => {
                    if let Some(min) = min_confidence {
                        if !is_valid_confidence(*min) {
                            return Err(invalid(format!("min_confidence {min} outside [0, 1]")));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════
// Run
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Failed,
}

/// Record of one executed step. Steps after a fatal failure are not recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome {
    /// 1-based position in the definition.
    pub step: usize,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<StepOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What a completed step reports. Confidences stay `f32` so they serialize
/// exactly as the backend reported them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StepOutput {
    Extract {
        document_type: DocumentType,
        confidence: f32,
        fields: Vec<String>,
    },
    Transform {
        fields: Vec<String>,
    },
    Validate {
        checked_fields: usize,
        confidence: Option<f32>,
    },
}

/// Aggregate state carried between steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkflowOutput {
    pub extracted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<DocumentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowRun {
    #[serde(rename = "workflow_id")]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub status: RunStatus,
    pub output: WorkflowOutput,
    pub steps: Vec<StepOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkflowRun {
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }
}

/// `wf-<unix millis>-<8 hex>`: time-ordered and unique under concurrency.
pub fn new_workflow_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("wf-{}-{}", Utc::now().timestamp_millis(), &suffix[..8])
}
