use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::templates::{self, Template};

/// Free-form per-request extraction options (`config` form field).
pub type JobConfig = serde_json::Map<String, serde_json::Value>;

// ═══════════════════════════════════════════
// Document type
// ═══════════════════════════════════════════

/// The document categories the service knows how to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Invoice,
    Contract,
    Medical,
    Receipt,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::Contract => "contract",
            Self::Medical => "medical",
            Self::Receipt => "receipt",
        }
    }

    /// Parse a template id. Surrounding whitespace and case are ignored.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "invoice" => Some(Self::Invoice),
            "contract" => Some(Self::Contract),
            "medical" => Some(Self::Medical),
            "receipt" => Some(Self::Receipt),
            _ => None,
        }
    }

    pub fn all() -> &'static [DocumentType] {
        &[Self::Invoice, Self::Contract, Self::Medical, Self::Receipt]
    }

    /// The registry template describing this type's expected fields.
    pub fn template(&self) -> &'static Template {
        templates::template_for(*self)
    }
}

impl Default for DocumentType {
    fn default() -> Self {
        Self::Invoice
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ═══════════════════════════════════════════
// Document (intake output)
// ═══════════════════════════════════════════

/// An uploaded document buffered in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// A text document supplied inline (workflow extract steps).
    pub fn inline(filename: impl Into<String>, content: &str) -> Self {
        Self::new(filename, "text/plain", content.as_bytes().to_vec())
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn info(&self) -> DocumentInfo {
        DocumentInfo {
            filename: self.filename.clone(),
            mime_type: self.mime_type.clone(),
            size_bytes: self.size(),
        }
    }
}

/// Document metadata retained by a job after the bytes are released.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentInfo {
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

// ═══════════════════════════════════════════
// Extracted fields, one shape per document type
// ═══════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Party {
    pub name: String,
    pub address: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceLineItem {
    pub description: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceFields {
    pub invoice_number: String,
    pub date: String,
    pub vendor: Party,
    pub total: f64,
    pub currency: String,
    pub items: Vec<InvoiceLineItem>,
    pub tax: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractDates {
    pub effective: String,
    pub expiration: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractFields {
    pub parties: Vec<String>,
    pub dates: ContractDates,
    pub terms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Medication {
    pub name: String,
    pub dosage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedicalFields {
    pub patient_name: String,
    pub diagnoses: Vec<String>,
    pub medications: Vec<Medication>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiptItem {
    pub description: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiptFields {
    pub store: String,
    pub date: String,
    pub items: Vec<ReceiptItem>,
    pub total: f64,
}

/// Typed extraction payload. Serializes as the bare field object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtractedFields {
    Invoice(InvoiceFields),
    Contract(ContractFields),
    Medical(MedicalFields),
    Receipt(ReceiptFields),
}

impl ExtractedFields {
    pub fn document_type(&self) -> DocumentType {
        match self {
            Self::Invoice(_) => DocumentType::Invoice,
            Self::Contract(_) => DocumentType::Contract,
            Self::Medical(_) => DocumentType::Medical,
            Self::Receipt(_) => DocumentType::Receipt,
        }
    }

    /// Flatten into a JSON object for field-level reshaping.
    pub fn to_map(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}

// ═══════════════════════════════════════════
// Backend outputs
// ═══════════════════════════════════════════

/// Result of extracting one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    pub document_type: DocumentType,
    #[serde(rename = "extracted_data")]
    pub fields: ExtractedFields,
    /// Backend-reported, expected in [0, 1].
    pub confidence: f32,
    #[serde(rename = "processing_time", serialize_with = "serialize_duration")]
    pub duration: Duration,
}

/// Result of plain text recognition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OcrOutput {
    pub text: String,
    pub confidence: f32,
}

/// Human-readable processing time, e.g. `"1.2s"`.
pub fn format_duration(duration: Duration) -> String {
    format!("{:.1}s", duration.as_secs_f64())
}

fn serialize_duration<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_duration(*duration))
}
