//! Template registry: the static catalog of supported document types.
//!
//! Compiled into the binary and shared by every request without locking.

use serde::Serialize;

use crate::pipeline::extraction::DocumentType;

/// A named schema describing the fields expected for a document category.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Template {
    pub id: &'static str,
    pub name: &'static str,
    pub fields: &'static [&'static str],
}

static TEMPLATES: [Template; 4] = [
    Template {
        id: "invoice",
        name: "Invoices",
        fields: &["invoice_number", "date", "vendor", "total"],
    },
    Template {
        id: "contract",
        name: "Contracts",
        fields: &["parties", "dates", "terms"],
    },
    Template {
        id: "medical",
        name: "Medical Records",
        fields: &["patient_name", "diagnoses", "medications"],
    },
    Template {
        id: "receipt",
        name: "Receipts",
        fields: &["store", "date", "items", "total"],
    },
];

/// All templates, in catalog order.
pub fn list() -> &'static [Template] {
    &TEMPLATES
}

/// Look up a template by id.
pub fn get(id: &str) -> Option<&'static Template> {
    TEMPLATES.iter().find(|t| t.id == id)
}

pub(crate) fn template_for(document_type: DocumentType) -> &'static Template {
    match document_type {
        DocumentType::Invoice => &TEMPLATES[0],
        DocumentType::Contract => &TEMPLATES[1],
        DocumentType::Medical => &TEMPLATES[2],
        DocumentType::Receipt => &TEMPLATES[3],
    }
}
