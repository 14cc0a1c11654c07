//! Canned extraction payloads returned by the simulated backend.

use super::types::*;

pub fn invoice() -> InvoiceFields {
    InvoiceFields {
        invoice_number: "INV-2024-001234".into(),
        date: "2024-01-15".into(),
        vendor: Party {
            name: "Acme Corporation".into(),
            address: "123 Business Ave, Suite 100, San Francisco, CA 94102".into(),
            email: "billing@acmecorp.com".into(),
        },
        total: 2547.50,
        currency: "USD".into(),
        items: vec![
            line_item("Professional Services", 40, 50.00, 2000.00),
            line_item("Software License", 1, 299.00, 299.00),
            line_item("Support Package", 1, 248.50, 248.50),
        ],
        tax: 254.75,
    }
}

pub fn contract() -> ContractFields {
    ContractFields {
        parties: vec![
            "Acme Corporation".into(),
            "Globex Industries LLC".into(),
        ],
        dates: ContractDates {
            effective: "2024-02-01".into(),
            expiration: "2025-01-31".into(),
        },
        terms: vec![
            "Services billed monthly, net 30".into(),
            "Either party may terminate with 60 days written notice".into(),
            "Governed by the laws of the State of California".into(),
        ],
    }
}

pub fn medical() -> MedicalFields {
    MedicalFields {
        patient_name: "Jane Doe".into(),
        diagnoses: vec![
            "Essential hypertension".into(),
            "Type 2 diabetes mellitus".into(),
        ],
        medications: vec![
            Medication {
                name: "Lisinopril".into(),
                dosage: "10 mg once daily".into(),
            },
            Medication {
                name: "Metformin".into(),
                dosage: "500 mg twice daily".into(),
            },
        ],
    }
}

pub fn receipt() -> ReceiptFields {
    ReceiptFields {
        store: "Corner Market".into(),
        date: "2024-01-15".into(),
        items: vec![
            ReceiptItem {
                description: "Coffee beans 1kg".into(),
                price: 18.99,
            },
            ReceiptItem {
                description: "Whole milk 2L".into(),
                price: 3.49,
            },
        ],
        total: 22.48,
    }
}

/// Canned fields and confidence for a document type.
pub fn for_type(document_type: DocumentType) -> (ExtractedFields, f32) {
    match document_type {
        DocumentType::Invoice => (ExtractedFields::Invoice(invoice()), 0.97),
        DocumentType::Contract => (ExtractedFields::Contract(contract()), 0.94),
        DocumentType::Medical => (ExtractedFields::Medical(medical()), 0.91),
        DocumentType::Receipt => (ExtractedFields::Receipt(receipt()), 0.96),
    }
}

pub const OCR_TEXT: &str = "Sample OCR extracted text from the image...";
pub const OCR_CONFIDENCE: f32 = 0.95;

fn line_item(description: &str, quantity: u32, unit_price: f64, total: f64) -> InvoiceLineItem {
    InvoiceLineItem {
        description: description.into(),
        quantity,
        unit_price,
        total,
    }
}
