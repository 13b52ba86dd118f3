//! Heuristic data extraction for scanned Brazilian utility bills.
//!
//! OCR output goes through three independent heuristics (category, total
//! amount, due date); each contributes a fixed share to the confidence of
//! the result. Extraction is advisory: the caller confirms or edits every
//! field, so this crate never fails an upload, it only degrades to an empty
//! result with zero confidence.

use std::path::Path;

use chrono::NaiveDate;
use thiserror::Error;

pub use amount::extract_amount;
pub use category::identify_category;
pub use date::extract_due_date;
pub use recognizer::{RecognizerHandle, TesseractRecognizer, TextRecognizer};

use engine::{ExtractedSnapshot, InvoiceCategory, MoneyCents};

mod amount;
mod category;
mod date;
mod patterns;
mod recognizer;

/// Errors from the recognizer layer. The heuristics themselves never fail.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("recognizer failed: {0}")]
    Recognizer(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// What was read off a scanned bill.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExtractedInvoice {
    pub category: Option<InvoiceCategory>,
    pub amount: Option<MoneyCents>,
    pub due_date: Option<NaiveDate>,
    /// Additive: 0.3 for category, 0.4 for amount, 0.3 for due date.
    pub confidence: f64,
}

impl ExtractedInvoice {
    fn empty() -> Self {
        Self {
            category: None,
            amount: None,
            due_date: None,
            confidence: 0.0,
        }
    }
}

impl From<ExtractedInvoice> for ExtractedSnapshot {
    fn from(extracted: ExtractedInvoice) -> Self {
        Self {
            category: extracted.category,
            amount: extracted.amount,
            due_date: extracted.due_date,
            confidence: extracted.confidence,
        }
    }
}

/// Runs the full pipeline over already-recognized text.
pub fn extract_from_text(text: &str) -> ExtractedInvoice {
    let category = identify_category(text);
    let amount = extract_amount(text);
    let due_date = extract_due_date(text);

    let mut confidence = 0.0;
    if category.is_some() {
        confidence += 0.3;
    }
    if amount.is_some() {
        confidence += 0.4;
    }
    if due_date.is_some() {
        confidence += 0.3;
    }

    ExtractedInvoice {
        category,
        amount,
        due_date,
        confidence,
    }
}

/// Recognizes a scanned document and applies the heuristics.
///
/// A recognizer failure is logged and absorbed: the result is empty with
/// `confidence: 0.0`, never an error, because the user confirms every field
/// anyway.
pub async fn extract_invoice_data(handle: &RecognizerHandle, image: &Path) -> ExtractedInvoice {
    let recognizer = handle.acquire().await;
    match recognizer.recognize_text(image).await {
        Ok(text) => extract_from_text(&text),
        Err(err) => {
            tracing::warn!(image = %image.display(), error = %err, "text recognition failed");
            ExtractedInvoice::empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;

    struct CannedRecognizer(&'static str);

    #[async_trait]
    impl TextRecognizer for CannedRecognizer {
        async fn recognize_text(&self, _image: &Path) -> Result<String, ExtractionError> {
            Ok(self.0.to_string())
        }
    }

    struct BrokenRecognizer;

    #[async_trait]
    impl TextRecognizer for BrokenRecognizer {
        async fn recognize_text(&self, _image: &Path) -> Result<String, ExtractionError> {
            Err(ExtractionError::Recognizer("no worker".to_string()))
        }
    }

    #[test]
    fn full_bill_has_full_confidence() {
        let text = "EDP Energia Elétrica\nNOV/2025 03/12/2025 240,55\nTOTAL A PAGAR R$ 240,55";
        let extracted = extract_from_text(text);
        assert_eq!(extracted.category, Some(InvoiceCategory::Electricity));
        assert_eq!(extracted.amount, Some(MoneyCents::new(24_055)));
        assert_eq!(
            extracted.due_date,
            NaiveDate::from_ymd_opt(2025, 12, 3)
        );
        assert!((extracted.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_extraction_sums_weights() {
        // Amount only: no vendor vocabulary, no date.
        let extracted = extract_from_text("TOTAL A PAGAR 99,90");
        assert_eq!(extracted.amount, Some(MoneyCents::new(9_990)));
        assert_eq!(extracted.category, None);
        assert_eq!(extracted.due_date, None);
        assert!((extracted.confidence - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_text_has_zero_confidence() {
        let extracted = extract_from_text("");
        assert_eq!(extracted.confidence, 0.0);
    }

    #[tokio::test]
    async fn recognizer_failure_degrades_to_empty() {
        let handle = RecognizerHandle::with_recognizer(Arc::new(BrokenRecognizer));
        let extracted = extract_invoice_data(&handle, &PathBuf::from("missing.png")).await;
        assert_eq!(extracted.category, None);
        assert_eq!(extracted.amount, None);
        assert_eq!(extracted.due_date, None);
        assert_eq!(extracted.confidence, 0.0);
    }

    #[tokio::test]
    async fn handle_runs_recognizer_through_pipeline() {
        let handle = RecognizerHandle::with_recognizer(Arc::new(CannedRecognizer(
            "SABESP\nVENCIMENTO: 15/03/2025\nVALOR TOTAL 120,00",
        )));
        let extracted = extract_invoice_data(&handle, &PathBuf::from("conta.png")).await;
        assert_eq!(extracted.category, Some(InvoiceCategory::Water));
        assert_eq!(extracted.amount, Some(MoneyCents::new(12_000)));
        assert_eq!(
            extracted.due_date,
            NaiveDate::from_ymd_opt(2025, 3, 15)
        );
        assert!((extracted.confidence - 1.0).abs() < f64::EPSILON);

        handle.release().await;
        let again = extract_invoice_data(&handle, &PathBuf::from("conta.png")).await;
        assert_eq!(again.amount, Some(MoneyCents::new(12_000)));
    }
}
