//! Request/response bodies shared by the HTTP server and its clients.
//!
//! Monetary amounts travel as integer centavos (`*_minor` fields) and dates
//! as ISO calendar dates; the server converts at the boundary.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Vendor category of a utility bill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceCategory {
    Electricity,
    Water,
    Telecom,
}

pub mod earmark {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EarmarkNew {
        pub number: String,
        pub budget_line: String,
        pub bank_account: String,
        pub total_minor: i64,
        /// Defaults to `total_minor` when absent.
        pub initial_balance_minor: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EarmarkCreated {
        pub id: Uuid,
    }

    /// Partial update; absent fields are left unchanged. Balance and status
    /// are not updatable here, they only move through the ledger.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct EarmarkUpdate {
        pub number: Option<String>,
        pub budget_line: Option<String>,
        pub bank_account: Option<String>,
    }

    /// Query parameters for listing earmarks.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct EarmarkList {
        /// Restrict to one bank account.
        pub bank_account: Option<String>,
        /// When `true`, only earmarks with spendable balance.
        pub active: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceAdjust {
        /// Positive consumes balance, negative restores it.
        pub delta_minor: i64,
    }
}

pub mod invoice {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InvoiceNew {
        pub category: InvoiceCategory,
        pub due_date: NaiveDate,
        pub total_minor: i64,
        pub file_url: Option<String>,
        /// Extraction snapshot taken at upload time, if the invoice came
        /// from a scanned document.
        pub extracted: Option<ExtractedData>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InvoiceCreated {
        pub id: Uuid,
    }

    /// Partial update; absent fields are left unchanged.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct InvoiceUpdate {
        pub category: Option<InvoiceCategory>,
        pub due_date: Option<NaiveDate>,
        pub total_minor: Option<i64>,
        pub file_url: Option<String>,
    }

    /// Query parameters for listing invoices.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct InvoiceList {
        pub category: Option<InvoiceCategory>,
        /// Only invoices due between today and this many days from now.
        pub due_within_days: Option<i64>,
    }

    /// What the extraction pipeline read off a scanned bill.
    #[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
    pub struct ExtractedData {
        pub category: Option<InvoiceCategory>,
        pub amount_minor: Option<i64>,
        pub due_date: Option<NaiveDate>,
        pub confidence: f64,
    }
}

pub mod link {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LinkNew {
        pub invoice_id: Uuid,
        pub earmark_id: Uuid,
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LinkCreated {
        pub id: Uuid,
    }

    /// Body for unlinking: the earmark to restore and the amount drawn.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct Unlink {
        pub earmark_id: Uuid,
        pub amount_minor: i64,
    }

    /// Coverage summary of one invoice.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct Coverage {
        pub invoice_id: Uuid,
        pub total_minor: i64,
        pub linked_minor: i64,
        pub complete: bool,
    }
}

pub mod extract {
    use super::*;

    /// Request to run OCR extraction over a document on the server host.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExtractRequest {
        pub image_path: String,
    }
}
