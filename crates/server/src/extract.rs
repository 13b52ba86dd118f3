//! OCR extraction API endpoint.

use std::path::PathBuf;

use axum::{Extension, Json, extract::State};

use api_types::extract::ExtractRequest;
use api_types::invoice::ExtractedData;

use crate::{ServerError, invoices::category_from_engine, server::ServerState, user};

/// Runs the extraction pipeline over a document and returns the advisory
/// result. Never fails on recognizer errors; those come back as an empty
/// result with zero confidence.
pub async fn run(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ExtractRequest>,
) -> Result<Json<ExtractedData>, ServerError> {
    let path = PathBuf::from(payload.image_path);
    let extracted = extraction::extract_invoice_data(&state.recognizer, &path).await;

    Ok(Json(ExtractedData {
        category: extracted.category.map(category_from_engine),
        amount_minor: extracted.amount.map(|amount| amount.cents()),
        due_date: extracted.due_date,
        confidence: extracted.confidence,
    }))
}
