//! Invoice API endpoints.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use api_types::invoice::{ExtractedData, InvoiceCreated, InvoiceList, InvoiceNew, InvoiceUpdate};
use engine::{ExtractedSnapshot, Invoice, MoneyCents};

use crate::{ServerError, server::ServerState, user};

pub(crate) fn category_to_engine(category: api_types::InvoiceCategory) -> engine::InvoiceCategory {
    match category {
        api_types::InvoiceCategory::Electricity => engine::InvoiceCategory::Electricity,
        api_types::InvoiceCategory::Water => engine::InvoiceCategory::Water,
        api_types::InvoiceCategory::Telecom => engine::InvoiceCategory::Telecom,
    }
}

pub(crate) fn category_from_engine(category: engine::InvoiceCategory) -> api_types::InvoiceCategory {
    match category {
        engine::InvoiceCategory::Electricity => api_types::InvoiceCategory::Electricity,
        engine::InvoiceCategory::Water => api_types::InvoiceCategory::Water,
        engine::InvoiceCategory::Telecom => api_types::InvoiceCategory::Telecom,
    }
}

fn snapshot_from_payload(extracted: ExtractedData) -> ExtractedSnapshot {
    ExtractedSnapshot {
        category: extracted.category.map(category_to_engine),
        amount: extracted.amount_minor.map(MoneyCents::new),
        due_date: extracted.due_date,
        confidence: extracted.confidence,
    }
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<InvoiceNew>,
) -> Result<(StatusCode, Json<InvoiceCreated>), ServerError> {
    let id = state
        .engine
        .create_invoice(
            category_to_engine(payload.category),
            payload.due_date,
            MoneyCents::new(payload.total_minor),
            payload.file_url.as_deref(),
            payload.extracted.map(snapshot_from_payload),
            &user.username,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(InvoiceCreated { id })))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Invoice>, ServerError> {
    let invoice = state.engine.invoice(id, &user.username).await?;
    Ok(Json(invoice))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<InvoiceList>,
) -> Result<Json<Vec<Invoice>>, ServerError> {
    let invoices = match (query.category, query.due_within_days) {
        (Some(category), _) => {
            state
                .engine
                .invoices_for_category(&user.username, category_to_engine(category))
                .await?
        }
        (None, Some(days)) => state.engine.invoices_due_within(&user.username, days).await?,
        _ => state.engine.invoices_for_user(&user.username).await?,
    };
    Ok(Json(invoices))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<InvoiceUpdate>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .update_invoice(
            id,
            &user.username,
            engine::InvoiceUpdate {
                category: payload.category.map(category_to_engine),
                due_date: payload.due_date,
                total: payload.total_minor.map(MoneyCents::new),
                file_url: payload.file_url,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_invoice(id, &user.username).await?;
    Ok(StatusCode::NO_CONTENT)
}
