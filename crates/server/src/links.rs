//! Linkage API endpoints.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use api_types::link::{Coverage, LinkCreated, LinkNew, Unlink};
use engine::{Linkage, MoneyCents};

use crate::{ServerError, server::ServerState, user};

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<LinkNew>,
) -> Result<(StatusCode, Json<LinkCreated>), ServerError> {
    let id = state
        .engine
        .link(
            payload.invoice_id,
            payload.earmark_id,
            MoneyCents::new(payload.amount_minor),
            &user.username,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(LinkCreated { id })))
}

pub async fn remove(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<Unlink>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .unlink(id, payload.earmark_id, MoneyCents::new(payload.amount_minor))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_for_invoice(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Linkage>>, ServerError> {
    state.engine.invoice(id, &user.username).await?;
    let links = state.engine.links_for_invoice(id).await?;
    Ok(Json(links))
}

pub async fn list_for_earmark(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Linkage>>, ServerError> {
    state.engine.earmark(id, &user.username).await?;
    let links = state.engine.links_for_earmark(id).await?;
    Ok(Json(links))
}

pub async fn coverage(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Coverage>, ServerError> {
    let invoice = state.engine.invoice(id, &user.username).await?;
    let linked = state.engine.total_linked(id).await?;
    let complete = state.engine.is_complete(id).await?;

    Ok(Json(Coverage {
        invoice_id: id,
        total_minor: invoice.total.cents(),
        linked_minor: linked.cents(),
        complete,
    }))
}
