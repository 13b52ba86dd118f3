//! Earmark API endpoints.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use api_types::earmark::{BalanceAdjust, EarmarkCreated, EarmarkList, EarmarkNew, EarmarkUpdate};
use engine::{Earmark, MoneyCents};

use crate::{ServerError, server::ServerState, user};

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<EarmarkNew>,
) -> Result<(StatusCode, Json<EarmarkCreated>), ServerError> {
    let id = state
        .engine
        .create_earmark(
            &payload.number,
            &payload.budget_line,
            &payload.bank_account,
            MoneyCents::new(payload.total_minor),
            payload.initial_balance_minor.map(MoneyCents::new),
            &user.username,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(EarmarkCreated { id })))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Earmark>, ServerError> {
    let earmark = state.engine.earmark(id, &user.username).await?;
    Ok(Json(earmark))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<EarmarkList>,
) -> Result<Json<Vec<Earmark>>, ServerError> {
    let earmarks = match (&query.bank_account, query.active) {
        (Some(account), _) => {
            state
                .engine
                .earmarks_for_account(&user.username, account)
                .await?
        }
        (None, Some(true)) => state.engine.active_earmarks_for_user(&user.username).await?,
        _ => state.engine.earmarks_for_user(&user.username).await?,
    };
    Ok(Json(earmarks))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EarmarkUpdate>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .update_earmark(
            id,
            &user.username,
            payload.number.as_deref(),
            payload.budget_line.as_deref(),
            payload.bank_account.as_deref(),
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_earmark(id, &user.username).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn adjust(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BalanceAdjust>,
) -> Result<Json<Earmark>, ServerError> {
    // Ownership check before the ledger write; the adjustment itself is
    // keyed by id only.
    state.engine.earmark(id, &user.username).await?;
    state
        .engine
        .adjust_balance(id, MoneyCents::new(payload.delta_minor))
        .await?;
    let earmark = state.engine.earmark(id, &user.username).await?;
    Ok(Json(earmark))
}
