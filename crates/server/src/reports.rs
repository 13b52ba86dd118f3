//! Reporting API endpoint.

use axum::{Extension, Json, extract::State};

use engine::FullReport;

use crate::{ServerError, server::ServerState, user};

pub async fn full(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<FullReport>, ServerError> {
    let report = state.engine.full_report(&user.username).await?;
    Ok(Json(report))
}
