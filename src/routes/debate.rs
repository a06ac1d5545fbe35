use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::debate::{ArgumentSummary, DebateDetail, SubmitArgumentRequest},
    error::AppError,
    services::debate_service,
    state::SharedState,
};

/// Routes serving debate snapshots and accepting argument submissions.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/debates/{id}", get(get_debate))
        .route("/api/arguments", post(submit_argument))
}

/// Fetch the full state of a debate, including its ordered arguments.
#[utoipa::path(
    get,
    path = "/api/debates/{id}",
    tag = "debates",
    params(("id" = Uuid, Path, description = "Identifier of the debate to fetch")),
    responses(
        (status = 200, description = "Debate snapshot", body = DebateDetail),
        (status = 404, description = "Debate not found")
    )
)]
pub async fn get_debate(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DebateDetail>, AppError> {
    let detail = debate_service::debate_detail(&state, id).await?;
    Ok(Json(detail))
}

/// Submit an argument for the caller's side of a debate.
#[utoipa::path(
    post,
    path = "/api/arguments",
    tag = "debates",
    request_body = SubmitArgumentRequest,
    responses(
        (status = 201, description = "Argument accepted", body = ArgumentSummary),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "User is not a participant"),
        (status = 404, description = "Debate not found")
    )
)]
pub async fn submit_argument(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<SubmitArgumentRequest>>,
) -> Result<(axum::http::StatusCode, Json<ArgumentSummary>), AppError> {
    let argument = debate_service::submit_argument(&state, payload).await?;
    Ok((axum::http::StatusCode::CREATED, Json(argument)))
}
