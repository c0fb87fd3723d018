/// Board endpoints
///
/// # Endpoints
///
/// - `GET /v1/boards` - Boards the caller collaborates on
/// - `POST /v1/boards` - Create a board in one of the caller's accounts
/// - `GET|PUT|DELETE /v1/boards/:id` - Board object
/// - `POST /v1/boards/:id/leave` - Drop the caller's own collaborator row

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use boards_shared::{
    auth::middleware::Principal,
    models::board::Board,
    services::boards::{BoardForm, UpdateBoardForm},
};
use uuid::Uuid;

pub async fn list_boards(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Vec<Board>>> {
    Ok(Json(state.services.list_boards(&principal).await?))
}

pub async fn create_board(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<BoardForm>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Board>)> {
    let Json(form) = payload?;

    let board = state.services.create_board(&principal, form).await?;

    Ok((StatusCode::CREATED, Json(board)))
}

/// Shared boards are readable anonymously
pub async fn get_board(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Board>> {
    Ok(Json(state.services.get_board(&principal, id).await?))
}

pub async fn update_board(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateBoardForm>, JsonRejection>,
) -> ApiResult<Json<Board>> {
    let Json(form) = payload?;

    Ok(Json(state.services.update_board(&principal, id, form).await?))
}

pub async fn delete_board(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.delete_board(&principal, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn leave_board(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.leave_board(&principal, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
