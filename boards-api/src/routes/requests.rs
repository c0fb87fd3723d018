/// Collaborator request endpoints
///
/// Anyone may ask to join a board by email; only owners of the board's
/// account can see and decide requests. Deciding an already decided request
/// returns it unchanged.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use boards_shared::{
    auth::middleware::Principal,
    models::collaborator_request::CollaboratorRequest,
    services::collaboration::CollaboratorRequestForm,
};
use uuid::Uuid;

pub async fn list_requests(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Vec<CollaboratorRequest>>> {
    Ok(Json(state.services.list_requests(&principal).await?))
}

/// Records a pending request and notifies the account owners
pub async fn create_request(
    State(state): State<AppState>,
    payload: Result<Json<CollaboratorRequestForm>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CollaboratorRequest>)> {
    let Json(form) = payload?;

    let request = state.services.create_request(form).await?;

    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn get_request(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CollaboratorRequest>> {
    Ok(Json(state.services.get_request(&principal, id).await?))
}

/// Accepts a pending request, adding the requester as a read collaborator
pub async fn accept_request(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CollaboratorRequest>> {
    Ok(Json(state.services.accept_request(&principal, id).await?))
}

pub async fn reject_request(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CollaboratorRequest>> {
    Ok(Json(state.services.reject_request(&principal, id).await?))
}
