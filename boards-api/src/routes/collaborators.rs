/// Board collaborator endpoints
///
/// `POST /v1/boards/collaborators` takes either one object or an array of
/// objects. An array is all-or-nothing: when any item is invalid nothing is
/// stored and the 400 body is an array of field error maps aligned with the
/// payload, with `{}` for the valid items.
///
/// ```text
/// POST /v1/boards/collaborators
/// Content-Type: application/json
///
/// [
///   { "board": "uuid", "email": "ana@example.com", "permission": "read" },
///   { "board": "uuid", "user": "uuid", "permission": "write" }
/// ]
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use boards_shared::{
    auth::middleware::Principal,
    services::collaboration::{CollaboratorPayload, CollaboratorView, UpdateCollaboratorForm},
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct CollaboratorQuery {
    /// Restrict the listing to one board
    pub board: Option<Uuid>,
}

pub async fn list_collaborators(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<CollaboratorQuery>,
) -> ApiResult<Json<Vec<CollaboratorView>>> {
    Ok(Json(
        state
            .services
            .list_collaborators(&principal, query.board)
            .await?,
    ))
}

/// Adds one collaborator, or several at once
///
/// Responds with an object for an object payload and an array for an array
/// payload.
///
/// # Errors
///
/// - `400 Bad Request`: field errors (a map, or an array of maps for arrays)
/// - `401 Unauthorized`: anonymous caller
/// - `403 Forbidden`: no write access to one of the boards
pub async fn add_collaborators(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<CollaboratorPayload>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(payload) = payload?;
    let is_bulk = payload.is_bulk();

    let mut created = state.services.add_collaborators(&principal, payload).await?;

    if is_bulk {
        return Ok((StatusCode::CREATED, Json(created)).into_response());
    }

    match created.pop() {
        Some(view) => Ok((StatusCode::CREATED, Json(view)).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

pub async fn get_collaborator(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CollaboratorView>> {
    Ok(Json(state.services.get_collaborator(&principal, id).await?))
}

/// Changes a collaborator's permission
///
/// Sends the invitation email the first time an invited collaborator is
/// saved.
pub async fn update_collaborator(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateCollaboratorForm>, JsonRejection>,
) -> ApiResult<Json<CollaboratorView>> {
    let Json(form) = payload?;

    Ok(Json(
        state
            .services
            .update_collaborator(&principal, id, form)
            .await?,
    ))
}

pub async fn remove_collaborator(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.remove_collaborator(&principal, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
