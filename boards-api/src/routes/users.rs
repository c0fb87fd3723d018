/// Current user endpoints
///
/// Every endpoint requires an authenticated principal.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use boards_shared::{
    auth::middleware::Principal,
    services::{
        signup::{ChangePasswordForm, SettingsForm},
        UserProfile,
    },
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct CancelAccountRequest {
    pub current_password: Option<String>,
}

pub async fn me(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<UserProfile>> {
    Ok(Json(state.services.me(&principal).await?))
}

/// Updates username, email and names
///
/// # Errors
///
/// - `400 Bad Request`: invalid or taken username or email
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<SettingsForm>, JsonRejection>,
) -> ApiResult<Json<UserProfile>> {
    let Json(form) = payload?;

    Ok(Json(state.services.update_settings(&principal, form).await?))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<ChangePasswordForm>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(form) = payload?;

    state.services.change_password(&principal, form).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Deactivates the user after re-checking their password
pub async fn cancel_account(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<CancelAccountRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(body) = payload?;

    state
        .services
        .cancel_account(&principal, body.current_password.as_deref())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
