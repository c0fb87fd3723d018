/// Signup, signin and password recovery endpoints
///
/// All endpoints here accept anonymous callers.
///
/// # Endpoints
///
/// - `POST /v1/auth/signup` - Create a user (plain, signup request or invitation)
/// - `POST /v1/auth/signin` - Exchange credentials for a session token
/// - `POST /v1/auth/signup_request` - Ask for an emailed signup token
/// - `POST /v1/auth/username/validate` - Check whether a username is taken
/// - `POST /v1/auth/forgot_password` - Email a password reset token
/// - `POST /v1/auth/reset_password` - Set a new password with a reset token

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use boards_shared::{
    auth::jwt,
    services::{
        signup::{SigninForm, SignupForm, UsernameAvailability},
        UserProfile,
    },
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user profile with a fresh session token
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub profile: UserProfile,

    /// Bearer token for subsequent requests
    pub token: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct EmailRequest {
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UsernameRequest {
    pub username: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignupRequestResponse {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ForgotPasswordResponse {
    pub email: String,
}

fn session(state: &AppState, profile: UserProfile) -> ApiResult<SessionResponse> {
    let token = jwt::issue_session_token(
        profile.user.id,
        &profile.user.username,
        state.jwt_secret(),
        state.config.session_lifetime(),
    )?;

    Ok(SessionResponse { profile, token })
}

/// Creates a user, their account and a demo board
///
/// The variant is chosen by the token present in the body:
/// `invited_user_token` takes over an invitation, `signup_request_token`
/// consumes an emailed signup request, neither is an open signup.
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/signup
/// Content-Type: application/json
///
/// {
///   "email": "juan@example.com",
///   "username": "juan",
///   "password": "Sup3r$ecret",
///   "signup_request_token": "sr_..."
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: field errors, including bad or expired tokens
/// - `409 Conflict`: username or email taken by a concurrent signup
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupForm>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let Json(form) = payload?;

    let profile = state.services.signup(form).await?;

    Ok((StatusCode::CREATED, Json(session(&state, profile)?)))
}

/// Authenticates by username, ignoring case, and password
///
/// An `invited_user_token` in the body is accepted for the signed in user.
///
/// # Errors
///
/// - `400 Bad Request`: missing fields or invalid credentials
pub async fn signin(
    State(state): State<AppState>,
    payload: Result<Json<SigninForm>, JsonRejection>,
) -> ApiResult<Json<SessionResponse>> {
    let Json(form) = payload?;

    let profile = state.services.signin(form).await?;

    Ok(Json(session(&state, profile)?))
}

/// Records a signup request and queues its emailed token
pub async fn request_signup(
    State(state): State<AppState>,
    payload: Result<Json<EmailRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SignupRequestResponse>)> {
    let Json(body) = payload?;

    let request = state.services.request_signup(body.email.as_deref()).await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupRequestResponse {
            id: request.id,
            email: request.email,
            created_at: request.created_at,
        }),
    ))
}

pub async fn validate_username(
    State(state): State<AppState>,
    payload: Result<Json<UsernameRequest>, JsonRejection>,
) -> ApiResult<Json<UsernameAvailability>> {
    let Json(body) = payload?;

    Ok(Json(
        state.services.validate_username(body.username.as_deref()).await?,
    ))
}

/// Queues a password reset email for an active user
///
/// # Errors
///
/// - `400 Bad Request`: no active user has this email
pub async fn forgot_password(
    State(state): State<AppState>,
    payload: Result<Json<EmailRequest>, JsonRejection>,
) -> ApiResult<Json<ForgotPasswordResponse>> {
    let Json(body) = payload?;

    state.services.forgot_password(body.email.as_deref()).await?;

    Ok(Json(ForgotPasswordResponse {
        email: body.email.unwrap_or_default(),
    }))
}

/// Sets a new password and signs the user in
pub async fn reset_password(
    State(state): State<AppState>,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> ApiResult<Json<SessionResponse>> {
    let Json(body) = payload?;

    let profile = state
        .services
        .reset_password(body.token.as_deref(), body.password.as_deref())
        .await?;

    Ok(Json(session(&state, profile)?))
}
