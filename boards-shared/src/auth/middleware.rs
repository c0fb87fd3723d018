/// Request principal extraction
///
/// Every route accepts anonymous callers and decides access later, so a
/// missing `Authorization` header is never an error:
///
/// - no `Authorization` header: [`Principal::Anonymous`]
/// - a valid `Bearer` session token: [`Principal::User`]
/// - anything else: [`AuthError`]
///
/// # Example
///
/// ```
/// use axum::http::HeaderMap;
/// use boards_shared::auth::middleware::principal_from_headers;
///
/// let principal = principal_from_headers(&HeaderMap::new(), "secret").unwrap();
/// assert!(principal.is_anonymous());
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};

/// Authenticated user behind a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
}

/// Who is making a request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Principal {
    #[default]
    Anonymous,
    User(AuthUser),
}

impl Principal {
    pub fn user(user_id: Uuid, username: impl Into<String>) -> Self {
        Principal::User(AuthUser {
            user_id,
            username: username.into(),
        })
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Principal::Anonymous)
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Principal::Anonymous => None,
            Principal::User(user) => Some(user.user_id),
        }
    }
}

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Header present but not `Bearer <token>`
    #[error("{0}")]
    InvalidFormat(String),

    /// Token failed validation
    #[error("{0}")]
    InvalidToken(String),
}

/// Resolves the principal from request headers
pub fn principal_from_headers(headers: &HeaderMap, secret: &str) -> Result<Principal, AuthError> {
    let auth_header = match headers.get(header::AUTHORIZATION) {
        None => return Ok(Principal::Anonymous),
        Some(value) => value
            .to_str()
            .map_err(|_| AuthError::InvalidFormat("Invalid authorization header".to_string()))?,
    };

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = validate_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken("Invalid token".to_string()),
    })?;

    Ok(Principal::user(claims.sub, claims.username))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, Claims};
    use axum::http::HeaderValue;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_missing_header_is_anonymous() {
        let principal = principal_from_headers(&HeaderMap::new(), SECRET).unwrap();
        assert!(principal.is_anonymous());
        assert!(principal.user_id().is_none());
    }

    #[test]
    fn test_valid_bearer_token() {
        let user_id = Uuid::new_v4();
        let token = create_token(&Claims::new(user_id, "juan"), SECRET).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );

        let principal = principal_from_headers(&headers, SECRET).unwrap();
        assert_eq!(principal, Principal::user(user_id, "juan"));
    }

    #[test]
    fn test_invalid_token_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer nope"));
        assert!(matches!(
            principal_from_headers(&headers, SECRET),
            Err(AuthError::InvalidToken(_))
        ));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Token abc"));
        assert!(matches!(
            principal_from_headers(&headers, SECRET),
            Err(AuthError::InvalidFormat(_))
        ));
    }
}
