/// Opaque emailed tokens
///
/// Signup requests, invitations and password resets hand the user a random
/// token by email. Only the SHA-256 hex digest is stored, on the record the
/// token is bound to; presenting the token looks that record up by digest.
///
/// # Format
///
/// ```text
/// sr_<40 base62 chars>   signup request
/// iu_<40 base62 chars>   invited user
/// pr_<40 base62 chars>   password reset
/// ```
///
/// Tokens are single use: the workflow that consumes one deletes or clears the
/// digest in the same unit of work.
///
/// # Example
///
/// ```
/// use boards_shared::auth::tokens::{hash_token, TokenPurpose, TokenService};
///
/// let service = TokenService::default();
/// let issued = service.issue(TokenPurpose::SignupRequest);
///
/// assert!(issued.token.starts_with("sr_"));
/// assert_eq!(hash_token(&issued.token), issued.hash);
/// ```

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, Rng};
use sha2::{Digest, Sha256};

use crate::models::{
    invited_user::InvitedUser, password_reset::PasswordReset, signup_request::SignupRequest,
};
use crate::store::{StoreResult, StoreTx};

/// Length of the random part of a token
const TOKEN_RANDOM_LENGTH: usize = 40;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// What a token was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    SignupRequest,
    InvitedUser,
    PasswordReset,
}

impl TokenPurpose {
    pub fn prefix(&self) -> &'static str {
        match self {
            TokenPurpose::SignupRequest => "sr_",
            TokenPurpose::InvitedUser => "iu_",
            TokenPurpose::PasswordReset => "pr_",
        }
    }

    /// Message reported on the token field when resolution fails
    pub fn not_found_message(&self) -> &'static str {
        match self {
            TokenPurpose::SignupRequest => "No signup request found for token.",
            TokenPurpose::InvitedUser => "No invited user found for token.",
            TokenPurpose::PasswordReset => "Invalid password reset token.",
        }
    }
}

/// A freshly issued token and the digest to store
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Sent to the user, never stored
    pub token: String,

    /// SHA-256 hex digest of `token`
    pub hash: String,
}

/// Token lifetimes
#[derive(Debug, Clone, Copy)]
pub struct TokenPolicy {
    pub signup_request_ttl: Duration,
    pub invited_user_ttl: Duration,
    pub password_reset_ttl: Duration,
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            signup_request_ttl: Duration::days(7),
            invited_user_ttl: Duration::days(30),
            password_reset_ttl: Duration::hours(24),
        }
    }
}

impl TokenPolicy {
    pub fn ttl(&self, purpose: TokenPurpose) -> Duration {
        match purpose {
            TokenPurpose::SignupRequest => self.signup_request_ttl,
            TokenPurpose::InvitedUser => self.invited_user_ttl,
            TokenPurpose::PasswordReset => self.password_reset_ttl,
        }
    }
}

/// Record a token resolved to
#[derive(Debug, Clone)]
pub enum TokenSubject {
    SignupRequest(SignupRequest),
    InvitedUser(InvitedUser),
    PasswordReset(PasswordReset),
}

/// Issues and resolves emailed tokens
#[derive(Debug, Clone, Default)]
pub struct TokenService {
    policy: TokenPolicy,
}

/// Hashes a token for storage or lookup
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn generate_random_string(length: usize) -> String {
    let mut rng = OsRng;

    (0..length)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// Whether `token` has the shape of a token for `purpose`
pub fn has_valid_format(token: &str, purpose: TokenPurpose) -> bool {
    match token.strip_prefix(purpose.prefix()) {
        Some(random_part) => {
            random_part.len() == TOKEN_RANDOM_LENGTH
                && random_part.chars().all(|c| c.is_ascii_alphanumeric())
        }
        None => false,
    }
}

impl TokenService {
    pub fn new(policy: TokenPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &TokenPolicy {
        &self.policy
    }

    /// Generates a token for `purpose`
    pub fn issue(&self, purpose: TokenPurpose) -> IssuedToken {
        let token = format!(
            "{}{}",
            purpose.prefix(),
            generate_random_string(TOKEN_RANDOM_LENGTH)
        );
        let hash = hash_token(&token);

        IssuedToken { token, hash }
    }

    /// Whether a token issued at `issued_at` is past its lifetime at `now`
    pub fn is_expired(
        &self,
        purpose: TokenPurpose,
        issued_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> bool {
        now - issued_at > self.policy.ttl(purpose)
    }

    /// Looks up the record bound to `token`
    ///
    /// Malformed, unknown, consumed and expired tokens all resolve to `None`.
    pub async fn resolve(
        &self,
        tx: &mut dyn StoreTx,
        token: &str,
        purpose: TokenPurpose,
    ) -> StoreResult<Option<TokenSubject>> {
        if !has_valid_format(token, purpose) {
            return Ok(None);
        }

        let hash = hash_token(token);
        let now = Utc::now();

        let subject = match purpose {
            TokenPurpose::SignupRequest => tx
                .signup_request_by_token_hash(&hash)
                .await?
                .filter(|request| !self.is_expired(purpose, request.created_at, now))
                .map(TokenSubject::SignupRequest),
            TokenPurpose::InvitedUser => tx
                .invited_user_by_token_hash(&hash)
                .await?
                .filter(|invited| invited.is_pending())
                .filter(|invited| {
                    let issued_at = invited.token_issued_at.unwrap_or(invited.created_at);
                    !self.is_expired(purpose, issued_at, now)
                })
                .map(TokenSubject::InvitedUser),
            TokenPurpose::PasswordReset => tx
                .password_reset_by_token_hash(&hash)
                .await?
                .filter(|reset| !self.is_expired(purpose, reset.created_at, now))
                .map(TokenSubject::PasswordReset),
        };

        Ok(subject)
    }

    pub async fn resolve_signup_request(
        &self,
        tx: &mut dyn StoreTx,
        token: &str,
    ) -> StoreResult<Option<SignupRequest>> {
        match self.resolve(tx, token, TokenPurpose::SignupRequest).await? {
            Some(TokenSubject::SignupRequest(request)) => Ok(Some(request)),
            _ => Ok(None),
        }
    }

    pub async fn resolve_invited_user(
        &self,
        tx: &mut dyn StoreTx,
        token: &str,
    ) -> StoreResult<Option<InvitedUser>> {
        match self.resolve(tx, token, TokenPurpose::InvitedUser).await? {
            Some(TokenSubject::InvitedUser(invited)) => Ok(Some(invited)),
            _ => Ok(None),
        }
    }

    pub async fn resolve_password_reset(
        &self,
        tx: &mut dyn StoreTx,
        token: &str,
    ) -> StoreResult<Option<PasswordReset>> {
        match self.resolve(tx, token, TokenPurpose::PasswordReset).await? {
            Some(TokenSubject::PasswordReset(reset)) => Ok(Some(reset)),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::signup_request::CreateSignupRequest;
    use crate::store::{memory::MemoryStore, Store};

    #[test]
    fn test_issue_format() {
        let service = TokenService::default();

        let first = service.issue(TokenPurpose::InvitedUser);
        let second = service.issue(TokenPurpose::InvitedUser);

        assert!(first.token.starts_with("iu_"));
        assert_eq!(first.token.len(), 43);
        assert!(has_valid_format(&first.token, TokenPurpose::InvitedUser));
        assert_ne!(first.token, second.token);
        assert_eq!(first.hash.len(), 64);
    }

    #[test]
    fn test_prefix_must_match_purpose() {
        let service = TokenService::default();
        let issued = service.issue(TokenPurpose::SignupRequest);

        assert!(!has_valid_format(&issued.token, TokenPurpose::PasswordReset));
        assert!(!has_valid_format("sr_short", TokenPurpose::SignupRequest));
    }

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash_token("sr_abc"), hash_token("sr_abc"));
        assert_ne!(hash_token("sr_abc"), hash_token("sr_abd"));
    }

    #[test]
    fn test_expiry() {
        let service = TokenService::default();
        let now = Utc::now();

        assert!(!service.is_expired(TokenPurpose::PasswordReset, now - Duration::hours(23), now));
        assert!(service.is_expired(TokenPurpose::PasswordReset, now - Duration::hours(25), now));
        assert!(!service.is_expired(TokenPurpose::SignupRequest, now - Duration::days(6), now));
    }

    #[tokio::test]
    async fn test_resolve_signup_request() {
        let store = MemoryStore::new();
        let service = TokenService::default();
        let issued = service.issue(TokenPurpose::SignupRequest);

        let mut tx = store.begin().await.unwrap();
        tx.insert_signup_request(CreateSignupRequest {
            email: "juan@example.com".to_string(),
            token_hash: issued.hash.clone(),
        })
        .await
        .unwrap();

        let request = service
            .resolve_signup_request(tx.as_mut(), &issued.token)
            .await
            .unwrap()
            .expect("token should resolve");
        assert_eq!(request.email, "juan@example.com");

        let other = service.issue(TokenPurpose::SignupRequest);
        assert!(service
            .resolve_signup_request(tx.as_mut(), &other.token)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_expired_token_does_not_resolve() {
        let store = MemoryStore::new();
        let service = TokenService::new(TokenPolicy {
            signup_request_ttl: Duration::seconds(-1),
            ..TokenPolicy::default()
        });
        let issued = service.issue(TokenPurpose::SignupRequest);

        let mut tx = store.begin().await.unwrap();
        tx.insert_signup_request(CreateSignupRequest {
            email: "juan@example.com".to_string(),
            token_hash: issued.hash,
        })
        .await
        .unwrap();

        assert!(service
            .resolve_signup_request(tx.as_mut(), &issued.token)
            .await
            .unwrap()
            .is_none());
    }
}
