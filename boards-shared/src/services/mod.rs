/// Workflows
///
/// Each public operation opens one unit of work, validates its input, checks
/// permissions against current rows, writes, and commits. Notifications are
/// written into the outbox inside the same unit of work.
///
/// # Modules
///
/// - `signup`: signup, signin, password reset and account settings
/// - `collaboration`: board collaborators, invitations and collaborator requests
/// - `boards`: board CRUD and leaving a board

pub mod boards;
pub mod collaboration;
pub mod signup;

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::auth::middleware::Principal;
use crate::auth::tokens::TokenService;
use crate::error::{push_error, DomainError, FieldErrors, REQUIRED};
use crate::models::{account::Account, user::User};
use crate::store::{Store, StoreTx};

/// Workflow switches
#[derive(Debug, Clone, Default)]
pub struct ServiceSettings {
    /// Accept signups that carry neither a signup request nor an invitation token
    pub allow_open_signup: bool,
}

/// Entry point to every workflow
#[derive(Clone)]
pub struct Services {
    store: Arc<dyn Store>,
    tokens: TokenService,
    settings: ServiceSettings,
}

impl Services {
    pub fn new(store: Arc<dyn Store>, tokens: TokenService, settings: ServiceSettings) -> Self {
        Self {
            store,
            tokens,
            settings,
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }
}

/// A user with the accounts they collaborate in
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub accounts: Vec<Account>,
}

impl UserProfile {
    pub(crate) async fn load(tx: &mut dyn StoreTx, user: User) -> Result<Self, DomainError> {
        let accounts = tx.accounts_for_user(user.id).await?;
        Ok(Self { user, accounts })
    }
}

/// The principal's user id, or `Unauthenticated`
pub(crate) fn authenticated(principal: &Principal) -> Result<Uuid, DomainError> {
    principal.user_id().ok_or(DomainError::Unauthenticated)
}

/// Loads the principal's user; deactivated users count as unauthenticated
pub(crate) async fn current_user(
    tx: &mut dyn StoreTx,
    principal: &Principal,
) -> Result<User, DomainError> {
    let user_id = authenticated(principal)?;

    match tx.user_by_id(user_id).await? {
        Some(user) if user.is_active => Ok(user),
        _ => Err(DomainError::Unauthenticated),
    }
}

/// Returns the trimmed-non-empty value or records a required error
pub(crate) fn required<'a>(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&'a str>,
) -> Option<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Some(v),
        _ => {
            push_error(errors, field, REQUIRED);
            None
        }
    }
}

pub(crate) fn has_errors(errors: &FieldErrors, field: &str) -> bool {
    errors.get(field).map_or(false, |messages| !messages.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required() {
        let mut errors = FieldErrors::new();

        assert_eq!(required(&mut errors, "email", Some("a@b.co")), Some("a@b.co"));
        assert!(errors.is_empty());

        assert_eq!(required(&mut errors, "email", Some("   ")), None);
        assert_eq!(required(&mut errors, "username", None), None);
        assert_eq!(errors["email"], vec![REQUIRED.to_string()]);
        assert!(has_errors(&errors, "username"));
        assert!(!has_errors(&errors, "password"));
    }

    #[test]
    fn test_authenticated() {
        assert!(matches!(
            authenticated(&Principal::Anonymous),
            Err(DomainError::Unauthenticated)
        ));

        let id = Uuid::new_v4();
        assert_eq!(authenticated(&Principal::user(id, "juan")).unwrap(), id);
    }
}
