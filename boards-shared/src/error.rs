//! Domain error types
//!
//! Workflows fail with [`DomainError`]. Validation failures carry a mapping of
//! field name to messages; messages that are not tied to one field go under
//! [`NON_FIELD_ERRORS`].

use std::collections::BTreeMap;

use crate::auth::jwt::JwtError;
use crate::auth::password::PasswordError;
use crate::store::{constraints, StoreError};

/// Field name to the list of messages for that field
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Key for cross-field messages
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_EMAIL: &str = "Enter a valid email address.";
pub const ALREADY_COLLABORATOR: &str = "User is already a collaborator in this board.";

/// Builds a mapping holding one message for one field
pub fn field_error(field: &str, message: impl Into<String>) -> FieldErrors {
    let mut errors = FieldErrors::new();
    push_error(&mut errors, field, message);
    errors
}

/// Appends a message to a field
pub fn push_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.into());
}

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Validation failed")]
    Validation(FieldErrors),

    /// One entry per submitted item, empty for valid items
    #[error("Validation failed for {} items", .0.len())]
    BulkValidation(Vec<FieldErrors>),

    #[error("You do not have permission to perform this action.")]
    PermissionDenied,

    #[error("Not found.")]
    NotFound,

    /// A uniqueness race lost against a concurrent writer
    #[error("Conflict")]
    Conflict(FieldErrors),

    #[error("{}", ALREADY_COLLABORATOR)]
    AlreadyCollaborator,

    #[error("Authentication credentials were not provided.")]
    Unauthenticated,

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Jwt(#[from] JwtError),
}

impl DomainError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        DomainError::Validation(field_error(field, message))
    }

    /// Field mapping for errors that are reported per field
    pub fn field_errors(&self) -> Option<FieldErrors> {
        match self {
            DomainError::Validation(errors) | DomainError::Conflict(errors) => Some(errors.clone()),
            DomainError::AlreadyCollaborator => Some(field_error("user", ALREADY_COLLABORATOR)),
            _ => None,
        }
    }
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => DomainError::NotFound,
            StoreError::UniqueViolation(ref constraint) => match conflict_errors(constraint) {
                Some(errors) => DomainError::Conflict(errors),
                None => DomainError::Store(err),
            },
            StoreError::CheckViolation(ref constraint)
                if constraint == constraints::BOARD_COLLABORATOR_TARGET =>
            {
                DomainError::Validation(field_error(
                    NON_FIELD_ERRORS,
                    crate::models::board_collaborator::NO_TARGET_SET,
                ))
            }
            other => DomainError::Store(other),
        }
    }
}

/// Maps a unique constraint name to the field errors a client sees
pub fn conflict_errors(constraint: &str) -> Option<FieldErrors> {
    let (field, message) = match constraint {
        constraints::USER_USERNAME => ("username", "Username already exists."),
        constraints::USER_EMAIL => ("email", "Email already exists."),
        constraints::BOARD_COLLABORATOR_USER => ("user", ALREADY_COLLABORATOR),
        constraints::BOARD_COLLABORATOR_INVITED_USER => ("invited_user", ALREADY_COLLABORATOR),
        constraints::INVITED_USER_EMAIL => ("email", "User has already been invited to this account."),
        constraints::ACCOUNT_COLLABORATOR => ("user", "User is already a collaborator in this account."),
        constraints::ACCOUNT_SLUG => ("slug", "Account slug already exists."),
        _ => return None,
    };

    Some(field_error(field, message))
}
