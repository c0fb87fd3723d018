/// Signup, signin and account settings
///
/// Signup comes in three shapes, picked by which token the form carries:
///
/// - `invited_user_token`: joins the inviting account as a member as well
/// - `signup_request_token`: consumes a signup request
/// - neither: open signup, only when enabled
///
/// Field validators run in a fixed order and their messages are merged into
/// one mapping, so a client sees every problem with a form at once.

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{current_user, has_errors, required, Services, UserProfile};
use crate::auth::middleware::Principal;
use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::auth::tokens::TokenPurpose;
use crate::error::{
    push_error, DomainError, FieldErrors, INVALID_EMAIL, NON_FIELD_ERRORS, REQUIRED,
};
use crate::models::{
    account::{Account, CreateAccount},
    account_collaborator::CreateAccountCollaborator,
    board::CreateBoard,
    board_collaborator::{CollaboratorTarget, CreateBoardCollaborator, Permission},
    invited_user::InvitedUser,
    notification::CreateNotification,
    password_reset::CreatePasswordReset,
    signup_request::{CreateSignupRequest, SignupRequest},
    user::{CreateUser, User},
};
use crate::store::StoreTx;
use crate::validation::{
    check_username_shape, is_email, slug_candidate, slugify, EMAIL_EXISTS, EMAIL_MAX_LENGTH,
    USERNAME_EXISTS,
};

pub const INVALID_CREDENTIALS: &str = "Unable to login with provided credentials.";
pub const SIGNUP_REQUEST_EMAIL_MISMATCH: &str = "Signup request email does not match email.";
pub const INVITED_USER_EMAIL_MISMATCH: &str = "Invited user email does not match signup email.";
pub const NO_USER_FOUND: &str = "No user found.";
pub const INVALID_CURRENT_PASSWORD: &str = "Current password is invalid.";
pub const PASSWORD_MISMATCH: &str = "Password doesn't match the confirmation.";
const NAME_MAX_LENGTH: usize = 30;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupForm {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub account_logo_color: Option<String>,
    pub signup_request_token: Option<String>,
    pub invited_user_token: Option<String>,
}

/// Which signup flow a form selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupVariant<'a> {
    Plain,
    Request(&'a str),
    Invited(&'a str),
}

impl SignupForm {
    pub fn variant(&self) -> SignupVariant<'_> {
        if let Some(token) = self.invited_user_token.as_deref() {
            SignupVariant::Invited(token)
        } else if let Some(token) = self.signup_request_token.as_deref() {
            SignupVariant::Request(token)
        } else {
            SignupVariant::Plain
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SigninForm {
    pub username: Option<String>,
    pub password: Option<String>,
    pub invited_user_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsForm {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangePasswordForm {
    pub current_password: Option<String>,
    pub password1: Option<String>,
    pub password2: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsernameAvailability {
    pub username: String,
    pub exists: bool,
}

/// The token a signup form was resolved to
enum SignupToken {
    Open,
    Request(SignupRequest),
    Invited(InvitedUser),
}

impl Services {
    /// Registers a user with their own account and demo board
    pub async fn signup(&self, form: SignupForm) -> Result<UserProfile, DomainError> {
        let variant = form.variant();
        if variant == SignupVariant::Plain && !self.settings.allow_open_signup {
            return Err(DomainError::validation("signup_request_token", REQUIRED));
        }

        let mut errors = FieldErrors::new();

        let email = required(&mut errors, "email", form.email.as_deref());
        let username = required(&mut errors, "username", form.username.as_deref());
        let password = required(&mut errors, "password", form.password.as_deref());
        let logo_color = required(
            &mut errors,
            "account_logo_color",
            form.account_logo_color.as_deref(),
        );

        if let Some(email) = email {
            if email.len() > EMAIL_MAX_LENGTH || !is_email(email) {
                push_error(&mut errors, "email", INVALID_EMAIL);
            }
        }
        if let Some(username) = username {
            if let Err(message) = check_username_shape(username) {
                push_error(&mut errors, "username", message);
            }
        }
        if let Some(password) = password {
            if let Err(message) = validate_password_strength(password) {
                push_error(&mut errors, "password", message);
            }
        }

        let mut tx = self.store.begin().await?;

        if let Some(username) = username.filter(|_| !has_errors(&errors, "username")) {
            if tx.user_by_username(username).await?.is_some() {
                push_error(&mut errors, "username", USERNAME_EXISTS);
            }
        }
        if let Some(email) = email.filter(|_| !has_errors(&errors, "email")) {
            if tx.user_by_email(email).await?.is_some() {
                push_error(&mut errors, "email", EMAIL_EXISTS);
            }
        }

        let token = match variant {
            SignupVariant::Plain => Some(SignupToken::Open),
            SignupVariant::Request(token) => {
                match self.tokens.resolve_signup_request(tx.as_mut(), token).await? {
                    None => {
                        let message = TokenPurpose::SignupRequest.not_found_message();
                        push_error(&mut errors, "signup_request_token", message);
                        None
                    }
                    Some(request) if email.map_or(false, |e| e != request.email) => {
                        push_error(&mut errors, "signup_request_token", SIGNUP_REQUEST_EMAIL_MISMATCH);
                        None
                    }
                    Some(request) => Some(SignupToken::Request(request)),
                }
            }
            SignupVariant::Invited(token) => {
                match self.tokens.resolve_invited_user(tx.as_mut(), token).await? {
                    None => {
                        let message = TokenPurpose::InvitedUser.not_found_message();
                        push_error(&mut errors, "invited_user_token", message);
                        None
                    }
                    Some(invited) if email.map_or(false, |e| e != invited.email) => {
                        push_error(&mut errors, "invited_user_token", INVITED_USER_EMAIL_MISMATCH);
                        None
                    }
                    Some(invited) => Some(SignupToken::Invited(invited)),
                }
            }
        };

        let (Some(email), Some(username), Some(password), Some(logo_color), Some(token)) =
            (email, username, password, logo_color, token)
        else {
            return Err(DomainError::Validation(errors));
        };
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        let user = tx
            .insert_user(CreateUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash: hash_password(password)?,
                first_name: String::new(),
                last_name: String::new(),
            })
            .await?;

        let account = create_account(tx.as_mut(), &user, username, logo_color).await?;

        match token {
            SignupToken::Open => {}
            SignupToken::Request(request) => {
                tx.delete_signup_request(request.id).await?;
            }
            SignupToken::Invited(invited) => {
                accept_invitation(tx.as_mut(), invited, &user).await?;
            }
        }

        let board = tx
            .insert_board(CreateBoard::demo(
                account.id,
                user.id,
                account.logo_color.clone(),
            ))
            .await?;
        tx.insert_board_collaborator(CreateBoardCollaborator::new(
            board.id,
            CollaboratorTarget::User(user.id),
            Permission::Write,
            Some(user.id),
        ))
        .await?;

        let profile = UserProfile::load(tx.as_mut(), user).await?;
        tx.commit().await?;

        info!(
            user_id = %profile.user.id,
            account_id = %account.id,
            board_id = %board.id,
            "User signed up"
        );

        Ok(profile)
    }

    /// Authenticates a user, accepting a pending invitation when a token is given
    pub async fn signin(&self, form: SigninForm) -> Result<UserProfile, DomainError> {
        let mut errors = FieldErrors::new();
        let username = required(&mut errors, "username", form.username.as_deref());
        let password = required(&mut errors, "password", form.password.as_deref());

        let mut tx = self.store.begin().await?;

        let invited = match form.invited_user_token.as_deref() {
            None => None,
            Some(token) => {
                let invited = self.tokens.resolve_invited_user(tx.as_mut(), token).await?;
                if invited.is_none() {
                    let message = TokenPurpose::InvitedUser.not_found_message();
                    push_error(&mut errors, "invited_user_token", message);
                }
                invited
            }
        };

        let (Some(username), Some(password)) = (username, password) else {
            return Err(DomainError::Validation(errors));
        };
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        let user = match tx.user_by_username(username).await? {
            Some(user) if user.is_active && verify_password(password, &user.password_hash)? => user,
            _ => return Err(DomainError::validation(NON_FIELD_ERRORS, INVALID_CREDENTIALS)),
        };

        if let Some(invited) = invited {
            accept_invitation(tx.as_mut(), invited, &user).await?;
        }

        let profile = UserProfile::load(tx.as_mut(), user).await?;
        tx.commit().await?;

        info!(user_id = %profile.user.id, "User signed in");

        Ok(profile)
    }

    /// Reports whether a username is taken
    pub async fn validate_username(
        &self,
        username: Option<&str>,
    ) -> Result<UsernameAvailability, DomainError> {
        let mut errors = FieldErrors::new();
        let Some(username) = required(&mut errors, "username", username) else {
            return Err(DomainError::Validation(errors));
        };

        let username = username.to_lowercase();
        check_username_shape(&username).map_err(|message| DomainError::validation("username", message))?;

        let mut tx = self.store.begin().await?;
        let exists = tx.user_by_username(&username).await?.is_some();

        Ok(UsernameAvailability { username, exists })
    }

    /// Stores a signup request and emails its token
    pub async fn request_signup(&self, email: Option<&str>) -> Result<SignupRequest, DomainError> {
        let mut errors = FieldErrors::new();
        let Some(email) = required(&mut errors, "email", email) else {
            return Err(DomainError::Validation(errors));
        };
        if email.len() > EMAIL_MAX_LENGTH || !is_email(email) {
            return Err(DomainError::validation("email", INVALID_EMAIL));
        }

        let mut tx = self.store.begin().await?;

        if tx.user_by_email(email).await?.is_some() {
            return Err(DomainError::validation("email", EMAIL_EXISTS));
        }

        let issued = self.tokens.issue(TokenPurpose::SignupRequest);
        let request = tx
            .insert_signup_request(CreateSignupRequest {
                email: email.to_string(),
                token_hash: issued.hash,
            })
            .await?;
        tx.insert_notification(CreateNotification::signup_request(email, &issued.token))
            .await?;
        tx.commit().await?;

        info!(signup_request_id = %request.id, "Signup requested");

        Ok(request)
    }

    /// Emails a password reset token to the user owning `email`
    pub async fn forgot_password(&self, email: Option<&str>) -> Result<(), DomainError> {
        let mut errors = FieldErrors::new();
        let Some(email) = required(&mut errors, "email", email) else {
            return Err(DomainError::Validation(errors));
        };

        let mut tx = self.store.begin().await?;

        let Some(user) = tx.user_by_email(email).await? else {
            return Err(DomainError::validation("email", NO_USER_FOUND));
        };

        let issued = self.tokens.issue(TokenPurpose::PasswordReset);
        tx.insert_password_reset(CreatePasswordReset {
            user_id: user.id,
            token_hash: issued.hash,
        })
        .await?;
        tx.insert_notification(CreateNotification::password_reset(&user, &issued.token))
            .await?;
        tx.commit().await?;

        info!(user_id = %user.id, "Password reset requested");

        Ok(())
    }

    /// Sets a new password from a reset token
    pub async fn reset_password(
        &self,
        token: Option<&str>,
        password: Option<&str>,
    ) -> Result<UserProfile, DomainError> {
        let mut errors = FieldErrors::new();
        let token = required(&mut errors, "token", token);
        let password = required(&mut errors, "password", password);

        if let Some(password) = password {
            if let Err(message) = validate_password_strength(password) {
                push_error(&mut errors, "password", message);
            }
        }

        let mut tx = self.store.begin().await?;

        let reset = match token {
            Some(token) => {
                let reset = self.tokens.resolve_password_reset(tx.as_mut(), token).await?;
                if reset.is_none() {
                    push_error(&mut errors, "token", TokenPurpose::PasswordReset.not_found_message());
                }
                reset
            }
            None => None,
        };

        let (Some(reset), Some(password)) = (reset, password) else {
            return Err(DomainError::Validation(errors));
        };
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        let mut user = tx.user_by_id(reset.user_id).await?.ok_or(DomainError::NotFound)?;
        user.password_hash = hash_password(password)?;
        let user = tx.update_user(&user).await?;
        tx.delete_password_resets(user.id).await?;

        let profile = UserProfile::load(tx.as_mut(), user).await?;
        tx.commit().await?;

        info!(user_id = %profile.user.id, "Password reset");

        Ok(profile)
    }

    /// The principal's own representation
    pub async fn me(&self, principal: &Principal) -> Result<UserProfile, DomainError> {
        let mut tx = self.store.begin().await?;
        let user = current_user(tx.as_mut(), principal).await?;

        UserProfile::load(tx.as_mut(), user).await
    }

    /// Updates username, email and names
    pub async fn update_settings(
        &self,
        principal: &Principal,
        form: SettingsForm,
    ) -> Result<UserProfile, DomainError> {
        let mut tx = self.store.begin().await?;
        let mut user = current_user(tx.as_mut(), principal).await?;
        let mut errors = FieldErrors::new();

        if let Some(username) = form.username.as_deref() {
            let username = username.trim().to_lowercase();
            if username.is_empty() {
                push_error(&mut errors, "username", REQUIRED);
            } else if let Err(message) = check_username_shape(&username) {
                push_error(&mut errors, "username", message);
            } else if is_taken_by_other(tx.user_by_username(&username).await?, user.id) {
                push_error(&mut errors, "username", USERNAME_EXISTS);
            } else {
                user.username = username;
            }
        }

        if let Some(email) = form.email.as_deref() {
            let email = email.trim();
            if email.len() > EMAIL_MAX_LENGTH || !is_email(email) {
                push_error(&mut errors, "email", INVALID_EMAIL);
            } else if is_taken_by_other(tx.user_by_email(email).await?, user.id) {
                push_error(&mut errors, "email", EMAIL_EXISTS);
            } else {
                user.email = email.to_string();
            }
        }

        for (field, value, target) in [
            ("first_name", form.first_name, &mut user.first_name),
            ("last_name", form.last_name, &mut user.last_name),
        ] {
            if let Some(value) = value {
                if value.chars().count() > NAME_MAX_LENGTH {
                    push_error(
                        &mut errors,
                        field,
                        format!("Ensure this field has no more than {} characters.", NAME_MAX_LENGTH),
                    );
                } else {
                    *target = value;
                }
            }
        }

        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        let user = tx.update_user(&user).await?;
        let profile = UserProfile::load(tx.as_mut(), user).await?;
        tx.commit().await?;

        Ok(profile)
    }

    pub async fn change_password(
        &self,
        principal: &Principal,
        form: ChangePasswordForm,
    ) -> Result<(), DomainError> {
        let mut errors = FieldErrors::new();
        let current = required(&mut errors, "current_password", form.current_password.as_deref());
        let password1 = required(&mut errors, "password1", form.password1.as_deref());
        let password2 = required(&mut errors, "password2", form.password2.as_deref());

        let mut tx = self.store.begin().await?;
        let mut user = current_user(tx.as_mut(), principal).await?;

        if let Some(current) = current {
            if !verify_password(current, &user.password_hash)? {
                push_error(&mut errors, "current_password", INVALID_CURRENT_PASSWORD);
            }
        }
        if let Some(password1) = password1 {
            if let Err(message) = validate_password_strength(password1) {
                push_error(&mut errors, "password1", message);
            }
            if password2.map_or(false, |p| p != password1) {
                push_error(&mut errors, "password2", PASSWORD_MISMATCH);
            }
        }

        let Some(password) = password1 else {
            return Err(DomainError::Validation(errors));
        };
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        user.password_hash = hash_password(password)?;
        tx.update_user(&user).await?;
        tx.commit().await?;

        info!(user_id = %user.id, "Password changed");

        Ok(())
    }

    /// Deactivates the principal's user
    pub async fn cancel_account(
        &self,
        principal: &Principal,
        current_password: Option<&str>,
    ) -> Result<(), DomainError> {
        let mut errors = FieldErrors::new();
        let current = required(&mut errors, "current_password", current_password);

        let mut tx = self.store.begin().await?;
        let mut user = current_user(tx.as_mut(), principal).await?;

        let Some(current) = current else {
            return Err(DomainError::Validation(errors));
        };
        if !verify_password(current, &user.password_hash)? {
            return Err(DomainError::validation("current_password", INVALID_CURRENT_PASSWORD));
        }

        user.is_active = false;
        tx.update_user(&user).await?;
        tx.commit().await?;

        info!(user_id = %user.id, "Account cancelled");

        Ok(())
    }
}

fn is_taken_by_other(found: Option<User>, user_id: Uuid) -> bool {
    found.map_or(false, |other| other.id != user_id)
}

/// Creates the user's account with a free slug and makes them its owner
async fn create_account(
    tx: &mut dyn StoreTx,
    user: &User,
    name: &str,
    logo_color: &str,
) -> Result<Account, DomainError> {
    let base = slugify(name);
    let mut n = 1;
    let mut slug = slug_candidate(&base, n);
    while tx.account_slug_exists(&slug).await? {
        n += 1;
        slug = slug_candidate(&base, n);
    }

    let account = tx
        .insert_account(CreateAccount {
            name: name.to_string(),
            slug,
            logo_color: Some(logo_color.to_string()),
            created_by: user.id,
        })
        .await?;
    tx.insert_account_collaborator(CreateAccountCollaborator::owner(account.id, user.id))
        .await?;

    Ok(account)
}

/// Turns a pending invitation into memberships of `user`
///
/// The user joins the inviting account as a member and takes over every board
/// collaborator row of the invitation. A row on a board the user already
/// collaborates on is dropped instead.
pub(crate) async fn accept_invitation(
    tx: &mut dyn StoreTx,
    mut invited: InvitedUser,
    user: &User,
) -> Result<InvitedUser, DomainError> {
    if tx.account_collaborator(invited.account_id, user.id).await?.is_none() {
        tx.insert_account_collaborator(CreateAccountCollaborator::member(
            invited.account_id,
            user.id,
        ))
        .await?;
    }

    for mut row in tx.board_collaborators_for_invited_user(invited.id).await? {
        if tx.board_collaborator_for_user(row.board_id, user.id).await?.is_some() {
            tx.delete_board_collaborator(row.id).await?;
            if invited.board_collaborator_id == Some(row.id) {
                invited.board_collaborator_id = None;
            }
        } else {
            row.user_id = Some(user.id);
            row.invited_user_id = None;
            row.modified_by = Some(user.id);
            tx.update_board_collaborator(&row).await?;
        }
    }

    invited.mark_accepted(user.id);
    let invited = tx.update_invited_user(&invited).await?;

    info!(invited_user_id = %invited.id, user_id = %user.id, "Invitation accepted");

    Ok(invited)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(invited: Option<&str>, request: Option<&str>) -> SignupForm {
        SignupForm {
            invited_user_token: invited.map(String::from),
            signup_request_token: request.map(String::from),
            ..SignupForm::default()
        }
    }

    #[test]
    fn test_variant_selection() {
        assert_eq!(form(None, None).variant(), SignupVariant::Plain);
        assert_eq!(form(None, Some("sr_x")).variant(), SignupVariant::Request("sr_x"));
        assert_eq!(form(Some("iu_x"), None).variant(), SignupVariant::Invited("iu_x"));
        assert_eq!(form(Some("iu_x"), Some("sr_x")).variant(), SignupVariant::Invited("iu_x"));
    }

    #[test]
    fn test_is_taken_by_other() {
        let now = chrono::Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: "juan".to_string(),
            email: "juan@example.com".to_string(),
            password_hash: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        assert!(!is_taken_by_other(None, user.id));
        assert!(!is_taken_by_other(Some(user.clone()), user.id));
        assert!(is_taken_by_other(Some(user), Uuid::new_v4()));
    }
}
