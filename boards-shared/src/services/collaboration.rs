/// Board collaborators, invitations and collaborator requests
///
/// Creating a collaborator row never emails anyone. The first time a row that
/// points at an invited user is saved again, the invited user is linked to it,
/// gets a fresh invitation token, and one invitation lands in the outbox.
/// Accepting a collaborator request does both steps in one unit of work.

use std::collections::HashSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{authenticated, current_user, required, Services};
use crate::auth::authorization::{
    can_access, can_access_collaborator, can_add_collaborators, can_list_collaborators,
    can_manage_request, is_account_owner, require, AccessMode, CollaboratorAction,
};
use crate::auth::middleware::Principal;
use crate::auth::tokens::TokenPurpose;
use crate::error::{
    field_error, push_error, DomainError, FieldErrors, ALREADY_COLLABORATOR, INVALID_EMAIL,
    NON_FIELD_ERRORS, REQUIRED,
};
use crate::models::{
    board::Board,
    board_collaborator::{
        BoardCollaborator, CollaboratorTarget, CreateBoardCollaborator, Permission,
        BOTH_TARGETS_SET, NO_TARGET_SET,
    },
    collaborator_request::{CollaboratorRequest, CreateCollaboratorRequest, RequestStatus},
    invited_user::CreateInvitedUser,
    notification::CreateNotification,
    user::User,
};
use crate::store::{StoreResult, StoreTx};
use crate::validation::{is_email, EMAIL_MAX_LENGTH};

/// One collaborator to add
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollaboratorForm {
    pub board: Option<Uuid>,
    pub permission: Option<Permission>,
    pub user: Option<Uuid>,
    pub email: Option<String>,
}

/// A create payload: one object or an array of them
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CollaboratorPayload {
    Bulk(Vec<CollaboratorForm>),
    Single(CollaboratorForm),
}

impl CollaboratorPayload {
    /// Array payloads answer with an array, even for one item
    pub fn is_bulk(&self) -> bool {
        matches!(self, CollaboratorPayload::Bulk(_))
    }

    fn into_forms(self) -> (Vec<CollaboratorForm>, bool) {
        match self {
            CollaboratorPayload::Bulk(forms) => (forms, true),
            CollaboratorPayload::Single(form) => (vec![form], false),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCollaboratorForm {
    pub permission: Option<Permission>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollaboratorRequestForm {
    pub email: Option<String>,
    pub board: Option<Uuid>,
}

/// Public fields of the user or invited user behind a collaborator row
#[derive(Debug, Clone, Serialize)]
pub struct CollaboratorUserData {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub is_invited: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollaboratorView {
    #[serde(flatten)]
    pub collaborator: BoardCollaborator,
    pub user_data: Option<CollaboratorUserData>,
}

fn does_not_exist(id: Uuid) -> String {
    format!("Invalid pk \"{}\" - object does not exist.", id)
}

impl Services {
    /// Adds one or many collaborators
    ///
    /// A bulk payload is all-or-nothing: when any item fails, nothing is
    /// written and the errors come back aligned with the items.
    pub async fn add_collaborators(
        &self,
        principal: &Principal,
        payload: CollaboratorPayload,
    ) -> Result<Vec<CollaboratorView>, DomainError> {
        let (forms, is_bulk) = payload.into_forms();
        require(principal, !principal.is_anonymous())?;

        let mut tx = self.store.begin().await?;
        let inviter = current_user(tx.as_mut(), principal).await?;

        let mut errors = vec![FieldErrors::new(); forms.len()];
        let mut boards = Vec::with_capacity(forms.len());
        for (form, item_errors) in forms.iter().zip(errors.iter_mut()) {
            let board = match form.board {
                None => {
                    push_error(item_errors, "board", REQUIRED);
                    None
                }
                Some(id) => {
                    let board = tx.board_by_id(id).await?;
                    if board.is_none() {
                        push_error(item_errors, "board", does_not_exist(id));
                    }
                    board
                }
            };
            boards.push(board);
        }

        let targets: Vec<Board> = boards.iter().flatten().cloned().collect();
        require(principal, can_add_collaborators(tx.as_mut(), principal, &targets).await?)?;

        let mut seen = HashSet::new();
        let mut created = Vec::with_capacity(forms.len());

        for ((form, board), item_errors) in forms.iter().zip(&boards).zip(errors.iter_mut()) {
            check_form_shape(form, item_errors);

            let (Some(board), Some(permission)) = (board, form.permission) else {
                continue;
            };
            if !item_errors.is_empty() {
                continue;
            }

            let (field, target) = match (form.user, form.email.as_deref()) {
                (Some(user_id), _) => {
                    if tx.user_by_id(user_id).await?.is_none() {
                        push_error(item_errors, "user", does_not_exist(user_id));
                        continue;
                    }
                    ("user", CollaboratorTarget::User(user_id))
                }
                (None, Some(email)) => {
                    let target = resolve_email_target(tx.as_mut(), board, email, inviter.id).await?;
                    let field = match target {
                        CollaboratorTarget::User(_) => "user",
                        CollaboratorTarget::InvitedUser(_) => "email",
                    };
                    (field, target)
                }
                (None, None) => continue,
            };

            if !seen.insert((board.id, target)) || has_row(tx.as_mut(), board.id, target).await? {
                push_error(item_errors, field, ALREADY_COLLABORATOR);
                continue;
            }

            let row = tx
                .insert_board_collaborator(CreateBoardCollaborator::new(
                    board.id,
                    target,
                    permission,
                    Some(inviter.id),
                ))
                .await?;
            created.push(row);
        }

        if errors.iter().any(|item_errors| !item_errors.is_empty()) {
            if is_bulk {
                return Err(DomainError::BulkValidation(errors));
            }
            let item_errors = errors.swap_remove(0);
            if item_errors == field_error("user", ALREADY_COLLABORATOR) {
                return Err(DomainError::AlreadyCollaborator);
            }
            return Err(DomainError::Validation(item_errors));
        }

        let mut views = Vec::with_capacity(created.len());
        for row in created {
            views.push(collaborator_view(tx.as_mut(), row, true).await?);
        }
        tx.commit().await?;

        info!(
            user_id = %inviter.id,
            count = views.len(),
            "Board collaborators added"
        );

        Ok(views)
    }

    /// Saves a collaborator row and dispatches a pending invitation
    pub async fn update_collaborator(
        &self,
        principal: &Principal,
        id: Uuid,
        form: UpdateCollaboratorForm,
    ) -> Result<CollaboratorView, DomainError> {
        let mut tx = self.store.begin().await?;
        let (mut row, board) = load_collaborator(tx.as_mut(), id).await?;

        let allowed = can_access_collaborator(
            tx.as_mut(),
            principal,
            &row,
            &board,
            CollaboratorAction::Update,
        )
        .await?;
        require(principal, allowed)?;

        let editor = current_user(tx.as_mut(), principal).await?;

        if let Some(permission) = form.permission {
            row.permission = permission;
        }
        row.modified_by = Some(editor.id);
        self.dispatch_invitation(tx.as_mut(), &mut row, &board, &editor).await?;
        let row = tx.update_board_collaborator(&row).await?;

        let view = collaborator_view(tx.as_mut(), row, true).await?;
        tx.commit().await?;

        Ok(view)
    }

    pub async fn remove_collaborator(&self, principal: &Principal, id: Uuid) -> Result<(), DomainError> {
        let mut tx = self.store.begin().await?;
        let (row, board) = load_collaborator(tx.as_mut(), id).await?;

        let allowed = can_access_collaborator(
            tx.as_mut(),
            principal,
            &row,
            &board,
            CollaboratorAction::Delete,
        )
        .await?;
        require(principal, allowed)?;

        tx.delete_board_collaborator(row.id).await?;
        tx.commit().await?;

        info!(collaborator_id = %row.id, board_id = %board.id, "Board collaborator removed");

        Ok(())
    }

    pub async fn get_collaborator(
        &self,
        principal: &Principal,
        id: Uuid,
    ) -> Result<CollaboratorView, DomainError> {
        let mut tx = self.store.begin().await?;
        let (row, board) = load_collaborator(tx.as_mut(), id).await?;

        let allowed = can_access_collaborator(
            tx.as_mut(),
            principal,
            &row,
            &board,
            CollaboratorAction::Retrieve,
        )
        .await?;
        require(principal, allowed)?;

        Ok(collaborator_view(tx.as_mut(), row, !principal.is_anonymous()).await?)
    }

    /// Collaborators of one readable board, or of every board of the principal
    pub async fn list_collaborators(
        &self,
        principal: &Principal,
        board_id: Option<Uuid>,
    ) -> Result<Vec<CollaboratorView>, DomainError> {
        require(principal, can_list_collaborators(principal, board_id))?;

        let mut tx = self.store.begin().await?;

        let rows = match board_id {
            Some(board_id) => {
                let board = tx.board_by_id(board_id).await?.ok_or(DomainError::NotFound)?;
                let allowed = can_access(tx.as_mut(), principal, &board, AccessMode::Read).await?
                    || is_account_owner(tx.as_mut(), principal, board.account_id).await?;
                require(principal, allowed)?;

                tx.board_collaborators(board.id).await?
            }
            None => {
                let user_id = authenticated(principal)?;
                let mut rows = Vec::new();
                for board in tx.boards_for_user(user_id).await? {
                    rows.extend(tx.board_collaborators(board.id).await?);
                }
                rows
            }
        };

        let include_email = !principal.is_anonymous();
        let mut views = Vec::with_capacity(rows.len());
        for row in rows {
            views.push(collaborator_view(tx.as_mut(), row, include_email).await?);
        }

        Ok(views)
    }

    /// Asks to join a board; every owner of the board's account is notified
    pub async fn create_request(
        &self,
        form: CollaboratorRequestForm,
    ) -> Result<CollaboratorRequest, DomainError> {
        let mut errors = FieldErrors::new();
        let email = required(&mut errors, "email", form.email.as_deref());
        if let Some(email) = email {
            if email.len() > EMAIL_MAX_LENGTH || !is_email(email) {
                push_error(&mut errors, "email", INVALID_EMAIL);
            }
        }
        if form.board.is_none() {
            push_error(&mut errors, "board", REQUIRED);
        }

        let mut tx = self.store.begin().await?;

        let board = match form.board {
            Some(id) => {
                let board = tx.board_by_id(id).await?;
                if board.is_none() {
                    push_error(&mut errors, "board", does_not_exist(id));
                }
                board
            }
            None => None,
        };

        let (Some(email), Some(board)) = (email, board) else {
            return Err(DomainError::Validation(errors));
        };
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        let request = tx
            .insert_collaborator_request(CreateCollaboratorRequest {
                email: email.to_string(),
                board_id: board.id,
            })
            .await?;

        let owners = tx.account_owners(board.account_id).await?;
        for owner in &owners {
            tx.insert_notification(CreateNotification::collaborator_request(owner, &request, &board))
                .await?;
        }
        tx.commit().await?;

        info!(
            request_id = %request.id,
            board_id = %board.id,
            owners = owners.len(),
            "Collaborator request created"
        );

        Ok(request)
    }

    /// Accepts a pending request, adding the requester as a reader
    pub async fn accept_request(
        &self,
        principal: &Principal,
        id: Uuid,
    ) -> Result<CollaboratorRequest, DomainError> {
        self.transition_request(principal, id, RequestStatus::Accepted).await
    }

    pub async fn reject_request(
        &self,
        principal: &Principal,
        id: Uuid,
    ) -> Result<CollaboratorRequest, DomainError> {
        self.transition_request(principal, id, RequestStatus::Rejected).await
    }

    /// Requests on boards of accounts the principal collaborates in
    pub async fn list_requests(
        &self,
        principal: &Principal,
    ) -> Result<Vec<CollaboratorRequest>, DomainError> {
        let user_id = authenticated(principal)?;
        let mut tx = self.store.begin().await?;

        Ok(tx.collaborator_requests_for_user(user_id).await?)
    }

    pub async fn get_request(
        &self,
        principal: &Principal,
        id: Uuid,
    ) -> Result<CollaboratorRequest, DomainError> {
        authenticated(principal)?;
        let mut tx = self.store.begin().await?;

        let request = tx.lock_collaborator_request(id).await?.ok_or(DomainError::NotFound)?;
        let board = tx.board_by_id(request.board_id).await?.ok_or(DomainError::NotFound)?;
        require(principal, can_manage_request(tx.as_mut(), principal, &board).await?)?;

        Ok(request)
    }

    async fn transition_request(
        &self,
        principal: &Principal,
        id: Uuid,
        next: RequestStatus,
    ) -> Result<CollaboratorRequest, DomainError> {
        authenticated(principal)?;
        let mut tx = self.store.begin().await?;

        let mut request = tx.lock_collaborator_request(id).await?.ok_or(DomainError::NotFound)?;
        let board = tx.board_by_id(request.board_id).await?.ok_or(DomainError::NotFound)?;
        require(principal, can_manage_request(tx.as_mut(), principal, &board).await?)?;

        if !request.transition(next) {
            return Ok(request);
        }

        let owner = current_user(tx.as_mut(), principal).await?;
        let request = tx.update_collaborator_request(&request).await?;

        if next == RequestStatus::Accepted {
            let target = resolve_email_target(tx.as_mut(), &board, &request.email, owner.id).await?;

            if !has_row(tx.as_mut(), board.id, target).await? {
                let mut row = tx
                    .insert_board_collaborator(CreateBoardCollaborator::new(
                        board.id,
                        target,
                        Permission::Read,
                        Some(owner.id),
                    ))
                    .await?;

                row.modified_by = Some(owner.id);
                self.dispatch_invitation(tx.as_mut(), &mut row, &board, &owner).await?;
                tx.update_board_collaborator(&row).await?;
            }
        }

        tx.commit().await?;

        info!(
            request_id = %request.id,
            status = request.status.as_str(),
            user_id = %owner.id,
            "Collaborator request resolved"
        );

        Ok(request)
    }

    /// Queues the invitation for an invited-user row that has none yet
    ///
    /// Stamps `row.invitation_sent_at`; the caller saves the row. Each
    /// invitation carries a freshly issued token, which replaces the invited
    /// user's previous one. The invited user stays linked to its first row.
    async fn dispatch_invitation(
        &self,
        tx: &mut dyn StoreTx,
        row: &mut BoardCollaborator,
        board: &Board,
        inviter: &User,
    ) -> Result<(), DomainError> {
        let Some(invited_user_id) = row.invited_user_id else {
            return Ok(());
        };
        if row.invitation_sent_at.is_some() {
            return Ok(());
        }

        let mut invited = tx
            .invited_user_by_id(invited_user_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if !invited.is_pending() {
            return Ok(());
        }

        let now = Utc::now();
        let issued = self.tokens.issue(TokenPurpose::InvitedUser);
        if invited.board_collaborator_id.is_none() {
            invited.board_collaborator_id = Some(row.id);
        }
        invited.token_hash = Some(issued.hash);
        invited.token_issued_at = Some(now);
        let invited = tx.update_invited_user(&invited).await?;
        row.invitation_sent_at = Some(now);

        let account = tx
            .account_by_id(board.account_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        tx.insert_notification(CreateNotification::invitation(
            &invited.email,
            &issued.token,
            &account,
            board,
            Some(inviter),
        ))
        .await?;

        info!(
            invited_user_id = %invited.id,
            board_id = %board.id,
            "Invitation queued"
        );

        Ok(())
    }
}

fn check_form_shape(form: &CollaboratorForm, errors: &mut FieldErrors) {
    if form.permission.is_none() {
        push_error(errors, "permission", REQUIRED);
    }

    match (form.user, form.email.as_deref()) {
        (Some(_), Some(_)) => push_error(errors, NON_FIELD_ERRORS, BOTH_TARGETS_SET),
        (None, None) => push_error(errors, NON_FIELD_ERRORS, NO_TARGET_SET),
        (None, Some(email)) if email.len() > EMAIL_MAX_LENGTH || !is_email(email) => {
            push_error(errors, "email", INVALID_EMAIL)
        }
        _ => {}
    }
}

async fn load_collaborator(
    tx: &mut dyn StoreTx,
    id: Uuid,
) -> Result<(BoardCollaborator, Board), DomainError> {
    let row = tx
        .board_collaborator_by_id(id)
        .await?
        .ok_or(DomainError::NotFound)?;
    let board = tx.board_by_id(row.board_id).await?.ok_or(DomainError::NotFound)?;

    Ok((row, board))
}

/// Maps an email to a collaborator target on the board's account
///
/// Account members are attached directly; anyone else becomes, or reuses, an
/// invited user of the account.
async fn resolve_email_target(
    tx: &mut dyn StoreTx,
    board: &Board,
    email: &str,
    inviter_id: Uuid,
) -> StoreResult<CollaboratorTarget> {
    if let Some(user) = tx.account_member_by_email(board.account_id, email).await? {
        return Ok(CollaboratorTarget::User(user.id));
    }

    let invited = match tx.invited_user_by_email(board.account_id, email).await? {
        Some(invited) => invited,
        None => {
            tx.insert_invited_user(CreateInvitedUser {
                email: email.to_string(),
                account_id: board.account_id,
                created_by: inviter_id,
            })
            .await?
        }
    };

    Ok(CollaboratorTarget::InvitedUser(invited.id))
}

async fn has_row(
    tx: &mut dyn StoreTx,
    board_id: Uuid,
    target: CollaboratorTarget,
) -> StoreResult<bool> {
    match target {
        CollaboratorTarget::User(user_id) => Ok(tx
            .board_collaborator_for_user(board_id, user_id)
            .await?
            .is_some()),
        CollaboratorTarget::InvitedUser(invited_user_id) => Ok(tx
            .board_collaborators(board_id)
            .await?
            .iter()
            .any(|row| row.invited_user_id == Some(invited_user_id))),
    }
}

async fn collaborator_view(
    tx: &mut dyn StoreTx,
    collaborator: BoardCollaborator,
    include_email: bool,
) -> StoreResult<CollaboratorView> {
    let user_data = match collaborator.target() {
        Some(CollaboratorTarget::User(user_id)) => {
            tx.user_by_id(user_id).await?.map(|user| CollaboratorUserData {
                id: user.id,
                username: Some(user.username),
                first_name: user.first_name,
                last_name: user.last_name,
                email: include_email.then_some(user.email),
                is_invited: false,
            })
        }
        Some(CollaboratorTarget::InvitedUser(invited_user_id)) => tx
            .invited_user_by_id(invited_user_id)
            .await?
            .map(|invited| CollaboratorUserData {
                id: invited.id,
                username: None,
                first_name: String::new(),
                last_name: String::new(),
                email: include_email.then_some(invited.email),
                is_invited: true,
            }),
        None => None,
    };

    Ok(CollaboratorView {
        collaborator,
        user_data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_accepts_object_or_array() {
        let board = Uuid::new_v4();

        let single: CollaboratorPayload = serde_json::from_value(serde_json::json!({
            "board": board,
            "permission": "read",
            "email": "ana@example.com",
        }))
        .unwrap();
        let (forms, is_bulk) = single.into_forms();
        assert!(!is_bulk);
        assert_eq!(forms[0].permission, Some(Permission::Read));

        let bulk: CollaboratorPayload = serde_json::from_value(serde_json::json!([
            { "board": board, "permission": "write", "user": Uuid::new_v4() },
            { "board": board, "permission": "read", "email": "ana@example.com" },
        ]))
        .unwrap();
        let (forms, is_bulk) = bulk.into_forms();
        assert!(is_bulk);
        assert_eq!(forms.len(), 2);
    }

    #[test]
    fn test_form_shape() {
        let mut errors = FieldErrors::new();
        check_form_shape(&CollaboratorForm::default(), &mut errors);
        assert_eq!(errors["permission"], vec![REQUIRED.to_string()]);
        assert_eq!(errors[NON_FIELD_ERRORS], vec![NO_TARGET_SET.to_string()]);

        let mut errors = FieldErrors::new();
        check_form_shape(
            &CollaboratorForm {
                permission: Some(Permission::Read),
                user: Some(Uuid::new_v4()),
                email: Some("ana@example.com".to_string()),
                ..CollaboratorForm::default()
            },
            &mut errors,
        );
        assert_eq!(errors[NON_FIELD_ERRORS], vec![BOTH_TARGETS_SET.to_string()]);

        let mut errors = FieldErrors::new();
        check_form_shape(
            &CollaboratorForm {
                permission: Some(Permission::Read),
                email: Some("not-an-email".to_string()),
                ..CollaboratorForm::default()
            },
            &mut errors,
        );
        assert_eq!(errors["email"], vec![INVALID_EMAIL.to_string()]);
    }
}
