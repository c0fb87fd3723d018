/// Board CRUD and leaving a board

use axum::http::Method;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::{current_user, required, Services};
use crate::auth::authorization::{can_access_board, can_use_board_collection, require, BoardAction};
use crate::auth::middleware::Principal;
use crate::error::{push_error, DomainError, FieldErrors, REQUIRED};
use crate::models::{
    board::{Board, CreateBoard},
    board_collaborator::{CollaboratorTarget, CreateBoardCollaborator, Permission},
};
use crate::store::StoreTx;

pub const NOT_ACCOUNT_COLLABORATOR: &str = "You are not a collaborator in this account.";
const BOARD_NAME_MAX_LENGTH: usize = 255;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoardForm {
    pub name: Option<String>,
    pub account: Option<Uuid>,
    pub color: Option<String>,
    pub is_shared: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBoardForm {
    pub name: Option<String>,
    pub color: Option<String>,
    pub is_shared: Option<bool>,
}

fn check_name(errors: &mut FieldErrors, name: &str) {
    if name.chars().count() > BOARD_NAME_MAX_LENGTH {
        push_error(
            errors,
            "name",
            format!("Ensure this field has no more than {} characters.", BOARD_NAME_MAX_LENGTH),
        );
    }
}

impl Services {
    /// Boards the principal collaborates on
    pub async fn list_boards(&self, principal: &Principal) -> Result<Vec<Board>, DomainError> {
        require(principal, can_use_board_collection(principal, &Method::GET, true))?;

        let mut tx = self.store.begin().await?;
        let user = current_user(tx.as_mut(), principal).await?;

        Ok(tx.boards_for_user(user.id).await?)
    }

    /// Creates a board in one of the principal's accounts
    ///
    /// The creator becomes a write collaborator of the new board.
    pub async fn create_board(
        &self,
        principal: &Principal,
        form: BoardForm,
    ) -> Result<Board, DomainError> {
        require(principal, can_use_board_collection(principal, &Method::POST, false))?;

        let mut tx = self.store.begin().await?;
        let user = current_user(tx.as_mut(), principal).await?;

        let mut errors = FieldErrors::new();
        let name = required(&mut errors, "name", form.name.as_deref());
        if let Some(name) = name {
            check_name(&mut errors, name);
        }

        let account_id = match form.account {
            None => {
                push_error(&mut errors, "account", REQUIRED);
                None
            }
            Some(account_id) => {
                if tx.account_collaborator(account_id, user.id).await?.is_none() {
                    push_error(&mut errors, "account", NOT_ACCOUNT_COLLABORATOR);
                }
                Some(account_id)
            }
        };

        let (Some(name), Some(account_id)) = (name, account_id) else {
            return Err(DomainError::Validation(errors));
        };
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        let board = tx
            .insert_board(CreateBoard {
                name: name.to_string(),
                account_id,
                created_by: user.id,
                is_shared: form.is_shared.unwrap_or(false),
                color: form.color,
            })
            .await?;
        tx.insert_board_collaborator(CreateBoardCollaborator::new(
            board.id,
            CollaboratorTarget::User(user.id),
            Permission::Write,
            Some(user.id),
        ))
        .await?;
        tx.commit().await?;

        info!(board_id = %board.id, account_id = %account_id, user_id = %user.id, "Board created");

        Ok(board)
    }

    pub async fn get_board(&self, principal: &Principal, id: Uuid) -> Result<Board, DomainError> {
        let mut tx = self.store.begin().await?;

        load_board(tx.as_mut(), principal, id, BoardAction::Retrieve).await
    }

    pub async fn update_board(
        &self,
        principal: &Principal,
        id: Uuid,
        form: UpdateBoardForm,
    ) -> Result<Board, DomainError> {
        let mut tx = self.store.begin().await?;
        let mut board = load_board(tx.as_mut(), principal, id, BoardAction::Update).await?;
        let user = current_user(tx.as_mut(), principal).await?;

        let mut errors = FieldErrors::new();
        if let Some(name) = form.name {
            if name.trim().is_empty() {
                push_error(&mut errors, "name", REQUIRED);
            } else {
                check_name(&mut errors, &name);
                board.name = name;
            }
        }
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        if let Some(color) = form.color {
            board.color = Some(color);
        }
        if let Some(is_shared) = form.is_shared {
            board.is_shared = is_shared;
        }
        board.modified_by = Some(user.id);

        let board = tx.update_board(&board).await?;
        tx.commit().await?;

        Ok(board)
    }

    pub async fn delete_board(&self, principal: &Principal, id: Uuid) -> Result<(), DomainError> {
        let mut tx = self.store.begin().await?;
        let board = load_board(tx.as_mut(), principal, id, BoardAction::Delete).await?;

        tx.delete_board(board.id).await?;
        tx.commit().await?;

        info!(board_id = %board.id, "Board deleted");

        Ok(())
    }

    /// Removes the principal's own collaborator row
    pub async fn leave_board(&self, principal: &Principal, id: Uuid) -> Result<(), DomainError> {
        let mut tx = self.store.begin().await?;
        let board = load_board(tx.as_mut(), principal, id, BoardAction::Leave).await?;
        let user = current_user(tx.as_mut(), principal).await?;

        let row = tx
            .board_collaborator_for_user(board.id, user.id)
            .await?
            .ok_or(DomainError::NotFound)?;
        tx.delete_board_collaborator(row.id).await?;
        tx.commit().await?;

        info!(board_id = %board.id, user_id = %user.id, "User left board");

        Ok(())
    }
}

/// Loads a board and checks `action` on it
async fn load_board(
    tx: &mut dyn StoreTx,
    principal: &Principal,
    id: Uuid,
    action: BoardAction,
) -> Result<Board, DomainError> {
    let board = tx.board_by_id(id).await?.ok_or(DomainError::NotFound)?;
    require(principal, can_access_board(tx, principal, &board, action).await?)?;

    Ok(board)
}
