/// In-memory store
///
/// Holds every table in process. A unit of work takes the state lock for its
/// whole lifetime and works on a copy; commit swaps the copy in, drop discards
/// it. Units of work are therefore fully serialized.
///
/// The same unique and check constraints as the PostgreSQL schema are enforced
/// and reported under the same constraint names.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{constraints, Store, StoreError, StoreResult, StoreTx};
use crate::models::{
    account::{Account, CreateAccount},
    account_collaborator::{AccountCollaborator, AccountRole, CreateAccountCollaborator},
    board::{Board, CreateBoard},
    board_collaborator::{validate_target, BoardCollaborator, CreateBoardCollaborator},
    collaborator_request::{CollaboratorRequest, CreateCollaboratorRequest, RequestStatus},
    invited_user::{CreateInvitedUser, InvitationStatus, InvitedUser},
    notification::{CreateNotification, Notification},
    password_reset::{CreatePasswordReset, PasswordReset},
    signup_request::{CreateSignupRequest, SignupRequest},
    user::{CreateUser, User},
};

/// Every table, in insertion order
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub users: Vec<User>,
    pub accounts: Vec<Account>,
    pub account_collaborators: Vec<AccountCollaborator>,
    pub boards: Vec<Board>,
    pub board_collaborators: Vec<BoardCollaborator>,
    pub invited_users: Vec<InvitedUser>,
    pub signup_requests: Vec<SignupRequest>,
    pub password_resets: Vec<PasswordReset>,
    pub collaborator_requests: Vec<CollaboratorRequest>,
    pub notifications: Vec<Notification>,
}

impl MemoryState {
    fn check_user_unique(&self, id: Uuid, username: &str, email: &str) -> StoreResult<()> {
        let others = self.users.iter().filter(|u| u.id != id);
        for user in others {
            if user.username.to_lowercase() == username.to_lowercase() {
                return Err(unique(constraints::USER_USERNAME));
            }
            if user.email.to_lowercase() == email.to_lowercase() {
                return Err(unique(constraints::USER_EMAIL));
            }
        }
        Ok(())
    }

    fn check_board_collaborator(&self, row: &BoardCollaborator) -> StoreResult<()> {
        validate_target(row.user_id, row.invited_user_id)
            .map_err(|_| StoreError::CheckViolation(constraints::BOARD_COLLABORATOR_TARGET.to_string()))?;

        let others = self
            .board_collaborators
            .iter()
            .filter(|c| c.id != row.id && c.board_id == row.board_id);
        for other in others {
            if row.user_id.is_some() && other.user_id == row.user_id {
                return Err(unique(constraints::BOARD_COLLABORATOR_USER));
            }
            if row.invited_user_id.is_some() && other.invited_user_id == row.invited_user_id {
                return Err(unique(constraints::BOARD_COLLABORATOR_INVITED_USER));
            }
        }
        Ok(())
    }

    fn check_invited_user(&self, row: &InvitedUser) -> StoreResult<()> {
        for other in self.invited_users.iter().filter(|i| i.id != row.id) {
            if other.account_id == row.account_id
                && other.email.to_lowercase() == row.email.to_lowercase()
            {
                return Err(unique(constraints::INVITED_USER_EMAIL));
            }
            if row.token_hash.is_some() && other.token_hash == row.token_hash {
                return Err(unique(constraints::INVITED_USER_TOKEN));
            }
        }
        Ok(())
    }
}

fn unique(constraint: &str) -> StoreError {
    StoreError::UniqueViolation(constraint.to_string())
}

/// Store holding all state in process memory
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the committed state
    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }

    /// Committed notifications, oldest first
    pub async fn notifications(&self) -> Vec<Notification> {
        self.state.lock().await.notifications.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx { guard, working }))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Unit of work over a private copy of the state
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn insert_user(&mut self, data: CreateUser) -> StoreResult<User> {
        let id = Uuid::new_v4();
        self.working.check_user_unique(id, &data.username, &data.email)?;

        let now = Utc::now();
        let user = User {
            id,
            username: data.username,
            email: data.email,
            password_hash: data.password_hash,
            first_name: data.first_name,
            last_name: data.last_name,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.working.users.push(user.clone());
        Ok(user)
    }

    async fn user_by_id(&mut self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.working.users.iter().find(|u| u.id == id).cloned())
    }

    async fn user_by_username(&mut self, username: &str) -> StoreResult<Option<User>> {
        let username = username.to_lowercase();
        Ok(self
            .working
            .users
            .iter()
            .find(|u| u.username.to_lowercase() == username)
            .cloned())
    }

    async fn user_by_email(&mut self, email: &str) -> StoreResult<Option<User>> {
        let email = email.to_lowercase();
        Ok(self
            .working
            .users
            .iter()
            .find(|u| u.email.to_lowercase() == email)
            .cloned())
    }

    async fn update_user(&mut self, user: &User) -> StoreResult<User> {
        self.working
            .check_user_unique(user.id, &user.username, &user.email)?;

        let stored = self
            .working
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(StoreError::NotFound)?;
        *stored = User {
            updated_at: Utc::now(),
            created_at: stored.created_at,
            ..user.clone()
        };
        Ok(stored.clone())
    }

    async fn insert_account(&mut self, data: CreateAccount) -> StoreResult<Account> {
        if self.working.accounts.iter().any(|a| a.slug == data.slug) {
            return Err(unique(constraints::ACCOUNT_SLUG));
        }

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            name: data.name,
            slug: data.slug,
            logo_color: data.logo_color,
            created_by: data.created_by,
            created_at: now,
            updated_at: now,
        };
        self.working.accounts.push(account.clone());
        Ok(account)
    }

    async fn account_by_id(&mut self, id: Uuid) -> StoreResult<Option<Account>> {
        Ok(self.working.accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn account_slug_exists(&mut self, slug: &str) -> StoreResult<bool> {
        Ok(self.working.accounts.iter().any(|a| a.slug == slug))
    }

    async fn accounts_for_user(&mut self, user_id: Uuid) -> StoreResult<Vec<Account>> {
        let state = &self.working;
        Ok(state
            .accounts
            .iter()
            .filter(|a| {
                state
                    .account_collaborators
                    .iter()
                    .any(|ac| ac.account_id == a.id && ac.user_id == user_id)
            })
            .cloned()
            .collect())
    }

    async fn insert_account_collaborator(
        &mut self,
        data: CreateAccountCollaborator,
    ) -> StoreResult<AccountCollaborator> {
        if self
            .working
            .account_collaborators
            .iter()
            .any(|ac| ac.account_id == data.account_id && ac.user_id == data.user_id)
        {
            return Err(unique(constraints::ACCOUNT_COLLABORATOR));
        }

        let collaborator = AccountCollaborator {
            id: Uuid::new_v4(),
            account_id: data.account_id,
            user_id: data.user_id,
            role: data.role,
            is_owner: data.role == AccountRole::Owner,
            created_at: Utc::now(),
        };
        self.working.account_collaborators.push(collaborator.clone());
        Ok(collaborator)
    }

    async fn account_collaborator(
        &mut self,
        account_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<AccountCollaborator>> {
        Ok(self
            .working
            .account_collaborators
            .iter()
            .find(|ac| ac.account_id == account_id && ac.user_id == user_id)
            .cloned())
    }

    async fn account_owners(&mut self, account_id: Uuid) -> StoreResult<Vec<User>> {
        let state = &self.working;
        Ok(state
            .account_collaborators
            .iter()
            .filter(|ac| ac.account_id == account_id && ac.is_owner)
            .filter_map(|ac| state.users.iter().find(|u| u.id == ac.user_id))
            .cloned()
            .collect())
    }

    async fn account_member_by_email(
        &mut self,
        account_id: Uuid,
        email: &str,
    ) -> StoreResult<Option<User>> {
        let state = &self.working;
        let email = email.to_lowercase();
        Ok(state
            .account_collaborators
            .iter()
            .filter(|ac| ac.account_id == account_id)
            .filter_map(|ac| state.users.iter().find(|u| u.id == ac.user_id))
            .find(|u| u.email.to_lowercase() == email)
            .cloned())
    }

    async fn insert_board(&mut self, data: CreateBoard) -> StoreResult<Board> {
        let now = Utc::now();
        let board = Board {
            id: Uuid::new_v4(),
            name: data.name,
            account_id: data.account_id,
            created_by: data.created_by,
            modified_by: Some(data.created_by),
            is_shared: data.is_shared,
            color: data.color,
            thumbnail_sm_path: String::new(),
            thumbnail_md_path: String::new(),
            thumbnail_lg_path: String::new(),
            created_at: now,
            updated_at: now,
        };
        self.working.boards.push(board.clone());
        Ok(board)
    }

    async fn board_by_id(&mut self, id: Uuid) -> StoreResult<Option<Board>> {
        Ok(self.working.boards.iter().find(|b| b.id == id).cloned())
    }

    async fn boards_for_user(&mut self, user_id: Uuid) -> StoreResult<Vec<Board>> {
        let state = &self.working;
        Ok(state
            .boards
            .iter()
            .rev()
            .filter(|b| {
                state
                    .board_collaborators
                    .iter()
                    .any(|c| c.board_id == b.id && c.user_id == Some(user_id))
            })
            .cloned()
            .collect())
    }

    async fn update_board(&mut self, board: &Board) -> StoreResult<Board> {
        let stored = self
            .working
            .boards
            .iter_mut()
            .find(|b| b.id == board.id)
            .ok_or(StoreError::NotFound)?;
        stored.name = board.name.clone();
        stored.modified_by = board.modified_by;
        stored.is_shared = board.is_shared;
        stored.color = board.color.clone();
        stored.thumbnail_sm_path = board.thumbnail_sm_path.clone();
        stored.thumbnail_md_path = board.thumbnail_md_path.clone();
        stored.thumbnail_lg_path = board.thumbnail_lg_path.clone();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete_board(&mut self, id: Uuid) -> StoreResult<bool> {
        let state = &mut self.working;
        let before = state.boards.len();
        state.boards.retain(|b| b.id != id);
        if state.boards.len() == before {
            return Ok(false);
        }

        let removed: Vec<Uuid> = state
            .board_collaborators
            .iter()
            .filter(|c| c.board_id == id)
            .map(|c| c.id)
            .collect();
        state.board_collaborators.retain(|c| c.board_id != id);
        for invited in state.invited_users.iter_mut() {
            if invited
                .board_collaborator_id
                .map_or(false, |cid| removed.contains(&cid))
            {
                invited.board_collaborator_id = None;
            }
        }
        state.collaborator_requests.retain(|r| r.board_id != id);
        Ok(true)
    }

    async fn insert_board_collaborator(
        &mut self,
        data: CreateBoardCollaborator,
    ) -> StoreResult<BoardCollaborator> {
        let now = Utc::now();
        let collaborator = BoardCollaborator {
            id: Uuid::new_v4(),
            board_id: data.board_id,
            user_id: data.user_id,
            invited_user_id: data.invited_user_id,
            permission: data.permission,
            created_by: data.created_by,
            modified_by: data.created_by,
            invitation_sent_at: None,
            created_at: now,
            updated_at: now,
        };
        self.working.check_board_collaborator(&collaborator)?;
        self.working.board_collaborators.push(collaborator.clone());
        Ok(collaborator)
    }

    async fn board_collaborator_by_id(
        &mut self,
        id: Uuid,
    ) -> StoreResult<Option<BoardCollaborator>> {
        Ok(self
            .working
            .board_collaborators
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn board_collaborator_for_user(
        &mut self,
        board_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<BoardCollaborator>> {
        Ok(self
            .working
            .board_collaborators
            .iter()
            .find(|c| c.board_id == board_id && c.user_id == Some(user_id))
            .cloned())
    }

    async fn board_collaborators(&mut self, board_id: Uuid) -> StoreResult<Vec<BoardCollaborator>> {
        Ok(self
            .working
            .board_collaborators
            .iter()
            .filter(|c| c.board_id == board_id)
            .cloned()
            .collect())
    }

    async fn board_collaborators_for_invited_user(
        &mut self,
        invited_user_id: Uuid,
    ) -> StoreResult<Vec<BoardCollaborator>> {
        Ok(self
            .working
            .board_collaborators
            .iter()
            .filter(|c| c.invited_user_id == Some(invited_user_id))
            .cloned()
            .collect())
    }

    async fn update_board_collaborator(
        &mut self,
        collaborator: &BoardCollaborator,
    ) -> StoreResult<BoardCollaborator> {
        self.working.check_board_collaborator(collaborator)?;

        let stored = self
            .working
            .board_collaborators
            .iter_mut()
            .find(|c| c.id == collaborator.id)
            .ok_or(StoreError::NotFound)?;
        stored.user_id = collaborator.user_id;
        stored.invited_user_id = collaborator.invited_user_id;
        stored.permission = collaborator.permission;
        stored.modified_by = collaborator.modified_by;
        stored.invitation_sent_at = collaborator.invitation_sent_at;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete_board_collaborator(&mut self, id: Uuid) -> StoreResult<bool> {
        let state = &mut self.working;
        let before = state.board_collaborators.len();
        state.board_collaborators.retain(|c| c.id != id);
        if state.board_collaborators.len() == before {
            return Ok(false);
        }

        for invited in state.invited_users.iter_mut() {
            if invited.board_collaborator_id == Some(id) {
                invited.board_collaborator_id = None;
            }
        }
        Ok(true)
    }

    async fn insert_invited_user(&mut self, data: CreateInvitedUser) -> StoreResult<InvitedUser> {
        let now = Utc::now();
        let invited_user = InvitedUser {
            id: Uuid::new_v4(),
            email: data.email,
            account_id: data.account_id,
            board_collaborator_id: None,
            token_hash: None,
            token_issued_at: None,
            status: InvitationStatus::Pending,
            user_id: None,
            created_by: data.created_by,
            created_at: now,
            updated_at: now,
        };
        self.working.check_invited_user(&invited_user)?;
        self.working.invited_users.push(invited_user.clone());
        Ok(invited_user)
    }

    async fn invited_user_by_id(&mut self, id: Uuid) -> StoreResult<Option<InvitedUser>> {
        Ok(self.working.invited_users.iter().find(|i| i.id == id).cloned())
    }

    async fn invited_user_by_email(
        &mut self,
        account_id: Uuid,
        email: &str,
    ) -> StoreResult<Option<InvitedUser>> {
        let email = email.to_lowercase();
        Ok(self
            .working
            .invited_users
            .iter()
            .find(|i| i.account_id == account_id && i.email.to_lowercase() == email)
            .cloned())
    }

    async fn invited_user_by_token_hash(
        &mut self,
        token_hash: &str,
    ) -> StoreResult<Option<InvitedUser>> {
        Ok(self
            .working
            .invited_users
            .iter()
            .find(|i| i.token_hash.as_deref() == Some(token_hash))
            .cloned())
    }

    async fn update_invited_user(&mut self, invited_user: &InvitedUser) -> StoreResult<InvitedUser> {
        self.working.check_invited_user(invited_user)?;

        let stored = self
            .working
            .invited_users
            .iter_mut()
            .find(|i| i.id == invited_user.id)
            .ok_or(StoreError::NotFound)?;
        stored.board_collaborator_id = invited_user.board_collaborator_id;
        stored.token_hash = invited_user.token_hash.clone();
        stored.token_issued_at = invited_user.token_issued_at;
        stored.status = invited_user.status;
        stored.user_id = invited_user.user_id;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn insert_signup_request(
        &mut self,
        data: CreateSignupRequest,
    ) -> StoreResult<SignupRequest> {
        if self
            .working
            .signup_requests
            .iter()
            .any(|r| r.token_hash == data.token_hash)
        {
            return Err(unique(constraints::SIGNUP_REQUEST_TOKEN));
        }

        let request = SignupRequest {
            id: Uuid::new_v4(),
            email: data.email,
            token_hash: data.token_hash,
            created_at: Utc::now(),
        };
        self.working.signup_requests.push(request.clone());
        Ok(request)
    }

    async fn signup_request_by_token_hash(
        &mut self,
        token_hash: &str,
    ) -> StoreResult<Option<SignupRequest>> {
        Ok(self
            .working
            .signup_requests
            .iter()
            .find(|r| r.token_hash == token_hash)
            .cloned())
    }

    async fn delete_signup_request(&mut self, id: Uuid) -> StoreResult<bool> {
        let before = self.working.signup_requests.len();
        self.working.signup_requests.retain(|r| r.id != id);
        Ok(self.working.signup_requests.len() < before)
    }

    async fn insert_password_reset(
        &mut self,
        data: CreatePasswordReset,
    ) -> StoreResult<PasswordReset> {
        if self
            .working
            .password_resets
            .iter()
            .any(|r| r.token_hash == data.token_hash)
        {
            return Err(unique(constraints::PASSWORD_RESET_TOKEN));
        }

        let reset = PasswordReset {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            token_hash: data.token_hash,
            created_at: Utc::now(),
        };
        self.working.password_resets.push(reset.clone());
        Ok(reset)
    }

    async fn password_reset_by_token_hash(
        &mut self,
        token_hash: &str,
    ) -> StoreResult<Option<PasswordReset>> {
        Ok(self
            .working
            .password_resets
            .iter()
            .find(|r| r.token_hash == token_hash)
            .cloned())
    }

    async fn delete_password_resets(&mut self, user_id: Uuid) -> StoreResult<u64> {
        let before = self.working.password_resets.len();
        self.working.password_resets.retain(|r| r.user_id != user_id);
        Ok((before - self.working.password_resets.len()) as u64)
    }

    async fn insert_collaborator_request(
        &mut self,
        data: CreateCollaboratorRequest,
    ) -> StoreResult<CollaboratorRequest> {
        let now = Utc::now();
        let request = CollaboratorRequest {
            id: Uuid::new_v4(),
            email: data.email,
            board_id: data.board_id,
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.working.collaborator_requests.push(request.clone());
        Ok(request)
    }

    async fn lock_collaborator_request(
        &mut self,
        id: Uuid,
    ) -> StoreResult<Option<CollaboratorRequest>> {
        // The unit of work already holds the whole state exclusively
        Ok(self
            .working
            .collaborator_requests
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn collaborator_requests_for_user(
        &mut self,
        user_id: Uuid,
    ) -> StoreResult<Vec<CollaboratorRequest>> {
        let state = &self.working;
        let account_ids: Vec<Uuid> = state
            .account_collaborators
            .iter()
            .filter(|ac| ac.user_id == user_id)
            .map(|ac| ac.account_id)
            .collect();

        Ok(state
            .collaborator_requests
            .iter()
            .rev()
            .filter(|r| {
                state
                    .boards
                    .iter()
                    .any(|b| b.id == r.board_id && account_ids.contains(&b.account_id))
            })
            .cloned()
            .collect())
    }

    async fn update_collaborator_request(
        &mut self,
        request: &CollaboratorRequest,
    ) -> StoreResult<CollaboratorRequest> {
        let stored = self
            .working
            .collaborator_requests
            .iter_mut()
            .find(|r| r.id == request.id)
            .ok_or(StoreError::NotFound)?;
        stored.status = request.status;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn insert_notification(&mut self, data: CreateNotification) -> StoreResult<Notification> {
        let notification = Notification {
            id: Uuid::new_v4(),
            kind: data.kind,
            recipient: data.recipient,
            payload: data.payload,
            attempts: 0,
            last_error: None,
            locked_until: None,
            sent_at: None,
            created_at: Utc::now(),
        };
        self.working.notifications.push(notification.clone());
        Ok(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::board_collaborator::{CollaboratorTarget, Permission};

    fn create_user(username: &str, email: &str) -> CreateUser {
        CreateUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            first_name: String::new(),
            last_name: String::new(),
        }
    }

    #[tokio::test]
    async fn test_commit_makes_writes_visible() {
        let store = MemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        tx.insert_user(create_user("juan", "juan@example.com")).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(tx.user_by_username("JUAN").await.unwrap().is_some());
        assert!(tx.user_by_email("Juan@Example.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_drop_rolls_back() {
        let store = MemoryStore::new();

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_user(create_user("juan", "juan@example.com")).await.unwrap();
        }

        assert!(store.snapshot().await.users.is_empty());
    }

    #[tokio::test]
    async fn test_user_uniqueness_ignores_case() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_user(create_user("juan", "juan@example.com")).await.unwrap();

        let err = tx
            .insert_user(create_user("JUAN", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(c) if c == constraints::USER_USERNAME));

        let err = tx
            .insert_user(create_user("other", "JUAN@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(c) if c == constraints::USER_EMAIL));
    }

    #[tokio::test]
    async fn test_board_collaborator_constraints() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let user = tx.insert_user(create_user("juan", "juan@example.com")).await.unwrap();
        let board_id = Uuid::new_v4();

        tx.insert_board_collaborator(CreateBoardCollaborator::new(
            board_id,
            CollaboratorTarget::User(user.id),
            Permission::Read,
            None,
        ))
        .await
        .unwrap();

        let err = tx
            .insert_board_collaborator(CreateBoardCollaborator::new(
                board_id,
                CollaboratorTarget::User(user.id),
                Permission::Write,
                None,
            ))
            .await
            .unwrap_err();
        assert!(
            matches!(err, StoreError::UniqueViolation(c) if c == constraints::BOARD_COLLABORATOR_USER)
        );

        let err = tx
            .insert_board_collaborator(CreateBoardCollaborator {
                board_id,
                user_id: Some(user.id),
                invited_user_id: Some(Uuid::new_v4()),
                permission: Permission::Read,
                created_by: None,
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err, StoreError::CheckViolation(c) if c == constraints::BOARD_COLLABORATOR_TARGET)
        );
    }
}
