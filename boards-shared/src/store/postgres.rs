/// PostgreSQL store
///
/// Each unit of work is one `sqlx` transaction. Primitives delegate to the
/// model functions, which run their SQL on the transaction's connection.
/// Dropping a [`PgTx`] without committing rolls the transaction back.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{Store, StoreResult, StoreTx};
use crate::models::{
    account::{Account, CreateAccount},
    account_collaborator::{AccountCollaborator, CreateAccountCollaborator},
    board::{Board, CreateBoard},
    board_collaborator::{validate_target, BoardCollaborator, CreateBoardCollaborator},
    collaborator_request::{CollaboratorRequest, CreateCollaboratorRequest},
    invited_user::{CreateInvitedUser, InvitedUser},
    notification::{CreateNotification, Notification},
    password_reset::{CreatePasswordReset, PasswordReset},
    signup_request::{CreateSignupRequest, SignupRequest},
    user::{CreateUser, User},
};
use crate::store::{constraints, StoreError};

/// Store backed by a PostgreSQL connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Unit of work over one PostgreSQL transaction
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

/// Rejects collaborator rows that name both or neither target before the
/// database sees them, so the error names the constraint either way
fn check_target(user_id: Option<Uuid>, invited_user_id: Option<Uuid>) -> StoreResult<()> {
    validate_target(user_id, invited_user_id)
        .map_err(|_| StoreError::CheckViolation(constraints::BOARD_COLLABORATOR_TARGET.to_string()))
}

#[async_trait]
impl StoreTx for PgTx {
    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn insert_user(&mut self, data: CreateUser) -> StoreResult<User> {
        Ok(User::create(&mut self.tx, data).await?)
    }

    async fn user_by_id(&mut self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&mut self.tx, id).await?)
    }

    async fn user_by_username(&mut self, username: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_username(&mut self.tx, username).await?)
    }

    async fn user_by_email(&mut self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&mut self.tx, email).await?)
    }

    async fn update_user(&mut self, user: &User) -> StoreResult<User> {
        Ok(User::save(&mut self.tx, user).await?)
    }

    async fn insert_account(&mut self, data: CreateAccount) -> StoreResult<Account> {
        Ok(Account::create(&mut self.tx, data).await?)
    }

    async fn account_by_id(&mut self, id: Uuid) -> StoreResult<Option<Account>> {
        Ok(Account::find_by_id(&mut self.tx, id).await?)
    }

    async fn account_slug_exists(&mut self, slug: &str) -> StoreResult<bool> {
        Ok(Account::slug_exists(&mut self.tx, slug).await?)
    }

    async fn accounts_for_user(&mut self, user_id: Uuid) -> StoreResult<Vec<Account>> {
        Ok(Account::list_by_user(&mut self.tx, user_id).await?)
    }

    async fn insert_account_collaborator(
        &mut self,
        data: CreateAccountCollaborator,
    ) -> StoreResult<AccountCollaborator> {
        Ok(AccountCollaborator::create(&mut self.tx, data).await?)
    }

    async fn account_collaborator(
        &mut self,
        account_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<AccountCollaborator>> {
        Ok(AccountCollaborator::find(&mut self.tx, account_id, user_id).await?)
    }

    async fn account_owners(&mut self, account_id: Uuid) -> StoreResult<Vec<User>> {
        Ok(AccountCollaborator::list_owners(&mut self.tx, account_id).await?)
    }

    async fn account_member_by_email(
        &mut self,
        account_id: Uuid,
        email: &str,
    ) -> StoreResult<Option<User>> {
        Ok(AccountCollaborator::find_member_by_email(&mut self.tx, account_id, email).await?)
    }

    async fn insert_board(&mut self, data: CreateBoard) -> StoreResult<Board> {
        Ok(Board::create(&mut self.tx, data).await?)
    }

    async fn board_by_id(&mut self, id: Uuid) -> StoreResult<Option<Board>> {
        Ok(Board::find_by_id(&mut self.tx, id).await?)
    }

    async fn boards_for_user(&mut self, user_id: Uuid) -> StoreResult<Vec<Board>> {
        Ok(Board::list_by_collaborator(&mut self.tx, user_id).await?)
    }

    async fn update_board(&mut self, board: &Board) -> StoreResult<Board> {
        Ok(Board::save(&mut self.tx, board).await?)
    }

    async fn delete_board(&mut self, id: Uuid) -> StoreResult<bool> {
        Ok(Board::delete(&mut self.tx, id).await?)
    }

    async fn insert_board_collaborator(
        &mut self,
        data: CreateBoardCollaborator,
    ) -> StoreResult<BoardCollaborator> {
        check_target(data.user_id, data.invited_user_id)?;
        Ok(BoardCollaborator::create(&mut self.tx, data).await?)
    }

    async fn board_collaborator_by_id(
        &mut self,
        id: Uuid,
    ) -> StoreResult<Option<BoardCollaborator>> {
        Ok(BoardCollaborator::find_by_id(&mut self.tx, id).await?)
    }

    async fn board_collaborator_for_user(
        &mut self,
        board_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<BoardCollaborator>> {
        Ok(BoardCollaborator::find_for_user(&mut self.tx, board_id, user_id).await?)
    }

    async fn board_collaborators(&mut self, board_id: Uuid) -> StoreResult<Vec<BoardCollaborator>> {
        Ok(BoardCollaborator::list_by_board(&mut self.tx, board_id).await?)
    }

    async fn board_collaborators_for_invited_user(
        &mut self,
        invited_user_id: Uuid,
    ) -> StoreResult<Vec<BoardCollaborator>> {
        Ok(BoardCollaborator::list_by_invited_user(&mut self.tx, invited_user_id).await?)
    }

    async fn update_board_collaborator(
        &mut self,
        collaborator: &BoardCollaborator,
    ) -> StoreResult<BoardCollaborator> {
        check_target(collaborator.user_id, collaborator.invited_user_id)?;
        Ok(BoardCollaborator::save(&mut self.tx, collaborator).await?)
    }

    async fn delete_board_collaborator(&mut self, id: Uuid) -> StoreResult<bool> {
        Ok(BoardCollaborator::delete(&mut self.tx, id).await?)
    }

    async fn insert_invited_user(&mut self, data: CreateInvitedUser) -> StoreResult<InvitedUser> {
        Ok(InvitedUser::create(&mut self.tx, data).await?)
    }

    async fn invited_user_by_id(&mut self, id: Uuid) -> StoreResult<Option<InvitedUser>> {
        Ok(InvitedUser::find_by_id(&mut self.tx, id).await?)
    }

    async fn invited_user_by_email(
        &mut self,
        account_id: Uuid,
        email: &str,
    ) -> StoreResult<Option<InvitedUser>> {
        Ok(InvitedUser::find_by_email(&mut self.tx, account_id, email).await?)
    }

    async fn invited_user_by_token_hash(
        &mut self,
        token_hash: &str,
    ) -> StoreResult<Option<InvitedUser>> {
        Ok(InvitedUser::find_by_token_hash(&mut self.tx, token_hash).await?)
    }

    async fn update_invited_user(&mut self, invited_user: &InvitedUser) -> StoreResult<InvitedUser> {
        Ok(InvitedUser::save(&mut self.tx, invited_user).await?)
    }

    async fn insert_signup_request(
        &mut self,
        data: CreateSignupRequest,
    ) -> StoreResult<SignupRequest> {
        Ok(SignupRequest::create(&mut self.tx, data).await?)
    }

    async fn signup_request_by_token_hash(
        &mut self,
        token_hash: &str,
    ) -> StoreResult<Option<SignupRequest>> {
        Ok(SignupRequest::find_by_token_hash(&mut self.tx, token_hash).await?)
    }

    async fn delete_signup_request(&mut self, id: Uuid) -> StoreResult<bool> {
        Ok(SignupRequest::delete(&mut self.tx, id).await?)
    }

    async fn insert_password_reset(
        &mut self,
        data: CreatePasswordReset,
    ) -> StoreResult<PasswordReset> {
        Ok(PasswordReset::create(&mut self.tx, data).await?)
    }

    async fn password_reset_by_token_hash(
        &mut self,
        token_hash: &str,
    ) -> StoreResult<Option<PasswordReset>> {
        Ok(PasswordReset::find_by_token_hash(&mut self.tx, token_hash).await?)
    }

    async fn delete_password_resets(&mut self, user_id: Uuid) -> StoreResult<u64> {
        Ok(PasswordReset::delete_for_user(&mut self.tx, user_id).await?)
    }

    async fn insert_collaborator_request(
        &mut self,
        data: CreateCollaboratorRequest,
    ) -> StoreResult<CollaboratorRequest> {
        Ok(CollaboratorRequest::create(&mut self.tx, data).await?)
    }

    async fn lock_collaborator_request(
        &mut self,
        id: Uuid,
    ) -> StoreResult<Option<CollaboratorRequest>> {
        Ok(CollaboratorRequest::find_for_update(&mut self.tx, id).await?)
    }

    async fn collaborator_requests_for_user(
        &mut self,
        user_id: Uuid,
    ) -> StoreResult<Vec<CollaboratorRequest>> {
        Ok(CollaboratorRequest::list_for_user(&mut self.tx, user_id).await?)
    }

    async fn update_collaborator_request(
        &mut self,
        request: &CollaboratorRequest,
    ) -> StoreResult<CollaboratorRequest> {
        Ok(CollaboratorRequest::save(&mut self.tx, request).await?)
    }

    async fn insert_notification(&mut self, data: CreateNotification) -> StoreResult<Notification> {
        Ok(Notification::create(&mut self.tx, data).await?)
    }
}
