/// Entity store
///
/// Workflows reach storage through [`Store`] and the unit of work it opens,
/// [`StoreTx`]. Every primitive is a plain lookup, insert, update or delete;
/// the logic built on top lives in `services`.
///
/// A unit of work becomes durable on [`StoreTx::commit`]. Dropping it without
/// committing rolls every write back.
///
/// # Implementations
///
/// - [`postgres::PgStore`]: `sqlx` transactions against PostgreSQL
/// - [`memory::MemoryStore`]: in-process state, used by tests and local runs

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    account::{Account, CreateAccount},
    account_collaborator::{AccountCollaborator, CreateAccountCollaborator},
    board::{Board, CreateBoard},
    board_collaborator::{BoardCollaborator, CreateBoardCollaborator},
    collaborator_request::{CollaboratorRequest, CreateCollaboratorRequest},
    invited_user::{CreateInvitedUser, InvitedUser},
    notification::{CreateNotification, Notification},
    password_reset::{CreatePasswordReset, PasswordReset},
    signup_request::{CreateSignupRequest, SignupRequest},
    user::{CreateUser, User},
};

/// Names of the storage constraints both stores enforce
pub mod constraints {
    pub const USER_USERNAME: &str = "users_username_lower_key";
    pub const USER_EMAIL: &str = "users_email_lower_key";
    pub const ACCOUNT_SLUG: &str = "accounts_slug_key";
    pub const ACCOUNT_COLLABORATOR: &str = "account_collaborators_account_user_key";
    pub const BOARD_COLLABORATOR_USER: &str = "board_collaborators_board_user_key";
    pub const BOARD_COLLABORATOR_INVITED_USER: &str = "board_collaborators_board_invited_user_key";
    pub const BOARD_COLLABORATOR_TARGET: &str = "board_collaborators_target_check";
    pub const INVITED_USER_EMAIL: &str = "invited_users_email_account_key";
    pub const INVITED_USER_TOKEN: &str = "invited_users_token_hash_key";
    pub const SIGNUP_REQUEST_TOKEN: &str = "signup_requests_token_hash_key";
    pub const PASSWORD_RESET_TOKEN: &str = "password_resets_token_hash_key";
}

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Check constraint violated: {0}")]
    CheckViolation(String),

    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StoreError::Unavailable(err.to_string())
            }
            sqlx::Error::Database(db_err) => {
                let constraint = db_err.constraint().unwrap_or_default().to_string();
                if db_err.is_unique_violation() {
                    StoreError::UniqueViolation(constraint)
                } else if db_err.is_check_violation() {
                    StoreError::CheckViolation(constraint)
                } else {
                    StoreError::Database(err)
                }
            }
            _ => StoreError::Database(err),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Opens units of work
#[async_trait]
pub trait Store: Send + Sync {
    /// Starts a unit of work
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>>;

    /// Checks the store can serve requests
    async fn ping(&self) -> StoreResult<()>;
}

/// One unit of work
///
/// Reads observe the writes made earlier in the same unit.
#[async_trait]
pub trait StoreTx: Send {
    /// Makes every write of this unit durable
    async fn commit(self: Box<Self>) -> StoreResult<()>;

    // Users

    async fn insert_user(&mut self, data: CreateUser) -> StoreResult<User>;
    async fn user_by_id(&mut self, id: Uuid) -> StoreResult<Option<User>>;
    /// Case-insensitive
    async fn user_by_username(&mut self, username: &str) -> StoreResult<Option<User>>;
    /// Case-insensitive
    async fn user_by_email(&mut self, email: &str) -> StoreResult<Option<User>>;
    async fn update_user(&mut self, user: &User) -> StoreResult<User>;

    // Accounts

    async fn insert_account(&mut self, data: CreateAccount) -> StoreResult<Account>;
    async fn account_by_id(&mut self, id: Uuid) -> StoreResult<Option<Account>>;
    async fn account_slug_exists(&mut self, slug: &str) -> StoreResult<bool>;
    async fn accounts_for_user(&mut self, user_id: Uuid) -> StoreResult<Vec<Account>>;

    // Account collaborators

    async fn insert_account_collaborator(
        &mut self,
        data: CreateAccountCollaborator,
    ) -> StoreResult<AccountCollaborator>;
    async fn account_collaborator(
        &mut self,
        account_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<AccountCollaborator>>;
    async fn account_owners(&mut self, account_id: Uuid) -> StoreResult<Vec<User>>;
    /// Member of the account whose email matches, ignoring case
    async fn account_member_by_email(
        &mut self,
        account_id: Uuid,
        email: &str,
    ) -> StoreResult<Option<User>>;

    // Boards

    async fn insert_board(&mut self, data: CreateBoard) -> StoreResult<Board>;
    async fn board_by_id(&mut self, id: Uuid) -> StoreResult<Option<Board>>;
    /// Boards where the user has a collaborator row
    async fn boards_for_user(&mut self, user_id: Uuid) -> StoreResult<Vec<Board>>;
    async fn update_board(&mut self, board: &Board) -> StoreResult<Board>;
    async fn delete_board(&mut self, id: Uuid) -> StoreResult<bool>;

    // Board collaborators

    async fn insert_board_collaborator(
        &mut self,
        data: CreateBoardCollaborator,
    ) -> StoreResult<BoardCollaborator>;
    async fn board_collaborator_by_id(&mut self, id: Uuid)
        -> StoreResult<Option<BoardCollaborator>>;
    async fn board_collaborator_for_user(
        &mut self,
        board_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<BoardCollaborator>>;
    async fn board_collaborators(&mut self, board_id: Uuid) -> StoreResult<Vec<BoardCollaborator>>;
    async fn board_collaborators_for_invited_user(
        &mut self,
        invited_user_id: Uuid,
    ) -> StoreResult<Vec<BoardCollaborator>>;
    async fn update_board_collaborator(
        &mut self,
        collaborator: &BoardCollaborator,
    ) -> StoreResult<BoardCollaborator>;
    async fn delete_board_collaborator(&mut self, id: Uuid) -> StoreResult<bool>;

    // Invited users

    async fn insert_invited_user(&mut self, data: CreateInvitedUser) -> StoreResult<InvitedUser>;
    async fn invited_user_by_id(&mut self, id: Uuid) -> StoreResult<Option<InvitedUser>>;
    async fn invited_user_by_email(
        &mut self,
        account_id: Uuid,
        email: &str,
    ) -> StoreResult<Option<InvitedUser>>;
    async fn invited_user_by_token_hash(
        &mut self,
        token_hash: &str,
    ) -> StoreResult<Option<InvitedUser>>;
    async fn update_invited_user(&mut self, invited_user: &InvitedUser) -> StoreResult<InvitedUser>;

    // Signup requests

    async fn insert_signup_request(
        &mut self,
        data: CreateSignupRequest,
    ) -> StoreResult<SignupRequest>;
    async fn signup_request_by_token_hash(
        &mut self,
        token_hash: &str,
    ) -> StoreResult<Option<SignupRequest>>;
    async fn delete_signup_request(&mut self, id: Uuid) -> StoreResult<bool>;

    // Password resets

    async fn insert_password_reset(
        &mut self,
        data: CreatePasswordReset,
    ) -> StoreResult<PasswordReset>;
    async fn password_reset_by_token_hash(
        &mut self,
        token_hash: &str,
    ) -> StoreResult<Option<PasswordReset>>;
    async fn delete_password_resets(&mut self, user_id: Uuid) -> StoreResult<u64>;

    // Collaborator requests

    async fn insert_collaborator_request(
        &mut self,
        data: CreateCollaboratorRequest,
    ) -> StoreResult<CollaboratorRequest>;
    /// Loads a request and holds it until the unit of work ends
    async fn lock_collaborator_request(
        &mut self,
        id: Uuid,
    ) -> StoreResult<Option<CollaboratorRequest>>;
    /// Requests on boards of accounts the user collaborates in
    async fn collaborator_requests_for_user(
        &mut self,
        user_id: Uuid,
    ) -> StoreResult<Vec<CollaboratorRequest>>;
    async fn update_collaborator_request(
        &mut self,
        request: &CollaboratorRequest,
    ) -> StoreResult<CollaboratorRequest>;

    // Notifications

    async fn insert_notification(&mut self, data: CreateNotification) -> StoreResult<Notification>;
}
