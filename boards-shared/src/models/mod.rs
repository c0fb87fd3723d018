/// Database models for the boards backend
///
/// Each model owns its table's SQL. Functions take `&mut PgConnection` so they
/// run inside whatever transaction the caller opened; the Postgres store is the
/// only caller.
///
/// # Models
///
/// - `user`: registered users
/// - `account`: workspaces owning boards
/// - `account_collaborator`: user membership in accounts with owner flag
/// - `board`: boards
/// - `board_collaborator`: user or invited user access to a board
/// - `invited_user`: pending or accepted invitations by email
/// - `signup_request`: emailed signup tokens
/// - `password_reset`: emailed password reset tokens
/// - `collaborator_request`: requests to join a board
/// - `notification`: outbox drained by the mailer

pub mod account;
pub mod account_collaborator;
pub mod board;
pub mod board_collaborator;
pub mod collaborator_request;
pub mod invited_user;
pub mod notification;
pub mod password_reset;
pub mod signup_request;
pub mod user;
