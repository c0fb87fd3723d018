/// API route handlers
///
/// Handlers stay thin: they extract the principal and body, call one
/// [`boards_shared::services::Services`] operation and pick the status code.
///
/// - `health`: Health check endpoint
/// - `auth`: Signup, signin and password recovery
/// - `users`: The current user's profile and account
/// - `boards`: Board CRUD and leaving
/// - `collaborators`: Board collaborators, single or bulk
/// - `requests`: Collaborator requests and their owner decisions

pub mod auth;
pub mod boards;
pub mod collaborators;
pub mod health;
pub mod requests;
pub mod users;
