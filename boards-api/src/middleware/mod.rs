/// Middleware modules for the API server
///
/// Principal resolution lives in [`crate::app`] because it needs the
/// application state.

pub mod security;
