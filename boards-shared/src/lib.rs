//! # Boards Shared Library
//!
//! Domain types, storage and workflows used by the Boards API server and the
//! mailer.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `store`: Transactional entity store, PostgreSQL and in-memory
//! - `auth`: Passwords, session tokens, emailed tokens and permission rules
//! - `services`: Signup, collaboration and board workflows
//! - `db`: Connection pool and migrations
//! - `error`: Domain error types
//! - `validation`: Shared input checks

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod validation;

/// Current version of the Boards shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
