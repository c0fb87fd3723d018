//! # Boards API Server Library
//!
//! HTTP surface over the workflows in `boards-shared`.
//!
//! ## Modules
//!
//! - `app`: Application state, principal layer and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
