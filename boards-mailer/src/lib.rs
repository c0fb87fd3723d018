//! # Boards Mailer Library
//!
//! Drains the notification outbox written by the API workflows and delivers
//! each notification as an email.
//!
//! ## Modules
//!
//! - `adapters`: Delivery channels (log, HTTP relay)
//! - `compose`: Notification to email rendering
//! - `config`: Environment configuration
//! - `orchestrator`: The dispatch loop
//! - `queue`: Outbox claims and bookkeeping
//!
//! ## Example
//!
//! ```no_run
//! use boards_mailer::adapters::{LogMailer, Mailer};
//!
//! let mailer = LogMailer::new();
//! println!("Mailer: {}", mailer.name());
//! ```

pub mod adapters;
pub mod compose;
pub mod config;
pub mod orchestrator;
pub mod queue;
