/// Core Mailer trait and types
///
/// A mailer hands one composed [`Email`] to a delivery channel. It knows
/// nothing about the outbox: retries, leases and bookkeeping belong to the
/// dispatcher.
///
/// # Example
///
/// ```no_run
/// use async_trait::async_trait;
/// use boards_mailer::adapters::{Email, Mailer, MailerResult};
///
/// struct StdoutMailer;
///
/// #[async_trait]
/// impl Mailer for StdoutMailer {
///     fn name(&self) -> &str {
///         "stdout"
///     }
///
///     async fn send(&self, email: &Email) -> MailerResult<()> {
///         println!("{} -> {}: {}", email.from, email.to, email.subject);
///         Ok(())
///     }
/// }
/// ```

use async_trait::async_trait;
use serde::Serialize;

/// Mailer error types
#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    /// Mailer settings are unusable
    #[error("Invalid mailer configuration: {0}")]
    InvalidConfig(String),

    /// The notification payload lacks a field its email needs
    #[error("Invalid notification payload: {0}")]
    InvalidPayload(String),

    /// The relay could not be reached
    #[error("Transport error: {0}")]
    Transport(String),

    /// The relay answered with a non-success status
    #[error("Relay rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl MailerError {
    /// Whether retrying the same notification can succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            MailerError::InvalidConfig(_) | MailerError::InvalidPayload(_) => false,
            MailerError::Transport(_) => true,
            MailerError::Rejected { status, .. } => *status == 429 || *status >= 500,
        }
    }
}

/// Mailer result type alias
pub type MailerResult<T> = Result<T, MailerError>;

/// A composed plain-text email
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Delivery channel for composed emails
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    async fn send(&self, email: &Email) -> MailerResult<()>;
}
