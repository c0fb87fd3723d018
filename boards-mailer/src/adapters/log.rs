/// Log-only mailer
///
/// Used when no relay is configured, typically in development: every email
/// is written to the log, links included, and counts as delivered.

use crate::adapters::{Email, Mailer, MailerResult};
use async_trait::async_trait;

#[derive(Debug, Default, Clone)]
pub struct LogMailer;

impl LogMailer {
    pub fn new() -> Self {
        LogMailer
    }
}

#[async_trait]
impl Mailer for LogMailer {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, email: &Email) -> MailerResult<()> {
        tracing::info!(
            from = %email.from,
            to = %email.to,
            subject = %email.subject,
            "Email (not sent, no relay configured)\n{}",
            email.text
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_mailer_always_delivers() {
        let mailer = LogMailer::new();
        let email = Email {
            from: "Boards <no-reply@localhost>".to_string(),
            to: "juan@example.com".to_string(),
            subject: "Hello".to_string(),
            text: "Body".to_string(),
        };

        assert_eq!(mailer.name(), "log");
        assert!(mailer.send(&email).await.is_ok());
    }
}
