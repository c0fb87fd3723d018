/// HTTP relay mailer
///
/// Posts each email as JSON to a transactional mail relay:
///
/// ```json
/// {
///   "from": "Boards <no-reply@example.com>",
///   "to": "juan@example.com",
///   "subject": "Confirm your email",
///   "text": "..."
/// }
/// ```
///
/// Any 2xx answer counts as delivered. 429 and 5xx answers are retried by
/// the dispatcher, other statuses are not.

use crate::adapters::{Email, Mailer, MailerError, MailerResult};
use async_trait::async_trait;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest relay error body kept in `last_error`
const MAX_ERROR_BODY: usize = 500;

pub struct RelayMailer {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl RelayMailer {
    /// # Errors
    ///
    /// Returns [`MailerError::Transport`] if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, token: Option<String>) -> MailerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MailerError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
            token,
        })
    }
}

#[async_trait]
impl Mailer for RelayMailer {
    fn name(&self) -> &str {
        "relay"
    }

    async fn send(&self, email: &Email) -> MailerResult<()> {
        let mut request = self.client.post(&self.url).json(email);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MailerError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }

        Err(MailerError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_relay_is_transport_error() {
        let mailer = RelayMailer::new("http://127.0.0.1:9/send", None).unwrap();
        let email = Email {
            from: "Boards <no-reply@localhost>".to_string(),
            to: "juan@example.com".to_string(),
            subject: "Hello".to_string(),
            text: "Body".to_string(),
        };

        let err = mailer.send(&email).await.unwrap_err();
        assert!(matches!(err, MailerError::Transport(_)));
        assert!(err.is_retryable());
    }
}
