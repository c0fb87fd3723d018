/// Email composition
///
/// Turns an outbox notification into a plain-text [`Email`]. Links point at
/// the frontend (`APP_BASE_URL`), which forwards tokens to the API.
///
/// | Kind | Link |
/// |------|------|
/// | `signup_request` | `/signup?signup_request_token=<token>` |
/// | `invitation` | `/signup?invited_user_token=<token>` |
/// | `password_reset` | `/reset-password?token=<token>` |
/// | `collaborator_request` | `/boards/<board_id>/requests/<request_id>` |

use crate::adapters::{Email, MailerError, MailerResult};
use boards_shared::models::notification::{Notification, NotificationKind};
use reqwest::Url;
use serde_json::Value as JsonValue;

#[derive(Debug, Clone)]
pub struct Composer {
    from: String,
    base_url: Url,
}

fn field<'a>(payload: &'a JsonValue, name: &str) -> MailerResult<&'a str> {
    payload[name]
        .as_str()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| MailerError::InvalidPayload(format!("missing \"{}\"", name)))
}

impl Composer {
    /// # Errors
    ///
    /// Returns [`MailerError::InvalidConfig`] if `base_url` is not an
    /// absolute URL.
    pub fn new(from: impl Into<String>, base_url: &str) -> MailerResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| MailerError::InvalidConfig(format!("APP_BASE_URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(MailerError::InvalidConfig(format!(
                "APP_BASE_URL cannot be a base: {}",
                base_url
            )));
        }

        Ok(Self {
            from: from.into(),
            base_url,
        })
    }

    fn link(&self, segments: &[&str], query: &[(&str, &str)]) -> String {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        url.to_string()
    }

    pub fn compose(&self, notification: &Notification) -> MailerResult<Email> {
        let payload = &notification.payload;

        let (subject, text) = match notification.kind {
            NotificationKind::SignupRequest => {
                let link = self.link(&["signup"], &[("signup_request_token", field(payload, "token")?)]);
                (
                    "Confirm your email to sign up".to_string(),
                    format!(
                        "Hi,\n\n\
                         Someone asked to create a Boards account for this email address.\n\
                         Continue your signup here:\n\n{}\n\n\
                         If this wasn't you, ignore this email.\n",
                        link
                    ),
                )
            }
            NotificationKind::Invitation => {
                let link = self.link(&["signup"], &[("invited_user_token", field(payload, "token")?)]);
                let board_name = field(payload, "board_name")?;
                let inviter = payload["invited_by"].as_str().unwrap_or("Someone");
                let account_name = payload["account_name"].as_str().unwrap_or_default();
                (
                    format!("{} invited you to {}", inviter, board_name),
                    format!(
                        "Hi,\n\n\
                         {} invited you to collaborate on the board \"{}\" in {}.\n\
                         Join here:\n\n{}\n",
                        inviter, board_name, account_name, link
                    ),
                )
            }
            NotificationKind::PasswordReset => {
                let link = self.link(&["reset-password"], &[("token", field(payload, "token")?)]);
                let username = payload["username"].as_str().unwrap_or_default();
                (
                    "Reset your password".to_string(),
                    format!(
                        "Hi {},\n\n\
                         Use this link to choose a new password:\n\n{}\n\n\
                         If you didn't ask for a reset, ignore this email.\n",
                        username, link
                    ),
                )
            }
            NotificationKind::CollaboratorRequest => {
                let board_id = field(payload, "board_id")?;
                let request_id = field(payload, "request_id")?;
                let requester = field(payload, "requester_email")?;
                let board_name = payload["board_name"].as_str().unwrap_or_default();
                let link = self.link(&["boards", board_id, "requests", request_id], &[]);
                (
                    format!("{} wants to join {}", requester, board_name),
                    format!(
                        "Hi,\n\n\
                         {} asked to collaborate on the board \"{}\".\n\
                         Accept or reject the request here:\n\n{}\n",
                        requester, board_name, link
                    ),
                )
            }
        };

        Ok(Email {
            from: self.from.clone(),
            to: notification.recipient.clone(),
            subject,
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn notification(kind: NotificationKind, payload: JsonValue) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            kind,
            recipient: "juan@example.com".to_string(),
            payload,
            attempts: 0,
            last_error: None,
            locked_until: None,
            sent_at: None,
            created_at: Utc::now(),
        }
    }

    fn composer() -> Composer {
        Composer::new("Boards <no-reply@localhost>", "https://boards.example/app/").unwrap()
    }

    #[test]
    fn test_signup_request_link_carries_token() {
        let email = composer()
            .compose(&notification(
                NotificationKind::SignupRequest,
                json!({ "email": "juan@example.com", "token": "sr_a1b2" }),
            ))
            .unwrap();

        assert_eq!(email.to, "juan@example.com");
        assert!(email
            .text
            .contains("https://boards.example/app/signup?signup_request_token=sr_a1b2"));
    }

    #[test]
    fn test_invitation_names_inviter_and_board() {
        let email = composer()
            .compose(&notification(
                NotificationKind::Invitation,
                json!({
                    "email": "ana@example.com",
                    "token": "iu_ff00",
                    "account_name": "juan",
                    "board_id": Uuid::new_v4(),
                    "board_name": "Roadmap",
                    "invited_by": "Juan Pérez"
                }),
            ))
            .unwrap();

        assert_eq!(email.subject, "Juan Pérez invited you to Roadmap");
        assert!(email.text.contains("invited_user_token=iu_ff00"));
    }

    #[test]
    fn test_collaborator_request_links_to_request() {
        let board_id = Uuid::new_v4();
        let request_id = Uuid::new_v4();
        let email = composer()
            .compose(&notification(
                NotificationKind::CollaboratorRequest,
                json!({
                    "request_id": request_id,
                    "requester_email": "leo@example.com",
                    "board_id": board_id,
                    "board_name": "Roadmap"
                }),
            ))
            .unwrap();

        assert!(email.text.contains(&format!(
            "https://boards.example/app/boards/{}/requests/{}",
            board_id, request_id
        )));
    }

    #[test]
    fn test_missing_token_is_invalid_payload() {
        let err = composer()
            .compose(&notification(NotificationKind::PasswordReset, json!({ "username": "juan" })))
            .unwrap_err();

        assert!(matches!(err, MailerError::InvalidPayload(_)));
    }

    #[test]
    fn test_relative_base_url_is_rejected() {
        assert!(matches!(
            Composer::new("x", "/app"),
            Err(MailerError::InvalidConfig(_))
        ));
    }
}
