/// Notification outbox model
///
/// Workflows never talk to a mail server. They insert a notification row in the
/// same transaction as the change that triggers it, so a notification exists
/// iff the change committed. The `boards-mailer` worker drains the table.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE notification_kind AS ENUM (
///     'signup_request', 'invitation', 'password_reset', 'collaborator_request'
/// );
///
/// CREATE TABLE notifications (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     kind notification_kind NOT NULL,
///     recipient VARCHAR(254) NOT NULL,
///     payload JSONB NOT NULL DEFAULT '{}'::jsonb,
///     attempts INTEGER NOT NULL DEFAULT 0,
///     last_error TEXT,
///     locked_until TIMESTAMPTZ,
///     sent_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use sqlx::PgConnection;
use uuid::Uuid;

use super::{account::Account, board::Board, collaborator_request::CollaboratorRequest, user::User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Carries the signup request token
    SignupRequest,

    /// Carries the invited user token
    Invitation,

    /// Carries the password reset token
    PasswordReset,

    /// Tells an account owner someone asked to join a board
    CollaboratorRequest,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::SignupRequest => "signup_request",
            NotificationKind::Invitation => "invitation",
            NotificationKind::PasswordReset => "password_reset",
            NotificationKind::CollaboratorRequest => "collaborator_request",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub recipient: String,
    pub payload: JsonValue,
    pub attempts: i32,
    pub last_error: Option<String>,

    /// Set while a mailer holds the row
    pub locked_until: Option<DateTime<Utc>>,

    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateNotification {
    pub kind: NotificationKind,
    pub recipient: String,
    pub payload: JsonValue,
}

impl CreateNotification {
    pub fn signup_request(email: &str, token: &str) -> Self {
        Self {
            kind: NotificationKind::SignupRequest,
            recipient: email.to_string(),
            payload: json!({ "email": email, "token": token }),
        }
    }

    pub fn invitation(
        email: &str,
        token: &str,
        account: &Account,
        board: &Board,
        invited_by: Option<&User>,
    ) -> Self {
        Self {
            kind: NotificationKind::Invitation,
            recipient: email.to_string(),
            payload: json!({
                "email": email,
                "token": token,
                "account_name": account.name,
                "board_id": board.id,
                "board_name": board.name,
                "invited_by": invited_by.map(User::display_name),
            }),
        }
    }

    pub fn password_reset(user: &User, token: &str) -> Self {
        Self {
            kind: NotificationKind::PasswordReset,
            recipient: user.email.clone(),
            payload: json!({ "username": user.username, "token": token }),
        }
    }

    pub fn collaborator_request(owner: &User, request: &CollaboratorRequest, board: &Board) -> Self {
        Self {
            kind: NotificationKind::CollaboratorRequest,
            recipient: owner.email.clone(),
            payload: json!({
                "request_id": request.id,
                "requester_email": request.email,
                "board_id": board.id,
                "board_name": board.name,
            }),
        }
    }
}

impl Notification {
    pub async fn create(
        conn: &mut PgConnection,
        data: CreateNotification,
    ) -> Result<Self, sqlx::Error> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (kind, recipient, payload)
            VALUES ($1, $2, $3)
            RETURNING id, kind, recipient, payload, attempts, last_error,
                      locked_until, sent_at, created_at
            "#,
        )
        .bind(data.kind)
        .bind(data.recipient)
        .bind(data.payload)
        .fetch_one(&mut *conn)
        .await?;

        Ok(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(NotificationKind::CollaboratorRequest).unwrap(),
            "collaborator_request"
        );
        assert_eq!(NotificationKind::PasswordReset.as_str(), "password_reset");
    }

    #[test]
    fn test_signup_request_payload_carries_token() {
        let notification = CreateNotification::signup_request("juan@example.com", "sr_abc");

        assert_eq!(notification.kind, NotificationKind::SignupRequest);
        assert_eq!(notification.recipient, "juan@example.com");
        assert_eq!(notification.payload["token"], "sr_abc");
    }
}
