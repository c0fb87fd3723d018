/// Invited user model and database operations
///
/// An invited user stands in for someone who was added to a board by email
/// before having a user in the board's account. The invite token is issued when
/// the invitation is dispatched; only its SHA-256 hash is stored.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE invitation_status AS ENUM ('pending', 'accepted');
///
/// CREATE TABLE invited_users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(254) NOT NULL,
///     account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
///     board_collaborator_id UUID,
///     token_hash VARCHAR(64),
///     token_issued_at TIMESTAMPTZ,
///     status invitation_status NOT NULL DEFAULT 'pending',
///     user_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_by UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE UNIQUE INDEX invited_users_email_account_key
///     ON invited_users (LOWER(email), account_id);
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invitation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct InvitedUser {
    pub id: Uuid,
    pub email: String,
    pub account_id: Uuid,

    /// Collaborator row the invitation was dispatched for
    pub board_collaborator_id: Option<Uuid>,

    #[serde(skip_serializing, default)]
    pub token_hash: Option<String>,

    pub token_issued_at: Option<DateTime<Utc>>,

    pub status: InvitationStatus,

    /// User that accepted the invitation
    pub user_id: Option<Uuid>,

    /// User that added this email to a board
    pub created_by: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateInvitedUser {
    pub email: String,
    pub account_id: Uuid,
    pub created_by: Uuid,
}

impl InvitedUser {
    pub fn is_pending(&self) -> bool {
        self.status == InvitationStatus::Pending
    }

    /// Marks the invitation accepted by `user_id` and retires its token
    pub fn mark_accepted(&mut self, user_id: Uuid) {
        self.status = InvitationStatus::Accepted;
        self.user_id = Some(user_id);
        self.token_hash = None;
    }

    pub async fn create(
        conn: &mut PgConnection,
        data: CreateInvitedUser,
    ) -> Result<Self, sqlx::Error> {
        let invited_user = sqlx::query_as::<_, InvitedUser>(
            r#"
            INSERT INTO invited_users (email, account_id, created_by)
            VALUES ($1, $2, $3)
            RETURNING id, email, account_id, board_collaborator_id, token_hash,
                      token_issued_at, status, user_id, created_by, created_at, updated_at
            "#,
        )
        .bind(data.email)
        .bind(data.account_id)
        .bind(data.created_by)
        .fetch_one(&mut *conn)
        .await?;

        Ok(invited_user)
    }

    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let invited_user = sqlx::query_as::<_, InvitedUser>(
            r#"
            SELECT id, email, account_id, board_collaborator_id, token_hash,
                   token_issued_at, status, user_id, created_by, created_at, updated_at
            FROM invited_users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(invited_user)
    }

    /// Finds the invitation for `email` in `account_id`, ignoring case
    pub async fn find_by_email(
        conn: &mut PgConnection,
        account_id: Uuid,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let invited_user = sqlx::query_as::<_, InvitedUser>(
            r#"
            SELECT id, email, account_id, board_collaborator_id, token_hash,
                   token_issued_at, status, user_id, created_by, created_at, updated_at
            FROM invited_users
            WHERE account_id = $1 AND LOWER(email) = LOWER($2)
            "#,
        )
        .bind(account_id)
        .bind(email)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(invited_user)
    }

    pub async fn find_by_token_hash(
        conn: &mut PgConnection,
        token_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let invited_user = sqlx::query_as::<_, InvitedUser>(
            r#"
            SELECT id, email, account_id, board_collaborator_id, token_hash,
                   token_issued_at, status, user_id, created_by, created_at, updated_at
            FROM invited_users
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(invited_user)
    }

    pub async fn save(
        conn: &mut PgConnection,
        invited_user: &InvitedUser,
    ) -> Result<Self, sqlx::Error> {
        let invited_user = sqlx::query_as::<_, InvitedUser>(
            r#"
            UPDATE invited_users
            SET board_collaborator_id = $2,
                token_hash = $3,
                token_issued_at = $4,
                status = $5,
                user_id = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, account_id, board_collaborator_id, token_hash,
                      token_issued_at, status, user_id, created_by, created_at, updated_at
            "#,
        )
        .bind(invited_user.id)
        .bind(invited_user.board_collaborator_id)
        .bind(&invited_user.token_hash)
        .bind(invited_user.token_issued_at)
        .bind(invited_user.status)
        .bind(invited_user.user_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(invited_user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_accepted_retires_token() {
        let mut invited = InvitedUser {
            id: Uuid::new_v4(),
            email: "ana@example.com".to_string(),
            account_id: Uuid::new_v4(),
            board_collaborator_id: None,
            token_hash: Some("abc".to_string()),
            token_issued_at: Some(Utc::now()),
            status: InvitationStatus::Pending,
            user_id: None,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let user_id = Uuid::new_v4();

        assert!(invited.is_pending());
        invited.mark_accepted(user_id);

        assert!(!invited.is_pending());
        assert_eq!(invited.user_id, Some(user_id));
        assert!(invited.token_hash.is_none());
    }
}
