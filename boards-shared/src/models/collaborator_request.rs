/// Board collaborator request model and database operations
///
/// Anyone can ask to join a board by leaving their email. Account owners then
/// accept or reject the request; both outcomes are terminal.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE collaborator_request_status AS ENUM ('pending', 'accepted', 'rejected');
///
/// CREATE TABLE board_collaborator_requests (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(254) NOT NULL,
///     board_id UUID NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
///     status collaborator_request_status NOT NULL DEFAULT 'pending',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # State Machine
///
/// ```text
/// pending ──accept──> accepted
///    │
///    └────reject──> rejected
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "collaborator_request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CollaboratorRequest {
    pub id: Uuid,
    pub email: String,
    pub board_id: Uuid,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateCollaboratorRequest {
    pub email: String,
    pub board_id: Uuid,
}

impl CollaboratorRequest {
    /// Moves a pending request to `next`
    ///
    /// Returns `false` and leaves the request untouched when it already reached
    /// a terminal state.
    pub fn transition(&mut self, next: RequestStatus) -> bool {
        if self.status.is_terminal() || next == RequestStatus::Pending {
            return false;
        }
        self.status = next;
        true
    }

    pub async fn create(
        conn: &mut PgConnection,
        data: CreateCollaboratorRequest,
    ) -> Result<Self, sqlx::Error> {
        let request = sqlx::query_as::<_, CollaboratorRequest>(
            r#"
            INSERT INTO board_collaborator_requests (email, board_id)
            VALUES ($1, $2)
            RETURNING id, email, board_id, status, created_at, updated_at
            "#,
        )
        .bind(data.email)
        .bind(data.board_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(request)
    }

    /// Loads a request and locks its row until the transaction ends
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let request = sqlx::query_as::<_, CollaboratorRequest>(
            r#"
            SELECT id, email, board_id, status, created_at, updated_at
            FROM board_collaborator_requests
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(request)
    }

    /// Lists requests on boards of every account the user collaborates in
    pub async fn list_for_user(
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let requests = sqlx::query_as::<_, CollaboratorRequest>(
            r#"
            SELECT r.id, r.email, r.board_id, r.status, r.created_at, r.updated_at
            FROM board_collaborator_requests r
            INNER JOIN boards b ON b.id = r.board_id
            INNER JOIN account_collaborators ac ON ac.account_id = b.account_id
            WHERE ac.user_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(requests)
    }

    pub async fn save(
        conn: &mut PgConnection,
        request: &CollaboratorRequest,
    ) -> Result<Self, sqlx::Error> {
        let request = sqlx::query_as::<_, CollaboratorRequest>(
            r#"
            UPDATE board_collaborator_requests
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, board_id, status, created_at, updated_at
            "#,
        )
        .bind(request.id)
        .bind(request.status)
        .fetch_one(&mut *conn)
        .await?;

        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(status: RequestStatus) -> CollaboratorRequest {
        CollaboratorRequest {
            id: Uuid::new_v4(),
            email: "ana@example.com".to_string(),
            board_id: Uuid::new_v4(),
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_pending_transitions() {
        let mut accepted = request(RequestStatus::Pending);
        assert!(accepted.transition(RequestStatus::Accepted));
        assert_eq!(accepted.status, RequestStatus::Accepted);

        let mut rejected = request(RequestStatus::Pending);
        assert!(rejected.transition(RequestStatus::Rejected));
        assert_eq!(rejected.status, RequestStatus::Rejected);
    }

    #[test]
    fn test_terminal_states_do_not_move() {
        let mut accepted = request(RequestStatus::Accepted);
        assert!(!accepted.transition(RequestStatus::Rejected));
        assert!(!accepted.transition(RequestStatus::Accepted));
        assert_eq!(accepted.status, RequestStatus::Accepted);

        let mut pending = request(RequestStatus::Pending);
        assert!(!pending.transition(RequestStatus::Pending));
    }
}
