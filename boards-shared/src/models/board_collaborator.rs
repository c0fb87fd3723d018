/// Board collaborator model and database operations
///
/// A collaborator row grants a registered user or an invited user access to a
/// board. Exactly one of `user_id` and `invited_user_id` is set; both stores
/// reject writes that break this, and Postgres backs it with
/// `board_collaborators_target_check`. A user (or invited user) appears at most
/// once per board.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE board_permission AS ENUM ('read', 'write');
///
/// CREATE TABLE board_collaborators (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     board_id UUID NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
///     user_id UUID REFERENCES users(id) ON DELETE CASCADE,
///     invited_user_id UUID REFERENCES invited_users(id) ON DELETE CASCADE,
///     permission board_permission NOT NULL,
///     created_by UUID REFERENCES users(id),
///     modified_by UUID REFERENCES users(id),
///     invitation_sent_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT board_collaborators_target_check
///         CHECK ((user_id IS NULL) <> (invited_user_id IS NULL))
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

/// Access level granted by a collaborator row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "board_permission", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Read => "read",
            Permission::Write => "write",
        }
    }
}

/// Message for a row that names both a user and an invited user
pub const BOTH_TARGETS_SET: &str = "Both user and invited_user cannot be set together.";

/// Message for a row that names neither a user nor an invited user
pub const NO_TARGET_SET: &str = "Either user or invited_user must be set.";

/// Checks the user XOR invited user invariant
pub fn validate_target(
    user_id: Option<Uuid>,
    invited_user_id: Option<Uuid>,
) -> Result<(), &'static str> {
    match (user_id, invited_user_id) {
        (Some(_), Some(_)) => Err(BOTH_TARGETS_SET),
        (None, None) => Err(NO_TARGET_SET),
        _ => Ok(()),
    }
}

/// Who a collaborator row points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollaboratorTarget {
    User(Uuid),
    InvitedUser(Uuid),
}

/// A user's or invited user's access to a board
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BoardCollaborator {
    pub id: Uuid,
    pub board_id: Uuid,
    pub user_id: Option<Uuid>,
    pub invited_user_id: Option<Uuid>,
    pub permission: Permission,

    /// Set once, on creation
    pub created_by: Option<Uuid>,

    /// Set on every save
    pub modified_by: Option<Uuid>,

    /// When the invitation for this row was queued
    pub invitation_sent_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a collaborator row
#[derive(Debug, Clone)]
pub struct CreateBoardCollaborator {
    pub board_id: Uuid,
    pub user_id: Option<Uuid>,
    pub invited_user_id: Option<Uuid>,
    pub permission: Permission,
    pub created_by: Option<Uuid>,
}

impl CreateBoardCollaborator {
    pub fn new(
        board_id: Uuid,
        target: CollaboratorTarget,
        permission: Permission,
        created_by: Option<Uuid>,
    ) -> Self {
        let (user_id, invited_user_id) = match target {
            CollaboratorTarget::User(id) => (Some(id), None),
            CollaboratorTarget::InvitedUser(id) => (None, Some(id)),
        };

        Self {
            board_id,
            user_id,
            invited_user_id,
            permission,
            created_by,
        }
    }
}

impl BoardCollaborator {
    /// Returns the target of this row, or `None` when the invariant is broken
    pub fn target(&self) -> Option<CollaboratorTarget> {
        match (self.user_id, self.invited_user_id) {
            (Some(user_id), None) => Some(CollaboratorTarget::User(user_id)),
            (None, Some(invited_user_id)) => Some(CollaboratorTarget::InvitedUser(invited_user_id)),
            _ => None,
        }
    }

    /// Whether this row grants at least `required` access
    pub fn grants(&self, required: Permission) -> bool {
        match required {
            Permission::Read => true,
            Permission::Write => self.permission == Permission::Write,
        }
    }

    pub async fn create(
        conn: &mut PgConnection,
        data: CreateBoardCollaborator,
    ) -> Result<Self, sqlx::Error> {
        let collaborator = sqlx::query_as::<_, BoardCollaborator>(
            r#"
            INSERT INTO board_collaborators
                (board_id, user_id, invited_user_id, permission, created_by, modified_by)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING id, board_id, user_id, invited_user_id, permission,
                      created_by, modified_by, invitation_sent_at, created_at, updated_at
            "#,
        )
        .bind(data.board_id)
        .bind(data.user_id)
        .bind(data.invited_user_id)
        .bind(data.permission)
        .bind(data.created_by)
        .fetch_one(&mut *conn)
        .await?;

        Ok(collaborator)
    }

    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let collaborator = sqlx::query_as::<_, BoardCollaborator>(
            r#"
            SELECT id, board_id, user_id, invited_user_id, permission,
                   created_by, modified_by, invitation_sent_at, created_at, updated_at
            FROM board_collaborators
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(collaborator)
    }

    /// Finds the row for `user_id` on `board_id`
    pub async fn find_for_user(
        conn: &mut PgConnection,
        board_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let collaborator = sqlx::query_as::<_, BoardCollaborator>(
            r#"
            SELECT id, board_id, user_id, invited_user_id, permission,
                   created_by, modified_by, invitation_sent_at, created_at, updated_at
            FROM board_collaborators
            WHERE board_id = $1 AND user_id = $2
            "#,
        )
        .bind(board_id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(collaborator)
    }

    /// Lists the rows of a board, oldest first
    pub async fn list_by_board(
        conn: &mut PgConnection,
        board_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let collaborators = sqlx::query_as::<_, BoardCollaborator>(
            r#"
            SELECT id, board_id, user_id, invited_user_id, permission,
                   created_by, modified_by, invitation_sent_at, created_at, updated_at
            FROM board_collaborators
            WHERE board_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(board_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(collaborators)
    }

    /// Lists the rows pointing at an invited user
    pub async fn list_by_invited_user(
        conn: &mut PgConnection,
        invited_user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let collaborators = sqlx::query_as::<_, BoardCollaborator>(
            r#"
            SELECT id, board_id, user_id, invited_user_id, permission,
                   created_by, modified_by, invitation_sent_at, created_at, updated_at
            FROM board_collaborators
            WHERE invited_user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(invited_user_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(collaborators)
    }

    /// Writes the target, permission, modifier and invitation stamp back and
    /// bumps `updated_at`
    pub async fn save(
        conn: &mut PgConnection,
        collaborator: &BoardCollaborator,
    ) -> Result<Self, sqlx::Error> {
        let collaborator = sqlx::query_as::<_, BoardCollaborator>(
            r#"
            UPDATE board_collaborators
            SET user_id = $2,
                invited_user_id = $3,
                permission = $4,
                modified_by = $5,
                invitation_sent_at = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, board_id, user_id, invited_user_id, permission,
                      created_by, modified_by, invitation_sent_at, created_at, updated_at
            "#,
        )
        .bind(collaborator.id)
        .bind(collaborator.user_id)
        .bind(collaborator.invited_user_id)
        .bind(collaborator.permission)
        .bind(collaborator.modified_by)
        .bind(collaborator.invitation_sent_at)
        .fetch_one(&mut *conn)
        .await?;

        Ok(collaborator)
    }

    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM board_collaborators WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_target() {
        let id = Uuid::new_v4();

        assert!(validate_target(Some(id), None).is_ok());
        assert!(validate_target(None, Some(id)).is_ok());
        assert_eq!(validate_target(Some(id), Some(id)), Err(BOTH_TARGETS_SET));
        assert_eq!(validate_target(None, None), Err(NO_TARGET_SET));
    }

    #[test]
    fn test_create_from_target() {
        let board_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let data = CreateBoardCollaborator::new(
            board_id,
            CollaboratorTarget::User(user_id),
            Permission::Read,
            None,
        );
        assert_eq!(data.user_id, Some(user_id));
        assert!(data.invited_user_id.is_none());

        let data = CreateBoardCollaborator::new(
            board_id,
            CollaboratorTarget::InvitedUser(user_id),
            Permission::Write,
            None,
        );
        assert!(data.user_id.is_none());
        assert_eq!(data.invited_user_id, Some(user_id));
    }

    #[test]
    fn test_grants() {
        let mut row = BoardCollaborator {
            id: Uuid::new_v4(),
            board_id: Uuid::new_v4(),
            user_id: Some(Uuid::new_v4()),
            invited_user_id: None,
            permission: Permission::Read,
            created_by: None,
            modified_by: None,
            invitation_sent_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(row.grants(Permission::Read));
        assert!(!row.grants(Permission::Write));

        row.permission = Permission::Write;
        assert!(row.grants(Permission::Read));
        assert!(row.grants(Permission::Write));
    }
}
