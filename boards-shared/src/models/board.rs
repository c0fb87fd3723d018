/// Board model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE boards (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
///     created_by UUID NOT NULL REFERENCES users(id),
///     modified_by UUID REFERENCES users(id),
///     is_shared BOOLEAN NOT NULL DEFAULT FALSE,
///     color VARCHAR(32),
///     thumbnail_sm_path TEXT NOT NULL DEFAULT '',
///     thumbnail_md_path TEXT NOT NULL DEFAULT '',
///     thumbnail_lg_path TEXT NOT NULL DEFAULT '',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Thumbnail paths are opaque storage keys; nothing here reads the files.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

/// Name given to the board created for every new account
pub const DEMO_BOARD_NAME: &str = "Demo Board";

/// A board inside an account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Board {
    pub id: Uuid,
    pub name: String,

    /// Owning account
    pub account_id: Uuid,

    pub created_by: Uuid,
    pub modified_by: Option<Uuid>,

    /// Shared boards are readable by anyone, including anonymous visitors
    pub is_shared: bool,

    pub color: Option<String>,

    pub thumbnail_sm_path: String,
    pub thumbnail_md_path: String,
    pub thumbnail_lg_path: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a board
#[derive(Debug, Clone)]
pub struct CreateBoard {
    pub name: String,
    pub account_id: Uuid,
    pub created_by: Uuid,
    pub is_shared: bool,
    pub color: Option<String>,
}

impl CreateBoard {
    /// The board every new account starts with
    pub fn demo(account_id: Uuid, created_by: Uuid, color: Option<String>) -> Self {
        Self {
            name: DEMO_BOARD_NAME.to_string(),
            account_id,
            created_by,
            is_shared: false,
            color,
        }
    }
}

impl Board {
    pub async fn create(conn: &mut PgConnection, data: CreateBoard) -> Result<Self, sqlx::Error> {
        let board = sqlx::query_as::<_, Board>(
            r#"
            INSERT INTO boards (name, account_id, created_by, modified_by, is_shared, color)
            VALUES ($1, $2, $3, $3, $4, $5)
            RETURNING id, name, account_id, created_by, modified_by, is_shared, color,
                      thumbnail_sm_path, thumbnail_md_path, thumbnail_lg_path,
                      created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.account_id)
        .bind(data.created_by)
        .bind(data.is_shared)
        .bind(data.color)
        .fetch_one(&mut *conn)
        .await?;

        Ok(board)
    }

    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let board = sqlx::query_as::<_, Board>(
            r#"
            SELECT id, name, account_id, created_by, modified_by, is_shared, color,
                   thumbnail_sm_path, thumbnail_md_path, thumbnail_lg_path,
                   created_at, updated_at
            FROM boards
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(board)
    }

    /// Lists boards the user has a collaborator row on, newest first
    pub async fn list_by_collaborator(
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let boards = sqlx::query_as::<_, Board>(
            r#"
            SELECT b.id, b.name, b.account_id, b.created_by, b.modified_by, b.is_shared,
                   b.color, b.thumbnail_sm_path, b.thumbnail_md_path, b.thumbnail_lg_path,
                   b.created_at, b.updated_at
            FROM boards b
            INNER JOIN board_collaborators bc ON bc.board_id = b.id
            WHERE bc.user_id = $1
            ORDER BY b.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(boards)
    }

    /// Writes the mutable columns back and bumps `updated_at`
    pub async fn save(conn: &mut PgConnection, board: &Board) -> Result<Self, sqlx::Error> {
        let board = sqlx::query_as::<_, Board>(
            r#"
            UPDATE boards
            SET name = $2,
                modified_by = $3,
                is_shared = $4,
                color = $5,
                thumbnail_sm_path = $6,
                thumbnail_md_path = $7,
                thumbnail_lg_path = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, account_id, created_by, modified_by, is_shared, color,
                      thumbnail_sm_path, thumbnail_md_path, thumbnail_lg_path,
                      created_at, updated_at
            "#,
        )
        .bind(board.id)
        .bind(&board.name)
        .bind(board.modified_by)
        .bind(board.is_shared)
        .bind(&board.color)
        .bind(&board.thumbnail_sm_path)
        .bind(&board.thumbnail_md_path)
        .bind(&board.thumbnail_lg_path)
        .fetch_one(&mut *conn)
        .await?;

        Ok(board)
    }

    /// Deletes a board; collaborator rows and requests cascade
    ///
    /// Returns whether a row was deleted.
    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM boards WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
