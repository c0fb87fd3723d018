/// Password reset model and database operations
///
/// One row per forgot-password request. All of a user's rows are removed when
/// the password is reset, so older links stop working too.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PasswordReset {
    pub id: Uuid,
    pub user_id: Uuid,

    #[serde(skip_serializing, default)]
    pub token_hash: String,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreatePasswordReset {
    pub user_id: Uuid,
    pub token_hash: String,
}

impl PasswordReset {
    pub async fn create(
        conn: &mut PgConnection,
        data: CreatePasswordReset,
    ) -> Result<Self, sqlx::Error> {
        let reset = sqlx::query_as::<_, PasswordReset>(
            r#"
            INSERT INTO password_resets (user_id, token_hash)
            VALUES ($1, $2)
            RETURNING id, user_id, token_hash, created_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.token_hash)
        .fetch_one(&mut *conn)
        .await?;

        Ok(reset)
    }

    pub async fn find_by_token_hash(
        conn: &mut PgConnection,
        token_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let reset = sqlx::query_as::<_, PasswordReset>(
            r#"
            SELECT id, user_id, token_hash, created_at
            FROM password_resets
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(reset)
    }

    /// Deletes every reset row of a user, returning how many were removed
    pub async fn delete_for_user(conn: &mut PgConnection, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM password_resets WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }
}
