/// Signup request model and database operations
///
/// A signup request is created when someone asks to join with their email. The
/// mailed token is the only way to sign up through this flow; the row is
/// deleted when the signup succeeds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SignupRequest {
    pub id: Uuid,
    pub email: String,

    #[serde(skip_serializing, default)]
    pub token_hash: String,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateSignupRequest {
    pub email: String,
    pub token_hash: String,
}

impl SignupRequest {
    pub async fn create(
        conn: &mut PgConnection,
        data: CreateSignupRequest,
    ) -> Result<Self, sqlx::Error> {
        let request = sqlx::query_as::<_, SignupRequest>(
            r#"
            INSERT INTO signup_requests (email, token_hash)
            VALUES ($1, $2)
            RETURNING id, email, token_hash, created_at
            "#,
        )
        .bind(data.email)
        .bind(data.token_hash)
        .fetch_one(&mut *conn)
        .await?;

        Ok(request)
    }

    pub async fn find_by_token_hash(
        conn: &mut PgConnection,
        token_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let request = sqlx::query_as::<_, SignupRequest>(
            r#"
            SELECT id, email, token_hash, created_at
            FROM signup_requests
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(request)
    }

    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM signup_requests WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
