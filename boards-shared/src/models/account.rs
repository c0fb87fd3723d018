/// Account model and database operations
///
/// An account is the workspace that owns boards. Every signup creates one
/// account named after the new user's username, with a slug derived from the
/// name and disambiguated against existing slugs.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE accounts (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     slug VARCHAR(255) NOT NULL,
///     logo_color VARCHAR(32),
///     created_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT accounts_slug_key UNIQUE (slug)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

/// Workspace owning a set of boards
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// URL-safe unique identifier derived from `name`
    pub slug: String,

    /// Logo color picked at signup
    pub logo_color: Option<String>,

    /// User that created the account
    pub created_by: Uuid,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new account
#[derive(Debug, Clone)]
pub struct CreateAccount {
    pub name: String,
    pub slug: String,
    pub logo_color: Option<String>,
    pub created_by: Uuid,
}

impl Account {
    /// Inserts a new account
    ///
    /// # Errors
    ///
    /// Returns a database error carrying `accounts_slug_key` when the slug is taken.
    pub async fn create(conn: &mut PgConnection, data: CreateAccount) -> Result<Self, sqlx::Error> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (name, slug, logo_color, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, slug, logo_color, created_by, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.slug)
        .bind(data.logo_color)
        .bind(data.created_by)
        .fetch_one(&mut *conn)
        .await?;

        Ok(account)
    }

    /// Finds an account by ID
    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, slug, logo_color, created_by, created_at, updated_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(account)
    }

    /// Checks whether a slug is already in use
    pub async fn slug_exists(conn: &mut PgConnection, slug: &str) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM accounts WHERE slug = $1)")
                .bind(slug)
                .fetch_one(&mut *conn)
                .await?;

        Ok(exists)
    }

    /// Lists the accounts a user collaborates in, oldest first
    pub async fn list_by_user(
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let accounts = sqlx::query_as::<_, Account>(
            r#"
            SELECT a.id, a.name, a.slug, a.logo_color, a.created_by, a.created_at, a.updated_at
            FROM accounts a
            INNER JOIN account_collaborators ac ON ac.account_id = a.id
            WHERE ac.user_id = $1
            ORDER BY a.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(accounts)
    }
}
