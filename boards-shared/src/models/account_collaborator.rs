/// Account collaborator model and database operations
///
/// Links users to accounts with a role. The `is_owner` flag mirrors
/// `role = 'owner'` and is what the permission checks read; a check constraint
/// keeps the two in step.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE account_role AS ENUM ('owner', 'member');
///
/// CREATE TABLE account_collaborators (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role account_role NOT NULL DEFAULT 'member',
///     is_owner BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT account_collaborators_account_user_key UNIQUE (account_id, user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

use super::user::User;

/// Role of a user inside an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "account_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    /// Created the account; manages collaborators and requests
    Owner,

    /// Joined through an invitation
    Member,
}

impl AccountRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::Owner => "owner",
            AccountRole::Member => "member",
        }
    }
}

/// Membership of a user in an account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AccountCollaborator {
    pub id: Uuid,
    pub account_id: Uuid,
    pub user_id: Uuid,
    pub role: AccountRole,

    /// True iff `role` is `Owner`
    pub is_owner: bool,

    pub created_at: DateTime<Utc>,
}

/// Input for creating an account collaborator
#[derive(Debug, Clone)]
pub struct CreateAccountCollaborator {
    pub account_id: Uuid,
    pub user_id: Uuid,
    pub role: AccountRole,
}

impl CreateAccountCollaborator {
    /// Owner row created at signup
    pub fn owner(account_id: Uuid, user_id: Uuid) -> Self {
        Self {
            account_id,
            user_id,
            role: AccountRole::Owner,
        }
    }

    /// Member row created when an invitation is accepted
    pub fn member(account_id: Uuid, user_id: Uuid) -> Self {
        Self {
            account_id,
            user_id,
            role: AccountRole::Member,
        }
    }
}

impl AccountCollaborator {
    /// Inserts a collaborator row
    ///
    /// # Errors
    ///
    /// Returns a database error carrying `account_collaborators_account_user_key`
    /// when the user already belongs to the account.
    pub async fn create(
        conn: &mut PgConnection,
        data: CreateAccountCollaborator,
    ) -> Result<Self, sqlx::Error> {
        let collaborator = sqlx::query_as::<_, AccountCollaborator>(
            r#"
            INSERT INTO account_collaborators (account_id, user_id, role, is_owner)
            VALUES ($1, $2, $3, $4)
            RETURNING id, account_id, user_id, role, is_owner, created_at
            "#,
        )
        .bind(data.account_id)
        .bind(data.user_id)
        .bind(data.role)
        .bind(data.role == AccountRole::Owner)
        .fetch_one(&mut *conn)
        .await?;

        Ok(collaborator)
    }

    /// Finds the row linking `user_id` to `account_id`
    pub async fn find(
        conn: &mut PgConnection,
        account_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let collaborator = sqlx::query_as::<_, AccountCollaborator>(
            r#"
            SELECT id, account_id, user_id, role, is_owner, created_at
            FROM account_collaborators
            WHERE account_id = $1 AND user_id = $2
            "#,
        )
        .bind(account_id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(collaborator)
    }

    /// Lists the owners of an account
    pub async fn list_owners(
        conn: &mut PgConnection,
        account_id: Uuid,
    ) -> Result<Vec<User>, sqlx::Error> {
        let owners = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.username, u.email, u.password_hash, u.first_name, u.last_name,
                   u.is_active, u.created_at, u.updated_at
            FROM users u
            INNER JOIN account_collaborators ac ON ac.user_id = u.id
            WHERE ac.account_id = $1 AND ac.is_owner = TRUE
            ORDER BY ac.created_at ASC
            "#,
        )
        .bind(account_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(owners)
    }

    /// Finds the account member whose email matches, ignoring case
    pub async fn find_member_by_email(
        conn: &mut PgConnection,
        account_id: Uuid,
        email: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.username, u.email, u.password_hash, u.first_name, u.last_name,
                   u.is_active, u.created_at, u.updated_at
            FROM users u
            INNER JOIN account_collaborators ac ON ac.user_id = u.id
            WHERE ac.account_id = $1 AND LOWER(u.email) = LOWER($2)
            "#,
        )
        .bind(account_id)
        .bind(email)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_role_as_str() {
        assert_eq!(AccountRole::Owner.as_str(), "owner");
        assert_eq!(AccountRole::Member.as_str(), "member");
    }

    #[test]
    fn test_create_helpers_set_role() {
        let account_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        assert_eq!(
            CreateAccountCollaborator::owner(account_id, user_id).role,
            AccountRole::Owner
        );
        assert_eq!(
            CreateAccountCollaborator::member(account_id, user_id).role,
            AccountRole::Member
        );
    }
}
