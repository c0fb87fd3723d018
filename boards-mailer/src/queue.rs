/// Notification outbox reader
///
/// The outbox is the `notifications` table written by the workflows. A row is
/// due while it is unsent, below the attempt limit and not leased.
///
/// # Claiming
///
/// Claims take rows `FOR UPDATE SKIP LOCKED` and lease them by setting
/// `locked_until`, so several mailers can drain one table and a crashed
/// mailer's rows come back once the lease ends.
///
/// # Example
///
/// ```no_run
/// use boards_mailer::queue::{NotificationQueue, Outbox};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let queue = NotificationQueue::new(pool, 5);
///
/// for notification in queue.claim(20).await? {
///     println!("Claimed {} for {}", notification.kind.as_str(), notification.recipient);
/// }
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use boards_shared::models::notification::Notification;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

/// How long a claimed row stays invisible to other mailers
pub const LEASE_MINUTES: i64 = 5;

/// Outbox error
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Notification not found: {0}")]
    NotificationNotFound(Uuid),
}

/// Delay before the next delivery attempt
///
/// Doubles from 30 seconds per failed attempt, capped at one hour.
pub fn retry_delay(attempts: i32) -> Duration {
    let exponent = attempts.saturating_sub(1).clamp(0, 7) as u32;
    let delay = Duration::seconds(30 * 2_i64.pow(exponent));

    delay.min(Duration::hours(1))
}

/// Outbox operations used by the dispatcher
#[async_trait]
pub trait Outbox: Send + Sync {
    /// Leases up to `limit` due notifications, oldest first
    async fn claim(&self, limit: i64) -> Result<Vec<Notification>, QueueError>;

    /// Records delivery; the payload token is dropped
    async fn mark_sent(&self, id: Uuid) -> Result<(), QueueError>;

    /// Records a failed attempt; the row is due again at `retry_at`
    async fn mark_failed(&self, id: Uuid, error: &str, retry_at: DateTime<Utc>)
        -> Result<(), QueueError>;

    /// Gives up on a notification that can never be delivered
    async fn abandon(&self, id: Uuid, error: &str) -> Result<(), QueueError>;
}

/// Postgres outbox
#[derive(Clone)]
pub struct NotificationQueue {
    db: PgPool,

    /// Attempts after which a row is no longer due
    max_attempts: i32,
}

impl NotificationQueue {
    pub fn new(db: PgPool, max_attempts: i32) -> Self {
        NotificationQueue { db, max_attempts }
    }

    /// Number of rows still waiting for delivery
    pub async fn pending_count(&self) -> Result<i64, QueueError> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM notifications
            WHERE sent_at IS NULL AND attempts < $1
            "#,
        )
        .bind(self.max_attempts)
        .fetch_one(&self.db)
        .await?;

        Ok(count)
    }
}

#[async_trait]
impl Outbox for NotificationQueue {
    async fn claim(&self, limit: i64) -> Result<Vec<Notification>, QueueError> {
        let lease_until = Utc::now() + Duration::minutes(LEASE_MINUTES);

        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            WITH due AS (
                SELECT id
                FROM notifications
                WHERE sent_at IS NULL
                  AND attempts < $2
                  AND (locked_until IS NULL OR locked_until < NOW())
                ORDER BY created_at ASC
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            UPDATE notifications
            SET locked_until = $3
            FROM due
            WHERE notifications.id = due.id
            RETURNING
                notifications.id,
                notifications.kind,
                notifications.recipient,
                notifications.payload,
                notifications.attempts,
                notifications.last_error,
                notifications.locked_until,
                notifications.sent_at,
                notifications.created_at
            "#,
        )
        .bind(limit)
        .bind(self.max_attempts)
        .bind(lease_until)
        .fetch_all(&self.db)
        .await?;

        if !notifications.is_empty() {
            tracing::debug!(count = notifications.len(), "Claimed notifications");
        }

        Ok(notifications)
    }

    async fn mark_sent(&self, id: Uuid) -> Result<(), QueueError> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET
                sent_at = NOW(),
                locked_until = NULL,
                last_error = NULL,
                attempts = attempts + 1,
                payload = payload - 'token'
            WHERE id = $1 AND sent_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(QueueError::NotificationNotFound(id));
        }

        Ok(())
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        error: &str,
        retry_at: DateTime<Utc>,
    ) -> Result<(), QueueError> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET
                attempts = attempts + 1,
                last_error = $2,
                locked_until = $3
            WHERE id = $1 AND sent_at IS NULL
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(retry_at)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(QueueError::NotificationNotFound(id));
        }

        Ok(())
    }

    async fn abandon(&self, id: Uuid, error: &str) -> Result<(), QueueError> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET
                attempts = GREATEST(attempts + 1, $3),
                last_error = $2,
                locked_until = NULL
            WHERE id = $1 AND sent_at IS NULL
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(self.max_attempts)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(QueueError::NotificationNotFound(id));
        }

        tracing::warn!(notification_id = %id, error = %error, "Notification abandoned");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delay_doubles_then_caps() {
        assert_eq!(retry_delay(1), Duration::seconds(30));
        assert_eq!(retry_delay(2), Duration::seconds(60));
        assert_eq!(retry_delay(4), Duration::seconds(240));
        assert_eq!(retry_delay(8), Duration::hours(1));
        assert_eq!(retry_delay(50), Duration::hours(1));
        assert_eq!(retry_delay(0), Duration::seconds(30));
    }
}
