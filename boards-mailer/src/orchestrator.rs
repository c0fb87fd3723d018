/// Mail dispatcher
///
/// Main mailer loop: claims due notifications, composes them and hands them
/// to the configured [`Mailer`], then records the outcome on the outbox row.
///
/// ```text
/// Dispatcher
///   ├─> Outbox: claim a batch (leased)
///   ├─> Composer: notification -> email
///   ├─> Mailer: deliver
///   └─> Outbox: mark sent / failed / abandoned
/// ```
///
/// # Failure handling
///
/// - retryable delivery errors: the row is due again after [`retry_delay`]
/// - bad payloads and permanent relay rejections: the row is abandoned
/// - outbox errors: logged, the loop keeps polling
///
/// # Example
///
/// ```no_run
/// use boards_mailer::adapters::LogMailer;
/// use boards_mailer::compose::Composer;
/// use boards_mailer::orchestrator::{Dispatcher, DispatcherConfig};
/// use boards_mailer::queue::NotificationQueue;
/// use sqlx::PgPool;
/// use std::sync::Arc;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let dispatcher = Dispatcher::new(
///     Arc::new(NotificationQueue::new(pool, 5)),
///     Arc::new(LogMailer::new()),
///     Composer::new("Boards <no-reply@localhost>", "http://localhost:3000")?,
///     DispatcherConfig::default(),
/// );
///
/// dispatcher.run().await;
/// # Ok(())
/// # }
/// ```

use crate::adapters::Mailer;
use crate::compose::Composer;
use crate::queue::{retry_delay, Outbox};
use boards_shared::models::notification::Notification;
use chrono::Utc;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Idle wait between polls, in seconds
    pub poll_interval_secs: u64,

    /// Notifications claimed per poll
    pub batch_size: i64,

    /// Deliveries tried before a notification is abandoned
    pub max_attempts: i32,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        DispatcherConfig {
            poll_interval_secs: 5,
            batch_size: 20,
            max_attempts: 5,
        }
    }
}

/// What happened to one claimed notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Sent,
    Retrying,
    Abandoned,
}

/// Counts of one batch
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub sent: usize,
    pub retrying: usize,
    pub abandoned: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.sent + self.retrying + self.abandoned
    }

    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Sent => self.sent += 1,
            Outcome::Retrying => self.retrying += 1,
            Outcome::Abandoned => self.abandoned += 1,
        }
    }
}

pub struct Dispatcher {
    outbox: Arc<dyn Outbox>,
    mailer: Arc<dyn Mailer>,
    composer: Composer,
    config: DispatcherConfig,
    shutdown_token: CancellationToken,
}

impl Dispatcher {
    pub fn new(
        outbox: Arc<dyn Outbox>,
        mailer: Arc<dyn Mailer>,
        composer: Composer,
        config: DispatcherConfig,
    ) -> Self {
        Dispatcher {
            outbox,
            mailer,
            composer,
            config,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Gets shutdown token
    ///
    /// Cancelling it stops the loop after the batch in flight.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Runs the dispatch loop until shutdown
    ///
    /// A full batch is followed immediately by the next poll; a partial or
    /// empty one waits `poll_interval_secs`.
    pub async fn run(&self) {
        tracing::info!(mailer = %self.mailer.name(), "Mail dispatcher starting");

        let poll_interval = Duration::from_secs(self.config.poll_interval_secs);

        while !self.shutdown_token.is_cancelled() {
            let report = match self.run_once().await {
                Ok(report) => report,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to claim notifications");
                    BatchReport::default()
                }
            };

            if report.total() as i64 >= self.config.batch_size {
                continue;
            }

            tokio::select! {
                _ = self.shutdown_token.cancelled() => break,
                _ = sleep(poll_interval) => {}
            }
        }

        tracing::info!("Mail dispatcher shut down");
    }

    /// Claims and processes one batch
    ///
    /// # Errors
    ///
    /// Returns an error only if the claim itself fails; per-notification
    /// failures are recorded on the rows.
    pub async fn run_once(&self) -> Result<BatchReport, crate::queue::QueueError> {
        let notifications = self.outbox.claim(self.config.batch_size).await?;

        let mut report = BatchReport::default();
        for notification in notifications {
            report.record(self.deliver(notification).await);
        }

        if report.total() > 0 {
            tracing::info!(
                sent = report.sent,
                retrying = report.retrying,
                abandoned = report.abandoned,
                "Processed notification batch"
            );
        }

        Ok(report)
    }

    async fn deliver(&self, notification: Notification) -> Outcome {
        let id = notification.id;
        let kind = notification.kind.as_str();

        let result = match self.composer.compose(&notification) {
            Ok(email) => self.mailer.send(&email).await,
            Err(e) => Err(e),
        };

        let (outcome, recorded) = match result {
            Ok(()) => {
                tracing::info!(notification_id = %id, kind, "Notification sent");
                (Outcome::Sent, self.outbox.mark_sent(id).await)
            }
            Err(e) => {
                let attempts = notification.attempts + 1;
                let message = e.to_string();

                if e.is_retryable() && attempts < self.config.max_attempts {
                    let retry_at = Utc::now() + retry_delay(attempts);
                    tracing::warn!(
                        notification_id = %id,
                        kind,
                        attempts,
                        error = %message,
                        "Notification delivery failed, will retry"
                    );
                    (
                        Outcome::Retrying,
                        self.outbox.mark_failed(id, &message, retry_at).await,
                    )
                } else {
                    tracing::error!(
                        notification_id = %id,
                        kind,
                        attempts,
                        error = %message,
                        "Notification delivery failed permanently"
                    );
                    (Outcome::Abandoned, self.outbox.abandon(id, &message).await)
                }
            }
        };

        if let Err(e) = recorded {
            tracing::error!(notification_id = %id, error = %e, "Failed to record notification outcome");
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{Email, MailerError, MailerResult};
    use crate::queue::QueueError;
    use async_trait::async_trait;
    use boards_shared::models::notification::NotificationKind;
    use chrono::DateTime;
    use serde_json::json;
    use tokio::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct FakeOutbox {
        rows: Mutex<Vec<Notification>>,
    }

    impl FakeOutbox {
        async fn push(&self, kind: NotificationKind, payload: serde_json::Value) -> Uuid {
            let notification = Notification {
                id: Uuid::new_v4(),
                kind,
                recipient: "juan@example.com".to_string(),
                payload,
                attempts: 0,
                last_error: None,
                locked_until: None,
                sent_at: None,
                created_at: Utc::now(),
            };
            let id = notification.id;
            self.rows.lock().await.push(notification);
            id
        }

        async fn get(&self, id: Uuid) -> Notification {
            self.rows
                .lock()
                .await
                .iter()
                .find(|n| n.id == id)
                .cloned()
                .unwrap()
        }
    }

    #[async_trait]
    impl Outbox for FakeOutbox {
        async fn claim(&self, limit: i64) -> Result<Vec<Notification>, QueueError> {
            let now = Utc::now();
            let mut rows = self.rows.lock().await;
            let claimed: Vec<Notification> = rows
                .iter_mut()
                .filter(|n| n.sent_at.is_none() && n.attempts < 5)
                .filter(|n| n.locked_until.map_or(true, |until| until < now))
                .take(limit as usize)
                .map(|n| {
                    n.locked_until = Some(now + chrono::Duration::minutes(5));
                    n.clone()
                })
                .collect();
            Ok(claimed)
        }

        async fn mark_sent(&self, id: Uuid) -> Result<(), QueueError> {
            let mut rows = self.rows.lock().await;
            let row = rows.iter_mut().find(|n| n.id == id).unwrap();
            row.sent_at = Some(Utc::now());
            row.attempts += 1;
            row.locked_until = None;
            if let Some(payload) = row.payload.as_object_mut() {
                payload.remove("token");
            }
            Ok(())
        }

        async fn mark_failed(
            &self,
            id: Uuid,
            error: &str,
            retry_at: DateTime<Utc>,
        ) -> Result<(), QueueError> {
            let mut rows = self.rows.lock().await;
            let row = rows.iter_mut().find(|n| n.id == id).unwrap();
            row.attempts += 1;
            row.last_error = Some(error.to_string());
            row.locked_until = Some(retry_at);
            Ok(())
        }

        async fn abandon(&self, id: Uuid, error: &str) -> Result<(), QueueError> {
            let mut rows = self.rows.lock().await;
            let row = rows.iter_mut().find(|n| n.id == id).unwrap();
            row.attempts = row.attempts.max(5);
            row.last_error = Some(error.to_string());
            row.locked_until = None;
            Ok(())
        }
    }

    /// Records sent emails; fails with `error` while it is set
    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<Email>>,
        error: Mutex<Option<u16>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send(&self, email: &Email) -> MailerResult<()> {
            if let Some(status) = *self.error.lock().await {
                return Err(MailerError::Rejected {
                    status,
                    body: "nope".to_string(),
                });
            }
            self.sent.lock().await.push(email.clone());
            Ok(())
        }
    }

    fn dispatcher(outbox: Arc<FakeOutbox>, mailer: Arc<RecordingMailer>) -> Dispatcher {
        Dispatcher::new(
            outbox,
            mailer,
            Composer::new("Boards <no-reply@localhost>", "http://localhost:3000").unwrap(),
            DispatcherConfig::default(),
        )
    }

    #[test]
    fn test_dispatcher_config_default() {
        let config = DispatcherConfig::default();
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.batch_size, 20);
        assert_eq!(config.max_attempts, 5);
    }

    #[tokio::test]
    async fn test_sent_notification_is_delivered_once() {
        let outbox = Arc::new(FakeOutbox::default());
        let mailer = Arc::new(RecordingMailer::default());
        let id = outbox
            .push(NotificationKind::SignupRequest, json!({ "token": "sr_1" }))
            .await;

        let dispatcher = dispatcher(outbox.clone(), mailer.clone());
        let report = dispatcher.run_once().await.unwrap();
        assert_eq!(report.sent, 1);

        let report = dispatcher.run_once().await.unwrap();
        assert_eq!(report.total(), 0);

        assert_eq!(mailer.sent.lock().await.len(), 1);
        let row = outbox.get(id).await;
        assert!(row.sent_at.is_some());
        assert!(row.payload.get("token").is_none());
    }

    #[tokio::test]
    async fn test_server_error_is_retried_later() {
        let outbox = Arc::new(FakeOutbox::default());
        let mailer = Arc::new(RecordingMailer::default());
        *mailer.error.lock().await = Some(503);
        let id = outbox
            .push(NotificationKind::PasswordReset, json!({ "username": "juan", "token": "pr_1" }))
            .await;

        let report = dispatcher(outbox.clone(), mailer.clone()).run_once().await.unwrap();
        assert_eq!(report.retrying, 1);

        let row = outbox.get(id).await;
        assert_eq!(row.attempts, 1);
        assert!(row.sent_at.is_none());
        assert!(row.locked_until.unwrap() > Utc::now());
        assert!(row.last_error.unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_bad_payload_is_abandoned() {
        let outbox = Arc::new(FakeOutbox::default());
        let mailer = Arc::new(RecordingMailer::default());
        let id = outbox.push(NotificationKind::Invitation, json!({})).await;

        let report = dispatcher(outbox.clone(), mailer.clone()).run_once().await.unwrap();
        assert_eq!(report.abandoned, 1);
        assert!(mailer.sent.lock().await.is_empty());
        assert_eq!(outbox.get(id).await.attempts, 5);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let outbox = Arc::new(FakeOutbox::default());
        let mailer = Arc::new(RecordingMailer::default());
        outbox
            .push(NotificationKind::SignupRequest, json!({ "token": "sr_1" }))
            .await;

        let dispatcher = Arc::new(dispatcher(outbox, mailer.clone()));
        let token = dispatcher.shutdown_token();
        let handle = tokio::spawn({
            let dispatcher = dispatcher.clone();
            async move { dispatcher.run().await }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(mailer.sent.lock().await.len(), 1);
    }
}
