//! # Boards Mailer
//!
//! Background process delivering queued notifications (signup links,
//! invitations, password resets, collaborator requests). Several instances
//! may run against the same database.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/boards cargo run -p boards-mailer
//! ```

use boards_mailer::{
    adapters::{LogMailer, Mailer, RelayMailer},
    compose::Composer,
    config::MailerConfig,
    orchestrator::{Dispatcher, DispatcherConfig},
    queue::NotificationQueue,
};
use boards_shared::db::pool::{close_pool, create_pool, DatabaseConfig};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "boards_mailer=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Boards Mailer v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = MailerConfig::from_env()?;

    let mailer: Arc<dyn Mailer> = match &config.relay_url {
        Some(url) => Arc::new(RelayMailer::new(url.clone(), config.relay_token.clone())?),
        None => {
            tracing::warn!("MAILER_RELAY_URL not set; emails will only be logged");
            Arc::new(LogMailer::new())
        }
    };
    let composer = Composer::new(config.from.clone(), &config.app_base_url)?;

    let pool = create_pool(DatabaseConfig::new(config.database_url.clone()).with_max_connections(2))
        .await?;

    let dispatcher = Dispatcher::new(
        Arc::new(NotificationQueue::new(pool.clone(), config.max_attempts)),
        mailer,
        composer,
        DispatcherConfig {
            poll_interval_secs: config.poll_interval_secs,
            batch_size: config.batch_size,
            max_attempts: config.max_attempts,
        },
    );

    let shutdown_token = dispatcher.shutdown_token();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown signal received, finishing current batch...");
                shutdown_token.cancel();
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
        }
    });

    dispatcher.run().await;

    close_pool(pool).await;
    Ok(())
}
