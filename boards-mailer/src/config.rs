/// Mailer configuration
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `MAILER_POLL_INTERVAL_SECS`: Idle wait between outbox polls (default: 5)
/// - `MAILER_BATCH_SIZE`: Notifications claimed per poll (default: 20)
/// - `MAILER_MAX_ATTEMPTS`: Deliveries tried before a row is abandoned (default: 5)
/// - `MAILER_FROM`: Sender address (default: `Boards <no-reply@localhost>`)
/// - `MAILER_RELAY_URL`: HTTP relay endpoint; unset logs emails instead of sending
/// - `MAILER_RELAY_TOKEN`: Bearer token for the relay
/// - `APP_BASE_URL`: Frontend origin used in email links (default: http://localhost:3000)

use std::{env, str::FromStr};

#[derive(Debug, Clone)]
pub struct MailerConfig {
    pub database_url: String,
    pub poll_interval_secs: u64,
    pub batch_size: i64,
    pub max_attempts: i32,
    pub from: String,
    pub relay_url: Option<String>,
    pub relay_token: Option<String>,
    pub app_base_url: String,
}

fn env_or<T>(name: &str, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(name).unwrap_or_else(|_| default.to_string());
    value
        .trim()
        .parse::<T>()
        .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", name, e))
}

fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl MailerConfig {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is missing or a number does not
    /// parse.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let config = Self {
            database_url,
            poll_interval_secs: env_or("MAILER_POLL_INTERVAL_SECS", "5")?,
            batch_size: env_or("MAILER_BATCH_SIZE", "20")?,
            max_attempts: env_or("MAILER_MAX_ATTEMPTS", "5")?,
            from: optional("MAILER_FROM").unwrap_or_else(|| "Boards <no-reply@localhost>".to_string()),
            relay_url: optional("MAILER_RELAY_URL"),
            relay_token: optional("MAILER_RELAY_TOKEN"),
            app_base_url: optional("APP_BASE_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
        };

        if config.batch_size < 1 {
            anyhow::bail!("MAILER_BATCH_SIZE must be at least 1");
        }
        if config.max_attempts < 1 {
            anyhow::bail!("MAILER_MAX_ATTEMPTS must be at least 1");
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_falls_back_to_default() {
        let value: u64 = env_or("BOARDS_MAILER_TEST_UNSET_VARIABLE", "7").unwrap();
        assert_eq!(value, 7);

        assert!(env_or::<u64>("BOARDS_MAILER_TEST_UNSET_VARIABLE", "seven").is_err());
    }

    #[test]
    fn test_optional_ignores_unset() {
        assert_eq!(optional("BOARDS_MAILER_TEST_UNSET_VARIABLE"), None);
    }
}
