/// Email delivery adapters
///
/// - **Log**: writes emails to the log; the default without a relay
/// - **Relay**: posts emails to an HTTP mail relay
///
/// # Example
///
/// ```no_run
/// use boards_mailer::adapters::{LogMailer, Mailer, RelayMailer};
/// use std::sync::Arc;
///
/// # fn example(relay_url: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
/// let mailer: Arc<dyn Mailer> = match relay_url {
///     Some(url) => Arc::new(RelayMailer::new(url, None)?),
///     None => Arc::new(LogMailer::new()),
/// };
/// println!("Mailer: {}", mailer.name());
/// # Ok(())
/// # }
/// ```

pub mod log;
pub mod mailer_trait;
pub mod relay;

pub use log::LogMailer;
pub use mailer_trait::{Email, Mailer, MailerError, MailerResult};
pub use relay::RelayMailer;
