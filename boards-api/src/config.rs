/// Configuration management for the API server
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGINS`: Comma separated origins, `*` for any (default: *)
/// - `API_PRODUCTION`: Enables HSTS (default: false)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Secret key for session tokens (required, 32+ chars)
/// - `JWT_EXPIRATION_HOURS`: Session token lifetime (default: 24)
/// - `ALLOW_OPEN_SIGNUP`: Accept signups without a token (default: false)
/// - `SIGNUP_REQUEST_TTL_HOURS`: default 168
/// - `INVITED_USER_TTL_HOURS`: default 720
/// - `PASSWORD_RESET_TTL_HOURS`: default 24
///
/// # Example
///
/// ```no_run
/// use boards_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use boards_shared::auth::tokens::TokenPolicy;
use boards_shared::services::ServiceSettings;
use serde::{Deserialize, Serialize};
use std::{env, str::FromStr};

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub signup: SignupConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Served behind HTTPS
    pub production: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for session token signing
    ///
    /// Must be at least 32 bytes. Generate with: `openssl rand -hex 32`
    pub secret: String,

    pub expiration_hours: i64,
}

/// Signup and emailed token settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupConfig {
    pub allow_open_signup: bool,
    pub signup_request_ttl_hours: i64,
    pub invited_user_ttl_hours: i64,
    pub password_reset_ttl_hours: i64,
}

impl Default for SignupConfig {
    fn default() -> Self {
        Self {
            allow_open_signup: false,
            signup_request_ttl_hours: 168,
            invited_user_ttl_hours: 720,
            password_reset_ttl_hours: 24,
        }
    }
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

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value does not
    /// parse.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        Ok(Self {
            api: ApiConfig {
                host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env_or("API_PORT", "8080")?,
                cors_origins: parse_origins(
                    &env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()),
                ),
                production: env_or("API_PRODUCTION", "false")?,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: env_or("DATABASE_MAX_CONNECTIONS", "10")?,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expiration_hours: env_or("JWT_EXPIRATION_HOURS", "24")?,
            },
            signup: SignupConfig {
                allow_open_signup: env_or("ALLOW_OPEN_SIGNUP", "false")?,
                signup_request_ttl_hours: env_or("SIGNUP_REQUEST_TTL_HOURS", "168")?,
                invited_user_ttl_hours: env_or("INVITED_USER_TTL_HOURS", "720")?,
                password_reset_ttl_hours: env_or("PASSWORD_RESET_TTL_HOURS", "24")?,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn token_policy(&self) -> TokenPolicy {
        TokenPolicy {
            signup_request_ttl: chrono::Duration::hours(self.signup.signup_request_ttl_hours),
            invited_user_ttl: chrono::Duration::hours(self.signup.invited_user_ttl_hours),
            password_reset_ttl: chrono::Duration::hours(self.signup.password_reset_ttl_hours),
        }
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            allow_open_signup: self.signup.allow_open_signup,
        }
    }

    pub fn session_lifetime(&self) -> chrono::Duration {
        chrono::Duration::hours(self.jwt.expiration_hours)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.api.cors_origins.iter().any(|origin| origin == "*")
    }
}
