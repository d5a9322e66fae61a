use std::net::SocketAddr;

use anyhow::Context;
use secrecy::{ExposeSecret, SecretString};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub secure: bool,
    pub remember_days: i64,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub server: String,
    pub port: u16,
    pub use_tls: bool,
    pub use_ssl: bool,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub sender: String,
    pub workers: usize,
    pub queue_capacity: usize,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub base_url: String,
    pub secret_key: SecretString,
    pub reset_token_ttl_secs: i64,
    pub session: SessionConfig,
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;

        // Reset tokens are signed with this key; there is no fallback.
        let secret_key = std::env::var("SECRET_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(SecretString::from)
            .context("SECRET_KEY is not set")?;

        let session = SessionConfig {
            cookie_name: std::env::var("SESSION_COOKIE_NAME")
                .unwrap_or_else(|_| "rsu_session".into()),
            secure: env_flag("SESSION_COOKIE_SECURE")?,
            remember_days: env_parse("REMEMBER_COOKIE_DAYS")?.unwrap_or(365),
        };

        let username = std::env::var("MAIL_USERNAME").ok().filter(|v| !v.is_empty());
        let sender = std::env::var("MAIL_SENDER")
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| username.clone())
            .context("MAIL_SENDER or MAIL_USERNAME must be set")?;
        let mail = MailConfig {
            server: std::env::var("MAIL_SERVER").context("MAIL_SERVER is not set")?,
            port: env_parse("MAIL_PORT")?.context("MAIL_PORT is not set")?,
            use_tls: env_flag("MAIL_USE_TLS")?,
            use_ssl: env_flag("MAIL_USE_SSL")?,
            username,
            password: std::env::var("MAIL_PASSWORD")
                .ok()
                .filter(|v| !v.is_empty())
                .map(SecretString::from),
            sender,
            workers: env_parse("MAIL_WORKERS")?.unwrap_or(2).max(1),
            queue_capacity: env_parse("MAIL_QUEUE_CAPACITY")?.unwrap_or(64).max(1),
        };

        Ok(Self {
            database_url,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_parse("APP_PORT")?.unwrap_or(8080),
            base_url: std::env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into())
                .trim_end_matches('/')
                .to_string(),
            secret_key,
            reset_token_ttl_secs: env_parse("RESET_TOKEN_TTL_SECS")?.unwrap_or(600),
            session,
            mail,
        })
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }

    pub fn secret(&self) -> &[u8] {
        self.secret_key.expose_secret().as_bytes()
    }
}

fn env_parse<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("{key} has an invalid value")),
        _ => Ok(None),
    }
}

/// Flags are integers like `MAIL_USE_TLS=1`; anything non-zero is on.
fn env_flag(key: &str) -> anyhow::Result<bool> {
    Ok(env_parse::<i64>(key)?.map(|v| v != 0).unwrap_or(false))
}
