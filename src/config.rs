//! Record store configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_NOTIFY_CHANNEL: &str = "message_inserts";
pub const DEFAULT_SUBSCRIBE_BUFFER: usize = 256;

/// Errors produced while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("missing required env var {0}")]
    Missing(&'static str),

    /// An environment variable is set but unusable.
    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub notify_channel: String,
    pub subscribe_buffer: usize,
}

impl StoreConfig {
    /// Build typed store config from environment variables.
    ///
    /// Required:
    /// - `DATABASE_URL`
    ///
    /// Optional:
    /// - `DB_MAX_CONNECTIONS`: default 5, minimum 1
    /// - `MESSAGES_NOTIFY_CHANNEL`: default `message_inserts`
    /// - `SUBSCRIBE_BUFFER`: default 256, minimum 1
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is unset or the notify channel is
    /// not a plain identifier.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
        let notify_channel =
            std::env::var("MESSAGES_NOTIFY_CHANNEL").unwrap_or_else(|_| DEFAULT_NOTIFY_CHANNEL.to_string());
        validate_identifier("MESSAGES_NOTIFY_CHANNEL", &notify_channel)?;

        Ok(Self {
            database_url,
            max_connections: env_parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS).max(1),
            notify_channel,
            subscribe_buffer: env_parse("SUBSCRIBE_BUFFER", DEFAULT_SUBSCRIBE_BUFFER).max(1),
        })
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn validate_identifier(var: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Invalid { var, reason: "must not be empty".into() });
    }
    if let Some(bad) = value.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(ConfigError::Invalid { var, reason: format!("unexpected character {bad:?}") });
    }
    Ok(())
}
