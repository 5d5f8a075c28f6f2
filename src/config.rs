//! Runtime configuration.
//!
//! Read from environment variables:
//! - `BOT_TOKEN` - Telegram bot token (required to talk to Telegram)
//! - `CHAT_ID` - Household group chat for reminders and the daily digest
//! - `CHORE_BOT_DB` - SQLite database path (default: platform data dir)
//! - `DIGEST_HOUR_UTC` - Hour (0-23, UTC) the daily digest is sent (default: 0)
//! - `WEBHOOK_SECRET` - Secret token Telegram must echo on webhook calls
//! - `TELEGRAM_API_URL` - Bot API base URL (default: `https://api.telegram.org`)

use std::path::PathBuf;

use crate::error::ConfigError;

/// Default Bot API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: Option<String>,
    pub chat_id: Option<i64>,
    pub db_path: Option<PathBuf>,
    pub digest_hour_utc: u32,
    pub webhook_secret: Option<String>,
    pub api_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            db_path: None,
            digest_hour_utc: 0,
            webhook_secret: None,
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let chat_id = match get("CHAT_ID") {
            Some(raw) => Some(raw.parse::<i64>().map_err(|_| ConfigError::Invalid {
                var: "CHAT_ID",
                value: raw,
            })?),
            None => None,
        };

        let digest_hour_utc = match get("DIGEST_HOUR_UTC") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(hour) if hour < 24 => hour,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "DIGEST_HOUR_UTC",
                        value: raw,
                    })
                }
            },
            None => 0,
        };

        Ok(Self {
            bot_token: get("BOT_TOKEN"),
            chat_id,
            db_path: get("CHORE_BOT_DB").map(PathBuf::from),
            digest_hour_utc,
            webhook_secret: get("WEBHOOK_SECRET"),
            api_url: get("TELEGRAM_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        })
    }

    pub fn require_token(&self) -> Result<&str, ConfigError> {
        self.bot_token
            .as_deref()
            .ok_or(ConfigError::Missing("BOT_TOKEN"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = load(&[]).unwrap();
        assert!(config.bot_token.is_none());
        assert!(config.chat_id.is_none());
        assert_eq!(config.digest_hour_utc, 0);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(matches!(
            config.require_token(),
            Err(ConfigError::Missing("BOT_TOKEN"))
        ));
    }

    #[test]
    fn reads_all_values() {
        let config = load(&[
            ("BOT_TOKEN", "123:abc"),
            ("CHAT_ID", "-5144431873"),
            ("CHORE_BOT_DB", "/tmp/chores.db"),
            ("DIGEST_HOUR_UTC", "7"),
            ("WEBHOOK_SECRET", "s3cret"),
        ])
        .unwrap();

        assert_eq!(config.require_token().unwrap(), "123:abc");
        assert_eq!(config.chat_id, Some(-5144431873));
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/chores.db")));
        assert_eq!(config.digest_hour_utc, 7);
        assert_eq!(config.webhook_secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn blank_values_are_unset() {
        let config = load(&[("CHAT_ID", "  "), ("BOT_TOKEN", "")]).unwrap();
        assert!(config.chat_id.is_none());
        assert!(config.bot_token.is_none());
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(matches!(
            load(&[("CHAT_ID", "household")]),
            Err(ConfigError::Invalid { var: "CHAT_ID", .. })
        ));
        assert!(matches!(
            load(&[("DIGEST_HOUR_UTC", "24")]),
            Err(ConfigError::Invalid { var: "DIGEST_HOUR_UTC", .. })
        ));
    }
}
