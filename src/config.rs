use cron::Schedule;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use teloxide::types::ChatId;

use crate::engine::FactMode;

/// Twice daily at 00:00 and 12:00 UTC (7-field cron: sec min hour day month dow year).
pub const DEFAULT_BROADCAST_CRON: &str = "0 0 0,12 * * * *";

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// Invalid cron expression.
    InvalidCron { expr: String, source: cron::error::Error },
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read config file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse config file '{}': {}", path.display(), source)
            }
            Self::InvalidCron { expr, source } => {
                write!(f, "invalid cron expression '{}': {}", expr, source)
            }
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            Self::InvalidCron { source, .. } => Some(source),
            Self::Validation(_) => None,
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    telegram_bot_token: String,
    openai_api_key: String,
    /// Comma-delimited chat IDs the scheduled broadcast posts to
    /// (e.g. "-1001234,-1005678"). Empty disables the broadcast.
    #[serde(default)]
    broadcast_chat_ids: String,
    /// 7-field cron expression for the broadcast schedule.
    broadcast_cron: Option<String>,
    /// Fact acquisition mode: "unique", "quick", "sourced-batch" or
    /// "sourced-single".
    mode: Option<String>,
    /// Directory for state files (logs, fact history). Defaults to current
    /// directory.
    data_dir: Option<String>,
}

pub struct Config {
    pub telegram_bot_token: String,
    pub openai_api_key: String,
    /// Chats the scheduled broadcast posts to.
    pub broadcast_chats: Vec<ChatId>,
    pub broadcast_schedule: Schedule,
    pub mode: FactMode,
    /// Directory for state files (logs, fact history).
    pub data_dir: PathBuf,
    /// Location of the fact history document.
    pub history_path: PathBuf,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config_path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| ConfigError::ReadFile { path: config_path.clone(), source: e })?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseJson { path: config_path.clone(), source: e })?;

        // Validate required fields
        if file.telegram_bot_token.is_empty() {
            return Err(ConfigError::Validation("telegram_bot_token is required".into()));
        }
        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = file.telegram_bot_token.split(':').collect();
        if token_parts.len() != 2 || token_parts[0].parse::<u64>().is_err() || token_parts[1].is_empty() {
            return Err(ConfigError::Validation(
                "telegram_bot_token appears invalid (expected format: 123456789:ABCdefGHI...)".into()
            ));
        }
        if file.openai_api_key.is_empty() {
            return Err(ConfigError::Validation("openai_api_key is required".into()));
        }

        let broadcast_chats = file
            .broadcast_chat_ids
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<i64>().map(ChatId).map_err(|_| {
                    ConfigError::Validation(format!("invalid chat id '{s}' in broadcast_chat_ids"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let cron_expr = file
            .broadcast_cron
            .unwrap_or_else(|| DEFAULT_BROADCAST_CRON.to_string());
        let broadcast_schedule = Schedule::from_str(&cron_expr)
            .map_err(|e| ConfigError::InvalidCron { expr: cron_expr.clone(), source: e })?;

        let mode = match file.mode {
            Some(m) => m.parse::<FactMode>().map_err(ConfigError::Validation)?,
            None => FactMode::Unique,
        };

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let history_path = data_dir.join("facts.json");

        Ok(Self {
            telegram_bot_token: file.telegram_bot_token,
            openai_api_key: file.openai_api_key,
            broadcast_chats,
            broadcast_schedule,
            mode,
            data_dir,
            history_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn assert_err<T>(result: Result<T, ConfigError>) -> ConfigError {
        match result {
            Ok(_) => panic!("expected error, got Ok"),
            Err(e) => e,
        }
    }

    #[test]
    fn test_valid_config_with_defaults() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdefGHIjklMNOpqrsTUVwxyz",
            "openai_api_key": "sk-test"
        }"#);
        let config = Config::load(file.path()).expect("should load valid config");
        assert_eq!(config.mode, FactMode::Unique);
        assert!(config.broadcast_chats.is_empty());
        assert_eq!(config.history_path, PathBuf::from("./facts.json"));
    }

    #[test]
    fn test_broadcast_chat_ids_split_on_comma() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "openai_api_key": "sk-test",
            "broadcast_chat_ids": "-1001234, -1005678"
        }"#);
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.broadcast_chats, vec![ChatId(-1001234), ChatId(-1005678)]);
    }

    #[test]
    fn test_invalid_broadcast_chat_id() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "openai_api_key": "sk-test",
            "broadcast_chat_ids": "-1001234,oops"
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("oops"));
    }

    #[test]
    fn test_mode_selection() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "openai_api_key": "sk-test",
            "mode": "sourced-batch"
        }"#);
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.mode, FactMode::SourcedBatch);
    }

    #[test]
    fn test_unknown_mode() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "openai_api_key": "sk-test",
            "mode": "telepathy"
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("telepathy"));
    }

    #[test]
    fn test_invalid_cron() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "openai_api_key": "sk-test",
            "broadcast_cron": "not a schedule"
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::InvalidCron { .. }));
    }

    #[test]
    fn test_empty_token() {
        let file = write_config(r#"{
            "telegram_bot_token": "",
            "openai_api_key": "sk-test"
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("telegram_bot_token"));
    }

    #[test]
    fn test_invalid_token_format() {
        for token in ["no_colon_here", "notanumber:ABCdef", "123456789:"] {
            let file = write_config(&format!(
                r#"{{"telegram_bot_token": "{token}", "openai_api_key": "sk-test"}}"#
            ));
            let err = assert_err(Config::load(file.path()));
            assert!(matches!(err, ConfigError::Validation(_)), "token: {token}");
        }
    }

    #[test]
    fn test_empty_api_key() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "openai_api_key": ""
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("openai_api_key"));
    }

    #[test]
    fn test_file_not_found() {
        let err = assert_err(Config::load("/nonexistent/path/config.json"));
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_invalid_json() {
        let file = write_config("{ invalid json }");
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::ParseJson { .. }));
    }
}
