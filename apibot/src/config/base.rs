//! Base config: Telegram connection, logging, command prefix and HTTP settings. Loaded from env.

use std::env;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::http::HttpConfig;

/// Process-level settings. Command bindings live in the file named by `commands_config`.
#[derive(Debug, Clone)]
pub struct BaseConfig {
    /// BOT_TOKEN; only `run` requires it.
    pub bot_token: Option<String>,
    /// TELEGRAM_API_URL or TELOXIDE_API_URL
    pub telegram_api_url: Option<String>,
    /// LOG_FILE
    pub log_file: String,
    /// COMMANDS_CONFIG
    pub commands_config: PathBuf,
    /// COMMAND_PREFIX
    pub command_prefix: String,
    /// HTTP_TIMEOUT_SECS, HTTP_USER_AGENT, HTTP_MAX_BODY_BYTES
    pub http: HttpConfig,
}

impl BaseConfig {
    /// Load from environment variables. `token` overrides BOT_TOKEN if provided.
    pub fn load(token: Option<String>) -> Result<Self, ConfigError> {
        let bot_token = token
            .or_else(|| env::var("BOT_TOKEN").ok())
            .filter(|t| !t.trim().is_empty());
        let telegram_api_url = env::var("TELEGRAM_API_URL")
            .or_else(|_| env::var("TELOXIDE_API_URL"))
            .ok();
        let log_file = env::var("LOG_FILE").unwrap_or_else(|_| "logs/apibot.log".to_string());
        let commands_config = env::var("COMMANDS_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.yaml"));
        let command_prefix = env::var("COMMAND_PREFIX").unwrap_or_else(|_| ".".to_string());

        let defaults = HttpConfig::default();
        let http = HttpConfig {
            timeout_secs: parse_env("HTTP_TIMEOUT_SECS")?.unwrap_or(defaults.timeout_secs),
            user_agent: env::var("HTTP_USER_AGENT").unwrap_or(defaults.user_agent),
            max_body_bytes: parse_env("HTTP_MAX_BODY_BYTES")?.unwrap_or(defaults.max_body_bytes),
        };

        Ok(Self {
            bot_token,
            telegram_api_url,
            log_file,
            commands_config,
            command_prefix,
            http,
        })
    }

    /// Validate config (telegram_api_url must be a valid URL if set, prefix and timeout non-empty).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref url_str) = self.telegram_api_url {
            if reqwest::Url::parse(url_str).is_err() {
                return Err(ConfigError::Env(format!(
                    "TELEGRAM_API_URL (or TELOXIDE_API_URL) is set but not a valid URL: {url_str}"
                )));
            }
        }
        if self.command_prefix.is_empty() || self.command_prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::Env(format!(
                "COMMAND_PREFIX must be non-empty without whitespace: {:?}",
                self.command_prefix
            )));
        }
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Env("HTTP_TIMEOUT_SECS must be positive".to_string()));
        }
        Ok(())
    }

    /// BOT_TOKEN, or an error naming the variable.
    pub fn require_token(&self) -> Result<&str, ConfigError> {
        self.bot_token
            .as_deref()
            .ok_or_else(|| ConfigError::Env("BOT_TOKEN not set".to_string()))
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env(format!("{name} is not a valid number: {raw}"))),
        Err(_) => Ok(None),
    }
}
