//! Environment-driven service configuration.

use std::env;
use std::path::PathBuf;

use crate::messages::DEFAULT_TRIGGER_WORD;
use crate::sink::discord::DEFAULT_API_BASE as DISCORD_API_BASE;
use crate::store::github::DEFAULT_API_BASE as GITHUB_API_BASE;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_COUNTER_FILE: &str = "events.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("environment variable {0} is not a valid {1}")]
    InvalidVar(&'static str, &'static str),
    #[error("remote store is half-configured: set all of GITHUB_TOKEN, GITHUB_OWNER, GITHUB_REPO, GITHUB_FILE_PATH or none")]
    PartialRemoteStore,
}

/// Remote counter backend settings; present only when fully configured.
#[derive(Debug, Clone)]
pub struct RemoteStoreConfig {
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub file_path: String,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub discord_bot_token: String,
    /// Own bot user id, filtered in addition to the author-is-bot flag.
    pub discord_bot_user_id: Option<u64>,
    pub discord_api_base: String,
    pub trigger_word: String,
    /// Role gate is enabled exactly when this is set.
    pub required_role_id: Option<u64>,
    pub counter_file: PathBuf,
    pub remote_store: Option<RemoteStoreConfig>,
    pub webhook_url: Option<String>,
    pub announce_channel_id: Option<u64>,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let discord_bot_token =
            env_non_empty("DISCORD_BOT_TOKEN").ok_or(ConfigError::MissingVar("DISCORD_BOT_TOKEN"))?;
        let discord_bot_user_id = env_parsed("DISCORD_BOT_USER_ID")?;
        let discord_api_base =
            env_non_empty("DISCORD_API_BASE_URL").unwrap_or_else(|| DISCORD_API_BASE.to_string());

        let host = env_non_empty("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = env_parsed::<u16>("PORT")?.unwrap_or(DEFAULT_PORT);

        let trigger_word =
            env_non_empty("TRIGGER_WORD").unwrap_or_else(|| DEFAULT_TRIGGER_WORD.to_string());
        let required_role_id = env_parsed("REQUIRED_ROLE_ID")?;

        let counter_file = PathBuf::from(
            env_non_empty("COUNTER_FILE").unwrap_or_else(|| DEFAULT_COUNTER_FILE.to_string()),
        );
        let remote_store = remote_store_from_env()?;

        let webhook_url = env_non_empty("WEBHOOK_URL");
        let announce_channel_id = env_parsed("DISCORD_ANNOUNCE_CHANNEL_ID")?;

        Ok(Self {
            host,
            port,
            discord_bot_token,
            discord_bot_user_id,
            discord_api_base,
            trigger_word,
            required_role_id,
            counter_file,
            remote_store,
            webhook_url,
            announce_channel_id,
        })
    }
}

fn remote_store_from_env() -> Result<Option<RemoteStoreConfig>, ConfigError> {
    let token = env_non_empty("GITHUB_TOKEN");
    let owner = env_non_empty("GITHUB_OWNER");
    let repo = env_non_empty("GITHUB_REPO");
    let file_path = env_non_empty("GITHUB_FILE_PATH");

    match (token, owner, repo, file_path) {
        (Some(token), Some(owner), Some(repo), Some(file_path)) => Ok(Some(RemoteStoreConfig {
            token,
            owner,
            repo,
            file_path,
            api_base: env_non_empty("GITHUB_API_BASE_URL")
                .unwrap_or_else(|| GITHUB_API_BASE.to_string()),
        })),
        (None, None, None, None) => Ok(None),
        _ => Err(ConfigError::PartialRemoteStore),
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env_non_empty(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidVar(key, std::any::type_name::<T>())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: &str) -> Self {
            let previous = env::var(key).ok();
            env::set_var(key, value);
            Self { key, previous }
        }

        fn unset(key: &'static str) -> Self {
            let previous = env::var(key).ok();
            env::remove_var(key);
            Self { key, previous }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.previous {
                Some(value) => env::set_var(self.key, value),
                None => env::remove_var(self.key),
            }
        }
    }

    fn clear_optional_vars() -> Vec<EnvGuard> {
        [
            "DISCORD_BOT_USER_ID",
            "DISCORD_API_BASE_URL",
            "HOST",
            "PORT",
            "TRIGGER_WORD",
            "REQUIRED_ROLE_ID",
            "COUNTER_FILE",
            "GITHUB_TOKEN",
            "GITHUB_OWNER",
            "GITHUB_REPO",
            "GITHUB_FILE_PATH",
            "GITHUB_API_BASE_URL",
            "WEBHOOK_URL",
            "DISCORD_ANNOUNCE_CHANNEL_ID",
        ]
        .into_iter()
        .map(EnvGuard::unset)
        .collect()
    }

    #[test]
    #[serial]
    fn defaults_apply_when_only_token_is_set() {
        let _cleared = clear_optional_vars();
        let _token = EnvGuard::set("DISCORD_BOT_TOKEN", "bot-token");

        let config = ServiceConfig::from_env().unwrap();
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.trigger_word, DEFAULT_TRIGGER_WORD);
        assert_eq!(config.counter_file, PathBuf::from(DEFAULT_COUNTER_FILE));
        assert!(config.remote_store.is_none());
        assert!(config.webhook_url.is_none());
        assert!(config.required_role_id.is_none());
    }

    #[test]
    #[serial]
    fn missing_bot_token_is_an_error() {
        let _cleared = clear_optional_vars();
        let _token = EnvGuard::unset("DISCORD_BOT_TOKEN");

        let err = ServiceConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("DISCORD_BOT_TOKEN")));
    }

    #[test]
    #[serial]
    fn full_github_quadruple_selects_remote_store() {
        let _cleared = clear_optional_vars();
        let _token = EnvGuard::set("DISCORD_BOT_TOKEN", "bot-token");
        let _g1 = EnvGuard::set("GITHUB_TOKEN", "ghp");
        let _g2 = EnvGuard::set("GITHUB_OWNER", "acme");
        let _g3 = EnvGuard::set("GITHUB_REPO", "counter");
        let _g4 = EnvGuard::set("GITHUB_FILE_PATH", "events.json");

        let config = ServiceConfig::from_env().unwrap();
        let remote = config.remote_store.expect("remote store");
        assert_eq!(remote.owner, "acme");
        assert_eq!(remote.api_base, GITHUB_API_BASE);
    }

    #[test]
    #[serial]
    fn partial_github_configuration_is_rejected() {
        let _cleared = clear_optional_vars();
        let _token = EnvGuard::set("DISCORD_BOT_TOKEN", "bot-token");
        let _g1 = EnvGuard::set("GITHUB_TOKEN", "ghp");

        let err = ServiceConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::PartialRemoteStore));
    }

    #[test]
    #[serial]
    fn unparseable_numeric_var_is_rejected() {
        let _cleared = clear_optional_vars();
        let _token = EnvGuard::set("DISCORD_BOT_TOKEN", "bot-token");
        let _role = EnvGuard::set("REQUIRED_ROLE_ID", "not-a-number");

        let err = ServiceConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar("REQUIRED_ROLE_ID", _)));
    }

    #[test]
    #[serial]
    fn overrides_take_precedence() {
        let _cleared = clear_optional_vars();
        let _token = EnvGuard::set("DISCORD_BOT_TOKEN", "bot-token");
        let _port = EnvGuard::set("PORT", "8080");
        let _word = EnvGuard::set("TRIGGER_WORD", "別のトリガー");
        let _hook = EnvGuard::set("WEBHOOK_URL", "https://example.test/hook");

        let config = ServiceConfig::from_env().unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.trigger_word, "別のトリガー");
        assert_eq!(
            config.webhook_url.as_deref(),
            Some("https://example.test/hook")
        );
    }
}
