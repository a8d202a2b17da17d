use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Locales with a message catalogue under `locales/`.
pub const SUPPORTED_LOCALES: &[&str] = &["en", "id"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML from config file at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to load config from environment: {0}")]
    Env(#[from] envy::Error),
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Deserialize, Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL of the hosting backend, without a trailing slash.
    pub api_base_url: String,
    /// Hex-encoded 32-byte key sealing the session cookie.
    pub session_key: String,

    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default)]
    pub notification_webhook_url: Option<String>,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_locale")]
    pub default_locale: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_password_reset_ttl_minutes")]
    pub password_reset_ttl_minutes: i64,

    #[serde(default = "default_plans_page_size")]
    pub plans_page_size: usize,

    #[serde(default)]
    pub secure_cookies: bool,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialStorefrontConfig {
    api_base_url: Option<String>,
    session_key: Option<String>,
    listen_addr: Option<String>,
    database_url: Option<String>,
    notification_webhook_url: Option<String>,
    log_dir: Option<String>,
    default_locale: Option<String>,
    request_timeout_secs: Option<u64>,
    password_reset_ttl_minutes: Option<i64>,
    plans_page_size: Option<usize>,
    secure_cookies: Option<bool>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_password_reset_ttl_minutes() -> i64 {
    60
}

fn default_plans_page_size() -> usize {
    6
}

impl StorefrontConfig {
    /// Loads the configuration: optional TOML file first, then environment
    /// variables (and `.env`) on top.
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::load_from(config_path, std::env::vars())
    }

    pub fn load_from<I>(config_path: Option<&str>, env_vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        // 1. Load from file (optional)
        let file_config: PartialStorefrontConfig = match config_path {
            Some(path_str) if Path::new(path_str).exists() => {
                let contents = fs::read_to_string(path_str).map_err(|source| ConfigError::Read {
                    path: path_str.to_string(),
                    source,
                })?;
                toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                    path: path_str.to_string(),
                    source,
                })?
            }
            _ => PartialStorefrontConfig::default(),
        };

        // 2. Load from environment variables
        let env_config: PartialStorefrontConfig = envy::from_iter(env_vars)?;

        // 3. Merge: environment overrides file
        let config = StorefrontConfig {
            api_base_url: env_config
                .api_base_url
                .or(file_config.api_base_url)
                .map(|url| url.trim_end_matches('/').to_string())
                .ok_or(ConfigError::Missing("API_BASE_URL"))?,
            session_key: env_config
                .session_key
                .or(file_config.session_key)
                .ok_or(ConfigError::Missing("SESSION_KEY"))?,
            listen_addr: env_config
                .listen_addr
                .or(file_config.listen_addr)
                .unwrap_or_else(default_listen_addr),
            database_url: env_config.database_url.or(file_config.database_url),
            notification_webhook_url: env_config
                .notification_webhook_url
                .or(file_config.notification_webhook_url),
            log_dir: env_config
                .log_dir
                .or(file_config.log_dir)
                .unwrap_or_else(default_log_dir),
            default_locale: env_config
                .default_locale
                .or(file_config.default_locale)
                .unwrap_or_else(default_locale),
            request_timeout_secs: env_config
                .request_timeout_secs
                .or(file_config.request_timeout_secs)
                .unwrap_or_else(default_request_timeout_secs),
            password_reset_ttl_minutes: env_config
                .password_reset_ttl_minutes
                .or(file_config.password_reset_ttl_minutes)
                .unwrap_or_else(default_password_reset_ttl_minutes),
            plans_page_size: env_config
                .plans_page_size
                .or(file_config.plans_page_size)
                .unwrap_or_else(default_plans_page_size),
            secure_cookies: env_config
                .secure_cookies
                .or(file_config.secure_cookies)
                .unwrap_or(false),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "api_base_url must be an http(s) URL, got {}",
                self.api_base_url
            )));
        }
        match hex::decode(&self.session_key) {
            Ok(bytes) if bytes.len() == 32 => {}
            _ => {
                return Err(ConfigError::Invalid(
                    "session_key must be 64 hex characters (32 bytes)".to_string(),
                ));
            }
        }
        if !SUPPORTED_LOCALES.contains(&self.default_locale.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "default_locale {} has no message catalogue",
                self.default_locale
            )));
        }
        if self.plans_page_size == 0 {
            return Err(ConfigError::Invalid("plans_page_size must be positive".to_string()));
        }
        if self.password_reset_ttl_minutes <= 0 {
            return Err(ConfigError::Invalid(
                "password_reset_ttl_minutes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
