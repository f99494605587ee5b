use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
    /// Configuration was already installed for this process.
    #[error("Configuration already initialized")]
    AlreadyInitialized,
}

/// Runtime configuration for the document service client.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Base URL of the remote document-intelligence service.
    pub api_url: String,
    /// Account name used to authenticate.
    pub username: Option<String>,
    /// API key issued to the account.
    pub api_key: Option<String>,
    /// Account password, preferred over the API key when both are present.
    pub password: Option<String>,
    /// Optional per-request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Directory that receives stored service responses.
    pub output_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: load_env("EZDOC_API_URL")?,
            username: load_env_optional("EZDOC_USERNAME"),
            api_key: load_env_optional("EZDOC_API_KEY"),
            password: load_env_optional("EZDOC_PASSWORD"),
            request_timeout_secs: load_env_optional("EZDOC_REQUEST_TIMEOUT_SECS")
                .map(|value| {
                    value.parse().map_err(|_| {
                        ConfigError::InvalidValue("EZDOC_REQUEST_TIMEOUT_SECS".to_string())
                    })
                })
                .transpose()?,
            output_dir: load_env_optional("EZDOC_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
        })
    }

    /// Configuration pointing at `api_url` with every optional setting left unset.
    pub fn for_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            username: None,
            api_key: None,
            password: None,
            request_timeout_secs: None,
            output_dir: PathBuf::from("."),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_url", &self.api_url)
            .field("username", &self.username)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    load_env_optional(key).ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load `.env` and the environment, then install the result in the global cache.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| ConfigError::AlreadyInitialized)?;
    Ok(get_config())
}
