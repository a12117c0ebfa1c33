//! Client configuration
//!
//! Settings are layered: built-in defaults, then `PICKME_*` environment
//! variables. Command-line overrides are applied by the binary on top of the
//! loaded value.

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment};
use serde::Deserialize;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// API base URL used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Default per-request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client configuration struct
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the REST API, without a trailing slash
    pub api_url: String,
    /// Timeout applied to every HTTP request, in seconds
    pub request_timeout_secs: u64,
    /// File the session tokens are persisted to
    pub token_file: PathBuf,
}

impl ClientConfig {
    /// Create a new ClientConfig from defaults and environment variables
    ///
    /// # Environment Variables
    /// - `PICKME_API_URL`: REST API base URL (default: "http://localhost:8000/api")
    /// - `PICKME_REQUEST_TIMEOUT_SECS`: request timeout (default: 30)
    /// - `PICKME_TOKEN_FILE`: token file (default: `<config dir>/pickme/tokens.json`)
    pub fn from_env() -> ConfigResult<Self> {
        let settings = Config::builder()
            .set_default("api_url", DEFAULT_API_URL)?
            .set_default("request_timeout_secs", DEFAULT_REQUEST_TIMEOUT_SECS as i64)?
            .set_default(
                "token_file",
                default_token_file().to_string_lossy().into_owned(),
            )?
            .add_source(Environment::with_prefix("PICKME").try_parsing(true))
            .build()?;

        let config: ClientConfig = settings.try_deserialize()?;
        let config = config.normalized()?;
        debug!("Loaded client configuration: {:?}", config);
        Ok(config)
    }

    /// Configuration pointing at `api_url` with every other field defaulted
    pub fn for_api(api_url: impl Into<String>) -> ConfigResult<Self> {
        ClientConfig {
            api_url: api_url.into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            token_file: default_token_file(),
        }
        .normalized()
    }

    /// Replace the API URL, re-validating it
    pub fn with_api_url(self, api_url: impl Into<String>) -> ConfigResult<Self> {
        ClientConfig {
            api_url: api_url.into(),
            ..self
        }
        .normalized()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn normalized(mut self) -> ConfigResult<Self> {
        let parsed = url::Url::parse(&self.api_url).map_err(|e| ConfigError::Invalid {
            key: "api_url",
            message: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                key: "api_url",
                message: format!("unsupported scheme {}", parsed.scheme()),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "request_timeout_secs",
                message: "must be greater than zero".to_string(),
            });
        }

        self.api_url = self.api_url.trim_end_matches('/').to_string();
        Ok(self)
    }
}

fn default_token_file() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("pickme").join("tokens.json"))
        .unwrap_or_else(|| PathBuf::from(".pickme-tokens.json"))
}
