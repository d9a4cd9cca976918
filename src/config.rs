//! Client configuration loaded from the environment.

use std::env;
use std::time::Duration;

/// Base URL used when `AGRIFUND_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "http://localhost:3001/api";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Runtime configuration for the AgriFund client.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the AgriFund REST API, without a trailing slash.
    pub api_base_url: String,
    /// Per-request timeout applied to every call.
    pub request_timeout: Duration,
}

impl Config {
    /// Loads configuration from the environment, honoring a `.env` file.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_base_url =
            env::var("AGRIFUND_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let request_timeout = env::var("AGRIFUND_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS));

        Self {
            api_base_url,
            request_timeout,
        }
    }

    /// Configuration pointing at an explicit base URL. Used by embedders that
    /// resolve the endpoint themselves and by the test harness.
    pub fn with_base_url(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}
