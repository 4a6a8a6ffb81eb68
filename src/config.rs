use crate::payments::poller::{PollingConfig, POLL_INTERVAL_MS, POLL_TIMEOUT_MS};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:3030";
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const VALID_ENVIRONMENTS: [&str; 3] = ["development", "staging", "production"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub environment: String,
    pub api: ApiConfig,
    pub polling: PollingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Backend origin; `/api` is appended by the client
    pub base_url: String,
    pub timeout_secs: u64,
    #[serde(default)]
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PollingSettings {
    pub interval_ms: u64,
    pub timeout_ms: u64,
}

impl From<PollingSettings> for PollingConfig {
    fn from(settings: PollingSettings) -> Self {
        PollingConfig {
            interval: Duration::from_millis(settings.interval_ms),
            timeout: Duration::from_millis(settings.timeout_ms),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            api: ApiConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
                auth_token: None,
            },
            polling: PollingSettings {
                interval_ms: POLL_INTERVAL_MS,
                timeout_ms: POLL_TIMEOUT_MS,
            },
        }
    }
}

impl Config {
    /// Load defaults, then `storefront.toml` if present, then `STOREFRONT_*` variables.
    ///
    /// Nested keys use a double underscore, e.g. `STOREFRONT_API__BASE_URL`.
    pub fn load() -> Result<Self> {
        Self::load_from("storefront")
    }

    pub fn load_from(file_stem: &str) -> Result<Self> {
        let defaults = Config::default();

        let settings = ::config::Config::builder()
            .set_default("environment", defaults.environment)?
            .set_default("api.base_url", defaults.api.base_url)?
            .set_default("api.timeout_secs", defaults.api.timeout_secs)?
            .set_default("polling.interval_ms", defaults.polling.interval_ms)?
            .set_default("polling.timeout_ms", defaults.polling.timeout_ms)?
            .add_source(::config::File::with_name(file_stem).required(false))
            .add_source(
                ::config::Environment::with_prefix("STOREFRONT")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .context("Failed to assemble configuration sources")?;

        let config: Config = settings
            .try_deserialize()
            .context("Configuration has invalid values")?;

        config.validate()?;
        Ok(config)
    }

    pub fn polling_config(&self) -> PollingConfig {
        self.polling.into()
    }

    pub fn validate(&self) -> Result<()> {
        if !VALID_ENVIRONMENTS.contains(&self.environment.as_str()) {
            return Err(anyhow!(
                "Environment must be one of: {:?}, got {}",
                VALID_ENVIRONMENTS,
                self.environment
            ));
        }

        if self.api.base_url.trim().is_empty() {
            return Err(anyhow!("API base URL cannot be empty"));
        }

        if self.api.timeout_secs == 0 {
            return Err(anyhow!("API timeout must be greater than 0"));
        }

        if self.polling.interval_ms == 0 {
            return Err(anyhow!("Polling interval must be greater than 0"));
        }

        if self.polling.timeout_ms < self.polling.interval_ms {
            return Err(anyhow!(
                "Polling timeout ({}ms) must not be shorter than the interval ({}ms)",
                self.polling.timeout_ms,
                self.polling.interval_ms
            ));
        }

        Ok(())
    }
}
