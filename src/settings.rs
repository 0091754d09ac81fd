//! Runtime settings for the billing API client.
//!
//! Settings are layered with the `config` crate: built-in defaults, then an
//! optional TOML file, then `PRU_BUDGET_*` environment variables.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{ProvisionError, ProvisionResult};

/// Prefix for environment variable overrides (`PRU_BUDGET_API_URL`, ...).
pub const ENV_PREFIX: &str = "PRU_BUDGET";

/// Environment variable naming an explicit settings file.
pub const CONFIG_PATH_ENV_VAR: &str = "PRU_BUDGET_CONFIG";

/// Settings file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "pru-budget.toml";

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_API_VERSION: &str = "2022-11-28";
pub const DEFAULT_PRODUCT_SKU: &str = "copilot_premium_request";
pub const DEFAULT_PRU_RATE: f64 = 0.04;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Billing API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root of the REST API (`https://api.<subdomain>.ghe.com` for data residency).
    pub api_url: String,

    /// Value sent in the `X-GitHub-Api-Version` header.
    pub api_version: String,

    /// Metered product the budget is scoped to.
    pub product_sku: String,

    /// USD per premium request, used when the budget is given in PRUs.
    pub pru_rate: f64,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            product_sku: DEFAULT_PRODUCT_SKU.to_string(),
            pru_rate: DEFAULT_PRU_RATE,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            user_agent: concat!("pru-budget/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Settings {
    /// Creates settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from the usual sources.
    ///
    /// `explicit_path` (from `--config`) wins over `PRU_BUDGET_CONFIG`; both
    /// must exist when given. `pru-budget.toml` in the working directory is
    /// optional.
    pub fn load(explicit_path: Option<&Path>) -> ProvisionResult<Self> {
        let file = match explicit_path {
            Some(path) => Some((path.to_path_buf(), true)),
            None => match env::var(CONFIG_PATH_ENV_VAR) {
                Ok(path) if !path.trim().is_empty() => Some((PathBuf::from(path), true)),
                _ => Some((PathBuf::from(DEFAULT_CONFIG_FILE), false)),
            },
        };
        Self::load_from(file, ENV_PREFIX)
    }

    /// Load settings from an optional file and an environment prefix.
    pub fn load_from(file: Option<(PathBuf, bool)>, env_prefix: &str) -> ProvisionResult<Self> {
        let mut builder = Config::builder();

        if let Some((path, required)) = file {
            tracing::debug!(path = %path.display(), required, "Reading settings file");
            builder = builder
                .add_source(File::new(&path.to_string_lossy(), FileFormat::Toml).required(required));
        }

        builder = builder.add_source(Environment::with_prefix(env_prefix).try_parsing(true));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings that cannot produce a working client.
    pub fn validate(&self) -> ProvisionResult<()> {
        Url::parse(&self.api_url).map_err(|e| {
            ProvisionError::InvalidInput(format!("api_url '{}' is not a valid URL: {}", self.api_url, e))
        })?;
        if self.api_version.trim().is_empty() {
            return Err(ProvisionError::InvalidInput("api_version must not be empty".to_string()));
        }
        if self.product_sku.trim().is_empty() {
            return Err(ProvisionError::InvalidInput("product_sku must not be empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ProvisionError::InvalidInput(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if !self.pru_rate.is_finite() || self.pru_rate < 0.0 {
            return Err(ProvisionError::InvalidInput(format!(
                "pru_rate must be a non-negative number, got {}",
                self.pru_rate
            )));
        }
        Ok(())
    }

    /// Sets the API root.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Sets the pinned API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Sets the metered product SKU.
    pub fn with_product_sku(mut self, sku: impl Into<String>) -> Self {
        self.product_sku = sku.into();
        self
    }

    /// Sets the default PRU rate.
    pub fn with_pru_rate(mut self, rate: f64) -> Self {
        self.pru_rate = rate;
        self
    }

    /// Sets the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = timeout.as_secs();
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Host name `gh auth token --hostname` expects for this API root.
    ///
    /// `api.github.com` maps to `github.com`, `api.<sub>.ghe.com` to
    /// `<sub>.ghe.com`; any other host is returned as is.
    pub fn gh_hostname(&self) -> Option<String> {
        let url = Url::parse(&self.api_url).ok()?;
        let host = url.host_str()?;
        Some(host.strip_prefix("api.").unwrap_or(host).to_string())
    }
}
