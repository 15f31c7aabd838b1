//! Client configuration, loaded from TOML.
//!
//! ```toml
//! token = "..."
//! log_filter = "hearth=debug"
//!
//! [captcha]
//! service = "2captcha"
//! key = "0123456789abcdef0123456789abcdef"
//!
//! [voice]
//! self_deaf = true
//! ```

use crate::error::{ClientError, ClientResult};
use hearth_captcha::{BackendOptions, BackendRegistry, CaptchaSolver};
use hearth_voice::JoinOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

const DEFAULT_API_BASE_URL: &str = "https://discord.com/api";
const DEFAULT_API_VERSION: u8 = 9;
const DEFAULT_USER_AGENT: &str = concat!("hearth/", env!("CARGO_PKG_VERSION"));

/// Top-level client configuration. Missing keys take their defaults and
/// unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub api_version: u8,
    /// Authorization token sent with every REST request.
    pub token: Option<String>,
    pub user_agent: String,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    pub captcha: CaptchaConfig,
    /// Self state used when joining voice without explicit options.
    pub voice: JoinOptions,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION,
            token: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            log_filter: "info".to_string(),
            captcha: CaptchaConfig::default(),
            voice: JoinOptions::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_toml_str(contents: &str) -> ClientResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ClientError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        info!("Loaded client config from {:?}", path);
        Ok(config)
    }

    /// Versioned REST root, e.g. `https://discord.com/api/v9`.
    pub fn rest_url(&self) -> String {
        format!("{}/v{}", self.api_base_url.trim_end_matches('/'), self.api_version)
    }
}

/// `[captcha]` section: which solving backend to use, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptchaConfig {
    /// Backend name; challenges are not solved when absent.
    pub service: Option<String>,
    pub key: Option<String>,
    pub api_base_url: Option<String>,
    pub poll_interval_ms: u64,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        let options = BackendOptions::default();
        Self {
            service: None,
            key: options.key,
            api_base_url: options.api_base_url,
            poll_interval_ms: options.poll_interval_ms,
        }
    }
}

impl CaptchaConfig {
    pub fn backend_options(&self) -> BackendOptions {
        BackendOptions {
            key: self.key.clone(),
            api_base_url: self.api_base_url.clone(),
            poll_interval_ms: self.poll_interval_ms,
        }
    }

    /// Builds the configured solver from the built-in backends.
    pub fn solver(&self) -> ClientResult<Option<CaptchaSolver>> {
        self.solver_with(&BackendRegistry::with_defaults())
    }

    /// Builds the configured solver from `registry`. Configuration errors
    /// surface here, at startup.
    pub fn solver_with(&self, registry: &BackendRegistry) -> ClientResult<Option<CaptchaSolver>> {
        let Some(service) = self.service.as_deref() else {
            return Ok(None);
        };
        let solver = CaptchaSolver::with_registry(registry, service, &self.backend_options())?;
        Ok(Some(solver))
    }
}
