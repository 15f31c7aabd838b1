//! Backend abstraction.
//!
//! Defines the single operation every solving service must provide, plus the
//! options a backend factory receives.

use crate::error::{CaptchaError, CaptchaResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Page the challenge is solved for.
pub const TARGET_PAGE_URL: &str = "https://discord.com";

/// One challenge to solve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeRequest {
    /// hCaptcha site key from the challenge response.
    pub site_key: String,
    /// Opaque `captcha_rqdata` blob, for enterprise challenges.
    pub rqdata: Option<String>,
    /// User agent the token will be redeemed with.
    pub user_agent: Option<String>,
}

impl ChallengeRequest {
    /// A plain challenge with only a site key.
    pub fn new(site_key: impl Into<String>) -> Self {
        Self {
            site_key: site_key.into(),
            rqdata: None,
            user_agent: None,
        }
    }

    pub fn with_rqdata(mut self, rqdata: impl Into<String>) -> Self {
        self.rqdata = Some(rqdata.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// Abstract challenge-solving backend.
#[async_trait]
pub trait CaptchaBackend: Send + Sync {
    /// Returns the registry name of the backend.
    fn name(&self) -> &str;

    /// Solves the challenge and returns the response token.
    ///
    /// Suspends until the service answers; no timeout is applied here.
    async fn solve(&self, request: &ChallengeRequest) -> CaptchaResult<String>;
}

/// Options handed to a backend factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendOptions {
    /// API key for the solving service.
    pub key: Option<String>,
    /// Overrides the service's API base URL.
    pub api_base_url: Option<String>,
    /// Delay between result polls (in milliseconds).
    pub poll_interval_ms: u64,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            key: None,
            api_base_url: None,
            poll_interval_ms: 5_000,
        }
    }
}

impl BackendOptions {
    /// Options carrying only an API key.
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Default::default()
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Returns the configured API key, trimmed. Absent or blank keys are rejected.
    pub fn require_api_key(&self, service: &str) -> CaptchaResult<String> {
        let key = self.key.as_deref().map(str::trim).unwrap_or_default();

        if key.is_empty() {
            return Err(CaptchaError::missing_credential(
                service,
                "no API key configured",
            ));
        }

        Ok(key.to_string())
    }
}
