//! 2captcha backend.
//!
//! Submits the challenge to `in.php`, then polls `res.php` until a worker
//! returns the token.

use crate::backend::{BackendOptions, CaptchaBackend, ChallengeRequest, TARGET_PAGE_URL};
use crate::error::{CaptchaError, CaptchaResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Registry name of this backend.
pub const SERVICE_NAME: &str = "2captcha";

const DEFAULT_API_BASE_URL: &str = "https://2captcha.com";
const NOT_READY: &str = "CAPCHA_NOT_READY";

/// 2captcha specific configuration.
#[derive(Debug, Clone)]
pub struct TwoCaptchaConfig {
    /// API key.
    pub api_key: String,
    /// Base URL for the 2captcha API (e.g. `https://2captcha.com`).
    pub api_base_url: String,
    /// Delay between result polls.
    pub poll_interval: Duration,
}

impl TwoCaptchaConfig {
    /// Validates `options` into a config.
    pub fn from_options(options: &BackendOptions) -> CaptchaResult<Self> {
        Ok(Self {
            api_key: options.require_api_key(SERVICE_NAME)?,
            api_base_url: options
                .api_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            poll_interval: options.poll_interval(),
        })
    }
}

/// `{"status": 1, "request": "..."}` envelope used by both endpoints.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: i64,
    request: String,
}

/// 2captcha backend.
pub struct TwoCaptcha {
    config: TwoCaptchaConfig,
    client: Client,
}

impl TwoCaptcha {
    /// Creates a backend; fails if the HTTP client cannot be built.
    pub fn new(config: TwoCaptchaConfig) -> CaptchaResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| CaptchaError::DependencyUnavailable {
                service: SERVICE_NAME.to_string(),
                reason: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self { config, client })
    }

    async fn submit(&self, request: &ChallengeRequest) -> CaptchaResult<String> {
        let mut form = vec![
            ("key", self.config.api_key.clone()),
            ("method", "hcaptcha".to_string()),
            ("sitekey", request.site_key.clone()),
            ("pageurl", TARGET_PAGE_URL.to_string()),
            ("invisible", "1".to_string()),
            ("json", "1".to_string()),
        ];
        if let Some(rqdata) = &request.rqdata {
            form.push(("data", rqdata.clone()));
        }
        if let Some(user_agent) = &request.user_agent {
            form.push(("userAgent", user_agent.clone()));
        }

        let response = self
            .client
            .post(format!("{}/in.php", self.config.api_base_url))
            .form(&form)
            .send()
            .await
            .map_err(|e| CaptchaError::Network(format!("task submission failed: {e}")))?;

        let body = self.read_envelope(response).await?;
        if body.status != 1 {
            return Err(CaptchaError::backend(SERVICE_NAME, body.request));
        }
        Ok(body.request)
    }

    /// Polls once. `Ok(None)` means the worker is not done yet.
    async fn poll(&self, task_id: &str) -> CaptchaResult<Option<String>> {
        let response = self
            .client
            .get(format!("{}/res.php", self.config.api_base_url))
            .query(&[
                ("key", self.config.api_key.as_str()),
                ("action", "get"),
                ("id", task_id),
                ("json", "1"),
            ])
            .send()
            .await
            .map_err(|e| CaptchaError::Network(format!("result poll failed: {e}")))?;

        let body = self.read_envelope(response).await?;
        match body.status {
            1 => Ok(Some(body.request)),
            _ if body.request == NOT_READY => Ok(None),
            _ => Err(CaptchaError::backend(SERVICE_NAME, body.request)),
        }
    }

    async fn read_envelope(&self, response: reqwest::Response) -> CaptchaResult<ApiResponse> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CaptchaError::Network(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(CaptchaError::backend(
                SERVICE_NAME,
                format!("HTTP {status}: {text}"),
            ));
        }

        // The API labels its JSON as text/html, so decode from the raw body.
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl CaptchaBackend for TwoCaptcha {
    fn name(&self) -> &str {
        SERVICE_NAME
    }

    async fn solve(&self, request: &ChallengeRequest) -> CaptchaResult<String> {
        let task_id = self.submit(request).await?;
        debug!(task_id = %task_id, "Submitted hCaptcha task to 2captcha");

        loop {
            tokio::time::sleep(self.config.poll_interval).await;
            if let Some(token) = self.poll(&task_id).await? {
                debug!(task_id = %task_id, "2captcha task solved");
                return Ok(token);
            }
        }
    }
}

pub(crate) fn factory(options: &BackendOptions) -> CaptchaResult<Arc<dyn CaptchaBackend>> {
    Ok(Arc::new(TwoCaptcha::new(TwoCaptchaConfig::from_options(options)?)?))
}
