//! CapMonster Cloud backend.
//!
//! Creates an `HCaptchaTaskProxyless` task, then polls `getTaskResult`.

use crate::backend::{BackendOptions, CaptchaBackend, ChallengeRequest, TARGET_PAGE_URL};
use crate::error::{CaptchaError, CaptchaResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Registry name of this backend.
pub const SERVICE_NAME: &str = "capmonster";

const DEFAULT_API_BASE_URL: &str = "https://api.capmonster.cloud";

/// CapMonster specific configuration.
#[derive(Debug, Clone)]
pub struct CapMonsterConfig {
    /// Client key.
    pub client_key: String,
    /// Base URL for the CapMonster API (e.g. `https://api.capmonster.cloud`).
    pub api_base_url: String,
    /// Delay between result polls.
    pub poll_interval: Duration,
}

impl CapMonsterConfig {
    /// Validates `options` into a config.
    pub fn from_options(options: &BackendOptions) -> CaptchaResult<Self> {
        Ok(Self {
            client_key: options.require_api_key(SERVICE_NAME)?,
            api_base_url: options
                .api_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            poll_interval: options.poll_interval(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskResponse {
    error_id: i64,
    error_code: Option<String>,
    error_description: Option<String>,
    task_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskResultResponse {
    error_id: i64,
    error_code: Option<String>,
    error_description: Option<String>,
    status: Option<String>,
    solution: Option<Solution>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Solution {
    g_recaptcha_response: String,
}

fn describe(code: Option<String>, description: Option<String>) -> String {
    match (code, description) {
        (Some(code), Some(description)) => format!("{code}: {description}"),
        (Some(code), None) => code,
        (None, Some(description)) => description,
        (None, None) => "unknown error".to_string(),
    }
}

/// CapMonster Cloud backend.
pub struct CapMonster {
    config: CapMonsterConfig,
    client: Client,
}

impl CapMonster {
    /// Creates a backend; fails if the HTTP client cannot be built.
    pub fn new(config: CapMonsterConfig) -> CaptchaResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| CaptchaError::DependencyUnavailable {
                service: SERVICE_NAME.to_string(),
                reason: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self { config, client })
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        body: serde_json::Value,
    ) -> CaptchaResult<T> {
        let response = self
            .client
            .post(format!("{}/{endpoint}", self.config.api_base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| CaptchaError::Network(format!("{endpoint} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(CaptchaError::backend(
                SERVICE_NAME,
                format!("{endpoint} returned HTTP {status}: {error}"),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| CaptchaError::Network(format!("failed to parse {endpoint} response: {e}")))
    }

    async fn create_task(&self, request: &ChallengeRequest) -> CaptchaResult<u64> {
        let mut task = json!({
            "type": "HCaptchaTaskProxyless",
            "websiteURL": TARGET_PAGE_URL,
            "websiteKey": request.site_key,
            "isInvisible": true,
        });
        if let Some(rqdata) = &request.rqdata {
            task["data"] = json!(rqdata);
        }
        if let Some(user_agent) = &request.user_agent {
            task["userAgent"] = json!(user_agent);
        }

        let created: CreateTaskResponse = self
            .post(
                "createTask",
                json!({ "clientKey": self.config.client_key, "task": task }),
            )
            .await?;

        if created.error_id != 0 {
            return Err(CaptchaError::backend(
                SERVICE_NAME,
                describe(created.error_code, created.error_description),
            ));
        }
        created
            .task_id
            .ok_or_else(|| CaptchaError::backend(SERVICE_NAME, "createTask returned no taskId"))
    }

    /// Polls once. `Ok(None)` means the task is still processing.
    async fn poll(&self, task_id: u64) -> CaptchaResult<Option<String>> {
        let result: TaskResultResponse = self
            .post(
                "getTaskResult",
                json!({ "clientKey": self.config.client_key, "taskId": task_id }),
            )
            .await?;

        if result.error_id != 0 {
            return Err(CaptchaError::backend(
                SERVICE_NAME,
                describe(result.error_code, result.error_description),
            ));
        }

        match (result.status.as_deref(), result.solution) {
            (Some("ready"), Some(solution)) => Ok(Some(solution.g_recaptcha_response)),
            (Some("ready"), None) => Err(CaptchaError::backend(
                SERVICE_NAME,
                "task ready without a solution",
            )),
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl CaptchaBackend for CapMonster {
    fn name(&self) -> &str {
        SERVICE_NAME
    }

    async fn solve(&self, request: &ChallengeRequest) -> CaptchaResult<String> {
        let task_id = self.create_task(request).await?;
        debug!(task_id, "Created CapMonster hCaptcha task");

        loop {
            tokio::time::sleep(self.config.poll_interval).await;
            if let Some(token) = self.poll(task_id).await? {
                debug!(task_id, "CapMonster task solved");
                return Ok(token);
            }
        }
    }
}

pub(crate) fn factory(options: &BackendOptions) -> CaptchaResult<Arc<dyn CaptchaBackend>> {
    Ok(Arc::new(CapMonster::new(CapMonsterConfig::from_options(options)?)?))
}
