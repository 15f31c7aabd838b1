//! REST client with challenge handling.
//!
//! Privileged endpoints may answer `400` with an hCaptcha challenge instead
//! of performing the action. [`HttpApi`] solves it through the configured
//! [`CaptchaSolver`] and retries the request once with the token attached.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use hearth_captcha::{CaptchaSolver, ChallengeRequest};
use hearth_model::CallApi;
use hearth_types::Snowflake;
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

const CAPTCHA_KEY_HEADER: &str = "X-Captcha-Key";
const CAPTCHA_RQTOKEN_HEADER: &str = "X-Captcha-Rqtoken";

/// Challenge body of a captcha-gated `400` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CaptchaChallenge {
    pub captcha_sitekey: String,
    #[serde(default)]
    pub captcha_key: Vec<String>,
    pub captcha_service: Option<String>,
    pub captcha_rqdata: Option<String>,
    pub captcha_rqtoken: Option<String>,
}

/// Token for a solved challenge, attached to the retried request.
struct SolvedChallenge {
    token: String,
    rqtoken: Option<String>,
}

enum Outcome {
    Done(Value),
    Challenged(CaptchaChallenge),
}

/// JSON REST client.
pub struct HttpApi {
    client: Client,
    base_url: String,
    token: Option<String>,
    user_agent: String,
    solver: Option<CaptchaSolver>,
}

impl HttpApi {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: config.rest_url(),
            token: config.token.clone(),
            user_agent: config.user_agent.clone(),
            solver: None,
        })
    }

    /// Solves challenges with `solver` instead of failing with
    /// [`ClientError::CaptchaRequired`].
    pub fn with_solver(mut self, solver: CaptchaSolver) -> Self {
        self.solver = Some(solver);
        self
    }

    pub fn solver(&self) -> Option<&CaptchaSolver> {
        self.solver.as_ref()
    }

    /// Sends a request to `path` (relative to the versioned API root).
    ///
    /// Returns the decoded JSON body, or `Value::Null` for empty bodies.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> ClientResult<Value> {
        let challenge = match self.send(method.clone(), path, body, None).await? {
            Outcome::Done(value) => return Ok(value),
            Outcome::Challenged(challenge) => challenge,
        };

        let Some(solver) = &self.solver else {
            warn!(path, "Request challenged and no captcha solver is configured");
            return Err(captcha_required(challenge));
        };

        info!(path, service = solver.service(), "Solving captcha for challenged request");
        let mut request = ChallengeRequest::new(challenge.captcha_sitekey.clone())
            .with_user_agent(self.user_agent.clone());
        if let Some(rqdata) = &challenge.captcha_rqdata {
            request = request.with_rqdata(rqdata.clone());
        }
        let solved = SolvedChallenge {
            token: solver.solve_request(&request).await?,
            rqtoken: challenge.captcha_rqtoken,
        };

        match self.send(method, path, body, Some(&solved)).await? {
            Outcome::Done(value) => Ok(value),
            Outcome::Challenged(challenge) => Err(captcha_required(challenge)),
        }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        solved: Option<&SolvedChallenge>,
    ) -> ClientResult<Outcome> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!(%method, %url, retried = solved.is_some(), "Sending API request");

        let mut builder = self
            .client
            .request(method, &url)
            .header(reqwest::header::USER_AGENT, &self.user_agent);
        if let Some(token) = &self.token {
            builder = builder.header(reqwest::header::AUTHORIZATION, token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }
        if let Some(solved) = solved {
            builder = builder.header(CAPTCHA_KEY_HEADER, &solved.token);
            if let Some(rqtoken) = &solved.rqtoken {
                builder = builder.header(CAPTCHA_RQTOKEN_HEADER, rqtoken);
            }
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(Outcome::Done(Value::Null));
            }
            return Ok(Outcome::Done(serde_json::from_str(&text)?));
        }

        if status == StatusCode::BAD_REQUEST {
            if let Ok(challenge) = serde_json::from_str::<CaptchaChallenge>(&text) {
                debug!(
                    site_key = %challenge.captcha_sitekey,
                    "Request answered with captcha challenge"
                );
                return Ok(Outcome::Challenged(challenge));
            }
        }

        Err(ClientError::Api {
            status: status.as_u16(),
            message: text,
        })
    }
}

fn captcha_required(challenge: CaptchaChallenge) -> ClientError {
    ClientError::CaptchaRequired {
        site_key: challenge.captcha_sitekey,
        service: challenge.captcha_service,
    }
}

#[async_trait]
impl CallApi for HttpApi {
    type Error = ClientError;

    async fn patch_call(&self, channel_id: Snowflake, body: Value) -> ClientResult<()> {
        self.request(Method::PATCH, &format!("channels/{channel_id}/call"), Some(&body))
            .await?;
        Ok(())
    }
}
