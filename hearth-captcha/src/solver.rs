use crate::backend::{BackendOptions, CaptchaBackend, ChallengeRequest};
use crate::error::CaptchaResult;
use crate::registry::BackendRegistry;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Solves challenges through exactly one bound backend.
///
/// Cloning is cheap and clones share the backend; concurrent
/// [`solve`](Self::solve) calls do not wait on each other.
#[derive(Clone)]
pub struct CaptchaSolver {
    service: String,
    backend: Arc<dyn CaptchaBackend>,
}

impl fmt::Debug for CaptchaSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptchaSolver")
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

impl CaptchaSolver {
    /// Binds the named built-in backend using `key` as its API key.
    pub fn new(service: &str, key: Option<&str>) -> CaptchaResult<Self> {
        let options = BackendOptions {
            key: key.map(str::to_string),
            ..Default::default()
        };
        Self::with_registry(&BackendRegistry::with_defaults(), service, &options)
    }

    /// Binds the backend registered under `service` in `registry`.
    pub fn with_registry(
        registry: &BackendRegistry,
        service: &str,
        options: &BackendOptions,
    ) -> CaptchaResult<Self> {
        let backend = registry.create(service, options)?;
        info!(service, "Captcha solver ready");
        Ok(Self {
            service: service.to_string(),
            backend,
        })
    }

    /// Binds an already-built backend.
    pub fn from_backend(backend: Arc<dyn CaptchaBackend>) -> Self {
        Self {
            service: backend.name().to_string(),
            backend,
        }
    }

    /// Name of the bound backend.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Solves a challenge for `site_key` and returns the token.
    pub async fn solve(&self, site_key: &str) -> CaptchaResult<String> {
        self.solve_request(&ChallengeRequest::new(site_key)).await
    }

    /// Solves a fully described challenge and returns the token.
    pub async fn solve_request(&self, request: &ChallengeRequest) -> CaptchaResult<String> {
        info!(service = %self.service, site_key = %request.site_key, "Solving captcha challenge");
        self.backend.solve(request).await
    }
}
