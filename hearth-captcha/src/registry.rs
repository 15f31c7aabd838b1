//! Backend registry: a table from backend name to factory.

use crate::backend::{BackendOptions, CaptchaBackend};
use crate::error::{CaptchaError, CaptchaResult};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Backend names this crate knows how to build, whether or not their
/// feature is enabled in the current build.
pub const KNOWN_BACKENDS: &[(&str, &str)] =
    &[("2captcha", "twocaptcha"), ("capmonster", "capmonster")];

fn feature_enabled(feature: &str) -> bool {
    match feature {
        "twocaptcha" => cfg!(feature = "twocaptcha"),
        "capmonster" => cfg!(feature = "capmonster"),
        _ => false,
    }
}

/// Builds a backend from options.
pub type BackendFactory =
    Arc<dyn Fn(&BackendOptions) -> CaptchaResult<Arc<dyn CaptchaBackend>> + Send + Sync>;

/// Mapping from backend name to factory.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    factories: HashMap<String, BackendFactory>,
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.names())
            .finish()
    }
}

impl BackendRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every backend compiled into this build.
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();

        #[cfg(feature = "twocaptcha")]
        registry.register(crate::twocaptcha::SERVICE_NAME, crate::twocaptcha::factory);

        #[cfg(feature = "capmonster")]
        registry.register(crate::capmonster::SERVICE_NAME, crate::capmonster::factory);

        registry
    }

    /// Registers a factory under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&BackendOptions) -> CaptchaResult<Arc<dyn CaptchaBackend>> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Builds the backend registered under `name`.
    pub fn create(
        &self,
        name: &str,
        options: &BackendOptions,
    ) -> CaptchaResult<Arc<dyn CaptchaBackend>> {
        if let Some(factory) = self.factories.get(name) {
            debug!(backend = name, "Building captcha backend");
            return factory(options);
        }

        match KNOWN_BACKENDS.iter().find(|(known, _)| *known == name) {
            Some((_, feature)) if !feature_enabled(feature) => {
                Err(CaptchaError::DependencyUnavailable {
                    service: name.to_string(),
                    reason: format!("built without the `{feature}` feature"),
                })
            }
            _ => Err(CaptchaError::UnknownBackend(name.to_string())),
        }
    }
}
