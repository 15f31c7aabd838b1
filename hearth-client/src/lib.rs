//! hearth client context.
//!
//! Ties the lower crates together:
//! - [`ClientConfig`]: TOML configuration
//! - [`logging::init`]: `tracing` subscriber bootstrap
//! - [`Client::dispatch`]: applies gateway events to the entity caches
//! - [`HttpApi`]: REST calls, retried once through a [`CaptchaSolver`] when
//!   the server answers with a challenge
//! - [`Client::join_voice`]: voice sessions for cached channels
//!
//! [`CaptchaSolver`]: hearth_captcha::CaptchaSolver

mod client;
mod config;
mod error;
mod gateway;
mod http;
pub mod logging;

pub use client::Client;
pub use config::{CaptchaConfig, ClientConfig};
pub use error::{ClientError, ClientResult};
pub use gateway::{ClientEvent, GatewayEvent};
pub use http::{CaptchaChallenge, HttpApi};
