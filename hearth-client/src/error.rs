//! Error types for the client context.

use hearth_captcha::CaptchaError;
use hearth_model::ModelError;
use hearth_types::Snowflake;
use hearth_voice::VoiceError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client context.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Reading the configuration file failed.
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid TOML for [`ClientConfig`](crate::ClientConfig).
    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// HTTP transport error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("api error {status}: {message}")]
    Api { status: u16, message: String },

    /// The request needs a solved challenge and no solver is configured, or
    /// the retried request was challenged again.
    #[error("captcha required (site key {site_key})")]
    CaptchaRequired {
        site_key: String,
        service: Option<String>,
    },

    #[error(transparent)]
    Captcha(#[from] CaptchaError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Voice(#[from] VoiceError),

    /// A gateway payload lacked a field dispatch depends on.
    #[error("malformed {event} payload: {reason}")]
    MalformedEvent { event: String, reason: String },

    #[error("channel {0} is not cached")]
    ChannelNotCached(Snowflake),

    #[error("no call is cached for channel {0}")]
    CallNotCached(Snowflake),

    #[error("channel {0} cannot host voice")]
    NotVoiceChannel(Snowflake),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
