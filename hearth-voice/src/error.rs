//! Error types for voice sessions.

use crate::stream::StreamKind;
use hearth_types::Snowflake;
use thiserror::Error;

/// Result type for voice operations.
pub type VoiceResult<T> = Result<T, VoiceError>;

/// Error reported by a media transport.
///
/// Carried unchanged on sub-stream error notifications, so it is cheap to
/// clone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(String);

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Errors that can occur while joining or using a voice session.
#[derive(Debug, Error)]
pub enum VoiceError {
    /// A join is already in flight for this context.
    #[error("already connecting to voice in {0}")]
    AlreadyConnecting(Snowflake),

    /// A live connection already exists for this context.
    #[error("already connected to voice in {0}")]
    AlreadyConnected(Snowflake),

    /// The media handshake did not complete.
    #[error("voice connection to {context} failed: {source}")]
    ConnectionFailed {
        context: Snowflake,
        #[source]
        source: TransportError,
    },

    /// The session is not in a state that can open sub-streams.
    #[error("voice session is not connected")]
    NotConnected,

    /// A sub-stream of this kind is already running on the connection.
    #[error("a {0} stream is already active")]
    StreamAlreadyActive(StreamKind),

    /// Volume must be a finite, non-negative level.
    #[error("invalid volume level: {0}")]
    InvalidVolume(f32),

    /// Playback controls were used on a non-playback sub-stream.
    #[error("{0} streams do not support playback controls")]
    NotPlayback(StreamKind),

    /// The transport rejected a sub-stream.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}
