//! Voice session lifecycle for hearth.
//!
//! This crate owns the state machine a voice connection goes through, from
//! the join request to teardown, plus the sub-streams (playback, capture,
//! video recording) nested inside a live connection. Encoding, encryption
//! and socket I/O live behind the [`MediaTransport`] trait.
//!
//! ```text
//! Idle -> Connecting -> Connected <-> Streaming -> Disconnecting -> Closed
//! ```
//!
//! `Streaming` is derived: a connected session reports it while at least one
//! sub-stream is active.

mod error;
mod manager;
mod session;
mod state;
mod stream;
pub mod transport;

pub use error::{TransportError, VoiceError, VoiceResult};
pub use manager::VoiceManager;
pub use session::{SessionEvent, VoiceSession};
pub use state::{JoinOptions, VoiceState, VoiceTarget};
pub use stream::{
    AudioSource, StreamEvent, StreamKind, StreamReporter, StreamRequest, SubStream, VideoOptions,
};
pub use transport::{MediaConnection, MediaStream, MediaTransport};
