//! Sub-streams nested inside a live voice connection.

use crate::error::{TransportError, VoiceError, VoiceResult};
use crate::transport::MediaStream;
use hearth_types::Snowflake;
use parking_lot::Mutex;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, warn};

const EVENT_CAPACITY: usize = 16;

/// Kind of media flow. At most one of each kind runs per connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StreamKind {
    /// Audio sent from a source.
    Playback,
    /// Screen or application capture.
    Capture,
    /// Camera video.
    RecordVideo,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Playback => "playback",
            Self::Capture => "capture",
            Self::RecordVideo => "video",
        })
    }
}

/// Where playback audio comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    File(PathBuf),
    Url(String),
}

/// Parameters for a camera video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoOptions {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Receive this user's video instead of sending our own.
    pub user_id: Option<Snowflake>,
}

impl Default for VideoOptions {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 30,
            user_id: None,
        }
    }
}

/// What the transport is asked to open.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamRequest {
    Playback { source: AudioSource, volume: f32 },
    Capture,
    RecordVideo(VideoOptions),
}

impl StreamRequest {
    pub fn kind(&self) -> StreamKind {
        match self {
            Self::Playback { .. } => StreamKind::Playback,
            Self::Capture => StreamKind::Capture,
            Self::RecordVideo(_) => StreamKind::RecordVideo,
        }
    }
}

/// Lifecycle notification of one sub-stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Start,
    Finish,
    /// The transport failed the stream. The parent connection is unaffected.
    Error(TransportError),
}

/// Handle a transport uses to report on a sub-stream it is running.
///
/// `finished` and `failed` end the stream; only the first of them (or a
/// local stop) is delivered.
#[derive(Debug, Clone)]
pub struct StreamReporter {
    kind: StreamKind,
    events: broadcast::Sender<StreamEvent>,
    ended: Arc<AtomicBool>,
}

impl StreamReporter {
    pub(crate) fn new(kind: StreamKind) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            kind,
            events,
            ended: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    pub fn started(&self) {
        if !self.has_ended() {
            let _ = self.events.send(StreamEvent::Start);
        }
    }

    pub fn finished(&self) {
        if self.end() {
            debug!(kind = %self.kind, "Sub-stream finished");
            let _ = self.events.send(StreamEvent::Finish);
        }
    }

    pub fn failed(&self, error: TransportError) {
        if self.end() {
            warn!(kind = %self.kind, error = %error, "Sub-stream failed");
            let _ = self.events.send(StreamEvent::Error(error));
        }
    }

    pub fn has_ended(&self) -> bool {
        self.ended.load(Ordering::Acquire)
    }

    /// Marks the stream ended; true for the caller that ended it.
    pub(crate) fn end(&self) -> bool {
        !self.ended.swap(true, Ordering::AcqRel)
    }

    /// Ends the stream locally, stopping the transport side if it was opened.
    pub(crate) fn stop(&self, stream: Option<&dyn MediaStream>) {
        if self.end() {
            if let Some(stream) = stream {
                stream.stop();
            }
            debug!(kind = %self.kind, "Sub-stream stopped");
            let _ = self.events.send(StreamEvent::Finish);
        }
    }

    pub(crate) fn same_stream(&self, other: &StreamReporter) -> bool {
        Arc::ptr_eq(&self.ended, &other.ended)
    }

    fn subscribe(&self) -> broadcast::Receiver<StreamEvent> {
        self.events.subscribe()
    }
}

/// A running sub-stream.
pub struct SubStream {
    reporter: StreamReporter,
    stream: Arc<dyn MediaStream>,
    paused: AtomicBool,
    volume: Mutex<f32>,
}

impl fmt::Debug for SubStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubStream")
            .field("kind", &self.kind())
            .field("active", &self.is_active())
            .field("paused", &self.is_paused())
            .finish_non_exhaustive()
    }
}

impl SubStream {
    pub(crate) fn new(reporter: StreamReporter, stream: Arc<dyn MediaStream>, volume: f32) -> Self {
        Self {
            reporter,
            stream,
            paused: AtomicBool::new(false),
            volume: Mutex::new(volume),
        }
    }

    pub fn kind(&self) -> StreamKind {
        self.reporter.kind
    }

    /// Subscribes to `Start`/`Finish`/`Error` notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StreamEvent> {
        self.reporter.subscribe()
    }

    pub fn is_active(&self) -> bool {
        !self.reporter.has_ended()
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub fn volume(&self) -> f32 {
        *self.volume.lock()
    }

    pub fn pause(&self) -> VoiceResult<()> {
        self.require_playback()?;
        if !self.paused.swap(true, Ordering::AcqRel) {
            self.stream.pause();
        }
        Ok(())
    }

    pub fn resume(&self) -> VoiceResult<()> {
        self.require_playback()?;
        if self.paused.swap(false, Ordering::AcqRel) {
            self.stream.resume();
        }
        Ok(())
    }

    /// Sets the playback volume; `1.0` is unchanged loudness.
    pub fn set_volume(&self, level: f32) -> VoiceResult<()> {
        self.require_playback()?;
        if !level.is_finite() || level < 0.0 {
            return Err(VoiceError::InvalidVolume(level));
        }
        *self.volume.lock() = level;
        self.stream.set_volume(level);
        Ok(())
    }

    /// Stops the stream. Safe to call repeatedly or after the stream ended.
    pub fn stop(&self) {
        self.reporter.stop(Some(self.stream.as_ref()));
    }

    fn require_playback(&self) -> VoiceResult<()> {
        match self.kind() {
            StreamKind::Playback => Ok(()),
            kind => Err(VoiceError::NotPlayback(kind)),
        }
    }
}
