use hearth_types::Snowflake;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a voice session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceState {
    Idle,
    Connecting,
    Connected,
    /// Connected with at least one active sub-stream.
    Streaming,
    Disconnecting,
    Closed,
}

impl VoiceState {
    /// Connected, with or without active sub-streams.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Connected | Self::Streaming)
    }
}

impl fmt::Display for VoiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Streaming => "streaming",
            Self::Disconnecting => "disconnecting",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Where a session connects to.
///
/// At most one session exists per `context`: the guild for guild channels,
/// the channel itself for DMs and group DMs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoiceTarget {
    pub context: Snowflake,
    pub channel_id: Snowflake,
}

impl VoiceTarget {
    pub fn new(context: Snowflake, channel_id: Snowflake) -> Self {
        Self {
            context,
            channel_id,
        }
    }

    /// A DM or group DM call, where the channel is its own context.
    pub fn direct(channel_id: Snowflake) -> Self {
        Self::new(channel_id, channel_id)
    }
}

/// Self state announced when joining.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinOptions {
    pub self_mute: bool,
    pub self_deaf: bool,
    pub self_video: bool,
}
