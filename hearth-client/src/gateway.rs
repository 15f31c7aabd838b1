//! Gateway dispatch payloads and the change events they produce.

use crate::error::{ClientError, ClientResult};
use hearth_model::{CallState, Channel, Invite, User};
use hearth_types::Snowflake;
use serde::Deserialize;
use serde_json::Value;

/// One dispatched gateway event: `{"t": name, "d": data}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GatewayEvent {
    #[serde(rename = "t")]
    pub name: String,
    #[serde(rename = "d", default)]
    pub data: Value,
}

impl GatewayEvent {
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Parses a raw dispatch frame.
    pub fn from_frame(frame: &str) -> ClientResult<Self> {
        Ok(serde_json::from_str(frame)?)
    }

    /// Reads a required identity field from the payload.
    pub(crate) fn require<T: for<'de> Deserialize<'de>>(&self, key: &str) -> ClientResult<T> {
        let value = self.data.get(key).ok_or_else(|| self.malformed(format!("missing `{key}`")))?;
        T::deserialize(value).map_err(|e| self.malformed(format!("invalid `{key}`: {e}")))
    }

    pub(crate) fn malformed(&self, reason: impl Into<String>) -> ClientError {
        ClientError::MalformedEvent {
            event: self.name.clone(),
            reason: reason.into(),
        }
    }
}

/// Cache change produced by dispatching a [`GatewayEvent`].
///
/// Update variants carry the entity before and after the patch; `old` is
/// `None` when the entity was not cached yet.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Ready {
        user_id: Snowflake,
    },
    UserUpdate {
        old: Option<User>,
        new: User,
    },
    ChannelCreate(Channel),
    ChannelUpdate {
        old: Option<Channel>,
        new: Channel,
    },
    ChannelDelete {
        id: Snowflake,
        channel: Option<Channel>,
    },
    CallCreate(CallState),
    CallUpdate {
        old: Option<CallState>,
        new: CallState,
    },
    CallDelete {
        channel_id: Snowflake,
        call: Option<CallState>,
    },
    InviteCreate(Invite),
    InviteDelete {
        code: String,
        invite: Option<Invite>,
    },
}
