use crate::cache::Lookup;
use crate::patch::{PatchDocument, Patchable};
use crate::user::User;
use hearth_types::{ChannelFlags, Snowflake};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Kind of a channel, from the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    GuildText,
    Dm,
    GuildVoice,
    GroupDm,
    GuildCategory,
    GuildStageVoice,
    /// A kind this client does not know about yet.
    Unknown(u8),
}

impl ChannelKind {
    /// True for channels that can host calls or voice sessions.
    pub fn is_voice_capable(&self) -> bool {
        matches!(
            self,
            Self::Dm | Self::GroupDm | Self::GuildVoice | Self::GuildStageVoice
        )
    }
}

impl From<u8> for ChannelKind {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::GuildText,
            1 => Self::Dm,
            2 => Self::GuildVoice,
            3 => Self::GroupDm,
            4 => Self::GuildCategory,
            13 => Self::GuildStageVoice,
            other => Self::Unknown(other),
        }
    }
}

/// Recipients arrive either as partial user objects or bare IDs.
#[derive(Deserialize)]
#[serde(untagged)]
enum RecipientRef {
    Object { id: Snowflake },
    Id(Snowflake),
}

impl RecipientRef {
    fn id(&self) -> Snowflake {
        match self {
            Self::Object { id } | Self::Id(id) => *id,
        }
    }
}

/// A cached channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    id: Snowflake,
    pub kind: ChannelKind,
    pub name: Option<String>,
    pub guild_id: Option<Snowflake>,
    pub rtc_region: Option<String>,
    pub recipient_ids: Vec<Snowflake>,
    pub flags: ChannelFlags,
}

impl Channel {
    /// Resolves every recipient against the user cache. Recipients that are
    /// not cached map to `None`.
    pub fn recipients(&self, users: &impl Lookup<User>) -> BTreeMap<Snowflake, Option<User>> {
        self.recipient_ids
            .iter()
            .map(|id| (*id, users.lookup(id)))
            .collect()
    }

    /// Guild the voice session for this channel is keyed by; DMs key by channel.
    pub fn voice_context(&self) -> Snowflake {
        self.guild_id.unwrap_or(self.id)
    }
}

impl Patchable for Channel {
    type Id = Snowflake;

    const ID_KEY: &'static str = "id";

    fn id(&self) -> Snowflake {
        self.id
    }

    fn with_id(id: Snowflake) -> Self {
        Self {
            id,
            kind: ChannelKind::GuildText,
            name: None,
            guild_id: None,
            rtc_region: None,
            recipient_ids: Vec::new(),
            flags: ChannelFlags::empty(),
        }
    }

    fn patch(&mut self, doc: &PatchDocument) {
        doc.apply_with("type", &mut self.kind, |kind: u8| ChannelKind::from(kind));
        doc.apply("name", &mut self.name);
        doc.apply("guild_id", &mut self.guild_id);
        doc.apply("rtc_region", &mut self.rtc_region);
        doc.apply("flags", &mut self.flags);
        doc.apply_with("recipients", &mut self.recipient_ids, |refs: Vec<RecipientRef>| {
            refs.iter().map(RecipientRef::id).collect()
        });
    }
}
