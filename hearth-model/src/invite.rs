use crate::cache::Lookup;
use crate::channel::Channel;
use crate::patch::{PatchDocument, Patchable};
use crate::user::User;
use hearth_types::{InviteFlags, Snowflake};
use serde::Deserialize;

#[derive(Deserialize)]
struct PartialRef {
    id: Snowflake,
}

/// A cached invite, keyed by its code.
#[derive(Debug, Clone, PartialEq)]
pub struct Invite {
    code: String,
    pub channel_id: Option<Snowflake>,
    pub inviter_id: Option<Snowflake>,
    pub uses: u64,
    pub max_uses: u64,
    pub max_age: u64,
    pub temporary: bool,
    pub flags: InviteFlags,
}

impl Invite {
    pub fn code(&self) -> &str {
        &self.code
    }

    /// True if the invite grants guest membership.
    pub fn is_guest(&self) -> bool {
        self.flags.contains(InviteFlags::GUEST)
    }

    pub fn channel(&self, channels: &impl Lookup<Channel>) -> Option<Channel> {
        channels.lookup(&self.channel_id?)
    }

    pub fn inviter(&self, users: &impl Lookup<User>) -> Option<User> {
        users.lookup(&self.inviter_id?)
    }
}

impl Patchable for Invite {
    type Id = String;

    const ID_KEY: &'static str = "code";

    fn id(&self) -> String {
        self.code.clone()
    }

    fn with_id(code: String) -> Self {
        Self {
            code,
            channel_id: None,
            inviter_id: None,
            uses: 0,
            max_uses: 0,
            max_age: 0,
            temporary: false,
            flags: InviteFlags::empty(),
        }
    }

    fn patch(&mut self, doc: &PatchDocument) {
        doc.apply("channel_id", &mut self.channel_id);
        if !doc.contains("channel_id") {
            doc.apply_with("channel", &mut self.channel_id, |c: PartialRef| Some(c.id));
        }
        doc.apply_with("inviter", &mut self.inviter_id, |u: PartialRef| Some(u.id));
        doc.apply("uses", &mut self.uses);
        doc.apply("max_uses", &mut self.max_uses);
        doc.apply("max_age", &mut self.max_age);
        doc.apply("temporary", &mut self.temporary);
        doc.apply("flags", &mut self.flags);
    }
}
