//! Voice/video call state for a channel.
//!
//! A call stores its ringing participants as IDs only. [`CallState::ringing`]
//! resolves them against the user cache on every read, so a user who updates
//! after being added to the ringing list is always seen in their latest form.

use crate::api::CallApi;
use crate::cache::Lookup;
use crate::channel::Channel;
use crate::patch::{PatchDocument, Patchable};
use crate::user::User;
use hearth_types::Snowflake;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// Metadata and participant set of a call, keyed by its hosting channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallState {
    channel_id: Snowflake,
    region: Option<String>,
    ringing: BTreeSet<Snowflake>,
}

/// Calls and call states share one representation; see [`CallState`].
pub type Call = CallState;

impl CallState {
    /// ID of the channel hosting the call.
    pub fn channel_id(&self) -> Snowflake {
        self.channel_id
    }

    /// Voice region, absent until the server first reports one.
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// IDs of the participants currently being rung, ascending.
    pub fn ringing_ids(&self) -> impl Iterator<Item = Snowflake> + '_ {
        self.ringing.iter().copied()
    }

    pub fn is_ringing(&self, user_id: Snowflake) -> bool {
        self.ringing.contains(&user_id)
    }

    /// The hosting channel, if it is still cached.
    pub fn channel(&self, channels: &impl Lookup<Channel>) -> Option<Channel> {
        channels.lookup(&self.channel_id)
    }

    /// Every ringing participant mapped to its cached user.
    ///
    /// Participants missing from the user cache stay in the map as `None`,
    /// which tells "known participant, not cached" apart from "not a
    /// participant".
    pub fn ringing(&self, users: &impl Lookup<User>) -> BTreeMap<Snowflake, Option<User>> {
        self.ringing
            .iter()
            .map(|id| (*id, users.lookup(id)))
            .collect()
    }

    /// Ringing participants that are currently cached, resolved at read time.
    pub fn ringing_users(&self, users: &impl Lookup<User>) -> BTreeMap<Snowflake, User> {
        self.ringing
            .iter()
            .filter_map(|id| users.lookup(id).map(|user| (*id, user)))
            .collect()
    }

    /// Asks the server to move the call to `region`.
    ///
    /// Local state is left alone: the new region arrives through the regular
    /// update stream once the server applies it.
    pub async fn set_rtc_region<A>(&self, api: &A, region: &str) -> Result<(), A::Error>
    where
        A: CallApi + ?Sized,
    {
        info!(channel_id = %self.channel_id, region, "Requesting call region change");
        api.patch_call(self.channel_id, json!({ "region": region }))
            .await
    }

    /// Alias of [`set_rtc_region`](Self::set_rtc_region).
    pub async fn set_voice_region<A>(&self, api: &A, region: &str) -> Result<(), A::Error>
    where
        A: CallApi + ?Sized,
    {
        self.set_rtc_region(api, region).await
    }
}

impl Patchable for CallState {
    type Id = Snowflake;

    const ID_KEY: &'static str = "channel_id";

    fn id(&self) -> Snowflake {
        self.channel_id
    }

    fn with_id(channel_id: Snowflake) -> Self {
        Self {
            channel_id,
            region: None,
            ringing: BTreeSet::new(),
        }
    }

    fn patch(&mut self, doc: &PatchDocument) {
        doc.apply("region", &mut self.region);
        doc.apply("ringing", &mut self.ringing);
    }
}
