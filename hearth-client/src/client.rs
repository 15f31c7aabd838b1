//! The client context: caches, REST and voice behind one handle.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::gateway::{ClientEvent, GatewayEvent};
use crate::http::HttpApi;
use hearth_model::{Cache, CallState, Channel, Invite, PatchDocument, Patchable, Upsert, User};
use hearth_types::Snowflake;
use hearth_voice::{JoinOptions, MediaTransport, VoiceManager, VoiceSession, VoiceTarget};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shared client context.
///
/// Owns one cache per entity kind. Entities never hold a reference back to
/// the client; callers pass the caches they need as lookups.
pub struct Client {
    config: ClientConfig,
    api: HttpApi,
    voice: VoiceManager,
    users: Cache<User>,
    channels: Cache<Channel>,
    calls: Cache<CallState>,
    invites: Cache<Invite>,
    user_id: RwLock<Option<Snowflake>>,
}

impl Client {
    /// Builds a client, including the configured captcha solver.
    pub fn new(config: ClientConfig, transport: Arc<dyn MediaTransport>) -> ClientResult<Self> {
        let mut api = HttpApi::new(&config)?;
        if let Some(solver) = config.captcha.solver()? {
            api = api.with_solver(solver);
        }
        Ok(Self::with_api(config, api, transport))
    }

    /// Builds a client around an already configured REST client.
    pub fn with_api(
        config: ClientConfig,
        api: HttpApi,
        transport: Arc<dyn MediaTransport>,
    ) -> Self {
        Self {
            config,
            api,
            voice: VoiceManager::new(transport),
            users: Cache::new(),
            channels: Cache::new(),
            calls: Cache::new(),
            invites: Cache::new(),
            user_id: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api(&self) -> &HttpApi {
        &self.api
    }

    pub fn voice(&self) -> &VoiceManager {
        &self.voice
    }

    pub fn users(&self) -> &Cache<User> {
        &self.users
    }

    pub fn channels(&self) -> &Cache<Channel> {
        &self.channels
    }

    pub fn calls(&self) -> &Cache<CallState> {
        &self.calls
    }

    pub fn invites(&self) -> &Cache<Invite> {
        &self.invites
    }

    /// The logged-in user's ID, known after `READY`.
    pub fn user_id(&self) -> Option<Snowflake> {
        *self.user_id.read()
    }

    /// Applies one gateway event to the caches.
    ///
    /// Returns `Ok(None)` for events this client does not track.
    pub fn dispatch(&self, event: &GatewayEvent) -> ClientResult<Option<ClientEvent>> {
        debug!(event = %event.name, "Dispatching gateway event");

        let change = match event.name.as_str() {
            "READY" => self.handle_ready(event)?,
            "USER_UPDATE" => {
                let (old, new) = split(self.users.upsert(&document(event)?)?);
                ClientEvent::UserUpdate { old, new }
            }
            "CHANNEL_CREATE" => {
                let upsert = self.channels.upsert(&document(event)?)?;
                ClientEvent::ChannelCreate(upsert.current().clone())
            }
            "CHANNEL_UPDATE" => {
                let (old, new) = split(self.channels.upsert(&document(event)?)?);
                ClientEvent::ChannelUpdate { old, new }
            }
            "CHANNEL_DELETE" => {
                let id: Snowflake = event.require(Channel::ID_KEY)?;
                ClientEvent::ChannelDelete {
                    id,
                    channel: self.channels.remove(&id),
                }
            }
            "CALL_CREATE" => {
                ClientEvent::CallCreate(self.calls.upsert(&document(event)?)?.current().clone())
            }
            "CALL_UPDATE" => {
                let (old, new) = split(self.calls.upsert(&document(event)?)?);
                ClientEvent::CallUpdate { old, new }
            }
            "CALL_DELETE" => {
                let channel_id: Snowflake = event.require(CallState::ID_KEY)?;
                ClientEvent::CallDelete {
                    channel_id,
                    call: self.calls.remove(&channel_id),
                }
            }
            "INVITE_CREATE" => {
                ClientEvent::InviteCreate(self.invites.upsert(&document(event)?)?.current().clone())
            }
            "INVITE_DELETE" => {
                let code: String = event.require(Invite::ID_KEY)?;
                let invite = self.invites.remove(&code);
                ClientEvent::InviteDelete { code, invite }
            }
            other => {
                debug!(event = other, "Ignoring untracked gateway event");
                return Ok(None);
            }
        };

        Ok(Some(change))
    }

    /// `READY` replaces every cache with the session's initial state.
    fn handle_ready(&self, event: &GatewayEvent) -> ClientResult<ClientEvent> {
        let user = event
            .data
            .get("user")
            .cloned()
            .ok_or_else(|| event.malformed("missing `user`"))?;
        let user = User::from_snapshot(&PatchDocument::from_value(user)?)?;
        let user_id = user.id();

        self.users.clear();
        self.channels.clear();
        self.calls.clear();
        self.invites.clear();

        self.users.insert(user);
        let users = load_snapshots(&self.users, event.data.get("users"));
        let channels = load_snapshots(&self.channels, event.data.get("private_channels"));
        *self.user_id.write() = Some(user_id);

        info!(%user_id, users, channels, "Session ready");
        Ok(ClientEvent::Ready { user_id })
    }

    /// Asks the server to move the cached call in `channel_id` to `region`.
    pub async fn set_call_region(&self, channel_id: Snowflake, region: &str) -> ClientResult<()> {
        let call = self
            .calls
            .get(&channel_id)
            .ok_or(ClientError::CallNotCached(channel_id))?;
        call.set_rtc_region(&self.api, region).await
    }

    /// Joins voice in a cached channel, using the configured self state when
    /// `options` is `None`.
    pub async fn join_voice(
        &self,
        channel_id: Snowflake,
        options: Option<JoinOptions>,
    ) -> ClientResult<Arc<VoiceSession>> {
        let channel = self
            .channels
            .get(&channel_id)
            .ok_or(ClientError::ChannelNotCached(channel_id))?;
        if !channel.kind.is_voice_capable() {
            return Err(ClientError::NotVoiceChannel(channel_id));
        }

        let target = VoiceTarget::new(channel.voice_context(), channel_id);
        let options = options.unwrap_or(self.config.voice);
        Ok(self.voice.join_channel(target, options).await?)
    }
}

fn document(event: &GatewayEvent) -> ClientResult<PatchDocument> {
    Ok(PatchDocument::from_value(event.data.clone())?)
}

fn split<T>(upsert: Upsert<T>) -> (Option<T>, T) {
    match upsert {
        Upsert::Created(new) => (None, new),
        Upsert::Updated { old, new } => (Some(old), new),
    }
}

/// Upserts every object in `list`; malformed entries are skipped.
fn load_snapshots<T: Patchable>(cache: &Cache<T>, list: Option<&Value>) -> usize {
    let Some(Value::Array(items)) = list else {
        return 0;
    };
    let mut loaded = 0;
    for item in items {
        match PatchDocument::from_value(item.clone()).and_then(|doc| cache.upsert(&doc)) {
            Ok(_) => loaded += 1,
            Err(e) => warn!(error = %e, "Skipping malformed snapshot in READY"),
        }
    }
    loaded
}
