use async_trait::async_trait;
use hearth_model::{Cache, CallApi, CallState, Channel, Patchable, PatchDocument, User};
use hearth_types::Snowflake;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

fn doc(value: Value) -> PatchDocument {
    PatchDocument::from_value(value).unwrap()
}

fn user(id: u64, username: &str) -> User {
    User::from_snapshot(&doc(json!({"id": id.to_string(), "username": username}))).unwrap()
}

fn call(value: Value) -> CallState {
    CallState::from_snapshot(&doc(value)).unwrap()
}

// ── Construction & patching ─────────────────────────────────────

#[test]
fn region_absent_until_first_provided() {
    let state = call(json!({"channel_id": "10"}));
    assert_eq!(state.channel_id(), Snowflake::new(10));
    assert_eq!(state.region(), None);
    assert_eq!(state.ringing_ids().count(), 0);
}

#[test]
fn patch_updates_region_and_keeps_ringing() {
    let mut state = call(json!({"channel_id": "10", "region": "rotterdam", "ringing": ["1", "2"]}));
    state.patch(&doc(json!({"region": "singapore"})));

    assert_eq!(state.region(), Some("singapore"));
    assert_eq!(
        state.ringing_ids().collect::<Vec<_>>(),
        vec![Snowflake::new(1), Snowflake::new(2)]
    );
}

#[test]
fn patch_never_changes_channel_id() {
    let mut state = call(json!({"channel_id": "10"}));
    state.patch(&doc(json!({"channel_id": "99", "region": "us-west"})));
    assert_eq!(state.channel_id(), Snowflake::new(10));
}

#[test]
fn unknown_keys_are_ignored() {
    let mut state = call(json!({"channel_id": "10", "region": "a"}));
    state.patch(&doc(json!({"voice_states": [], "unavailable": false, "message_id": "5"})));
    assert_eq!(state.region(), Some("a"));
}

#[test]
fn empty_ringing_list_clears_participants() {
    let mut state = call(json!({"channel_id": "10", "ringing": ["1"]}));
    state.patch(&doc(json!({"ringing": []})));
    assert!(!state.is_ringing(Snowflake::new(1)));
}

#[test]
fn malformed_ringing_leaves_previous_set() {
    let mut state = call(json!({"channel_id": "10", "ringing": ["1"]}));
    state.patch(&doc(json!({"ringing": "everyone"})));
    assert!(state.is_ringing(Snowflake::new(1)));
}

// ── Lazy resolution ─────────────────────────────────────────────

#[test]
fn ringing_preserves_uncached_participants() {
    let users = Cache::new();
    users.insert(user(1, "alice"));

    let state = call(json!({"channel_id": "10", "ringing": ["1", "2"]}));
    let ringing = state.ringing(&users);

    assert_eq!(ringing.len(), 2);
    assert_eq!(
        ringing[&Snowflake::new(1)].as_ref().and_then(|u| u.username.clone()),
        Some("alice".to_string())
    );
    assert!(ringing[&Snowflake::new(2)].is_none());
}

#[test]
fn ringing_reflects_user_updates_after_patch() {
    let users = Cache::new();
    users.insert(user(1, "alice"));
    let state = call(json!({"channel_id": "10", "ringing": ["1"]}));

    users.patch(&Snowflake::new(1), &doc(json!({"username": "alice2"})));

    let resolved = state.ringing(&users);
    assert_eq!(
        resolved[&Snowflake::new(1)].as_ref().unwrap().username.as_deref(),
        Some("alice2")
    );
}

#[test]
fn ringing_users_filters_uncached() {
    let mut users: HashMap<Snowflake, User> = HashMap::new();
    users.insert(Snowflake::new(2), user(2, "bob"));

    let state = call(json!({"channel_id": "10", "ringing": ["1", "2"]}));
    let cached = state.ringing_users(&users);

    assert_eq!(cached.len(), 1);
    assert!(cached.contains_key(&Snowflake::new(2)));
}

#[test]
fn channel_lookup_is_not_memoized() {
    let channels: Cache<Channel> = Cache::new();
    let state = call(json!({"channel_id": "10"}));
    assert!(state.channel(&channels).is_none());

    channels
        .upsert(&doc(json!({"id": "10", "type": 1, "name": "dm"})))
        .unwrap();
    assert_eq!(
        state.channel(&channels).and_then(|c| c.name),
        Some("dm".to_string())
    );

    channels.remove(&Snowflake::new(10));
    assert!(state.channel(&channels).is_none());
}

// ── Region requests ─────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("rejected")]
struct Rejected;

#[derive(Default)]
struct RecordingApi {
    calls: Mutex<Vec<(Snowflake, Value)>>,
    fail: bool,
}

#[async_trait]
impl CallApi for RecordingApi {
    type Error = Rejected;

    async fn patch_call(&self, channel_id: Snowflake, body: Value) -> Result<(), Rejected> {
        self.calls.lock().unwrap().push((channel_id, body));
        if self.fail { Err(Rejected) } else { Ok(()) }
    }
}

#[tokio::test]
async fn set_rtc_region_sends_patch_without_local_write() {
    let api = RecordingApi::default();
    let state = call(json!({"channel_id": "10", "region": "old"}));

    state.set_rtc_region(&api, "japan").await.unwrap();

    assert_eq!(state.region(), Some("old"));
    let calls = api.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, Snowflake::new(10));
    assert_eq!(calls[0].1, json!({"region": "japan"}));
}

#[tokio::test]
async fn set_voice_region_surfaces_api_errors() {
    let api = RecordingApi {
        fail: true,
        ..Default::default()
    };
    let state = call(json!({"channel_id": "10"}));
    assert!(state.set_voice_region(&api, "brazil").await.is_err());
}
