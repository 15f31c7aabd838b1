use hearth_model::{Cache, CallState, Patchable, PatchDocument, Upsert, User};
use hearth_types::Snowflake;
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::thread;

fn doc(value: Value) -> PatchDocument {
    PatchDocument::from_value(value).unwrap()
}

// ── Upsert / patch ──────────────────────────────────────────────

#[test]
fn upsert_creates_then_updates() {
    let cache: Cache<User> = Cache::new();

    let created = cache.upsert(&doc(json!({"id": "1", "username": "a"}))).unwrap();
    assert!(matches!(created, Upsert::Created(_)));

    let updated = cache.upsert(&doc(json!({"id": "1", "username": "b"}))).unwrap();
    match updated {
        Upsert::Updated { old, new } => {
            assert_eq!(old.username.as_deref(), Some("a"));
            assert_eq!(new.username.as_deref(), Some("b"));
        }
        Upsert::Created(_) => panic!("expected update"),
    }
    assert_eq!(cache.len(), 1);
}

#[test]
fn upsert_without_identity_fails() {
    let cache: Cache<CallState> = Cache::new();
    assert!(cache.upsert(&doc(json!({"region": "x"}))).is_err());
    assert!(cache.is_empty());
}

#[test]
fn patch_on_missing_entity_is_dropped() {
    let cache: Cache<User> = Cache::new();
    assert!(cache.patch(&Snowflake::new(1), &doc(json!({"username": "a"}))).is_none());
    assert!(cache.is_empty());
}

#[test]
fn get_returns_snapshot_not_live_view() {
    let cache: Cache<User> = Cache::new();
    cache.upsert(&doc(json!({"id": "1", "username": "a"}))).unwrap();

    let snapshot = cache.get(&Snowflake::new(1)).unwrap();
    cache.patch(&Snowflake::new(1), &doc(json!({"username": "b"})));

    assert_eq!(snapshot.username.as_deref(), Some("a"));
    assert_eq!(cache.get(&Snowflake::new(1)).unwrap().username.as_deref(), Some("b"));
}

#[test]
fn remove_and_clear() {
    let cache: Cache<User> = Cache::new();
    cache.upsert(&doc(json!({"id": "1"}))).unwrap();
    cache.upsert(&doc(json!({"id": "2"}))).unwrap();

    assert!(cache.remove(&Snowflake::new(1)).is_some());
    assert!(cache.remove(&Snowflake::new(1)).is_none());
    assert_eq!(cache.ids(), vec![Snowflake::new(2)]);

    cache.clear();
    assert!(cache.values().is_empty());
}

#[test]
fn readers_never_observe_partial_patches() {
    let cache: Arc<Cache<CallState>> = Arc::new(Cache::new());
    cache
        .upsert(&doc(json!({"channel_id": "1", "region": "r0", "ringing": ["1000"]})))
        .unwrap();

    let writer = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || {
            for n in 1..500u64 {
                let patch = doc(json!({
                    "region": format!("r{n}"),
                    "ringing": [(1000 + n).to_string()]
                }));
                cache.patch(&Snowflake::new(1), &patch);
            }
        })
    };

    for _ in 0..500 {
        let state = cache.get(&Snowflake::new(1)).unwrap();
        let n: u64 = state.region().unwrap()[1..].parse().unwrap();
        let ringing: Vec<_> = state.ringing_ids().collect();
        assert_eq!(ringing, vec![Snowflake::new(1000 + n)]);
    }

    writer.join().unwrap();
}

// ── Properties ──────────────────────────────────────────────────

fn user_fields() -> impl Strategy<Value = Map<String, Value>> {
    let username = prop::option::of("[a-z]{1,8}").prop_map(|v| v.map(Value::from));
    let global = prop::option::of("[A-Z][a-z]{0,8}").prop_map(|v| v.map(Value::from));
    let bot = prop::option::of(any::<bool>()).prop_map(|v| v.map(Value::from));
    (username, global, bot).prop_map(|(username, global, bot)| {
        let mut map = Map::new();
        if let Some(v) = username {
            map.insert("username".into(), v);
        }
        if let Some(v) = global {
            map.insert("global_name".into(), v);
        }
        if let Some(v) = bot {
            map.insert("bot".into(), v);
        }
        map
    })
}

proptest! {
    #[test]
    fn absent_fields_keep_previous_values(d1 in user_fields(), d2 in user_fields()) {
        let mut user = User::with_id(Snowflake::new(1));
        user.patch(&PatchDocument::new(d1.clone()));
        let after_first = user.clone();
        user.patch(&PatchDocument::new(d2.clone()));

        if !d2.contains_key("username") {
            prop_assert_eq!(&user.username, &after_first.username);
        }
        if !d2.contains_key("global_name") {
            prop_assert_eq!(&user.global_name, &after_first.global_name);
        }
        if !d2.contains_key("bot") {
            prop_assert_eq!(user.bot, after_first.bot);
        }
        prop_assert_eq!(user.id(), Snowflake::new(1));
    }
}
