use hearth_client::{Client, ClientConfig, ClientError, ClientEvent, GatewayEvent};
use hearth_model::Patchable;
use hearth_types::Snowflake;
use hearth_voice::transport::mock::MockTransport;
use hearth_voice::{JoinOptions, VoiceError, VoiceState};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn client() -> (Client, Arc<MockTransport>) {
    let transport = Arc::new(MockTransport::new());
    let client = Client::new(ClientConfig::default(), transport.clone()).unwrap();
    (client, transport)
}

fn dispatch(client: &Client, name: &str, data: serde_json::Value) -> Option<ClientEvent> {
    client.dispatch(&GatewayEvent::new(name, data)).unwrap()
}

fn ready(client: &Client) {
    dispatch(
        client,
        "READY",
        json!({
            "user": {"id": "1", "username": "me"},
            "users": [
                {"id": "11", "username": "alice"},
                {"id": "12", "username": "bob"},
                {"username": "no id"}
            ],
            "private_channels": [
                {"id": "300", "type": 1, "recipients": ["11"]},
                {"id": "301", "type": 3, "recipients": [{"id": "11"}, {"id": "12"}]}
            ],
            "session_id": "abc"
        }),
    );
}

// ── READY ───────────────────────────────────────────────────────

#[test]
fn ready_loads_snapshots() {
    let (client, _) = client();
    ready(&client);

    assert_eq!(client.user_id(), Some(Snowflake::new(1)));
    assert_eq!(client.users().len(), 3);
    assert_eq!(client.channels().len(), 2);
    let group = client.channels().get(&Snowflake::new(301)).unwrap();
    assert_eq!(group.recipient_ids, vec![Snowflake::new(11), Snowflake::new(12)]);
}

#[test]
fn ready_without_user_is_malformed() {
    let (client, _) = client();
    let err = client
        .dispatch(&GatewayEvent::new("READY", json!({"users": []})))
        .unwrap_err();
    assert!(matches!(err, ClientError::MalformedEvent { ref event, .. } if event == "READY"));
}

#[test]
fn frames_parse_into_events() {
    let frame = r#"{"op":0,"s":4,"t":"CALL_DELETE","d":{"channel_id":"300"}}"#;
    let event = GatewayEvent::from_frame(frame).unwrap();
    assert_eq!(event.name, "CALL_DELETE");
    assert_eq!(event.data, json!({"channel_id": "300"}));
}

// ── Calls ───────────────────────────────────────────────────────

#[test]
fn call_update_keeps_fields_absent_from_patch() {
    let (client, _) = client();
    ready(&client);

    let created = dispatch(
        &client,
        "CALL_CREATE",
        json!({"channel_id": "300", "region": "us-east", "ringing": ["11", "12"]}),
    );
    assert!(matches!(
        created,
        Some(ClientEvent::CallCreate(ref call)) if call.region() == Some("us-east")
    ));

    let Some(ClientEvent::CallUpdate { old, new }) =
        dispatch(&client, "CALL_UPDATE", json!({"channel_id": "300", "region": "rotterdam"}))
    else {
        panic!("expected a call update");
    };

    assert_eq!(old.unwrap().region(), Some("us-east"));
    assert_eq!(new.region(), Some("rotterdam"));
    assert!(new.is_ringing(Snowflake::new(11)));
    assert!(new.is_ringing(Snowflake::new(12)));
}

#[test]
fn ringing_resolves_against_current_user_cache() {
    let (client, _) = client();
    ready(&client);
    dispatch(&client, "CALL_CREATE", json!({"channel_id": "300", "ringing": ["11", "99"]}));
    dispatch(&client, "USER_UPDATE", json!({"id": "11", "username": "alice2"}));

    let call = client.calls().get(&Snowflake::new(300)).unwrap();
    let ringing = call.ringing(client.users());

    assert_eq!(ringing.len(), 2);
    assert_eq!(
        ringing[&Snowflake::new(11)].as_ref().unwrap().username.as_deref(),
        Some("alice2")
    );
    assert!(ringing[&Snowflake::new(99)].is_none());
    assert_eq!(call.channel(client.channels()).unwrap().id(), Snowflake::new(300));
}

#[test]
fn call_delete_evicts_call() {
    let (client, _) = client();
    dispatch(&client, "CALL_CREATE", json!({"channel_id": "300"}));

    let deleted = dispatch(&client, "CALL_DELETE", json!({"channel_id": "300"}));
    assert!(matches!(
        deleted,
        Some(ClientEvent::CallDelete { channel_id, call: Some(_) })
            if channel_id == Snowflake::new(300)
    ));
    assert!(client.calls().is_empty());

    let again = dispatch(&client, "CALL_DELETE", json!({"channel_id": "300"}));
    assert!(matches!(again, Some(ClientEvent::CallDelete { call: None, .. })));
}

#[tokio::test]
async fn set_call_region_needs_cached_call() {
    let (client, _) = client();
    assert!(matches!(
        client.set_call_region(Snowflake::new(300), "us-west").await,
        Err(ClientError::CallNotCached(_))
    ));
}

// ── Users, channels, invites ────────────────────────────────────

#[test]
fn user_update_reports_old_and_new() {
    let (client, _) = client();
    ready(&client);

    let Some(ClientEvent::UserUpdate { old, new }) =
        dispatch(&client, "USER_UPDATE", json!({"id": "12", "global_name": "Bobby"}))
    else {
        panic!("expected a user update");
    };
    assert_eq!(old.unwrap().global_name, None);
    assert_eq!(new.display_name(), Some("Bobby"));
    assert_eq!(new.username.as_deref(), Some("bob"));
}

#[test]
fn channel_lifecycle() {
    let (client, _) = client();

    let created = dispatch(
        &client,
        "CHANNEL_CREATE",
        json!({"id": "400", "type": 2, "guild_id": "7"}),
    );
    assert!(matches!(created, Some(ClientEvent::ChannelCreate(_))));

    let Some(ClientEvent::ChannelUpdate { old, new }) =
        dispatch(&client, "CHANNEL_UPDATE", json!({"id": "400", "name": "lounge"}))
    else {
        panic!("expected a channel update");
    };
    assert_eq!(old.unwrap().name, None);
    assert_eq!(new.name.as_deref(), Some("lounge"));
    assert_eq!(new.guild_id, Some(Snowflake::new(7)));

    let deleted = dispatch(&client, "CHANNEL_DELETE", json!({"id": "400"}));
    assert!(matches!(deleted, Some(ClientEvent::ChannelDelete { channel: Some(_), .. })));
    assert!(client.channels().is_empty());
}

#[test]
fn delete_without_identity_is_malformed() {
    let (client, _) = client();
    let err = client
        .dispatch(&GatewayEvent::new("CHANNEL_DELETE", json!({})))
        .unwrap_err();
    assert!(matches!(err, ClientError::MalformedEvent { .. }));
}

#[test]
fn invite_lifecycle() {
    let (client, _) = client();

    let created = dispatch(
        &client,
        "INVITE_CREATE",
        json!({"code": "hearth", "channel_id": "300", "inviter": {"id": "11"}, "flags": 1}),
    );
    let Some(ClientEvent::InviteCreate(invite)) = created else {
        panic!("expected an invite");
    };
    assert!(invite.is_guest());
    assert_eq!(invite.inviter_id, Some(Snowflake::new(11)));

    let deleted = dispatch(
        &client,
        "INVITE_DELETE",
        json!({"code": "hearth", "channel_id": "300"}),
    );
    assert!(matches!(
        deleted,
        Some(ClientEvent::InviteDelete { ref code, invite: Some(_) }) if code == "hearth"
    ));
}

#[test]
fn untracked_events_are_ignored() {
    let (client, _) = client();
    assert_eq!(dispatch(&client, "TYPING_START", json!({"channel_id": "1"})), None);
}

// ── Voice ───────────────────────────────────────────────────────

#[tokio::test]
async fn join_voice_in_dm_keys_by_channel() {
    let (client, transport) = client();
    ready(&client);

    let session = client.join_voice(Snowflake::new(300), None).await.unwrap();

    assert_eq!(session.state(), VoiceState::Connected);
    assert_eq!(session.target().context, Snowflake::new(300));
    assert_eq!(transport.last_connection().unwrap().options(), JoinOptions::default());
}

#[tokio::test]
async fn join_voice_in_guild_keys_by_guild() {
    let mut config = ClientConfig::default();
    config.voice.self_mute = true;
    let transport = Arc::new(MockTransport::new());
    let client = Client::new(config, transport.clone()).unwrap();
    dispatch(&client, "CHANNEL_CREATE", json!({"id": "400", "type": 2, "guild_id": "7"}));
    dispatch(&client, "CHANNEL_CREATE", json!({"id": "401", "type": 2, "guild_id": "7"}));

    let session = client.join_voice(Snowflake::new(400), None).await.unwrap();
    assert_eq!(session.target().context, Snowflake::new(7));
    assert!(transport.last_connection().unwrap().options().self_mute);

    let err = client.join_voice(Snowflake::new(401), None).await.unwrap_err();
    assert!(matches!(err, ClientError::Voice(VoiceError::AlreadyConnected(_))));
}

#[tokio::test]
async fn join_voice_rejects_text_and_unknown_channels() {
    let (client, _) = client();
    dispatch(&client, "CHANNEL_CREATE", json!({"id": "500", "type": 0, "guild_id": "7"}));

    assert!(matches!(
        client.join_voice(Snowflake::new(500), None).await,
        Err(ClientError::NotVoiceChannel(_))
    ));
    assert!(matches!(
        client.join_voice(Snowflake::new(501), None).await,
        Err(ClientError::ChannelNotCached(_))
    ));
}
