use hearth_types::Snowflake;
use hearth_voice::transport::mock::MockTransport;
use hearth_voice::{
    JoinOptions, TransportError, VoiceError, VoiceManager, VoiceState, VoiceTarget,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

fn guild_target(channel: u64) -> VoiceTarget {
    VoiceTarget::new(Snowflake::new(1), Snowflake::new(channel))
}

/// Yields until the session for `context` reaches `state`.
async fn wait_for(manager: &VoiceManager, context: Snowflake, state: VoiceState) {
    for _ in 0..100 {
        if manager.session(context).map(|s| s.state()) == Some(state) {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("session for {context} never reached {state}");
}

#[tokio::test]
async fn join_returns_live_session() {
    let manager = VoiceManager::new(Arc::new(MockTransport::new()));
    let session = manager.join_channel(guild_target(10), JoinOptions::default()).await.unwrap();

    assert_eq!(session.state(), VoiceState::Connected);
    assert_eq!(manager.active_contexts(), vec![Snowflake::new(1)]);
    assert!(Arc::ptr_eq(&session, &manager.session(Snowflake::new(1)).unwrap()));
}

#[tokio::test]
async fn join_while_connecting_is_rejected_and_leaves_attempt_alone() {
    let (transport, gate) = MockTransport::gated();
    let transport = Arc::new(transport);
    let manager = Arc::new(VoiceManager::new(transport.clone()));

    let joining = {
        let manager = manager.clone();
        tokio::spawn(async move {
            manager.join_channel(guild_target(10), JoinOptions::default()).await
        })
    };
    wait_for(&manager, Snowflake::new(1), VoiceState::Connecting).await;
    let in_flight = manager.session(Snowflake::new(1)).unwrap();

    // Same guild, different channel: still the same context.
    let err = manager
        .join_channel(guild_target(11), JoinOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, VoiceError::AlreadyConnecting(ctx) if ctx == Snowflake::new(1)));
    assert_eq!(in_flight.state(), VoiceState::Connecting);
    assert_eq!(transport.connect_calls(), 1);

    gate.notify_one();
    let session = tokio::time::timeout(Duration::from_secs(5), joining)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(Arc::ptr_eq(&session, &in_flight));
    assert_eq!(session.state(), VoiceState::Connected);
    assert_eq!(session.target().channel_id, Snowflake::new(10));
}

#[tokio::test]
async fn join_while_connected_is_already_connected() {
    let manager = VoiceManager::new(Arc::new(MockTransport::new()));
    manager.join_channel(guild_target(10), JoinOptions::default()).await.unwrap();

    assert!(matches!(
        manager.join_channel(guild_target(10), JoinOptions::default()).await,
        Err(VoiceError::AlreadyConnected(_))
    ));
}

#[tokio::test]
async fn separate_contexts_connect_independently() {
    let manager = VoiceManager::new(Arc::new(MockTransport::new()));
    manager.join_channel(guild_target(10), JoinOptions::default()).await.unwrap();
    manager
        .join_channel(VoiceTarget::direct(Snowflake::new(500)), JoinOptions::default())
        .await
        .unwrap();

    assert_eq!(manager.active_contexts(), vec![Snowflake::new(1), Snowflake::new(500)]);
}

#[tokio::test]
async fn disconnect_during_handshake_fails_join_and_closes_late_connection() {
    let (transport, gate) = MockTransport::gated();
    let transport = Arc::new(transport);
    let manager = Arc::new(VoiceManager::new(transport.clone()));

    let joining = {
        let manager = manager.clone();
        tokio::spawn(async move {
            manager.join_channel(guild_target(10), JoinOptions::default()).await
        })
    };
    wait_for(&manager, Snowflake::new(1), VoiceState::Connecting).await;
    let session = manager.session(Snowflake::new(1)).unwrap();

    session.disconnect();
    assert_eq!(session.state(), VoiceState::Closed);
    session.disconnect();

    gate.notify_one();
    let result = tokio::time::timeout(Duration::from_secs(5), joining).await.unwrap().unwrap();
    assert!(matches!(result, Err(VoiceError::ConnectionFailed { .. })));
    assert!(transport.last_connection().unwrap().is_closed());
    assert_eq!(session.state(), VoiceState::Closed);
}

#[tokio::test]
async fn failed_join_can_be_retried() {
    let transport = Arc::new(MockTransport::new());
    transport.fail_next(TransportError::new("server unreachable"));
    let manager = VoiceManager::new(transport.clone());

    assert!(matches!(
        manager.join_channel(guild_target(10), JoinOptions::default()).await,
        Err(VoiceError::ConnectionFailed { .. })
    ));
    assert!(manager.active_contexts().is_empty());

    let session = manager.join_channel(guild_target(10), JoinOptions::default()).await.unwrap();
    assert_eq!(session.state(), VoiceState::Connected);
    assert_eq!(transport.connect_calls(), 2);
}

#[tokio::test]
async fn manager_disconnect_forgets_session() {
    let transport = Arc::new(MockTransport::new());
    let manager = VoiceManager::new(transport.clone());
    let session = manager.join_channel(guild_target(10), JoinOptions::default()).await.unwrap();

    manager.disconnect(Snowflake::new(1));
    manager.disconnect(Snowflake::new(1));

    assert_eq!(session.state(), VoiceState::Closed);
    assert!(manager.session(Snowflake::new(1)).is_none());
    assert!(transport.last_connection().unwrap().is_closed());
}

#[tokio::test]
async fn disconnect_all_closes_everything() {
    let transport = Arc::new(MockTransport::new());
    let manager = VoiceManager::new(transport.clone());
    manager.join_channel(guild_target(10), JoinOptions::default()).await.unwrap();
    manager
        .join_channel(VoiceTarget::direct(Snowflake::new(500)), JoinOptions::default())
        .await
        .unwrap();

    manager.disconnect_all();

    assert!(manager.active_contexts().is_empty());
    assert!(transport.connections().iter().all(|c| c.is_closed()));
}

#[tokio::test]
async fn timed_out_join_can_be_retried() {
    let (transport, gate) = MockTransport::gated();
    let transport = Arc::new(transport);
    let manager = VoiceManager::new(transport.clone());

    let timed_out = tokio::time::timeout(
        Duration::from_millis(50),
        manager.join_channel(guild_target(10), JoinOptions::default()),
    )
    .await;
    assert!(timed_out.is_err());

    let abandoned = manager.session(Snowflake::new(1)).unwrap();
    assert_eq!(abandoned.state(), VoiceState::Closed);
    assert!(manager.active_contexts().is_empty());

    // Stores a permit so the next handshake completes at once.
    gate.notify_one();
    let session = tokio::time::timeout(
        Duration::from_secs(5),
        manager.join_channel(guild_target(10), JoinOptions::default()),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(session.state(), VoiceState::Connected);
    assert!(!Arc::ptr_eq(&session, &abandoned));
    assert_eq!(transport.connect_calls(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_joins_start_a_single_handshake() {
    const JOINS: usize = 8;

    let (transport, gate) = MockTransport::gated();
    let transport = Arc::new(transport);
    let manager = Arc::new(VoiceManager::new(transport.clone()));
    let (results, mut received) = tokio::sync::mpsc::unbounded_channel();

    for _ in 0..JOINS {
        let manager = manager.clone();
        let results = results.clone();
        tokio::spawn(async move {
            let result = manager.join_channel(guild_target(10), JoinOptions::default()).await;
            let _ = results.send(result);
        });
    }

    // Every join but the one holding the handshake is rejected without waiting on it.
    for _ in 1..JOINS {
        let result = tokio::time::timeout(Duration::from_secs(5), received.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(result, Err(VoiceError::AlreadyConnecting(_))));
    }
    assert_eq!(transport.connect_calls(), 1);

    gate.notify_one();
    let session = tokio::time::timeout(Duration::from_secs(5), received.recv())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(Arc::ptr_eq(&session, &manager.session(Snowflake::new(1)).unwrap()));

    manager.disconnect_all();
    assert!(transport.connections().iter().all(|c| c.is_closed()));
}
