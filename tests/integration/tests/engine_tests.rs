//! Engine integration tests
//!
//! These compose the full view model over the in-memory store and exercise
//! the end-to-end flows: multi-participant chat, leaderboard derivation
//! under churn, settings merge semantics, and validation short-circuits.
//!
//! Run with: cargo test -p integration-tests --test engine_tests

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use integration_tests::{doc, join_group, new_group, wait_until, SlowLookupStore};
use study_common::StoreConfig;
use study_core::traits::DocumentStore;
use study_core::{SettingKey, SyncError, UserId};
use study_engine::{session_channel, GroupViewModel};

// ============================================================================
// Chat Tests
// ============================================================================

#[tokio::test]
async fn test_two_participants_share_ordered_chat() {
    let store = new_group();
    let (_alice_session, alice) = join_group(&store, "alice");
    let (_bob_session, bob) = join_group(&store, "bob");

    alice.send_message("hi bob").await.unwrap();
    bob.send_message("hi alice").await.unwrap();

    let mut alice_rx = alice.messages();
    let mut bob_rx = bob.messages();

    let seen_by_alice = wait_until(&mut alice_rx, |m| m.len() == 2).await;
    let seen_by_bob = wait_until(&mut bob_rx, |m| m.len() == 2).await;

    // both participants converge on the same ordered log
    assert_eq!(seen_by_alice, seen_by_bob);
    assert_eq!(seen_by_alice[0].body.as_text(), "hi bob");
    assert_eq!(seen_by_alice[1].body.as_text(), "hi alice");
}

#[tokio::test]
async fn test_out_of_order_delivery_emits_sorted_log() {
    let store = new_group();
    let (_session, vm) = join_group(&store, "watcher");
    let mut rx = vm.messages();

    // seeded newest-first; emitted list must be ascending by timestamp
    for (body, at) in [
        ("third", "2026-03-01T12:00:00Z"),
        ("first", "2026-03-01T09:00:00Z"),
        ("second", "2026-03-01T10:30:00Z"),
    ] {
        store
            .append_document(
                "globalChat",
                doc(&[
                    ("sender", json!("seed")),
                    ("message", json!(body)),
                    ("timestamp", json!(at)),
                ]),
            )
            .await
            .unwrap();
    }

    let messages = wait_until(&mut rx, |m| m.len() == 3).await;
    let bodies: Vec<&str> = messages.iter().map(|m| m.body.as_text()).collect();
    assert_eq!(bodies, ["first", "second", "third"]);
}

#[tokio::test]
async fn test_rejected_sends_issue_zero_writes() {
    let store = new_group();
    let (_session, vm) = join_group(&store, "alice");

    assert!(matches!(
        vm.send_message("").await.unwrap_err(),
        SyncError::EmptyMessage
    ));
    assert!(matches!(
        vm.send_message("   ").await.unwrap_err(),
        SyncError::EmptyMessage
    ));
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_failed_send_keeps_existing_view() {
    let store = new_group();
    let (_session, vm) = join_group(&store, "alice");

    vm.send_message("first").await.unwrap();
    let mut rx = vm.messages();
    wait_until(&mut rx, |m| m.len() == 1).await;

    store.set_fail_writes(true);
    let err = vm.send_message("second").await.unwrap_err();
    assert!(err.is_transport());

    // the existing log is untouched; the caller retries with the kept body
    let state = vm.snapshot();
    assert_eq!(state.messages.len(), 1);
    assert_eq!(state.messages[0].body.as_text(), "first");

    store.set_fail_writes(false);
    vm.send_message("second").await.unwrap();
    wait_until(&mut rx, |m| m.len() == 2).await;
}

// ============================================================================
// Leaderboard Tests
// ============================================================================

#[tokio::test]
async fn test_group_statistics_scenario() {
    let store = new_group();
    store
        .put_merge(
            "statistics",
            "default",
            doc(&[("totalTimeStudied", json!("10:00:00"))]),
        )
        .await
        .unwrap();
    store
        .put_merge(
            "statistics",
            "alice",
            doc(&[("totalTimeStudied", json!("01:30:00")), ("likes", json!(2))]),
        )
        .await
        .unwrap();
    store
        .put_merge(
            "statistics",
            "bob",
            doc(&[("totalTimeStudied", json!("02:00:00")), ("likes", json!(0))]),
        )
        .await
        .unwrap();

    let (_session, vm) = join_group(&store, "carol");
    let mut rx = vm.leaderboard();

    let view = wait_until(&mut rx, |v| v.entries.len() == 2).await;
    assert_eq!(view.entries[0].uid.as_str(), "bob");
    assert_eq!(view.entries[0].minutes_studied.whole_minutes(), 120);
    assert_eq!(view.entries[1].uid.as_str(), "alice");
    assert_eq!(view.entries[1].minutes_studied.whole_minutes(), 90);
    assert_eq!(view.entries[1].likes, 2);
    assert_eq!(view.totals.minutes_studied.whole_minutes(), 600);
    assert!(view.entry(&UserId::new("default")).is_none());
}

#[tokio::test]
async fn test_unknown_user_renders_with_fallbacks() {
    let store = new_group();
    store
        .put_merge("statistics", "ghost", doc(&[("totalTimeStudied", json!(15))]))
        .await
        .unwrap();

    let (_session, vm) = join_group(&store, "alice");
    let mut rx = vm.leaderboard();

    let view = wait_until(&mut rx, |v| v.entries.len() == 1).await;
    assert_eq!(view.entries[0].username, "ghost");
    assert!(view.entries[0].trophy_glyphs.is_empty());
}

#[tokio::test]
async fn test_concurrent_likes_from_many_participants() {
    let store = new_group();
    store
        .put_merge("statistics", "star", doc(&[("likes", json!(5))]))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let (_session, vm) = join_group(&store, &format!("fan-{i}"));
            vm.like(&UserId::new("star")).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let snap = store.get_document("statistics", "star").await.unwrap().unwrap();
    assert_eq!(snap.field("likes"), Some(&json!(13)));
}

#[tokio::test]
async fn test_self_like_rejected_before_any_write() {
    let store = new_group();
    let (_session, vm) = join_group(&store, "alice");

    let err = vm.like(&UserId::new("alice")).await.unwrap_err();
    assert!(matches!(err, SyncError::SelfTarget(_)));
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_rename_appears_after_next_derivation() {
    let store = new_group();
    store
        .put_merge("statistics", "alice", doc(&[("totalTimeStudied", json!(10))]))
        .await
        .unwrap();

    let (_session, vm) = join_group(&store, "alice");
    let mut rx = vm.leaderboard();
    wait_until(&mut rx, |v| v.entries.len() == 1).await;

    vm.set_username("Alice the Great").await.unwrap();
    // a statistics change triggers the next full re-join
    store
        .put_merge("statistics", "alice", doc(&[("totalTimeStudied", json!(11))]))
        .await
        .unwrap();

    let view = wait_until(&mut rx, |v| {
        v.entries
            .first()
            .is_some_and(|e| e.username == "Alice the Great")
    })
    .await;
    assert_eq!(view.entries[0].minutes_studied.whole_minutes(), 11);
}

#[tokio::test]
async fn test_stale_derivation_never_overwrites_newer_view() {
    let raw = new_group();
    // the first profile lookup stalls; the follow-up notification's
    // derivation overtakes it
    let store: Arc<dyn DocumentStore> = Arc::new(SlowLookupStore::new(
        raw.clone(),
        "users",
        Duration::from_millis(400),
    ));
    let (handle, session) = session_channel();
    handle.sign_in("watcher");
    let vm = GroupViewModel::new(store, session, StoreConfig::default());
    let mut rx = vm.leaderboard();

    raw.put_merge("statistics", "alice", doc(&[("totalTimeStudied", json!(10))]))
        .await
        .unwrap();
    // let the slow derivation begin before superseding it
    tokio::time::sleep(Duration::from_millis(100)).await;
    raw.put_merge("statistics", "alice", doc(&[("totalTimeStudied", json!(20))]))
        .await
        .unwrap();

    let view = wait_until(&mut rx, |v| {
        v.entries
            .first()
            .is_some_and(|e| e.minutes_studied.whole_minutes() == 20)
    })
    .await;
    let settled = view.generation;

    // give the stalled derivation time to complete; it must be discarded
    tokio::time::sleep(Duration::from_millis(500)).await;
    let after = vm.snapshot().leaderboard;
    assert_eq!(
        after
            .entries
            .first()
            .map(|e| e.minutes_studied.whole_minutes()),
        Some(20)
    );
    assert!(after.generation >= settled);
}

// ============================================================================
// Settings Tests
// ============================================================================

#[tokio::test]
async fn test_settings_reach_all_participants_without_refresh() {
    let store = new_group();
    let (_alice_session, alice) = join_group(&store, "alice");
    let (_bob_session, bob) = join_group(&store, "bob");

    alice.set_setting(SettingKey::ShowTrophies, false).await.unwrap();

    let mut bob_rx = bob.settings();
    let settings = wait_until(&mut bob_rx, |s| !s.show_trophies).await;
    assert!(!settings.show_trophies);
}

#[tokio::test]
async fn test_toggle_round_trip_preserves_concurrent_sibling_edit() {
    let store = new_group();
    let (_alice_session, alice) = join_group(&store, "alice");
    let (_bob_session, bob) = join_group(&store, "bob");

    alice
        .set_setting(SettingKey::EnableLeaderboard, false)
        .await
        .unwrap();
    // bob edits a sibling toggle while alice's panel is off
    bob.set_setting(SettingKey::EnableSharedCoins, true).await.unwrap();
    alice
        .set_setting(SettingKey::EnableLeaderboard, true)
        .await
        .unwrap();

    let mut rx = alice.settings();
    let settings =
        wait_until(&mut rx, |s| s.enable_leaderboard && s.enable_shared_coins).await;
    assert!(settings.enable_leaderboard);
    assert!(settings.enable_shared_coins);
}

#[tokio::test]
async fn test_disabled_panel_stays_subscribed() {
    let store = new_group();
    let (_session, vm) = join_group(&store, "alice");

    vm.set_setting(SettingKey::EnableLeaderboard, false).await.unwrap();

    // statistics keep flowing while the panel is hidden
    store
        .put_merge("statistics", "bob", doc(&[("totalTimeStudied", json!(30))]))
        .await
        .unwrap();
    let mut rx = vm.leaderboard();
    wait_until(&mut rx, |v| !v.entries.is_empty()).await;

    // so re-enabling shows current data immediately, no refetch involved
    vm.set_setting(SettingKey::EnableLeaderboard, true).await.unwrap();
    let state = vm.snapshot();
    assert!(state.panel_visible(SettingKey::EnableLeaderboard));
    assert_eq!(state.leaderboard.entries[0].uid.as_str(), "bob");
}

// ============================================================================
// Profile Tests
// ============================================================================

#[tokio::test]
async fn test_display_name_updates_live_across_engine() {
    let store = new_group();
    let (_session, vm) = join_group(&store, "alice");

    let mut display = vm.display_name();
    wait_until(&mut display, |n| n.as_deref() == Some("alice")).await;

    vm.set_username("Alice").await.unwrap();
    wait_until(&mut display, |n| n.as_deref() == Some("Alice")).await;

    // subsequent messages are stamped with the new name
    vm.send_message("renamed").await.unwrap();
    let mut rx = vm.messages();
    let messages = wait_until(&mut rx, |m| m.len() == 1).await;
    assert_eq!(messages[0].sender_display_name, "Alice");
}

#[tokio::test]
async fn test_teardown_releases_subscriptions() {
    let store = new_group();
    let (_session, vm) = join_group(&store, "alice");

    vm.shutdown();

    // writes after teardown must not panic the torn-down engine
    store
        .put_merge("statistics", "bob", doc(&[("totalTimeStudied", json!(5))]))
        .await
        .unwrap();
    store
        .append_document("globalChat", doc(&[("sender", json!("bob")), ("message", json!("hi"))]))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
}
