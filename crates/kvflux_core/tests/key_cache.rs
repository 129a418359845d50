use kvflux_core::{AppConfig, ConnectionState, DataBackend, ErrorKind, StoreError};
use kvflux_test_support::fixtures::{connections, store_for};
use kvflux_test_support::{FakeBackend, FakeCall, FakeOp};

fn backend_with_keys() -> FakeBackend {
    FakeBackend::new()
        .with_connections(connections([1, 2]))
        .with_string_keys(1, &["user:1", "user:2", "session:9"])
        .with_string_keys(2, &["queue:jobs"])
}

#[tokio::test]
async fn expand_connects_and_lists_all_keys() {
    let backend = backend_with_keys();
    let (store, notifier) = store_for(&backend);
    store.fetch_connections().await;

    assert!(store.toggle_connection(1).await);

    let state = store.snapshot();
    assert!(state.is_expanded(1));
    assert!(!state.is_loading_keys(1));
    assert_eq!(state.keys(1), ["session:9", "user:1", "user:2"].map(String::from));
    assert_eq!(state.key_pattern(1), "*");

    let calls = backend.calls();
    assert!(calls.contains(&FakeCall::Connect {
        id: 1,
        uri: "redis://localhost:6379".into()
    }));
    assert!(calls.contains(&FakeCall::ListKeys {
        id: 1,
        pattern: "*".into()
    }));
    assert!(notifier.notifications().is_empty());
}

#[tokio::test]
async fn expanding_several_connections() {
    let backend = backend_with_keys();
    let (store, _notifier) = store_for(&backend);
    store.fetch_connections().await;

    store.toggle_connection(1).await;
    store.toggle_connection(2).await;

    let state = store.snapshot();
    assert!(state.is_expanded(1));
    assert!(state.is_expanded(2));
    assert_eq!(state.keys(2), ["queue:jobs".to_string()]);
}

#[tokio::test]
async fn collapse_keeps_cached_keys() {
    let backend = backend_with_keys();
    let (store, _notifier) = store_for(&backend);
    store.fetch_connections().await;

    assert!(store.toggle_connection(1).await);
    let calls_after_expand = backend.calls().len();

    assert!(!store.toggle_connection(1).await);

    let state = store.snapshot();
    assert!(!state.is_expanded(1));
    assert_eq!(state.keys(1).len(), 3);
    assert_eq!(backend.calls().len(), calls_after_expand);
}

#[tokio::test]
async fn re_expanding_lists_keys_again() {
    let backend = backend_with_keys();
    let (store, _notifier) = store_for(&backend);
    store.fetch_connections().await;

    store.toggle_connection(1).await;
    store.toggle_connection(1).await;
    store.toggle_connection(1).await;

    assert_eq!(backend.call_count(FakeOp::Connect), 2);
    assert_eq!(backend.call_count(FakeOp::ListKeys), 2);
    assert!(store.snapshot().is_expanded(1));
}

#[tokio::test]
async fn failed_connect_never_expands() {
    let backend = backend_with_keys().with_connect_error_for(1, "NOAUTH Authentication required");
    let (store, notifier) = store_for(&backend);
    store.fetch_connections().await;

    assert!(!store.toggle_connection(1).await);

    let state = store.snapshot();
    assert!(!state.is_expanded(1));
    assert!(!state.is_loading_keys(1));
    assert!(state.keys(1).is_empty());
    assert_eq!(backend.call_count(FakeOp::ListKeys), 0);

    let errors = notifier.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].title, "Connection Error");
    assert_eq!(errors[0].message, "NOAUTH Authentication required");
}

#[tokio::test]
async fn failed_listing_never_expands() {
    let backend = backend_with_keys().with_error(FakeOp::ListKeys, "LOADING dataset in memory");
    let (store, notifier) = store_for(&backend);
    store.fetch_connections().await;

    assert!(!store.toggle_connection(1).await);

    let state = store.snapshot();
    assert!(!state.is_expanded(1));
    assert!(!state.is_loading_keys(1));
    assert_eq!(
        state.error,
        Some(StoreError::Backend("LOADING dataset in memory".into()))
    );
    assert_eq!(notifier.errors()[0].title, "Connection Error");
}

#[tokio::test]
async fn toggling_unknown_connection_does_nothing() {
    let backend = backend_with_keys();
    let (store, _notifier) = store_for(&backend);

    assert!(!store.toggle_connection(1).await);

    assert!(backend.calls().is_empty());
    assert_eq!(store.snapshot(), ConnectionState::default());
}

#[tokio::test]
async fn fetch_keys_remembers_pattern() {
    let backend = backend_with_keys();
    let (store, _notifier) = store_for(&backend);
    store.fetch_connections().await;

    store.fetch_keys(1, "user:*").await.unwrap();

    let state = store.snapshot();
    assert_eq!(state.keys(1), ["user:1", "user:2"].map(String::from));
    assert_eq!(state.key_pattern(1), "user:*");
    assert!(!state.is_loading_keys(1));
}

#[tokio::test]
async fn fetch_keys_failure_propagates_and_keeps_cache() {
    let backend = backend_with_keys();
    let (store, _notifier) = store_for(&backend);
    store.fetch_connections().await;
    store.fetch_keys(1, "*").await.unwrap();

    backend.set_error(FakeOp::ListKeys, "READONLY");
    let err = store.fetch_keys(1, "user:*").await.unwrap_err();

    assert_eq!(err.to_string(), "READONLY");
    let state = store.snapshot();
    assert!(!state.is_loading_keys(1));
    assert_eq!(state.keys(1).len(), 3);
    assert_eq!(state.key_pattern(1), "*");
}

#[tokio::test]
async fn failed_fetch_keys_records_error() {
    let backend = backend_with_keys().with_error(FakeOp::ListKeys, "READONLY");
    let (store, _notifier) = store_for(&backend);
    store.fetch_connections().await;

    let err = store.fetch_keys(1, "*").await.unwrap_err();

    let state = store.snapshot();
    assert_eq!(state.error, Some(err));
    assert_eq!(state.error.map(|e| e.kind()), Some(ErrorKind::Backend));
}

#[tokio::test]
async fn fetch_keys_clears_previous_error() {
    let backend = backend_with_keys().with_error(FakeOp::SetKeyValue, "OOM");
    let (store, _notifier) = store_for(&backend);
    store.fetch_connections().await;

    assert!(!store.set_key_value(1, "user:1", "x").await);
    assert!(store.snapshot().error.is_some());

    store.fetch_keys(1, "*").await.unwrap();

    assert!(store.snapshot().error.is_none());
}

#[tokio::test]
async fn fetch_keys_for_unknown_connection() {
    let backend = backend_with_keys();
    let (store, _notifier) = store_for(&backend);

    let err = store.fetch_keys(42, "*").await.unwrap_err();

    assert_eq!(err, StoreError::UnknownConnection(42));
    assert_eq!(err.kind(), ErrorKind::StaleReference);
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn set_key_pattern_is_applied_by_refresh() {
    let backend = backend_with_keys();
    let (store, notifier) = store_for(&backend);
    store.fetch_connections().await;
    store.toggle_connection(1).await;

    store.set_key_pattern(1, "session:*");
    assert_eq!(backend.call_count(FakeOp::ListKeys), 1);
    assert_eq!(store.snapshot().keys(1).len(), 3);

    store.refresh_keys(1).await.unwrap();

    assert_eq!(store.snapshot().keys(1), ["session:9".to_string()]);
    assert_eq!(notifier.successes()[0].message, "Keys refreshed successfully");
}

#[tokio::test]
async fn refresh_keys_failure_propagates_without_success_toast() {
    let backend = backend_with_keys();
    let (store, notifier) = store_for(&backend);
    store.fetch_connections().await;

    backend.set_error(FakeOp::ListKeys, "boom");

    assert!(store.refresh_keys(1).await.is_err());
    assert!(notifier.successes().is_empty());
}

#[tokio::test]
async fn set_expanded_connection_keeps_cache_invariant() {
    let backend = backend_with_keys();
    let (store, _notifier) = store_for(&backend);

    store.set_expanded_connection(5, true);
    let state = store.snapshot();
    assert!(state.is_expanded(5));
    assert!(state.connection_keys.contains_key(&5));

    store.set_expanded_connection(5, false);
    assert!(!store.snapshot().is_expanded(5));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn configured_default_pattern_and_quiet_success() {
    let backend = backend_with_keys();
    let (store, notifier) = store_for(&backend);
    let store = store.with_config(AppConfig {
        default_key_pattern: "user:*".into(),
        notify_on_success: false,
    });
    store.fetch_connections().await;

    store.toggle_connection(1).await;
    store.refresh_keys(1).await.unwrap();

    assert_eq!(store.snapshot().keys(1), ["user:1", "user:2"].map(String::from));
    assert!(backend.calls().contains(&FakeCall::ListKeys {
        id: 1,
        pattern: "user:*".into()
    }));
    assert!(notifier.notifications().is_empty());
}

#[tokio::test]
async fn removal_while_connecting_leaves_no_trace() {
    let backend = backend_with_keys();
    let (store, notifier) = store_for(&backend);
    store.fetch_connections().await;

    let release = backend.hold(FakeOp::Connect);
    let (expanded, removed) = tokio::join!(store.toggle_connection(2), async {
        let removed = store.remove_connection(2).await;
        release.notify_one();
        removed
    });

    assert!(!expanded);
    assert!(removed);
    let state = store.snapshot();
    assert!(state.connection(2).is_none());
    assert!(!state.expanded_connections.contains(&2));
    assert!(!state.connection_keys.contains_key(&2));
    assert!(!state.loading_keys.contains_key(&2));
    assert_eq!(backend.call_count(FakeOp::ListKeys), 0);
    assert_eq!(notifier.errors()[0].title, "Connection Error");
}

#[tokio::test]
async fn late_key_listing_for_removed_connection_is_dropped() {
    let backend = backend_with_keys();
    let (store, notifier) = store_for(&backend);
    store.fetch_connections().await;

    let release = backend.hold(FakeOp::ListKeys);
    let (expanded, removed) = tokio::join!(store.toggle_connection(2), async {
        let removed = store.remove_connection(2).await;
        release.notify_one();
        removed
    });

    assert!(!expanded);
    assert!(removed);
    let state = store.snapshot();
    assert!(!state.expanded_connections.contains(&2));
    assert!(!state.connection_keys.contains_key(&2));
    assert!(!state.loading_keys.contains_key(&2));
    assert!(!state.key_patterns.contains_key(&2));
    assert!(notifier.errors().is_empty());
}

#[tokio::test]
async fn overlapping_expands_keep_last_response() {
    let backend = backend_with_keys();
    let (store, _notifier) = store_for(&backend);
    store.fetch_connections().await;

    let release = backend.hold(FakeOp::ListKeys);
    let (first, second) = tokio::join!(store.toggle_connection(1), async {
        backend.set_key_value(1, "user:3", "carol").await.unwrap();
        let expanded = store.toggle_connection(1).await;
        assert_eq!(store.snapshot().keys(1).len(), 4);
        release.notify_one();
        expanded
    });

    assert!(first);
    assert!(second);
    let state = store.snapshot();
    assert!(state.is_expanded(1));
    assert!(!state.is_loading_keys(1));
    assert_eq!(state.keys(1), ["session:9", "user:1", "user:2"].map(String::from));
    assert_eq!(backend.call_count(FakeOp::Connect), 2);
    assert_eq!(backend.call_count(FakeOp::ListKeys), 2);
}
