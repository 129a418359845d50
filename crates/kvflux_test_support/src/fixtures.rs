use crate::{FakeBackend, RecordingNotifier};
use kvflux_core::{Connection, ConnectionId, ConnectionStore, KeyDetail};
use std::sync::Arc;

pub fn connection(id: ConnectionId) -> Connection {
    Connection::new(
        id,
        format!("Connection {}", id),
        format!("redis://localhost:{}", 6378 + id),
        "#ff0000",
    )
}

pub fn connections(ids: impl IntoIterator<Item = ConnectionId>) -> Vec<Connection> {
    ids.into_iter().map(connection).collect()
}

pub fn string_key(key: impl Into<String>, value: impl Into<String>) -> KeyDetail {
    KeyDetail::new(key, value, kvflux_core::NO_EXPIRATION, "string")
}

/// Store wired to `backend` with a recording notifier.
pub fn store_for(backend: &FakeBackend) -> (ConnectionStore, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let store = ConnectionStore::new(backend.clone().as_backend_arc(), notifier.clone());
    (store, notifier)
}

/// Installs `env_logger` for tests; repeated calls are harmless.
pub fn init_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}
