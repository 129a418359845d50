mod expansion;
mod key_detail;
mod registry;

use crate::{
    AppConfig, Connection, ConnectionId, DEFAULT_KEY_PATTERN, DataBackend, KeyDetail, Notification,
    Notifier, StoreError,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Key detail currently shown to the user, with the connection it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedKey {
    pub connection_id: ConnectionId,
    pub detail: KeyDetail,
}

/// Local mirror of the remote connections and their keys.
///
/// Always handed out as a complete snapshot; every store operation replaces
/// the parts it touches in a single critical section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionState {
    pub connections: Vec<Connection>,
    pub selected_connection: Option<Connection>,
    pub selected_key: Option<SelectedKey>,
    /// True while the connection list itself is being fetched.
    pub is_loading: bool,
    /// Most recent failure. Cleared whenever the connection list is fetched again.
    pub error: Option<StoreError>,
    pub connection_keys: HashMap<ConnectionId, Vec<String>>,
    /// True only while a key listing is in flight for that connection.
    pub loading_keys: HashMap<ConnectionId, bool>,
    pub expanded_connections: HashSet<ConnectionId>,
    /// Last pattern used to list keys, per connection.
    pub key_patterns: HashMap<ConnectionId, String>,
}

impl ConnectionState {
    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }

    /// Cached keys of a connection, empty if none were ever fetched.
    pub fn keys(&self, id: ConnectionId) -> &[String] {
        self.connection_keys
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_expanded(&self, id: ConnectionId) -> bool {
        self.expanded_connections.contains(&id)
    }

    pub fn is_loading_keys(&self, id: ConnectionId) -> bool {
        self.loading_keys.get(&id).copied().unwrap_or(false)
    }

    pub fn key_pattern(&self, id: ConnectionId) -> &str {
        self.key_patterns
            .get(&id)
            .map(String::as_str)
            .unwrap_or(DEFAULT_KEY_PATTERN)
    }

    /// Drops every trace of a connection that no longer exists.
    fn forget_connection(&mut self, id: ConnectionId) {
        self.connections.retain(|c| c.id != id);
        self.connection_keys.remove(&id);
        self.loading_keys.remove(&id);
        self.key_patterns.remove(&id);
        self.expanded_connections.remove(&id);

        if self.selected_connection.as_ref().is_some_and(|c| c.id == id) {
            self.selected_connection = None;
        }
        if self
            .selected_key
            .as_ref()
            .is_some_and(|k| k.connection_id == id)
        {
            self.selected_key = None;
        }
    }

    /// Replaces the connection list and forgets ids that disappeared from it.
    fn replace_connections(&mut self, connections: Vec<Connection>) {
        let known: HashSet<ConnectionId> = connections.iter().map(|c| c.id).collect();

        let stale: HashSet<ConnectionId> = self
            .connections
            .iter()
            .map(|c| c.id)
            .chain(self.expanded_connections.iter().copied())
            .chain(self.connection_keys.keys().copied())
            .filter(|id| !known.contains(id))
            .collect();

        for id in stale {
            log::debug!("Connection {} is gone, dropping its cached state", id);
            self.forget_connection(id);
        }

        if let Some(selected_id) = self.selected_connection.as_ref().map(|c| c.id) {
            self.selected_connection = connections.iter().find(|c| c.id == selected_id).cloned();
        }

        self.connections = connections;
    }

    /// Clears the loading flag of a key listing that just finished.
    fn finish_loading_keys(&mut self, id: ConnectionId) {
        if self.connection(id).is_some() {
            self.loading_keys.insert(id, false);
        } else {
            self.loading_keys.remove(&id);
        }
    }
}

/// Connection registry, key cache and key detail editor over a [`DataBackend`].
///
/// Operations may interleave at backend calls. No lock is held across those
/// calls, so whichever response resolves last decides the final state, with
/// one exception: [`ConnectionStore::get_key_info`] discards responses that
/// were overtaken by a newer request.
pub struct ConnectionStore {
    backend: Arc<dyn DataBackend>,
    notifier: Arc<dyn Notifier>,
    config: AppConfig,
    state: RwLock<ConnectionState>,
    key_info_ticket: AtomicU64,
}

impl ConnectionStore {
    pub fn new(backend: Arc<dyn DataBackend>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            backend,
            notifier,
            config: AppConfig::default(),
            state: RwLock::new(ConnectionState::default()),
            key_info_ticket: AtomicU64::new(0),
        }
    }

    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Seeds the store with an existing state, e.g. one restored by the caller.
    pub fn with_state(self, state: ConnectionState) -> Self {
        *self.write() = state;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn snapshot(&self) -> ConnectionState {
        self.read().clone()
    }

    /// Pattern to reuse for a connection: the remembered one, else the configured default.
    fn remembered_pattern(&self, id: ConnectionId) -> String {
        self.read()
            .key_patterns
            .get(&id)
            .cloned()
            .unwrap_or_else(|| self.config.default_key_pattern.clone())
    }

    fn ensure_known(&self, id: ConnectionId) -> Result<Connection, StoreError> {
        self.read()
            .connection(id)
            .cloned()
            .ok_or(StoreError::UnknownConnection(id))
    }

    fn record_error(&self, err: &StoreError) {
        self.write().error = Some(err.clone());
    }

    fn notify_success(&self, message: &str) {
        if self.config.notify_on_success {
            self.notifier.notify(&Notification::success(message));
        }
    }

    fn notify_error(&self, message: String) {
        self.notifier.notify(&Notification::error(message));
    }

    fn next_key_info_ticket(&self) -> u64 {
        self.key_info_ticket.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_latest_key_info_ticket(&self, ticket: u64) -> bool {
        self.key_info_ticket.load(Ordering::SeqCst) == ticket
    }

    /// Applies one state transition under the write lock.
    fn update<R>(&self, f: impl FnOnce(&mut ConnectionState) -> R) -> R {
        f(&mut self.write())
    }

    fn read(&self) -> RwLockReadGuard<'_, ConnectionState> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poison_error) => poison_error.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, ConnectionState> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poison_error) => poison_error.into_inner(),
        }
    }
}
