use super::ConnectionStore;
use crate::{Connection, ConnectionId, Notification, StoreError};
use log::{debug, error, info, warn};

impl ConnectionStore {
    /// Expands or collapses a connection in the tree.
    ///
    /// Expanding always connects and lists keys again with the configured
    /// default pattern (`*` unless overridden), even when keys are cached. Collapsing is local and keeps the cached keys.
    /// Returns whether the connection is expanded afterwards.
    pub async fn toggle_connection(&self, id: ConnectionId) -> bool {
        let (connection, expanded) = {
            let state = self.read();
            (state.connection(id).cloned(), state.is_expanded(id))
        };

        let Some(connection) = connection else {
            warn!("Cannot toggle unknown connection {}", id);
            return false;
        };

        if expanded {
            self.update(|state| {
                state.expanded_connections.remove(&id);
            });
            debug!("Collapsed connection {}", id);
            return false;
        }

        self.update(|state| {
            state.loading_keys.insert(id, true);
        });

        match self.expand(&connection).await {
            Ok(()) => {
                let expanded = self.update(|state| {
                    state.finish_loading_keys(id);
                    // Removed while we were connecting.
                    if state.connection(id).is_none() {
                        return false;
                    }
                    state.expanded_connections.insert(id);
                    true
                });
                if expanded {
                    info!("Expanded connection {} ({})", id, connection.name);
                }
                expanded
            }
            Err(e) => {
                error!("Failed to expand connection {}: {}", id, e);
                self.update(|state| state.finish_loading_keys(id));
                self.notifier
                    .notify(&Notification::error_titled("Connection Error", e.to_string()));
                false
            }
        }
    }

    async fn expand(&self, connection: &Connection) -> Result<(), StoreError> {
        self.backend.connect(connection.id, &connection.uri).await?;
        self.fetch_keys(connection.id, &self.config.default_key_pattern)
            .await
    }

    /// Lists the keys of a connection matching `pattern` and caches them.
    ///
    /// The pattern is remembered for later refreshes. A failure is recorded in
    /// `error` and, unlike the other store operations, also returned to the caller.
    pub async fn fetch_keys(&self, id: ConnectionId, pattern: &str) -> Result<(), StoreError> {
        self.ensure_known(id)?;

        self.update(|state| {
            state.error = None;
            state.loading_keys.insert(id, true);
        });

        match self.backend.list_keys(id, pattern).await {
            Ok(keys) => {
                debug!(
                    "Fetched {} keys for connection {} with pattern {:?}",
                    keys.len(),
                    id,
                    pattern
                );
                self.update(|state| {
                    state.finish_loading_keys(id);
                    if state.connection(id).is_some() {
                        state.connection_keys.insert(id, keys);
                        state.key_patterns.insert(id, pattern.to_string());
                    }
                });
                Ok(())
            }
            Err(e) => {
                let err = StoreError::from(e);
                self.update(|state| {
                    state.finish_loading_keys(id);
                    state.error = Some(err.clone());
                });
                Err(err)
            }
        }
    }

    /// Lists keys again with the connection's remembered pattern.
    pub async fn refresh_keys(&self, id: ConnectionId) -> Result<(), StoreError> {
        self.reload_keys(id).await?;
        self.notify_success("Keys refreshed successfully");
        Ok(())
    }

    pub(super) async fn reload_keys(&self, id: ConnectionId) -> Result<(), StoreError> {
        let pattern = self.remembered_pattern(id);
        self.fetch_keys(id, &pattern).await
    }

    /// Remembers a pattern without fetching; apply it with `fetch_keys` or `refresh_keys`.
    pub fn set_key_pattern(&self, id: ConnectionId, pattern: impl Into<String>) {
        let pattern = pattern.into();
        self.update(|state| {
            state.key_patterns.insert(id, pattern);
        });
    }

    /// Sets expansion membership directly, without contacting the backend.
    pub fn set_expanded_connection(&self, id: ConnectionId, expanded: bool) {
        self.update(|state| {
            if expanded {
                state.connection_keys.entry(id).or_default();
                state.expanded_connections.insert(id);
            } else {
                state.expanded_connections.remove(&id);
            }
        });
    }
}
