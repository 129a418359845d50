use super::ConnectionStore;
use crate::{Connection, ConnectionId, NewConnection, StoreError};
use log::{error, info, warn};

impl ConnectionStore {
    /// Replaces the connection list with the backend's.
    ///
    /// On failure the error is recorded and the previous list is kept.
    pub async fn fetch_connections(&self) {
        self.update(|state| {
            state.is_loading = true;
            state.error = None;
        });

        match self.backend.list_connections().await {
            Ok(connections) => {
                info!("Loaded {} connections", connections.len());
                self.update(|state| {
                    state.replace_connections(connections);
                    state.is_loading = false;
                });
            }
            Err(e) => {
                error!("Failed to list connections: {}", e);
                self.update(|state| {
                    state.error = Some(e.into());
                    state.is_loading = false;
                });
            }
        }
    }

    /// Fetches the connection list and reloads keys of every expanded connection.
    ///
    /// Each expanded connection is reconnected and relisted with its remembered
    /// pattern. A connection that fails is collapsed; the others still refresh.
    pub async fn refresh_connections(&self) {
        self.update(|state| {
            state.is_loading = true;
            state.error = None;
        });

        let connections = match self.backend.list_connections().await {
            Ok(connections) => connections,
            Err(e) => {
                error!("Failed to list connections: {}", e);
                self.update(|state| {
                    state.error = Some(e.into());
                    state.is_loading = false;
                });
                return;
            }
        };

        let mut expanded: Vec<ConnectionId> = self
            .read()
            .expanded_connections
            .iter()
            .copied()
            .collect();
        expanded.sort_unstable();

        for id in expanded {
            let Some(connection) = connections.iter().find(|c| c.id == id) else {
                continue;
            };

            if let Err(e) = self.reload_expanded(connection).await {
                warn!("Failed to refresh connection {}: {}", id, e);
                self.update(|state| {
                    state.expanded_connections.remove(&id);
                });
            }
        }

        self.update(|state| {
            state.replace_connections(connections);
            state.is_loading = false;
        });
    }

    async fn reload_expanded(&self, connection: &Connection) -> Result<(), StoreError> {
        let id = connection.id;
        let pattern = self.remembered_pattern(id);

        self.update(|state| {
            state.loading_keys.insert(id, true);
        });

        let result = async {
            self.backend.connect(id, &connection.uri).await?;
            self.backend
                .list_keys(id, &pattern)
                .await
                .map_err(StoreError::from)
        }
        .await;

        self.update(|state| {
            state.finish_loading_keys(id);
            if let Ok(keys) = &result {
                state.connection_keys.insert(id, keys.clone());
            }
        });

        result.map(|_| ())
    }

    /// Appends a connection locally without contacting the backend.
    pub fn add_connection(&self, connection: Connection) {
        self.update(|state| state.connections.push(connection));
    }

    pub fn set_selected_connection(&self, connection: Option<Connection>) {
        self.update(|state| state.selected_connection = connection);
    }

    /// Creates a connection on the backend and appends it with the assigned id.
    ///
    /// Returns the new id, or `None` if the backend refused.
    pub async fn create_connection(&self, new_connection: NewConnection) -> Option<ConnectionId> {
        match self.backend.create_connection(&new_connection).await {
            Ok(id) => {
                info!("Created connection {} ({})", id, new_connection.name);
                self.update(|state| state.connections.push(new_connection.into_connection(id)));
                self.notify_success("Connection created successfully");
                Some(id)
            }
            Err(e) => {
                let err = StoreError::from(e);
                error!("Failed to create connection: {}", err);
                self.record_error(&err);
                self.notify_error(format!("Failed to create connection: {}", err));
                None
            }
        }
    }

    /// Deletes a connection on the backend, then drops it and everything cached for it.
    ///
    /// Nothing changes locally unless the backend call succeeds.
    pub async fn remove_connection(&self, id: ConnectionId) -> bool {
        match self.backend.delete_connection(id).await {
            Ok(()) => {
                self.update(|state| state.forget_connection(id));
                info!("Removed connection {}", id);
                self.notify_success("Connection removed successfully");
                true
            }
            Err(e) => {
                let err = StoreError::from(e);
                error!("Failed to remove connection {}: {}", id, err);
                self.record_error(&err);
                self.notify_error(format!("Failed to remove connection: {}", err));
                false
            }
        }
    }

    /// Updates a connection on the backend, then replaces the local copy.
    pub async fn update_connection(&self, connection: Connection) -> bool {
        match self.backend.update_connection(&connection).await {
            Ok(()) => {
                info!("Updated connection {}", connection.id);
                self.update(|state| {
                    if let Some(existing) =
                        state.connections.iter_mut().find(|c| c.id == connection.id)
                    {
                        *existing = connection.clone();
                    }
                    if state
                        .selected_connection
                        .as_ref()
                        .is_some_and(|c| c.id == connection.id)
                    {
                        state.selected_connection = Some(connection);
                    }
                });
                self.notify_success("Connection updated successfully");
                true
            }
            Err(e) => {
                let err = StoreError::from(e);
                error!("Failed to update connection {}: {}", connection.id, err);
                self.record_error(&err);
                self.notify_error(format!("Failed to update connection: {}", err));
                false
            }
        }
    }
}
