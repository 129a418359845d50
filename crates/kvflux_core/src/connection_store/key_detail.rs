use super::{ConnectionStore, SelectedKey};
use crate::{ConnectionId, StoreError};
use log::{debug, error, info};

impl ConnectionStore {
    /// Loads a key's detail into the selected-key slot.
    ///
    /// Only the most recently issued request may fill the slot: a response that
    /// arrives after a newer `get_key_info` (or `set_selected_key`) is dropped.
    pub async fn get_key_info(&self, id: ConnectionId, key: &str) -> bool {
        match self.load_key_info(id, key).await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to get key info for {:?} on {}: {}", key, id, e);
                self.notify_error(format!("Failed to get key info: {}", e));
                false
            }
        }
    }

    async fn load_key_info(&self, id: ConnectionId, key: &str) -> Result<(), StoreError> {
        self.ensure_known(id)?;

        let ticket = self.next_key_info_ticket();
        let detail = self.backend.get_key_detail(id, key).await?;

        self.update(|state| {
            if !self.is_latest_key_info_ticket(ticket) {
                debug!("Discarding stale detail for {:?} on {}", key, id);
                return;
            }
            if state.connection(id).is_none() {
                return;
            }
            state.selected_key = Some(SelectedKey {
                connection_id: id,
                detail,
            });
        });

        Ok(())
    }

    /// Writes a key's value, then reloads its detail so TTL and type come from the server.
    pub async fn set_key_value(&self, id: ConnectionId, key: &str, value: &str) -> bool {
        let result = async {
            self.ensure_known(id)?;
            self.backend.set_key_value(id, key, value).await.map_err(StoreError::from)
        }
        .await;

        if let Err(e) = result {
            error!("Failed to set value of {:?} on {}: {}", key, id, e);
            self.record_error(&e);
            self.notify_error(format!("Failed to set key value: {}", e));
            return false;
        }

        self.get_key_info(id, key).await;
        self.notify_success("Key value updated successfully");
        true
    }

    /// Deletes a key, clears the selected key and relists the connection's keys.
    pub async fn delete_key(&self, id: ConnectionId, key: &str) -> bool {
        let result = async {
            self.ensure_known(id)?;
            self.backend.delete_key(id, key).await.map_err(StoreError::from)
        }
        .await;

        if let Err(e) = result {
            error!("Failed to delete {:?} on {}: {}", key, id, e);
            self.record_error(&e);
            self.notify_error(format!("Failed to delete key: {}", e));
            return false;
        }

        info!("Deleted key {:?} on connection {}", key, id);
        self.set_selected_key(None);

        if let Err(e) = self.reload_keys(id).await {
            error!("Failed to reload keys of {} after delete: {}", id, e);
            self.record_error(&e);
            self.notify_error(format!("Failed to refresh keys: {}", e));
        }

        self.notify_success("Key deleted successfully");
        true
    }

    /// Sets a key's TTL in seconds (negative removes the expiration), then reloads its detail.
    pub async fn set_key_ttl(&self, id: ConnectionId, key: &str, ttl: i64) -> bool {
        let result = async {
            self.ensure_known(id)?;
            self.backend.set_key_ttl(id, key, ttl).await.map_err(StoreError::from)
        }
        .await;

        if let Err(e) = result {
            error!("Failed to set TTL of {:?} on {}: {}", key, id, e);
            self.record_error(&e);
            self.notify_error(format!("Failed to set key TTL: {}", e));
            return false;
        }

        self.get_key_info(id, key).await;
        self.notify_success("Key TTL updated successfully");
        true
    }

    /// Replaces the selected key and invalidates any `get_key_info` still in flight.
    pub fn set_selected_key(&self, selected: Option<SelectedKey>) {
        self.update(|state| {
            self.next_key_info_ticket();
            state.selected_key = selected;
        });
    }
}
