use crate::ConnectionId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Identity of a tab, derived from the key it shows.
///
/// Two tabs for the same (connection, key) pair always get the same id, which
/// is what keeps a key from being opened twice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(String);

impl TabId {
    pub fn new(connection_id: ConnectionId, key_name: &str) -> Self {
        Self(format!("{}-{}", connection_id, key_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    pub id: TabId,
    pub connection_id: ConnectionId,
    pub key_name: String,
    pub label: String,
}

/// A tab as requested by the caller, before its id is derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTab {
    pub connection_id: ConnectionId,
    pub key_name: String,
    pub label: String,
}

impl NewTab {
    /// Tab labelled with the key name itself.
    pub fn for_key(connection_id: ConnectionId, key_name: impl Into<String>) -> Self {
        let key_name = key_name.into();
        Self {
            connection_id,
            label: key_name.clone(),
            key_name,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn id(&self) -> TabId {
        TabId::new(self.connection_id, &self.key_name)
    }

    fn into_tab(self) -> Tab {
        Tab {
            id: self.id(),
            connection_id: self.connection_id,
            key_name: self.key_name,
            label: self.label,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabSessionState {
    /// Tabs in visual order (left to right).
    pub tabs: Vec<Tab>,
    pub active_tab_id: Option<TabId>,
}

impl TabSessionState {
    fn index_of(&self, id: &TabId) -> Option<usize> {
        self.tabs.iter().position(|tab| &tab.id == id)
    }

    /// Active tab after removing the tab that sat at `closed_idx`.
    ///
    /// The tab that slid into the closed position wins, then its left neighbour.
    fn active_after_close(&self, closed_idx: usize) -> Option<TabId> {
        self.tabs
            .get(closed_idx)
            .or_else(|| closed_idx.checked_sub(1).and_then(|i| self.tabs.get(i)))
            .map(|tab| tab.id.clone())
    }
}

/// Open tabs of the current session and which one is active.
///
/// Independent from the connection store: tabs reference keys only through
/// [`TabId`], and nothing here survives the process.
#[derive(Debug, Default)]
pub struct TabSession {
    state: RwLock<TabSessionState>,
}

impl TabSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a tab, or focuses it if the key is already open.
    pub fn add_tab(&self, new_tab: NewTab) -> TabId {
        let id = new_tab.id();
        let mut state = self.write();

        if state.index_of(&id).is_none() {
            log::debug!("Opening tab {}", id);
            state.tabs.push(new_tab.into_tab());
        }

        state.active_tab_id = Some(id.clone());
        id
    }

    /// Closes a tab and returns the tab that is active afterwards.
    ///
    /// Closing an unknown id changes nothing. `None` means no tab is left
    /// active, which callers use to navigate away from the tab area.
    pub fn remove_tab(&self, id: &TabId) -> Option<TabId> {
        let mut state = self.write();

        let Some(idx) = state.index_of(id) else {
            return state.active_tab_id.clone();
        };

        state.tabs.remove(idx);

        if state.active_tab_id.as_ref() == Some(id) {
            state.active_tab_id = state.active_after_close(idx);
        }

        log::debug!(
            "Closed tab {}, active is now {:?}",
            id,
            state.active_tab_id.as_ref().map(TabId::as_str)
        );

        state.active_tab_id.clone()
    }

    pub fn set_active_tab(&self, id: TabId) {
        self.write().active_tab_id = Some(id);
    }

    pub fn tab(&self, id: &TabId) -> Option<Tab> {
        self.read().tabs.iter().find(|tab| &tab.id == id).cloned()
    }

    pub fn tabs(&self) -> Vec<Tab> {
        self.read().tabs.clone()
    }

    pub fn active_tab_id(&self) -> Option<TabId> {
        self.read().active_tab_id.clone()
    }

    pub fn active_tab(&self) -> Option<Tab> {
        let state = self.read();
        let id = state.active_tab_id.as_ref()?;
        state.tabs.iter().find(|tab| &tab.id == id).cloned()
    }

    pub fn snapshot(&self) -> TabSessionState {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().tabs.is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, TabSessionState> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poison_error) => poison_error.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, TabSessionState> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poison_error) => poison_error.into_inner(),
        }
    }
}
