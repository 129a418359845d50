use async_trait::async_trait;
use kvflux_core::{
    BackendError, Connection, ConnectionId, DataBackend, KeyDetail, NO_EXPIRATION, NewConnection,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::Notify;

/// Backend operations, used to script failures and pauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FakeOp {
    ListConnections,
    CreateConnection,
    Connect,
    ListKeys,
    GetKeyDetail,
    SetKeyValue,
    DeleteKey,
    SetKeyTtl,
    UpdateConnection,
    DeleteConnection,
}

/// One recorded backend call with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    ListConnections,
    CreateConnection(NewConnection),
    Connect { id: ConnectionId, uri: String },
    ListKeys { id: ConnectionId, pattern: String },
    GetKeyDetail { id: ConnectionId, key: String },
    SetKeyValue { id: ConnectionId, key: String, value: String },
    DeleteKey { id: ConnectionId, key: String },
    SetKeyTtl { id: ConnectionId, key: String, ttl: i64 },
    UpdateConnection(Connection),
    DeleteConnection(ConnectionId),
}

impl FakeCall {
    pub fn op(&self) -> FakeOp {
        match self {
            FakeCall::ListConnections => FakeOp::ListConnections,
            FakeCall::CreateConnection(_) => FakeOp::CreateConnection,
            FakeCall::Connect { .. } => FakeOp::Connect,
            FakeCall::ListKeys { .. } => FakeOp::ListKeys,
            FakeCall::GetKeyDetail { .. } => FakeOp::GetKeyDetail,
            FakeCall::SetKeyValue { .. } => FakeOp::SetKeyValue,
            FakeCall::DeleteKey { .. } => FakeOp::DeleteKey,
            FakeCall::SetKeyTtl { .. } => FakeOp::SetKeyTtl,
            FakeCall::UpdateConnection(_) => FakeOp::UpdateConnection,
            FakeCall::DeleteConnection(_) => FakeOp::DeleteConnection,
        }
    }
}

#[derive(Default)]
struct FakeBackendState {
    connections: RwLock<Vec<Connection>>,
    keys: RwLock<HashMap<ConnectionId, BTreeMap<String, KeyDetail>>>,
    errors: RwLock<HashMap<FakeOp, String>>,
    connect_errors: RwLock<HashMap<ConnectionId, String>>,
    key_detail_holds: Mutex<HashMap<String, Arc<Notify>>>,
    response_holds: Mutex<HashMap<FakeOp, Arc<Notify>>>,
    calls: Mutex<Vec<FakeCall>>,
    next_id: AtomicI64,
}

/// In-memory key-value backend with scriptable failures.
///
/// Behaves like a small remote store: keys live per connection, listing
/// honours `*`/`?` glob patterns, and every call is recorded for assertions.
#[derive(Clone)]
pub struct FakeBackend {
    state: Arc<FakeBackendState>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        let backend = Self {
            state: Arc::new(FakeBackendState::default()),
        };
        backend.state.next_id.store(1, Ordering::SeqCst);
        backend
    }

    pub fn with_connections(self, connections: Vec<Connection>) -> Self {
        let max_id = connections.iter().map(|c| c.id).max().unwrap_or(0);
        self.state.next_id.fetch_max(max_id + 1, Ordering::SeqCst);
        *rwlock_write(&self.state.connections) = connections;
        self
    }

    pub fn with_keys(self, id: ConnectionId, details: Vec<KeyDetail>) -> Self {
        let mut keys = rwlock_write(&self.state.keys);
        let entry = keys.entry(id).or_default();
        for detail in details {
            entry.insert(detail.key.clone(), detail);
        }
        drop(keys);
        self
    }

    /// Adds plain string keys whose value is the key name uppercased.
    pub fn with_string_keys(self, id: ConnectionId, keys: &[&str]) -> Self {
        let details = keys
            .iter()
            .map(|key| KeyDetail::new(*key, key.to_uppercase(), NO_EXPIRATION, "string"))
            .collect();
        self.with_keys(id, details)
    }

    pub fn with_error(self, op: FakeOp, message: impl Into<String>) -> Self {
        self.set_error(op, message);
        self
    }

    pub fn with_connect_error_for(self, id: ConnectionId, message: impl Into<String>) -> Self {
        self.set_connect_error(id, message);
        self
    }

    pub fn set_connect_error(&self, id: ConnectionId, message: impl Into<String>) {
        rwlock_write(&self.state.connect_errors).insert(id, message.into());
    }

    pub fn set_error(&self, op: FakeOp, message: impl Into<String>) {
        rwlock_write(&self.state.errors).insert(op, message.into());
    }

    pub fn clear_error(&self, op: FakeOp) {
        rwlock_write(&self.state.errors).remove(&op);
    }

    /// Makes the next `get_key_detail` for `key` wait until the returned handle is notified.
    pub fn hold_key_detail(&self, key: impl Into<String>) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        mutex_lock(&self.state.key_detail_holds).insert(key.into(), notify.clone());
        notify
    }

    /// Makes the next call of `op` do its work, then hold the response until
    /// the returned handle is notified.
    pub fn hold(&self, op: FakeOp) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        mutex_lock(&self.state.response_holds).insert(op, notify.clone());
        notify
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        mutex_lock(&self.state.calls).clone()
    }

    pub fn call_count(&self, op: FakeOp) -> usize {
        mutex_lock(&self.state.calls)
            .iter()
            .filter(|call| call.op() == op)
            .count()
    }

    pub fn stored_connections(&self) -> Vec<Connection> {
        rwlock_read(&self.state.connections).clone()
    }

    pub fn stored_key(&self, id: ConnectionId, key: &str) -> Option<KeyDetail> {
        rwlock_read(&self.state.keys)
            .get(&id)
            .and_then(|keys| keys.get(key))
            .cloned()
    }

    pub fn as_backend_arc(self) -> Arc<dyn DataBackend> {
        Arc::new(self)
    }

    fn record(&self, call: FakeCall) -> Result<(), BackendError> {
        let op = call.op();
        mutex_lock(&self.state.calls).push(call);

        match rwlock_read(&self.state.errors).get(&op) {
            Some(message) => Err(BackendError::new(message.clone())),
            None => Ok(()),
        }
    }

    async fn respond<T>(
        &self,
        op: FakeOp,
        result: Result<T, BackendError>,
    ) -> Result<T, BackendError> {
        let hold = mutex_lock(&self.state.response_holds).remove(&op);
        if let Some(notify) = hold {
            notify.notified().await;
        }
        result
    }

    fn with_store<T>(
        &self,
        id: ConnectionId,
        f: impl FnOnce(&mut BTreeMap<String, KeyDetail>) -> Result<T, BackendError>,
    ) -> Result<T, BackendError> {
        if !rwlock_read(&self.state.connections)
            .iter()
            .any(|c| c.id == id)
        {
            return Err(BackendError::new("Connection not found"));
        }

        let mut keys = rwlock_write(&self.state.keys);
        f(keys.entry(id).or_default())
    }
}

#[async_trait]
impl DataBackend for FakeBackend {
    async fn list_connections(&self) -> Result<Vec<Connection>, BackendError> {
        self.record(FakeCall::ListConnections)?;
        Ok(self.stored_connections())
    }

    async fn create_connection(
        &self,
        connection: &NewConnection,
    ) -> Result<ConnectionId, BackendError> {
        self.record(FakeCall::CreateConnection(connection.clone()))?;

        let id = self.state.next_id.fetch_add(1, Ordering::SeqCst);
        rwlock_write(&self.state.connections).push(connection.clone().into_connection(id));
        Ok(id)
    }

    async fn connect(&self, id: ConnectionId, uri: &str) -> Result<(), BackendError> {
        self.record(FakeCall::Connect {
            id,
            uri: uri.to_string(),
        })?;

        let result = match rwlock_read(&self.state.connect_errors).get(&id) {
            Some(message) => Err(BackendError::new(message.clone())),
            None => Ok(()),
        };
        self.respond(FakeOp::Connect, result).await
    }

    async fn list_keys(
        &self,
        id: ConnectionId,
        pattern: &str,
    ) -> Result<Vec<String>, BackendError> {
        self.record(FakeCall::ListKeys {
            id,
            pattern: pattern.to_string(),
        })?;

        let result = self.with_store(id, |keys| {
            Ok(keys
                .keys()
                .filter(|key| glob_match(pattern, key))
                .cloned()
                .collect())
        });
        self.respond(FakeOp::ListKeys, result).await
    }

    async fn get_key_detail(&self, id: ConnectionId, key: &str) -> Result<KeyDetail, BackendError> {
        self.record(FakeCall::GetKeyDetail {
            id,
            key: key.to_string(),
        })?;

        let hold = mutex_lock(&self.state.key_detail_holds).remove(key);
        if let Some(notify) = hold {
            notify.notified().await;
        }

        self.with_store(id, |keys| {
            keys.get(key)
                .cloned()
                .ok_or_else(|| BackendError::new(format!("Key not found: {}", key)))
        })
    }

    async fn set_key_value(
        &self,
        id: ConnectionId,
        key: &str,
        value: &str,
    ) -> Result<(), BackendError> {
        self.record(FakeCall::SetKeyValue {
            id,
            key: key.to_string(),
            value: value.to_string(),
        })?;

        self.with_store(id, |keys| {
            keys.insert(
                key.to_string(),
                KeyDetail::new(key, value, NO_EXPIRATION, "string"),
            );
            Ok(())
        })
    }

    async fn delete_key(&self, id: ConnectionId, key: &str) -> Result<(), BackendError> {
        self.record(FakeCall::DeleteKey {
            id,
            key: key.to_string(),
        })?;

        self.with_store(id, |keys| {
            keys.remove(key);
            Ok(())
        })
    }

    async fn set_key_ttl(&self, id: ConnectionId, key: &str, ttl: i64) -> Result<(), BackendError> {
        self.record(FakeCall::SetKeyTtl {
            id,
            key: key.to_string(),
            ttl,
        })?;

        self.with_store(id, |keys| {
            let detail = keys
                .get_mut(key)
                .ok_or_else(|| BackendError::new(format!("Key not found: {}", key)))?;
            detail.ttl = if ttl < 0 { NO_EXPIRATION } else { ttl };
            Ok(())
        })
    }

    async fn update_connection(&self, connection: &Connection) -> Result<(), BackendError> {
        self.record(FakeCall::UpdateConnection(connection.clone()))?;

        let mut connections = rwlock_write(&self.state.connections);
        let existing = connections
            .iter_mut()
            .find(|c| c.id == connection.id)
            .ok_or_else(|| BackendError::new("Connection not found"))?;
        *existing = connection.clone();
        Ok(())
    }

    async fn delete_connection(&self, id: ConnectionId) -> Result<(), BackendError> {
        self.record(FakeCall::DeleteConnection(id))?;

        rwlock_write(&self.state.connections).retain(|c| c.id != id);
        rwlock_write(&self.state.keys).remove(&id);
        self.respond(FakeOp::DeleteConnection, Ok(())).await
    }
}

/// Glob matching with `*` (any run) and `?` (any single char).
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((star_p, star_t)) = star {
            p = star_p + 1;
            t = star_t + 1;
            star = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}

fn rwlock_read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poison_error) => poison_error.into_inner(),
    }
}

fn rwlock_write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poison_error) => poison_error.into_inner(),
    }
}

fn mutex_lock<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poison_error) => poison_error.into_inner(),
    }
}
