use crate::{BackendError, Connection, ConnectionId, KeyDetail, NewConnection};
use async_trait::async_trait;

/// Remote side of every operation the stores perform.
///
/// The stores never talk to a key-value server directly; each call here is one
/// asynchronous round-trip that either succeeds or fails with an opaque
/// [`BackendError`]. Implementations must be `Send + Sync` so a store can be
/// shared between tasks.
#[async_trait]
pub trait DataBackend: Send + Sync {
    /// List every configured connection.
    async fn list_connections(&self) -> Result<Vec<Connection>, BackendError>;

    /// Persist a new connection and return the id assigned to it.
    async fn create_connection(&self, connection: &NewConnection)
    -> Result<ConnectionId, BackendError>;

    /// Open (or re-open) the link to the store behind `uri`.
    ///
    /// Must be called before any key operation on `id`.
    async fn connect(&self, id: ConnectionId, uri: &str) -> Result<(), BackendError>;

    /// List key names matching a glob-style `pattern`.
    async fn list_keys(&self, id: ConnectionId, pattern: &str)
    -> Result<Vec<String>, BackendError>;

    async fn get_key_detail(&self, id: ConnectionId, key: &str) -> Result<KeyDetail, BackendError>;

    async fn set_key_value(
        &self,
        id: ConnectionId,
        key: &str,
        value: &str,
    ) -> Result<(), BackendError>;

    async fn delete_key(&self, id: ConnectionId, key: &str) -> Result<(), BackendError>;

    /// Set the time-to-live of a key in seconds.
    ///
    /// A negative `ttl` removes the expiration.
    async fn set_key_ttl(&self, id: ConnectionId, key: &str, ttl: i64)
    -> Result<(), BackendError>;

    async fn update_connection(&self, connection: &Connection) -> Result<(), BackendError>;

    async fn delete_connection(&self, id: ConnectionId) -> Result<(), BackendError>;
}
