use serde::{Deserialize, Serialize};

pub type ConnectionId = i64;

/// Key pattern used when nothing else has been remembered for a connection.
pub const DEFAULT_KEY_PATTERN: &str = "*";

/// TTL value meaning the key never expires.
pub const NO_EXPIRATION: i64 = -1;

/// A configured endpoint to a remote key-value store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub name: String,
    #[serde(rename = "uri_connection")]
    pub uri: String,
    pub color: String,
}

impl Connection {
    pub fn new(
        id: ConnectionId,
        name: impl Into<String>,
        uri: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            uri: uri.into(),
            color: color.into(),
        }
    }
}

/// Connection fields submitted to the backend before an id exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewConnection {
    pub uri: String,
    pub name: String,
    pub color: String,
}

impl NewConnection {
    pub fn new(uri: impl Into<String>, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
            color: color.into(),
        }
    }

    pub fn into_connection(self, id: ConnectionId) -> Connection {
        Connection {
            id,
            name: self.name,
            uri: self.uri,
            color: self.color,
        }
    }
}

/// Value and metadata of a single key, as last reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDetail {
    pub key: String,
    pub value: String,
    pub ttl: i64,
    #[serde(rename = "type")]
    pub key_type: String,
}

impl KeyDetail {
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        ttl: i64,
        key_type: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            ttl,
            key_type: key_type.into(),
        }
    }

    pub fn expires(&self) -> bool {
        self.ttl != NO_EXPIRATION
    }
}
