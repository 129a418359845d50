mod app_config;
mod backend;
mod connection_store;
mod error;
mod model;
mod notification;
mod tab_session;

pub use app_config::{AppConfig, AppConfigStore};
pub use backend::DataBackend;
pub use connection_store::{ConnectionState, ConnectionStore, SelectedKey};
pub use error::{BackendError, ConfigError, ErrorKind, StoreError};
pub use model::{
    Connection, ConnectionId, DEFAULT_KEY_PATTERN, KeyDetail, NO_EXPIRATION, NewConnection,
};
pub use notification::{LogNotifier, NoopNotifier, Notification, NotificationKind, Notifier};
pub use tab_session::{NewTab, Tab, TabId, TabSession, TabSessionState};
