use kvflux_core::{Notification, NotificationKind, Notifier};
use std::sync::Mutex;

/// Notifier that keeps every notification for later assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        match self.notifications.lock() {
            Ok(guard) => guard.clone(),
            Err(poison_error) => poison_error.into_inner().clone(),
        }
    }

    pub fn errors(&self) -> Vec<Notification> {
        self.of_kind(NotificationKind::Error)
    }

    pub fn successes(&self) -> Vec<Notification> {
        self.of_kind(NotificationKind::Success)
    }

    pub fn messages(&self) -> Vec<String> {
        self.notifications()
            .into_iter()
            .map(|notification| notification.message)
            .collect()
    }

    pub fn clear(&self) {
        match self.notifications.lock() {
            Ok(mut guard) => guard.clear(),
            Err(poison_error) => poison_error.into_inner().clear(),
        }
    }

    fn of_kind(&self, kind: NotificationKind) -> Vec<Notification> {
        self.notifications()
            .into_iter()
            .filter(|notification| notification.kind == kind)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) {
        match self.notifications.lock() {
            Ok(mut guard) => guard.push(notification.clone()),
            Err(poison_error) => poison_error.into_inner().push(notification.clone()),
        }
    }
}
