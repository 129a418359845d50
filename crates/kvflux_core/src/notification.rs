#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            title: "Success".to_string(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::error_titled("Error", message)
    }

    pub fn error_titled(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NotificationKind::Error
    }
}

/// Sink for user-facing toasts.
///
/// Fire-and-forget: the stores never look at what happens to a notification.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Forwards notifications to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) {
        match notification.kind {
            NotificationKind::Success => {
                log::info!("{}: {}", notification.title, notification.message)
            }
            NotificationKind::Error => {
                log::error!("{}: {}", notification.title, notification.message)
            }
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _notification: &Notification) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_kind_and_title() {
        let ok = Notification::success("Saved");
        assert_eq!(ok.title, "Success");
        assert!(!ok.is_error());

        let failed = Notification::error("Failed to delete key: NOPERM");
        assert_eq!(failed.title, "Error");
        assert!(failed.is_error());

        let titled = Notification::error_titled("Connection Error", "refused");
        assert_eq!(titled.kind, NotificationKind::Error);
        assert_eq!(titled.title, "Connection Error");
    }

    #[test]
    fn notifiers_are_object_safe() {
        let notifiers: Vec<Box<dyn Notifier>> = vec![Box::new(LogNotifier), Box::new(NoopNotifier)];
        for notifier in &notifiers {
            notifier.notify(&Notification::success("done"));
        }
    }
}
