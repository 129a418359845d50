pub mod fake_backend;
pub mod fixtures;
pub mod recording_notifier;

pub use fake_backend::{FakeBackend, FakeCall, FakeOp, glob_match};
pub use fixtures::init_logging;
pub use recording_notifier::RecordingNotifier;
