//! Notification collaborator.
//!
//! Delivery (push, SMS, in-app) is an external concern; the engine only
//! reports the state changes supervisors and workers care about.

use parking_lot::Mutex;

/// A state change worth notifying someone about.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// A task completion was rejected on distance.
    TaskAutoRejected {
        /// Rejected task.
        task_id: u64,
        /// Distance from the zone in meters.
        distance_meters: f64,
    },
    /// A task completed in the warning band; supervisors should look.
    TaskFlaggedForReview {
        /// Flagged task.
        task_id: u64,
        /// Distance from the zone in meters.
        distance_meters: f64,
    },
    /// An attendance record needs a supervisor decision.
    AttendancePendingReview {
        /// Pending attendance record.
        attendance_id: u64,
    },
    /// A worker submitted an appeal.
    AppealSubmitted {
        /// New appeal.
        appeal_id: u64,
    },
    /// A supervisor decided an appeal.
    AppealDecided {
        /// Decided appeal.
        appeal_id: u64,
        /// Whether the entity was reinstated.
        approved: bool,
    },
}

/// Receiver for engine state changes.
pub trait Notifier: Send + Sync {
    /// Delivers one event. Must not block the sync path.
    fn notify(&self, event: SyncEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _event: SyncEvent) {}
}

/// Records events for assertion in tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<SyncEvent>>,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events delivered so far.
    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: SyncEvent) {
        self.events.lock().push(event);
    }
}
