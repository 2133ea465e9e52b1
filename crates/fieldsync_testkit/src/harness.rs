//! Wired engine harness over the in-memory collaborators.

use crate::fixtures::{test_epoch, unit_square_zone};
use fieldsync_engine::{
    AppealWorkflow, EngineConfig, ManualClock, MemoryStore, RecordingNotifier, SyncCoordinator,
};
use fieldsync_geo::{MemoryZoneIndex, ZonePolygon};
use std::sync::Arc;

/// A coordinator and appeal workflow wired to in-memory collaborators,
/// with handles to each so tests can inspect and manipulate them.
pub struct TestHarness {
    /// Shared entity store.
    pub store: Arc<MemoryStore>,
    /// Zone index, pre-seeded with the canonical zone (id 1).
    pub zones: Arc<MemoryZoneIndex>,
    /// Frozen clock, starting at `test_epoch()`.
    pub clock: Arc<ManualClock>,
    /// Event recorder.
    pub notifier: Arc<RecordingNotifier>,
    /// The coordinator under test.
    pub coordinator: SyncCoordinator<MemoryStore>,
    /// The appeal workflow under test.
    pub appeals: AppealWorkflow<MemoryStore>,
}

impl TestHarness {
    /// Builds a harness with the canonical unit-square zone and default
    /// thresholds.
    pub fn new() -> Self {
        Self::with_zones(vec![unit_square_zone(1)])
    }

    /// Builds a harness over the given zones.
    pub fn with_zones(zones: Vec<ZonePolygon>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let zones = Arc::new(MemoryZoneIndex::from_zones(zones));
        let clock = Arc::new(ManualClock::at(test_epoch()));
        let notifier = Arc::new(RecordingNotifier::new());

        let coordinator = SyncCoordinator::new(
            store.clone(),
            zones.clone(),
            clock.clone(),
            notifier.clone(),
            EngineConfig::default(),
        );
        let appeals = AppealWorkflow::new(store.clone(), clock.clone(), notifier.clone());

        Self {
            store,
            zones,
            clock,
            notifier,
            coordinator,
            appeals,
        }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
