//! Zone lookup collaborator.

use crate::point::GeoPoint;
use crate::polygon::ZonePolygon;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Read-only lookup of authorization polygons.
///
/// Supplied by an external zone-management collaborator; the engine only
/// ever reads through this trait. Implementations must return zones in
/// ascending id order so the containment tie-break stays stable.
pub trait ZoneIndex: Send + Sync {
    /// All active zones, ascending by id.
    fn active_zones(&self) -> Vec<ZonePolygon>;

    /// Looks up a zone by id.
    fn zone(&self, id: u64) -> Option<ZonePolygon>;

    /// Looks up a zone by code.
    fn zone_by_code(&self, code: &str) -> Option<ZonePolygon>;

    /// Active zones whose anchor lies within `radius_meters` of `point`,
    /// ascending by id.
    fn zones_near(&self, point: &GeoPoint, radius_meters: f64) -> Vec<ZonePolygon> {
        self.active_zones()
            .into_iter()
            .filter(|z| z.nearest_vertex_distance_meters(point) <= radius_meters || z.contains(point))
            .collect()
    }
}

/// In-memory zone index.
///
/// Backs the reference server and tests; a production deployment would
/// implement `ZoneIndex` over its zone store instead.
#[derive(Debug, Default)]
pub struct MemoryZoneIndex {
    zones: RwLock<BTreeMap<u64, ZonePolygon>>,
}

impl MemoryZoneIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an index from a zone list.
    pub fn from_zones(zones: impl IntoIterator<Item = ZonePolygon>) -> Self {
        let index = Self::new();
        for zone in zones {
            index.insert(zone);
        }
        index
    }

    /// Inserts or replaces a zone.
    pub fn insert(&self, zone: ZonePolygon) {
        self.zones.write().insert(zone.id, zone);
    }

    /// Number of zones in the index.
    pub fn len(&self) -> usize {
        self.zones.read().len()
    }

    /// Returns true if the index holds no zones.
    pub fn is_empty(&self) -> bool {
        self.zones.read().is_empty()
    }
}

impl ZoneIndex for MemoryZoneIndex {
    fn active_zones(&self) -> Vec<ZonePolygon> {
        self.zones.read().values().cloned().collect()
    }

    fn zone(&self, id: u64) -> Option<ZonePolygon> {
        self.zones.read().get(&id).cloned()
    }

    fn zone_by_code(&self, code: &str) -> Option<ZonePolygon> {
        self.zones.read().values().find(|z| z.code == code).cloned()
    }
}
