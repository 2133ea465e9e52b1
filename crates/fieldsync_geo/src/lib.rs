//! # Fieldsync Geo
//!
//! Geofence geometry and validation for Fieldsync.
//!
//! This crate provides:
//! - `GeoPoint` with reported GPS accuracy
//! - `ZonePolygon` with ray-casting containment and vertex distance
//! - Haversine great-circle distance
//! - `GeofenceEngine` classifying points as accepted / warned / rejected
//! - `ZoneIndex` lookup trait with an in-memory implementation
//!
//! This is a pure geometry crate with no I/O. The engine holds no mutable
//! state: identical `(point, zones, thresholds)` inputs always produce
//! identical outcomes.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod engine;
mod error;
mod index;
mod point;
mod polygon;

pub use engine::{Decision, GeofenceEngine, GeofenceThresholds, ValidationOutcome};
pub use error::{GeoError, GeoResult};
pub use index::{MemoryZoneIndex, ZoneIndex};
pub use point::{haversine_meters, GeoPoint, EARTH_RADIUS_METERS, METERS_PER_DEGREE_LATITUDE};
pub use polygon::ZonePolygon;
