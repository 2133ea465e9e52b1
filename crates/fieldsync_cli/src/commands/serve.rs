//! `fieldsync serve` - run the reference sync server.

use super::{load_zones, CliError, CliResult};
use fieldsync_engine::{EngineConfig, MemoryStore, NoopNotifier, SystemClock};
use fieldsync_geo::{GeofenceThresholds, MemoryZoneIndex};
use fieldsync_server::{ServerConfig, SyncServer};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub fn run(
    zones: Option<PathBuf>,
    bind: &str,
    warning_meters: f64,
    hard_reject_meters: f64,
) -> CliResult {
    let zones = load_zones(zones)?;
    info!(zones = zones.len(), "loaded zone file");

    let bind_addr = bind
        .parse()
        .map_err(|_| CliError::BadBindAddr(bind.to_string()))?;

    let thresholds = GeofenceThresholds::new(warning_meters, hard_reject_meters);
    let server = SyncServer::new(
        ServerConfig::new(bind_addr),
        EngineConfig::new(thresholds),
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryZoneIndex::from_zones(zones)),
        Arc::new(SystemClock),
        Arc::new(NoopNotifier),
    );

    let runtime = tokio::runtime::Runtime::new().map_err(CliError::Io)?;
    runtime.block_on(server.run())?;
    Ok(())
}
