// ── Shared server state ──

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use macrosync_core::ReconciliationDriver;

use crate::sync::SyncCommand;

/// Static build metadata reported by `/health`.
#[derive(Debug, Clone, Copy)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            service: "macrosync",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// One async mutex per device id.
///
/// Reconciliation reads the live macro set and writes back a full
/// replacement, so two overlapping runs for the same device would lose an
/// update. Handlers hold the device's guard for the whole run; different
/// devices proceed in parallel. Entries nobody holds or waits on are
/// dropped on the next acquire, so the map stays as large as the set of
/// devices currently in flight.
#[derive(Debug, Default)]
pub struct DeviceLocks {
    locks: DashMap<u64, Arc<Mutex<()>>>,
}

impl DeviceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, device_id: u64) -> OwnedMutexGuard<()> {
        // The map holds the only reference to an idle lock.
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        // Clone the Arc out first so the shard lock is released before awaiting.
        let lock = self
            .locks
            .entry(device_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

pub struct AppState {
    pub driver: ReconciliationDriver,
    pub locks: DeviceLocks,
    pub sync: Option<SyncCommand>,
    pub build: BuildInfo,
}

impl AppState {
    pub fn new(driver: ReconciliationDriver, sync: Option<SyncCommand>) -> Self {
        Self {
            driver,
            locks: DeviceLocks::new(),
            sync,
            build: BuildInfo::default(),
        }
    }
}
