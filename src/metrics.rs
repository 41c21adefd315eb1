use std::sync::{Mutex, OnceLock};
use sysinfo::{MemoryRefreshKind, RefreshKind, System};

/// System memory at one point in time, in MB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemorySnapshot {
    pub total_mb: u64,
    pub used_mb: u64,
    pub avail_mb: u64,
}

static SYS: OnceLock<Mutex<System>> = OnceLock::new();

pub fn memory_snapshot() -> MemorySnapshot {
    let lock = SYS.get_or_init(|| {
        Mutex::new(System::new_with_specifics(
            RefreshKind::nothing().with_memory(MemoryRefreshKind::everything()),
        ))
    });
    let mut sys = match lock.lock() {
        Ok(g) => g,
        Err(poisoned) => poisoned.into_inner(),
    };
    sys.refresh_memory();
    let total_mb = sys.total_memory() / (1024 * 1024);
    let avail_mb = sys.available_memory() / (1024 * 1024);
    MemorySnapshot {
        total_mb,
        used_mb: total_mb.saturating_sub(avail_mb),
        avail_mb,
    }
}
