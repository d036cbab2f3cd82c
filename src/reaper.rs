//! Consumes exit notices and retires the matching registry records.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::error::FleetError;
use crate::logging::Console;
use crate::registry::Registry;
use crate::types::{WorkerId, unit_number};

/// Retire one exited unit: mark it terminated, release its channel, and join
/// its thread. Returns false for a duplicate or unknown notice.
pub fn reap(registry: &Registry, console: &dyn Console, id: WorkerId) -> bool {
    let Some(reaped) = registry.mark_terminated(id) else {
        warn!(unit = unit_number(id), "exit notice for a unit that is not active");
        return false;
    };
    if let Some(thread) = reaped.thread {
        if thread.join().is_err() {
            warn!(unit = unit_number(id), "unit thread panicked");
        }
    }
    debug!(unit = unit_number(id), active = reaped.active, "unit reaped");
    console.info(&format!("Unit {} was terminated.", unit_number(id)));
    true
}

/// Start the reaper; it runs until every exit sender has been dropped.
pub fn spawn(
    registry: Arc<Registry>,
    console: Arc<dyn Console>,
    exits: Receiver<WorkerId>,
) -> Result<JoinHandle<()>, FleetError> {
    thread::Builder::new()
        .name("reaper".to_string())
        .spawn(move || {
            for id in exits.iter() {
                reap(&registry, console.as_ref(), id);
            }
            debug!("exit channel closed");
        })
        .map_err(|source| FleetError::Spawn {
            role: "reaper".to_string(),
            source,
        })
}
