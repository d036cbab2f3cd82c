//! Unit registry shared by the controller (creation) and the reaper (exit).

use std::sync::mpsc::Sender;
use std::sync::{Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::error::{DispatchError, FleetError};
use crate::types::{Directive, WorkerId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Liveness {
    Active,
    Terminated,
}

struct WorkerRecord {
    liveness: Liveness,
    commands: Option<Sender<Directive>>,
    thread: Option<JoinHandle<()>>,
}

struct RegistryState {
    records: Vec<WorkerRecord>,
    active: usize,
}

/// Arena of unit records indexed by `WorkerId`; ids are never reused.
pub struct Registry {
    state: Mutex<RegistryState>,
    drained: Condvar,
}

/// Resources released when a unit is reaped.
pub struct Reaped {
    pub thread: Option<JoinHandle<()>>,
    pub active: usize,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState {
                records: Vec::new(),
                active: 0,
            }),
            drained: Condvar::new(),
        }
    }

    /// Allocate the next id and record the unit started by `start`.
    ///
    /// The lock is held while `start` runs so an early exit notice from the
    /// new unit cannot reach the reaper before its record exists.
    pub fn register<F>(&self, start: F) -> Result<(WorkerId, usize), FleetError>
    where
        F: FnOnce(WorkerId) -> Result<(Sender<Directive>, JoinHandle<()>), FleetError>,
    {
        let mut guard = self.state.lock().expect("registry mutex poisoned");
        let id = guard.records.len();
        let (commands, thread) = start(id)?;
        guard.records.push(WorkerRecord {
            liveness: Liveness::Active,
            commands: Some(commands),
            thread: Some(thread),
        });
        guard.active += 1;
        Ok((id, guard.active))
    }

    /// Command channel of an active unit, addressed by its 1-based number.
    pub fn command_channel(
        &self,
        unit: usize,
    ) -> Result<(WorkerId, Sender<Directive>), DispatchError> {
        let guard = self.state.lock().expect("registry mutex poisoned");
        let created = guard.records.len();
        let id = unit
            .checked_sub(1)
            .filter(|id| *id < created)
            .ok_or(DispatchError::NoSuchUnit { unit, created })?;
        let record = &guard.records[id];
        match (&record.liveness, &record.commands) {
            (Liveness::Active, Some(commands)) => Ok((id, commands.clone())),
            _ => Err(DispatchError::Terminated { id }),
        }
    }

    /// Flip a unit to `Terminated`; `None` if it is unknown or already reaped.
    pub fn mark_terminated(&self, id: WorkerId) -> Option<Reaped> {
        let mut guard = self.state.lock().expect("registry mutex poisoned");
        let record = guard.records.get_mut(id)?;
        if record.liveness == Liveness::Terminated {
            return None;
        }
        record.liveness = Liveness::Terminated;
        record.commands = None;
        let thread = record.thread.take();
        guard.active -= 1;
        let active = guard.active;
        if active == 0 {
            self.drained.notify_all();
        }
        Some(Reaped { thread, active })
    }

    /// Send `Kill` to every active unit and drop all command channels.
    ///
    /// Returns the number of units that were sent the directive.
    pub fn kill_all(&self) -> usize {
        let mut guard = self.state.lock().expect("registry mutex poisoned");
        let mut sent = 0;
        for record in guard.records.iter_mut() {
            if record.liveness != Liveness::Active {
                continue;
            }
            if let Some(commands) = record.commands.take() {
                if commands.send(Directive::Kill).is_ok() {
                    sent += 1;
                }
            }
        }
        sent
    }

    /// Block until no unit is active or `timeout` elapses; true if drained.
    pub fn wait_drained(&self, timeout: Duration) -> bool {
        let guard = self.state.lock().expect("registry mutex poisoned");
        let (guard, _) = self
            .drained
            .wait_timeout_while(guard, timeout, |state| state.active > 0)
            .expect("condvar wait failed");
        guard.active == 0
    }

    #[cfg(test)]
    pub fn liveness(&self, id: WorkerId) -> Option<Liveness> {
        let guard = self.state.lock().expect("registry mutex poisoned");
        guard.records.get(id).map(|record| record.liveness)
    }

    /// Ids of active units, ascending.
    pub fn active_ids(&self) -> Vec<WorkerId> {
        let guard = self.state.lock().expect("registry mutex poisoned");
        guard
            .records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.liveness == Liveness::Active)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn active_count(&self) -> usize {
        let guard = self.state.lock().expect("registry mutex poisoned");
        guard.active
    }
}
