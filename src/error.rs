use thiserror::Error;

use crate::types::WorkerId;

/// Unrecoverable setup failures; reported as `CRIT_ERR` and end the process.
#[derive(Error, Debug)]
pub enum FleetError {
    #[error("Unable to start {role} thread: {source}")]
    Spawn {
        role: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to read operator input: {0}")]
    Input(#[from] std::io::Error),
}

/// Reasons a directive could not be forwarded to a unit.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Unit {unit} does not exist ({created} created so far).")]
    NoSuchUnit { unit: usize, created: usize },

    #[error("This unit is inaccessible, because it was terminated.")]
    Terminated { id: WorkerId },
}
