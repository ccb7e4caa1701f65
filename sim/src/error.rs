//! Errors surfaced to callers of the driver.
//!
//! Blocking on a resource is modeled queuing, never an error. Engine bugs
//! (negative delays, negative levels, over-granted slots) panic instead of
//! showing up here.

use std::fmt;

use crate::process::ProcessId;

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SimError {
    /// A single request exceeds the total capacity of the resource and can
    /// never be satisfied.
    InvalidDemand {
        process: ProcessId,
        requested: u64,
        capacity: u64,
    },
    /// A configuration field is out of range.
    InvalidConfig { field: &'static str, reason: String },
    /// Statistics were requested on a run where no process completed.
    EmptyResultSet,
}

impl SimError {
    pub(crate) fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDemand {
                process,
                requested,
                capacity,
            } => write!(
                f,
                "process {process} requested {requested} units but capacity is {capacity}"
            ),
            Self::InvalidConfig { field, reason } => {
                write!(f, "invalid config `{field}`: {reason}")
            }
            Self::EmptyResultSet => write!(f, "no process completed; no data"),
        }
    }
}

impl std::error::Error for SimError {}
