//! The request lifecycle: installation/relocation/dismantle state machines,
//! the transactional coupling between an allocation decision and a
//! persisted request, and batch summary queries.
//!
//! Transitions happen through explicit commands only; there are no timers.
//! Status checks and writes are single conditional storage operations, so
//! two concurrent approval attempts on the same record resolve to exactly
//! one success and one no-op.

mod commands;
mod manager;

pub use commands::{
    CreateDismantle, CreateInstallation, CreateRelocation, OverrideInstallation,
};
pub use manager::{LifecycleManager, RequestCounts};

pub use crate::database::ports::InstallationFilter;
