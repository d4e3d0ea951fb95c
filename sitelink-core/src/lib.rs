//! Core library for Sitelink: the provider allocation engine, the request
//! lifecycle manager and the storage access layer they are built on.
//!
//! The HTTP surface, authentication and raw catalog read endpoints live in
//! sibling crates; this crate only exposes the decision logic and the
//! repository ports it consumes.
#![allow(missing_docs)]

/// Provider ranking and tie-break decision logic
pub mod allocation;

/// Settings loading and validation
pub mod config;

/// Repository ports and their PostgreSQL implementations
pub mod database;

/// Error types and error handling utilities
pub mod error;

/// Installation/relocation/dismantle state machines and batch queries
pub mod lifecycle;

pub use allocation::{
    AllocateOptions, AllocationEngine, AllocationSettings, Decision, Terms,
};
pub use config::{DatabaseConfig, Settings};
pub use error::{CoreError, Result};
pub use lifecycle::{
    CreateDismantle, CreateInstallation, CreateRelocation, InstallationFilter,
    LifecycleManager, OverrideInstallation, RequestCounts,
};

pub use sitelink_model as model;
