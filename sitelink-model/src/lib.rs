//! Core data model definitions shared across Sitelink crates.
#![allow(missing_docs)]

pub mod batch;
pub mod catalog;
pub mod error;
pub mod ids;
pub mod prelude;
pub mod request;

// Intentionally curated re-exports for downstream consumers.
pub use batch::{BatchRow, RequestKind};
pub use catalog::{Coverage, Location, PriceEntry, Provider, SlaEntry};
pub use error::{ModelError, Result as ModelResult};
pub use ids::{
    BatchId, DismantleId, InstallationId, LocationId, PriceId, ProviderId,
    RelocationId,
};
pub use request::{
    Communication, Dismantle, Installation, Relocation, RequestStatus,
};
