//! Convenience re-exports for downstream crates.

pub use crate::batch::{BatchRow, RequestKind};
pub use crate::catalog::{Coverage, Location, PriceEntry, Provider, SlaEntry};
pub use crate::error::ModelError;
pub use crate::ids::{
    BatchId, DismantleId, InstallationId, LocationId, PriceId, ProviderId,
    RelocationId,
};
pub use crate::request::{
    Communication, Dismantle, Installation, Relocation, RequestStatus,
};
