//! Typed command structs, one per lifecycle operation. Validation happens
//! here and in the manager before anything reaches the engine or storage.

use sitelink_model::{
    BatchId, Communication, InstallationId, ProviderId,
};

/// Create a new installation request at a location.
///
/// The provider is resolved by the allocation engine: ranked for VSAT,
/// pinned to the reserved carrier for M2M. `batch_id` is minted from the
/// clock when the caller does not group the request explicitly.
#[derive(Debug, Clone)]
pub struct CreateInstallation {
    pub location: String,
    pub address: String,
    /// Branch person-in-charge contact.
    pub contact: String,
    pub area: String,
    pub communication: Communication,
    pub batch_id: Option<BatchId>,
}

/// Re-allocate a pending installation to a caller-chosen provider and
/// approve it in the same guarded update.
#[derive(Debug, Clone)]
pub struct OverrideInstallation {
    pub id: InstallationId,
    pub provider_id: ProviderId,
    pub location: String,
}

/// Create a relocation request for an existing installation. The `old_*`
/// side is copied from the installation at creation time.
#[derive(Debug, Clone)]
pub struct CreateRelocation {
    pub installation_id: InstallationId,
    pub new_location: String,
    pub new_address: String,
    pub new_area: String,
    pub new_communication: Communication,
    pub new_contact: String,
    pub batch_id: Option<BatchId>,
}

/// Create a dismantle request for an existing installation.
#[derive(Debug, Clone)]
pub struct CreateDismantle {
    pub installation_id: InstallationId,
    pub batch_id: Option<BatchId>,
}
