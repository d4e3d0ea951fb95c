use async_trait::async_trait;

use sitelink_model::{
    BatchId, BatchRow, Communication, Dismantle, DismantleId, Installation,
    InstallationId, PriceId, ProviderId, Relocation, RelocationId,
    RequestStatus,
};

use crate::allocation::Decision;
use crate::error::Result;

/// Fields for a new installation row. Provider/price/days are all `Some`
/// (ranked VSAT decision) or all `None` (fixed-carrier path).
#[derive(Debug, Clone)]
pub struct NewInstallation {
    pub location: String,
    pub address: String,
    pub contact: String,
    pub area: String,
    pub province: String,
    pub communication: Communication,
    pub provider_id: Option<ProviderId>,
    pub provider_name: Option<String>,
    pub price_id: Option<PriceId>,
    pub price: Option<i64>,
    pub days: Option<i32>,
    pub batch_id: BatchId,
}

/// Fields for a new relocation row. `old_*` and the provider columns are
/// copied from the source installation by the caller.
#[derive(Debug, Clone)]
pub struct NewRelocation {
    pub installation_id: InstallationId,
    pub old_location: String,
    pub new_location: String,
    pub old_address: String,
    pub new_address: String,
    pub old_area: String,
    pub new_area: String,
    pub old_communication: Communication,
    pub new_communication: Communication,
    pub old_contact: String,
    pub new_contact: String,
    pub provider_id: Option<ProviderId>,
    pub provider_name: Option<String>,
    pub batch_id: BatchId,
}

/// Fields for a new dismantle row, copied from the source installation by
/// the caller.
#[derive(Debug, Clone)]
pub struct NewDismantle {
    pub installation_id: InstallationId,
    pub location: String,
    pub provider_id: Option<ProviderId>,
    pub provider_name: Option<String>,
    pub batch_id: BatchId,
}

/// Storage filter for installation listings.
#[derive(Debug, Clone, Default)]
pub struct InstallationFilter {
    pub status: Option<RequestStatus>,
    pub communication: Option<Communication>,
    pub province: Option<String>,
}

/// Installation persistence.
///
/// `approve` and `override_terms` are conditional updates guarded by
/// `status = 'pending'`; under concurrent calls exactly one caller observes
/// `true` and the rest observe `false` ("no change").
#[async_trait]
pub trait InstallationsRepository: Send + Sync {
    async fn insert(&self, rec: NewInstallation) -> Result<Installation>;

    async fn get(&self, id: InstallationId) -> Result<Option<Installation>>;

    async fn list(&self, filter: InstallationFilter) -> Result<Vec<Installation>>;

    async fn list_by_batch(&self, batch: BatchId) -> Result<Vec<Installation>>;

    /// One representative row per distinct batch id, newest first within a
    /// batch and status ascending on a created-at tie. Strictly read-only.
    async fn batch_summary(&self, filter: Option<&str>) -> Result<Vec<BatchRow>>;

    /// `pending → approved`. Returns `false` when the row was not pending
    /// (or does not exist).
    async fn approve(&self, id: InstallationId) -> Result<bool>;

    /// Persist an override decision and approve in one guarded update.
    /// Returns `false` when the row was not pending.
    async fn override_terms(
        &self,
        id: InstallationId,
        decision: &Decision,
    ) -> Result<bool>;

    async fn count_by_status(&self, status: RequestStatus) -> Result<i64>;
}

/// Relocation persistence. `insert` and `approve` are atomic units that
/// also touch the referenced installation; a reader never observes one
/// side of the pair without the other.
#[async_trait]
pub trait RelocationsRepository: Send + Sync {
    /// Insert the relocation and set the installation's
    /// `relocation_pending` flag in one transaction. Fails with
    /// `InstallationNotFound` on a dangling reference and
    /// `RequestAlreadyPending` when a relocation is already outstanding.
    async fn insert(&self, rec: NewRelocation) -> Result<Relocation>;

    async fn get(&self, id: RelocationId) -> Result<Option<Relocation>>;

    async fn list(&self) -> Result<Vec<Relocation>>;

    async fn list_by_batch(&self, batch: BatchId) -> Result<Vec<Relocation>>;

    async fn batch_summary(&self, filter: Option<&str>) -> Result<Vec<BatchRow>>;

    /// Approve the relocation and rewrite the installation's
    /// location/address/area/communication/contact in one transaction,
    /// clearing `relocation_pending`. Returns `false` when the relocation
    /// was not pending.
    async fn approve(&self, id: RelocationId) -> Result<bool>;

    async fn count_by_status(&self, status: RequestStatus) -> Result<i64>;
}

/// Dismantle persistence, same atomicity contract as relocations.
#[async_trait]
pub trait DismantlesRepository: Send + Sync {
    /// Insert the dismantle and set the installation's `dismantle_pending`
    /// flag in one transaction.
    async fn insert(&self, rec: NewDismantle) -> Result<Dismantle>;

    async fn get(&self, id: DismantleId) -> Result<Option<Dismantle>>;

    async fn list(&self) -> Result<Vec<Dismantle>>;

    async fn list_by_batch(&self, batch: BatchId) -> Result<Vec<Dismantle>>;

    async fn batch_summary(&self, filter: Option<&str>) -> Result<Vec<BatchRow>>;

    /// Approve the dismantle and flip the installation to `dismantled` in
    /// one transaction, clearing `dismantle_pending`. Returns `false` when
    /// the dismantle was not pending.
    async fn approve(&self, id: DismantleId) -> Result<bool>;

    async fn count_by_status(&self, status: RequestStatus) -> Result<i64>;
}
