use std::sync::Arc;

use tracing::info;

use sitelink_model::{
    BatchId, BatchRow, Communication, Dismantle, DismantleId, Installation,
    InstallationId, Provider, Relocation, RelocationId, RequestKind,
    RequestStatus,
};

use crate::allocation::{AllocateOptions, AllocationEngine, Decision};
use crate::database::ports::{
    CatalogRepository, DismantlesRepository, InstallationFilter,
    InstallationsRepository, NewDismantle, NewInstallation, NewRelocation,
    RelocationsRepository,
};
use crate::error::{CoreError, Result};

use super::commands::{
    CreateDismantle, CreateInstallation, CreateRelocation, OverrideInstallation,
};

/// Pending/approved totals per request kind, the dashboard counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestCounts {
    pub installations_pending: i64,
    pub installations_approved: i64,
    pub installations_dismantled: i64,
    pub relocations_pending: i64,
    pub relocations_approved: i64,
    pub dismantles_pending: i64,
    pub dismantles_approved: i64,
}

/// Owns the request state machines and couples allocation decisions to
/// persisted records. All collaborators are injected; the manager holds no
/// state of its own and may be shared across request handlers.
#[derive(Clone)]
pub struct LifecycleManager {
    engine: AllocationEngine,
    catalog: Arc<dyn CatalogRepository>,
    installations: Arc<dyn InstallationsRepository>,
    relocations: Arc<dyn RelocationsRepository>,
    dismantles: Arc<dyn DismantlesRepository>,
}

impl std::fmt::Debug for LifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleManager").finish_non_exhaustive()
    }
}

impl LifecycleManager {
    pub fn new(
        engine: AllocationEngine,
        catalog: Arc<dyn CatalogRepository>,
        installations: Arc<dyn InstallationsRepository>,
        relocations: Arc<dyn RelocationsRepository>,
        dismantles: Arc<dyn DismantlesRepository>,
    ) -> Self {
        Self {
            engine,
            catalog,
            installations,
            relocations,
            dismantles,
        }
    }

    /// Expose the allocation decision directly (dry-run / preview flows).
    pub async fn allocate(
        &self,
        location: &str,
        pinned_provider: Option<sitelink_model::ProviderId>,
    ) -> Result<Decision> {
        let opts = match pinned_provider {
            Some(p) => AllocateOptions::pinned(p),
            None => AllocateOptions::default(),
        };
        self.engine.allocate(location, opts).await
    }

    /// Coverage-eligible providers for a location, unranked.
    pub async fn eligible_providers(&self, location: &str) -> Result<Vec<Provider>> {
        self.engine.eligible_providers(location).await
    }

    /// Mint a batch id for a bulk submission.
    pub fn new_batch_id(&self) -> BatchId {
        BatchId::generate()
    }

    // ── Installations ──

    /// Resolve a provider for the location and persist the installation in
    /// `pending`. Allocation failures surface unmodified.
    pub async fn create_installation(
        &self,
        cmd: CreateInstallation,
    ) -> Result<Installation> {
        let location = self
            .catalog
            .find_location(&cmd.location)
            .await?
            .ok_or_else(|| CoreError::LocationNotFound {
                name: cmd.location.clone(),
            })?;

        let decision = match cmd.communication {
            Communication::M2m => {
                self.engine
                    .allocate(
                        &location.name,
                        AllocateOptions::pinned(self.engine.m2m_provider()),
                    )
                    .await?
            }
            Communication::Vsat => {
                self.engine
                    .allocate(&location.name, AllocateOptions::default())
                    .await?
            }
        };

        let batch_id = cmd.batch_id.unwrap_or_else(BatchId::generate);
        let (provider_id, provider_name, price_id, price, days) =
            match decision.terms {
                Some(terms) => (
                    Some(decision.provider_id),
                    Some(decision.provider_name),
                    Some(terms.price_id),
                    Some(terms.price),
                    Some(terms.days),
                ),
                None => (None, None, None, None, None),
            };

        let installation = self
            .installations
            .insert(NewInstallation {
                location: location.name,
                address: cmd.address,
                contact: cmd.contact,
                area: cmd.area,
                province: location.province,
                communication: cmd.communication,
                provider_id,
                provider_name,
                price_id,
                price,
                days,
                batch_id,
            })
            .await?;

        Ok(installation)
    }

    /// `pending → approved`. `Ok(false)` means the record was not pending
    /// anymore (or never existed): "already processed", not a fault.
    pub async fn approve_installation(&self, id: InstallationId) -> Result<bool> {
        self.installations.approve(id).await
    }

    /// Re-allocate with a caller-pinned provider and approve, guarded by
    /// the `pending` precondition. If another actor approved the record
    /// first the update affects zero rows and `Ok(false)` is returned.
    pub async fn override_installation(
        &self,
        cmd: OverrideInstallation,
    ) -> Result<bool> {
        let decision = self
            .engine
            .allocate(&cmd.location, AllocateOptions::pinned(cmd.provider_id))
            .await?;

        let updated = self.installations.override_terms(cmd.id, &decision).await?;
        if !updated {
            info!(id = cmd.id.as_i64(), "override skipped, not pending");
        }
        Ok(updated)
    }

    pub async fn get_installation(&self, id: InstallationId) -> Result<Installation> {
        self.installations
            .get(id)
            .await?
            .ok_or(CoreError::InstallationNotFound(id))
    }

    pub async fn list_installations(
        &self,
        filter: InstallationFilter,
    ) -> Result<Vec<Installation>> {
        self.installations.list(filter).await
    }

    pub async fn installations_by_batch(
        &self,
        batch: BatchId,
    ) -> Result<Vec<Installation>> {
        self.installations.list_by_batch(batch).await
    }

    // ── Relocations ──

    /// Copy the current site fields off the installation and persist the
    /// relocation in `pending`, marking the installation's outstanding
    /// relocation in the same atomic unit.
    pub async fn create_relocation(&self, cmd: CreateRelocation) -> Result<Relocation> {
        let installation = self.get_installation(cmd.installation_id).await?;

        let batch_id = cmd.batch_id.unwrap_or_else(BatchId::generate);
        self.relocations
            .insert(NewRelocation {
                installation_id: installation.id,
                old_location: installation.location,
                new_location: cmd.new_location,
                old_address: installation.address,
                new_address: cmd.new_address,
                old_area: installation.area,
                new_area: cmd.new_area,
                old_communication: installation.communication,
                new_communication: cmd.new_communication,
                old_contact: installation.contact,
                new_contact: cmd.new_contact,
                provider_id: installation.provider_id,
                provider_name: installation.provider_name,
                batch_id,
            })
            .await
    }

    /// Approve the relocation and rewrite the installation in place. Both
    /// writes commit together; `Ok(false)` when the relocation was not
    /// pending.
    pub async fn approve_relocation(&self, id: RelocationId) -> Result<bool> {
        self.relocations.approve(id).await
    }

    pub async fn get_relocation(&self, id: RelocationId) -> Result<Relocation> {
        self.relocations
            .get(id)
            .await?
            .ok_or(CoreError::RelocationNotFound(id))
    }

    pub async fn list_relocations(&self) -> Result<Vec<Relocation>> {
        self.relocations.list().await
    }

    pub async fn relocations_by_batch(&self, batch: BatchId) -> Result<Vec<Relocation>> {
        self.relocations.list_by_batch(batch).await
    }

    // ── Dismantles ──

    /// Copy provider/location off the installation and persist the
    /// dismantle in `pending`, marking the installation's outstanding
    /// dismantle in the same atomic unit. `InstallationNotFound` on a
    /// dangling reference; no row is created in that case.
    pub async fn create_dismantle(&self, cmd: CreateDismantle) -> Result<Dismantle> {
        let installation = self.get_installation(cmd.installation_id).await?;

        let batch_id = cmd.batch_id.unwrap_or_else(BatchId::generate);
        self.dismantles
            .insert(NewDismantle {
                installation_id: installation.id,
                location: installation.location,
                provider_id: installation.provider_id,
                provider_name: installation.provider_name,
                batch_id,
            })
            .await
    }

    /// Approve the dismantle and retire the installation. Both writes
    /// commit together; `Ok(false)` when the dismantle was not pending.
    pub async fn approve_dismantle(&self, id: DismantleId) -> Result<bool> {
        self.dismantles.approve(id).await
    }

    pub async fn get_dismantle(&self, id: DismantleId) -> Result<Dismantle> {
        self.dismantles
            .get(id)
            .await?
            .ok_or(CoreError::DismantleNotFound(id))
    }

    pub async fn list_dismantles(&self) -> Result<Vec<Dismantle>> {
        self.dismantles.list().await
    }

    pub async fn dismantles_by_batch(&self, batch: BatchId) -> Result<Vec<Dismantle>> {
        self.dismantles.list_by_batch(batch).await
    }

    // ── Batch & dashboard queries ──

    /// One representative row per distinct batch id of the given kind,
    /// optionally filtered by a partial, case-insensitive batch id match.
    /// Strictly read-only.
    pub async fn list_batch_summary(
        &self,
        kind: RequestKind,
        filter: Option<&str>,
    ) -> Result<Vec<BatchRow>> {
        match kind {
            RequestKind::Installation => self.installations.batch_summary(filter).await,
            RequestKind::Relocation => self.relocations.batch_summary(filter).await,
            RequestKind::Dismantle => self.dismantles.batch_summary(filter).await,
        }
    }

    /// Pending/approved totals across all three request kinds.
    pub async fn request_counts(&self) -> Result<RequestCounts> {
        Ok(RequestCounts {
            installations_pending: self
                .installations
                .count_by_status(RequestStatus::Pending)
                .await?,
            installations_approved: self
                .installations
                .count_by_status(RequestStatus::Approved)
                .await?,
            installations_dismantled: self
                .installations
                .count_by_status(RequestStatus::Dismantled)
                .await?,
            relocations_pending: self
                .relocations
                .count_by_status(RequestStatus::Pending)
                .await?,
            relocations_approved: self
                .relocations
                .count_by_status(RequestStatus::Approved)
                .await?,
            dismantles_pending: self
                .dismantles
                .count_by_status(RequestStatus::Pending)
                .await?,
            dismantles_approved: self
                .dismantles
                .count_by_status(RequestStatus::Approved)
                .await?,
        })
    }
}
