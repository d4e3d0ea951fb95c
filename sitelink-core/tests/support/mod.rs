//! In-memory repository fakes for driving the engine and lifecycle manager
//! without a live database. Write operations take one lock per call, so
//! the conditional-update contracts hold under concurrency exactly as the
//! PostgreSQL implementations guarantee them.

// Each test binary uses a different slice of the harness.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use sitelink_core::allocation::{
    AllocationEngine, AllocationSettings, Decision,
};
use sitelink_core::database::ports::{
    CatalogRepository, DismantlesRepository, InstallationFilter,
    InstallationsRepository, LoadIndexRepository, NewDismantle,
    NewInstallation, NewRelocation, RelocationsRepository,
};
use sitelink_core::error::{CoreError, Result};
use sitelink_core::model::{
    BatchId, BatchRow, Communication, Coverage, Dismantle, DismantleId,
    Installation, InstallationId, Location, LocationId, PriceEntry, PriceId,
    Provider, ProviderId, Relocation, RelocationId, RequestKind,
    RequestStatus, SlaEntry,
};

/// The reserved fixed-carrier id used across the test fixtures.
pub const M2M: ProviderId = ProviderId(99);

/// Route engine/manager logs through the test harness. Run with
/// `RUST_LOG=debug` to see allocation decisions; repeated calls no-op.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn test_settings() -> AllocationSettings {
    AllocationSettings {
        saturation_threshold: 10,
        m2m_provider_id: M2M,
        m2m_provider_name: "M2M".to_string(),
    }
}

// ── Catalog fake ──

#[derive(Default)]
pub struct InMemoryCatalog {
    locations: Vec<Location>,
    providers: Vec<Provider>,
    coverage: Vec<(String, Coverage)>,
    slas: Vec<(String, SlaEntry)>,
    prices: Vec<(String, PriceEntry)>,
    calls: AtomicUsize,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn location(mut self, id: i64, name: &str, province: &str) -> Self {
        self.locations.push(Location {
            id: LocationId(id),
            name: name.to_string(),
            province: province.to_string(),
        });
        self
    }

    pub fn provider(mut self, id: i64, name: &str) -> Self {
        self.providers.push(Provider {
            id: ProviderId(id),
            name: name.to_string(),
        });
        self
    }

    pub fn coverage(mut self, location: &str, provider: i64, available: bool) -> Self {
        let location_id = self
            .locations
            .iter()
            .find(|l| l.name == location)
            .map(|l| l.id)
            .unwrap_or(LocationId(0));
        self.coverage.push((
            location.to_string(),
            Coverage {
                location_id,
                provider_id: ProviderId(provider),
                available,
            },
        ));
        self
    }

    pub fn sla(mut self, location: &str, provider: i64, days: i32) -> Self {
        self.slas.push((
            location.to_string(),
            SlaEntry {
                provider_id: ProviderId(provider),
                days,
            },
        ));
        self
    }

    pub fn price(mut self, location: &str, provider: i64, price_id: i64, amount: i64) -> Self {
        self.prices.push((
            location.to_string(),
            PriceEntry {
                provider_id: ProviderId(provider),
                price_id: PriceId(price_id),
                amount,
            },
        ));
        self
    }

    /// Number of repository calls observed, for the no-lookup assertions.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalog {
    async fn find_location(&self, name: &str) -> Result<Option<Location>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.locations.iter().find(|l| l.name == name).cloned())
    }

    async fn find_providers(&self) -> Result<Vec<Provider>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.providers.clone())
    }

    async fn find_coverage(&self, location: &str) -> Result<Vec<Coverage>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .coverage
            .iter()
            .filter(|(loc, _)| loc == location)
            .map(|(_, c)| c.clone())
            .collect())
    }

    async fn find_sla(
        &self,
        location: &str,
        providers: &[ProviderId],
    ) -> Result<Vec<SlaEntry>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut rows: Vec<SlaEntry> = self
            .slas
            .iter()
            .filter(|(loc, s)| loc == location && providers.contains(&s.provider_id))
            .map(|(_, s)| *s)
            .collect();
        rows.sort_by_key(|s| (s.days, s.provider_id));
        Ok(rows)
    }

    async fn find_price(
        &self,
        location: &str,
        providers: &[ProviderId],
    ) -> Result<Vec<PriceEntry>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut rows: Vec<PriceEntry> = self
            .prices
            .iter()
            .filter(|(loc, p)| loc == location && providers.contains(&p.provider_id))
            .map(|(_, p)| *p)
            .collect();
        rows.sort_by_key(|p| (p.amount, p.provider_id));
        Ok(rows)
    }
}

// ── Request store fake ──

#[derive(Default)]
struct RequestState {
    installations: HashMap<i64, Installation>,
    relocations: HashMap<i64, Relocation>,
    dismantles: HashMap<i64, Dismantle>,
}

/// One store backing all three request repositories plus the load index,
/// mirroring how the real tables share a database.
#[derive(Default)]
pub struct InMemoryRequestStore {
    state: Mutex<RequestState>,
    next_id: AtomicI64,
    clock: AtomicI64,
}

impl InMemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Deterministic, strictly increasing timestamps so batch
    /// representative selection is reproducible.
    fn tick(&self) -> DateTime<Utc> {
        let n = self.clock.fetch_add(1, Ordering::SeqCst);
        Utc.timestamp_opt(1_700_000_000 + n, 0).unwrap()
    }

    /// Seed `n` active installations for a provider in a province, to
    /// shape the load index.
    pub fn seed_active(&self, provider: ProviderId, province: &str, n: usize) {
        for _ in 0..n {
            let id = self.next_id();
            let created_at = self.tick();
            let mut state = self.state.lock().unwrap();
            state.installations.insert(
                id,
                Installation {
                    id: InstallationId(id),
                    location: format!("seed-{province}"),
                    address: "seed".to_string(),
                    contact: "seed".to_string(),
                    area: province.to_string(),
                    province: province.to_string(),
                    communication: Communication::Vsat,
                    provider_id: Some(provider),
                    provider_name: Some(format!("provider-{}", provider.as_i64())),
                    price_id: Some(PriceId(1)),
                    price: Some(100),
                    days: Some(5),
                    status: RequestStatus::Approved,
                    relocation_pending: false,
                    dismantle_pending: false,
                    batch_id: BatchId(0),
                    created_at,
                },
            );
        }
    }

    pub fn installation_count(&self) -> usize {
        self.state.lock().unwrap().installations.len()
    }

    pub fn dismantle_count(&self) -> usize {
        self.state.lock().unwrap().dismantles.len()
    }
}

fn summarize(
    rows: Vec<(BatchId, i64, String, RequestStatus, DateTime<Utc>)>,
    kind: RequestKind,
    filter: Option<&str>,
) -> Vec<BatchRow> {
    let needle = filter.map(str::to_lowercase);
    let mut by_batch: HashMap<i64, (BatchId, i64, String, RequestStatus, DateTime<Utc>)> =
        HashMap::new();

    for row in rows {
        if let Some(needle) = &needle
            && !row.0.as_i64().to_string().to_lowercase().contains(needle)
        {
            continue;
        }
        by_batch
            .entry(row.0.as_i64())
            .and_modify(|current| {
                // Newest first, status ascending on a created-at tie.
                if (row.4, std::cmp::Reverse(row.3)) > (current.4, std::cmp::Reverse(current.3)) {
                    *current = row.clone();
                }
            })
            .or_insert(row);
    }

    let mut summary: Vec<BatchRow> = by_batch
        .into_values()
        .map(|(batch_id, record_id, location, status, created_at)| BatchRow {
            batch_id,
            kind,
            record_id,
            location,
            status,
            created_at,
        })
        .collect();
    summary.sort_by_key(|r| r.batch_id.as_i64());
    summary
}

#[async_trait]
impl LoadIndexRepository for InMemoryRequestStore {
    async fn count_active_by_provider(
        &self,
        provider: ProviderId,
        province: Option<&str>,
    ) -> Result<i64> {
        let state = self.state.lock().unwrap();
        Ok(state
            .installations
            .values()
            .filter(|i| {
                i.provider_id == Some(provider)
                    && matches!(
                        i.status,
                        RequestStatus::Pending | RequestStatus::Approved
                    )
                    && province.is_none_or(|p| i.province == p)
            })
            .count() as i64)
    }
}

#[async_trait]
impl InstallationsRepository for InMemoryRequestStore {
    async fn insert(&self, rec: NewInstallation) -> Result<Installation> {
        let id = self.next_id();
        let created_at = self.tick();
        let installation = Installation {
            id: InstallationId(id),
            location: rec.location,
            address: rec.address,
            contact: rec.contact,
            area: rec.area,
            province: rec.province,
            communication: rec.communication,
            provider_id: rec.provider_id,
            provider_name: rec.provider_name,
            price_id: rec.price_id,
            price: rec.price,
            days: rec.days,
            status: RequestStatus::Pending,
            relocation_pending: false,
            dismantle_pending: false,
            batch_id: rec.batch_id,
            created_at,
        };
        self.state
            .lock()
            .unwrap()
            .installations
            .insert(id, installation.clone());
        Ok(installation)
    }

    async fn get(&self, id: InstallationId) -> Result<Option<Installation>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .installations
            .get(&id.as_i64())
            .cloned())
    }

    async fn list(&self, filter: InstallationFilter) -> Result<Vec<Installation>> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<Installation> = state
            .installations
            .values()
            .filter(|i| {
                filter.status.is_none_or(|s| i.status == s)
                    && filter.communication.is_none_or(|c| i.communication == c)
                    && filter
                        .province
                        .as_deref()
                        .is_none_or(|p| i.province == p)
            })
            .cloned()
            .collect();
        rows.sort_by_key(|i| std::cmp::Reverse((i.created_at, i.id.as_i64())));
        Ok(rows)
    }

    async fn list_by_batch(&self, batch: BatchId) -> Result<Vec<Installation>> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<Installation> = state
            .installations
            .values()
            .filter(|i| i.batch_id == batch)
            .cloned()
            .collect();
        rows.sort_by_key(|i| i.id.as_i64());
        Ok(rows)
    }

    async fn batch_summary(&self, filter: Option<&str>) -> Result<Vec<BatchRow>> {
        let state = self.state.lock().unwrap();
        let rows = state
            .installations
            .values()
            .map(|i| {
                (
                    i.batch_id,
                    i.id.as_i64(),
                    i.location.clone(),
                    i.status,
                    i.created_at,
                )
            })
            .collect();
        Ok(summarize(rows, RequestKind::Installation, filter))
    }

    async fn approve(&self, id: InstallationId) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        match state.installations.get_mut(&id.as_i64()) {
            Some(i) if i.status == RequestStatus::Pending => {
                i.status = RequestStatus::Approved;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn override_terms(
        &self,
        id: InstallationId,
        decision: &Decision,
    ) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        match state.installations.get_mut(&id.as_i64()) {
            Some(i) if i.status == RequestStatus::Pending => {
                match &decision.terms {
                    Some(terms) => {
                        i.provider_id = Some(decision.provider_id);
                        i.provider_name = Some(decision.provider_name.clone());
                        i.price_id = Some(terms.price_id);
                        i.price = Some(terms.price);
                        i.days = Some(terms.days);
                    }
                    None => {
                        i.provider_id = None;
                        i.provider_name = None;
                        i.price_id = None;
                        i.price = None;
                        i.days = None;
                        i.communication = Communication::M2m;
                    }
                }
                i.status = RequestStatus::Approved;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn count_by_status(&self, status: RequestStatus) -> Result<i64> {
        let state = self.state.lock().unwrap();
        Ok(state
            .installations
            .values()
            .filter(|i| i.status == status)
            .count() as i64)
    }
}

#[async_trait]
impl RelocationsRepository for InMemoryRequestStore {
    async fn insert(&self, rec: NewRelocation) -> Result<Relocation> {
        let id = self.next_id();
        let created_at = self.tick();
        let mut state = self.state.lock().unwrap();

        let installation = state
            .installations
            .get_mut(&rec.installation_id.as_i64())
            .ok_or(CoreError::InstallationNotFound(rec.installation_id))?;
        if installation.relocation_pending {
            return Err(CoreError::RequestAlreadyPending {
                installation: rec.installation_id,
                kind: RequestKind::Relocation,
            });
        }
        installation.relocation_pending = true;

        let relocation = Relocation {
            id: RelocationId(id),
            installation_id: rec.installation_id,
            old_location: rec.old_location,
            new_location: rec.new_location,
            old_address: rec.old_address,
            new_address: rec.new_address,
            old_area: rec.old_area,
            new_area: rec.new_area,
            old_communication: rec.old_communication,
            new_communication: rec.new_communication,
            old_contact: rec.old_contact,
            new_contact: rec.new_contact,
            provider_id: rec.provider_id,
            provider_name: rec.provider_name,
            status: RequestStatus::Pending,
            batch_id: rec.batch_id,
            created_at,
        };
        state.relocations.insert(id, relocation.clone());
        Ok(relocation)
    }

    async fn get(&self, id: RelocationId) -> Result<Option<Relocation>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .relocations
            .get(&id.as_i64())
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Relocation>> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<Relocation> = state.relocations.values().cloned().collect();
        rows.sort_by_key(|r| std::cmp::Reverse((r.created_at, r.id.as_i64())));
        Ok(rows)
    }

    async fn list_by_batch(&self, batch: BatchId) -> Result<Vec<Relocation>> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<Relocation> = state
            .relocations
            .values()
            .filter(|r| r.batch_id == batch)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.id.as_i64());
        Ok(rows)
    }

    async fn batch_summary(&self, filter: Option<&str>) -> Result<Vec<BatchRow>> {
        let state = self.state.lock().unwrap();
        let rows = state
            .relocations
            .values()
            .map(|r| {
                (
                    r.batch_id,
                    r.id.as_i64(),
                    r.new_location.clone(),
                    r.status,
                    r.created_at,
                )
            })
            .collect();
        Ok(summarize(rows, RequestKind::Relocation, filter))
    }

    async fn approve(&self, id: RelocationId) -> Result<bool> {
        let mut state = self.state.lock().unwrap();

        let Some(relocation) = state.relocations.get_mut(&id.as_i64()) else {
            return Ok(false);
        };
        if relocation.status != RequestStatus::Pending {
            return Ok(false);
        }
        relocation.status = RequestStatus::Approved;
        let (installation_id, new_location, new_address, new_area, new_comm, new_contact) = (
            relocation.installation_id,
            relocation.new_location.clone(),
            relocation.new_address.clone(),
            relocation.new_area.clone(),
            relocation.new_communication,
            relocation.new_contact.clone(),
        );

        if let Some(installation) =
            state.installations.get_mut(&installation_id.as_i64())
        {
            installation.location = new_location;
            installation.address = new_address;
            installation.area = new_area;
            installation.communication = new_comm;
            installation.contact = new_contact;
            installation.relocation_pending = false;
        }
        Ok(true)
    }

    async fn count_by_status(&self, status: RequestStatus) -> Result<i64> {
        let state = self.state.lock().unwrap();
        Ok(state
            .relocations
            .values()
            .filter(|r| r.status == status)
            .count() as i64)
    }
}

#[async_trait]
impl DismantlesRepository for InMemoryRequestStore {
    async fn insert(&self, rec: NewDismantle) -> Result<Dismantle> {
        let id = self.next_id();
        let created_at = self.tick();
        let mut state = self.state.lock().unwrap();

        let installation = state
            .installations
            .get_mut(&rec.installation_id.as_i64())
            .ok_or(CoreError::InstallationNotFound(rec.installation_id))?;
        if installation.dismantle_pending {
            return Err(CoreError::RequestAlreadyPending {
                installation: rec.installation_id,
                kind: RequestKind::Dismantle,
            });
        }
        installation.dismantle_pending = true;

        let dismantle = Dismantle {
            id: DismantleId(id),
            installation_id: rec.installation_id,
            location: rec.location,
            provider_id: rec.provider_id,
            provider_name: rec.provider_name,
            status: RequestStatus::Pending,
            batch_id: rec.batch_id,
            created_at,
        };
        state.dismantles.insert(id, dismantle.clone());
        Ok(dismantle)
    }

    async fn get(&self, id: DismantleId) -> Result<Option<Dismantle>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .dismantles
            .get(&id.as_i64())
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Dismantle>> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<Dismantle> = state.dismantles.values().cloned().collect();
        rows.sort_by_key(|d| std::cmp::Reverse((d.created_at, d.id.as_i64())));
        Ok(rows)
    }

    async fn list_by_batch(&self, batch: BatchId) -> Result<Vec<Dismantle>> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<Dismantle> = state
            .dismantles
            .values()
            .filter(|d| d.batch_id == batch)
            .cloned()
            .collect();
        rows.sort_by_key(|d| d.id.as_i64());
        Ok(rows)
    }

    async fn batch_summary(&self, filter: Option<&str>) -> Result<Vec<BatchRow>> {
        let state = self.state.lock().unwrap();
        let rows = state
            .dismantles
            .values()
            .map(|d| {
                (
                    d.batch_id,
                    d.id.as_i64(),
                    d.location.clone(),
                    d.status,
                    d.created_at,
                )
            })
            .collect();
        Ok(summarize(rows, RequestKind::Dismantle, filter))
    }

    async fn approve(&self, id: DismantleId) -> Result<bool> {
        let mut state = self.state.lock().unwrap();

        let Some(dismantle) = state.dismantles.get_mut(&id.as_i64()) else {
            return Ok(false);
        };
        if dismantle.status != RequestStatus::Pending {
            return Ok(false);
        }
        dismantle.status = RequestStatus::Approved;
        let installation_id = dismantle.installation_id;

        if let Some(installation) =
            state.installations.get_mut(&installation_id.as_i64())
        {
            installation.status = RequestStatus::Dismantled;
            installation.dismantle_pending = false;
        }
        Ok(true)
    }

    async fn count_by_status(&self, status: RequestStatus) -> Result<i64> {
        let state = self.state.lock().unwrap();
        Ok(state
            .dismantles
            .values()
            .filter(|d| d.status == status)
            .count() as i64)
    }
}

/// Engine over the given fakes with the fixture settings.
pub fn engine(
    catalog: std::sync::Arc<InMemoryCatalog>,
    store: std::sync::Arc<InMemoryRequestStore>,
) -> AllocationEngine {
    AllocationEngine::new(catalog, store, test_settings())
}
