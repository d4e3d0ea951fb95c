//! The allocation decision function.
//!
//! Ranking order: coverage eligibility, then ascending SLA days, then
//! ascending price, then current provider load (province scope first,
//! global fallback). Every stage is deterministic; final ties resolve to
//! the first candidate in sorted order, never randomly.
//!
//! The engine only reads. It is reentrant, performs no retries and holds
//! no state beyond its injected repositories and settings.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use sitelink_model::{Location, PriceEntry, PriceId, ProviderId};

use crate::database::ports::{CatalogRepository, LoadIndexRepository};
use crate::error::{CoreError, Result};

/// Tuning knobs for the engine, loaded through [`crate::Settings`].
#[derive(Debug, Clone, Deserialize)]
pub struct AllocationSettings {
    /// Maximum concurrent active (pending + approved) requests a provider
    /// may hold before being excluded from new allocations.
    pub saturation_threshold: i64,
    /// Reserved provider id for the fixed M2M carrier. Pinning this id
    /// bypasses ranking entirely.
    pub m2m_provider_id: ProviderId,
    /// Display name recorded on decisions for the M2M carrier.
    pub m2m_provider_name: String,
}

impl AllocationSettings {
    pub const DEFAULT_SATURATION_THRESHOLD: i64 = 10;
}

/// Resolved contract terms for a ranked (VSAT) decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Terms {
    pub price_id: PriceId,
    pub price: i64,
    pub days: i32,
}

/// The outcome of an allocation: the chosen provider and, for ranked
/// decisions, its contract terms. `terms` is `None` only on the
/// fixed-carrier (M2M) path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub provider_id: ProviderId,
    pub provider_name: String,
    pub terms: Option<Terms>,
}

impl Decision {
    /// Whether this decision took the fixed-carrier path.
    pub fn is_fixed_carrier(&self) -> bool {
        self.terms.is_none()
    }
}

/// Per-call options for [`AllocationEngine::allocate`].
#[derive(Debug, Clone, Copy)]
pub struct AllocateOptions {
    /// Drop providers at or above the saturation threshold before ranking.
    /// Ignored when a provider is pinned.
    pub exclude_saturated: bool,
    /// Restrict the candidate set to exactly this provider (override flow).
    pub pinned_provider: Option<ProviderId>,
}

impl Default for AllocateOptions {
    fn default() -> Self {
        Self {
            exclude_saturated: true,
            pinned_provider: None,
        }
    }
}

impl AllocateOptions {
    pub fn pinned(provider: ProviderId) -> Self {
        Self {
            exclude_saturated: false,
            pinned_provider: Some(provider),
        }
    }
}

/// Pure decision function over the injected catalog and load index.
#[derive(Clone)]
pub struct AllocationEngine {
    catalog: Arc<dyn CatalogRepository>,
    load: Arc<dyn LoadIndexRepository>,
    settings: AllocationSettings,
}

impl std::fmt::Debug for AllocationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AllocationEngine")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl AllocationEngine {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        load: Arc<dyn LoadIndexRepository>,
        settings: AllocationSettings,
    ) -> Self {
        Self {
            catalog,
            load,
            settings,
        }
    }

    /// The reserved M2M carrier id this engine short-circuits on.
    pub fn m2m_provider(&self) -> ProviderId {
        self.settings.m2m_provider_id
    }

    /// Resolve a provider and contract terms for `location`.
    ///
    /// With a pinned provider the candidate set is restricted to exactly
    /// that provider; coverage, SLA and price rows are still required
    /// unless the pin is the reserved M2M carrier, which returns a fixed
    /// decision with no catalog lookups at all.
    pub async fn allocate(
        &self,
        location: &str,
        opts: AllocateOptions,
    ) -> Result<Decision> {
        if let Some(pinned) = opts.pinned_provider
            && pinned == self.settings.m2m_provider_id
        {
            return Ok(Decision {
                provider_id: pinned,
                provider_name: self.settings.m2m_provider_name.clone(),
                terms: None,
            });
        }

        let location = self
            .catalog
            .find_location(location)
            .await?
            .ok_or_else(|| CoreError::LocationNotFound {
                name: location.to_string(),
            })?;

        let candidates = self.candidate_providers(&opts).await?;
        let eligible = self.coverage_filter(&location, &candidates).await?;

        let provider_names: HashMap<ProviderId, &str> = candidates
            .iter()
            .map(|p| (p.id, p.name.as_str()))
            .collect();

        // SLA ranking. The repository contract sorts ascending by days.
        let slas = self.catalog.find_sla(&location.name, &eligible).await?;
        let Some(best) = slas.first() else {
            return Err(CoreError::NoServiceableProvider {
                location: location.name,
            });
        };
        let best_days = best.days;
        let finalists: Vec<ProviderId> = slas
            .iter()
            .take_while(|s| s.days == best_days)
            .map(|s| s.provider_id)
            .collect();

        // Price tie-break, ascending by amount per the repository contract.
        let prices = self.catalog.find_price(&location.name, &finalists).await?;
        let Some(cheapest) = prices.first() else {
            return Err(CoreError::NoPricingAvailable {
                location: location.name,
            });
        };
        let best_price = cheapest.amount;
        let price_tied: Vec<&PriceEntry> = prices
            .iter()
            .take_while(|p| p.amount == best_price)
            .collect();

        let chosen = if price_tied.len() == 1 {
            price_tied[0]
        } else {
            self.least_loaded(&price_tied, &location.province).await?
        };

        debug!(
            location = %location.name,
            provider = chosen.provider_id.as_i64(),
            days = best_days,
            price = chosen.amount,
            "allocation resolved"
        );

        Ok(Decision {
            provider_id: chosen.provider_id,
            provider_name: provider_names
                .get(&chosen.provider_id)
                .map(|n| (*n).to_string())
                .unwrap_or_default(),
            terms: Some(Terms {
                price_id: chosen.price_id,
                price: chosen.amount,
                days: best_days,
            }),
        })
    }

    /// Coverage-eligible providers for a location, without any ranking.
    pub async fn eligible_providers(
        &self,
        location: &str,
    ) -> Result<Vec<sitelink_model::Provider>> {
        let location = self
            .catalog
            .find_location(location)
            .await?
            .ok_or_else(|| CoreError::LocationNotFound {
                name: location.to_string(),
            })?;

        let providers = self.catalog.find_providers().await?;
        let covered = self.covered_set(&location).await?;
        Ok(providers
            .into_iter()
            .filter(|p| covered.contains(&p.id))
            .collect())
    }

    /// Step 1: all providers, minus saturated ones when admission control
    /// is on, or exactly the pinned provider.
    async fn candidate_providers(
        &self,
        opts: &AllocateOptions,
    ) -> Result<Vec<sitelink_model::Provider>> {
        let providers = self.catalog.find_providers().await?;

        if let Some(pinned) = opts.pinned_provider {
            let provider = providers
                .into_iter()
                .find(|p| p.id == pinned)
                .ok_or(CoreError::ProviderNotFound(pinned))?;
            return Ok(vec![provider]);
        }

        if !opts.exclude_saturated {
            return Ok(providers);
        }

        let mut admitted = Vec::with_capacity(providers.len());
        for provider in providers {
            let active = self.load.count_active_by_provider(provider.id, None).await?;
            if active < self.settings.saturation_threshold {
                admitted.push(provider);
            } else {
                debug!(
                    provider = provider.id.as_i64(),
                    active, "provider saturated, excluded from allocation"
                );
            }
        }
        Ok(admitted)
    }

    /// Step 2: keep candidates with an available coverage row.
    async fn coverage_filter(
        &self,
        location: &Location,
        candidates: &[sitelink_model::Provider],
    ) -> Result<Vec<ProviderId>> {
        let covered = self.covered_set(location).await?;
        let eligible: Vec<ProviderId> = candidates
            .iter()
            .map(|p| p.id)
            .filter(|id| covered.contains(id))
            .collect();

        if eligible.is_empty() {
            return Err(CoreError::NoCoverage {
                location: location.name.clone(),
            });
        }
        Ok(eligible)
    }

    async fn covered_set(&self, location: &Location) -> Result<HashSet<ProviderId>> {
        Ok(self
            .catalog
            .find_coverage(&location.name)
            .await?
            .into_iter()
            .filter(|c| c.available)
            .map(|c| c.provider_id)
            .collect())
    }

    /// Final tie-break: strictly smallest active count in the request's
    /// province; if the province-scoped counts tie, fall back to global
    /// counts; a residual tie resolves to the first candidate in the
    /// original sorted order.
    async fn least_loaded<'a>(
        &self,
        tied: &[&'a PriceEntry],
        province: &str,
    ) -> Result<&'a PriceEntry> {
        let scoped = self.counts_for(tied, Some(province)).await?;
        let min_scoped = scoped.iter().copied().min().unwrap_or(0);
        let still_tied: Vec<&PriceEntry> = tied
            .iter()
            .zip(&scoped)
            .filter(|(_, count)| **count == min_scoped)
            .map(|(entry, _)| *entry)
            .collect();

        if still_tied.len() == 1 {
            return Ok(still_tied[0]);
        }

        // Best-effort snapshot; races with concurrent allocations are
        // tolerated (load balancing, not load guaranteeing).
        let global = self.counts_for(&still_tied, None).await?;
        let min_global = global.iter().copied().min().unwrap_or(0);
        let winner = still_tied
            .iter()
            .zip(&global)
            .find(|(_, count)| **count == min_global)
            .map(|(entry, _)| *entry)
            .unwrap_or(still_tied[0]);
        Ok(winner)
    }

    async fn counts_for(
        &self,
        entries: &[&PriceEntry],
        province: Option<&str>,
    ) -> Result<Vec<i64>> {
        let mut counts = Vec::with_capacity(entries.len());
        for entry in entries {
            counts.push(
                self.load
                    .count_active_by_provider(entry.provider_id, province)
                    .await?,
            );
        }
        Ok(counts)
    }
}
