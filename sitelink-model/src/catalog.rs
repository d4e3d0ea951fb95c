//! Read-only catalog entities: locations, providers and the
//! coverage/SLA/price relations the allocation engine ranks over.

use crate::ids::{LocationId, PriceId, ProviderId};

/// A serviceable location.
///
/// Province-level rows ("areas") carry `name == province`; finer-grained
/// sub-locations ("special" sites) have their own name within a province.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub province: String,
}

impl Location {
    /// Whether this row is a province-level area rather than a special
    /// sub-location.
    pub fn is_area(&self) -> bool {
        self.name == self.province
    }
}

/// A connectivity provider. One reserved id (configured, see
/// `AllocationSettings` in the core crate) is the fixed M2M carrier that
/// bypasses ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Provider {
    pub id: ProviderId,
    pub name: String,
}

/// Eligibility relation: whether a provider can serve a location.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coverage {
    pub location_id: LocationId,
    pub provider_id: ProviderId,
    pub available: bool,
}

/// Promised provisioning lead time for a provider at a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SlaEntry {
    pub provider_id: ProviderId,
    pub days: i32,
}

/// Contract price for a provider at a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PriceEntry {
    pub provider_id: ProviderId,
    pub price_id: PriceId,
    pub amount: i64,
}
