use async_trait::async_trait;

use sitelink_model::{Coverage, Location, PriceEntry, Provider, ProviderId, SlaEntry};

use crate::error::Result;

/// Read-only access to the location/provider catalog and the
/// coverage/SLA/price relations.
///
/// Ordering contracts matter to the engine: `find_sla` returns rows
/// ascending by days and `find_price` ascending by amount, each with
/// provider id as a stable secondary key so ranking stays deterministic.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn find_location(&self, name: &str) -> Result<Option<Location>>;

    async fn find_providers(&self) -> Result<Vec<Provider>>;

    /// Coverage rows for a location, eligible or not; the caller applies
    /// the availability filter.
    async fn find_coverage(&self, location: &str) -> Result<Vec<Coverage>>;

    /// SLA rows for (location, providers), sorted ascending by days.
    async fn find_sla(
        &self,
        location: &str,
        providers: &[ProviderId],
    ) -> Result<Vec<SlaEntry>>;

    /// Price rows for (location, providers), sorted ascending by amount.
    async fn find_price(
        &self,
        location: &str,
        providers: &[ProviderId],
    ) -> Result<Vec<PriceEntry>>;
}
