use async_trait::async_trait;

use sitelink_model::ProviderId;

use crate::error::Result;

/// Query capability over current provider load, used for saturation
/// admission control and the final allocation tie-break.
///
/// Counts are a best-effort snapshot (eventual, not linearizable); a race
/// with a concurrent allocation costs at most a minor imbalance.
#[async_trait]
pub trait LoadIndexRepository: Send + Sync {
    /// Number of installations in a non-terminal state (`pending` or
    /// `approved`) assigned to `provider`, optionally scoped to a
    /// province.
    async fn count_active_by_provider(
        &self,
        provider: ProviderId,
        province: Option<&str>,
    ) -> Result<i64>;
}
