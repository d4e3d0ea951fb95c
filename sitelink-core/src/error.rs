use sitelink_model::{
    DismantleId, InstallationId, ModelError, ProviderId, RelocationId,
    RequestKind,
};
use thiserror::Error;

/// Error taxonomy of the allocation engine and lifecycle manager.
///
/// Allocation failures are structured so callers can report actionable
/// errors; none of them is retried internally, since repeating the same
/// read against unchanged catalog data yields the same result. A failed
/// status precondition on approve/override is *not* an error: those
/// operations return `Ok(false)` ("no change") instead.
#[derive(Error, Debug)]
pub enum CoreError {
    /// No provider has an available coverage row for the location.
    #[error("no provider covers location '{location}'")]
    NoCoverage { location: String },

    /// Coverage exists but no SLA rows were found for the eligible set.
    #[error("no serviceable provider for location '{location}': no SLA data")]
    NoServiceableProvider { location: String },

    /// SLA ranking succeeded but no price rows exist for the finalists.
    #[error("no pricing available for location '{location}'")]
    NoPricingAvailable { location: String },

    #[error("provider {0} not found")]
    ProviderNotFound(ProviderId),

    #[error("location '{name}' not found")]
    LocationNotFound { name: String },

    #[error("installation {0} not found")]
    InstallationNotFound(InstallationId),

    #[error("relocation {0} not found")]
    RelocationNotFound(RelocationId),

    #[error("dismantle {0} not found")]
    DismantleNotFound(DismantleId),

    /// The installation already has an outstanding child request of this
    /// kind; at most one unapproved relocation and one unapproved dismantle
    /// may exist per installation.
    #[error("installation {installation} already has a pending {kind} request")]
    RequestAlreadyPending {
        installation: InstallationId,
        kind: RequestKind,
    },

    /// Storage-layer fault. Propagated opaquely, never swallowed into a
    /// generic success.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
