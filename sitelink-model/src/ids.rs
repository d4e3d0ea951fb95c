//! Strongly typed identifiers for catalog and request records.
//!
//! All ids map to `BIGINT` columns in storage. The newtypes exist so a
//! provider id can never be passed where an installation id is expected.

use chrono::Utc;

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(
            feature = "serde",
            derive(serde::Serialize, serde::Deserialize),
            serde(transparent)
        )]
        pub struct $name(pub i64);

        impl $name {
            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Identifier of a catalog location row.
    LocationId
);
define_id!(
    /// Identifier of a connectivity provider.
    ProviderId
);
define_id!(
    /// Identifier of a price catalog row.
    PriceId
);
define_id!(
    /// Identifier of an installation request.
    InstallationId
);
define_id!(
    /// Identifier of a relocation request.
    RelocationId
);
define_id!(
    /// Identifier of a dismantle request.
    DismantleId
);
define_id!(
    /// Caller-scoped grouping id for requests submitted together.
    ///
    /// Not a uniqueness key: many rows may share one batch id. Immutable
    /// once assigned.
    BatchId
);

impl BatchId {
    /// Mint a fresh batch id from the current wall clock, millisecond
    /// resolution, matching the ids handed out to bulk-upload clients.
    pub fn generate() -> Self {
        Self(Utc::now().timestamp_millis())
    }
}
