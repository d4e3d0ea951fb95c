//! Service request entities: installations and the relocation/dismantle
//! child requests that reference them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::ModelError;
use crate::ids::{
    BatchId, DismantleId, InstallationId, PriceId, ProviderId, RelocationId,
};

/// Request state. Advances forward only: `Pending → Approved → Dismantled`.
///
/// The variant order is meaningful: batch summaries tie-break by status
/// ascending so pending work surfaces first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RequestStatus {
    Pending,
    Approved,
    Dismantled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Dismantled => "dismantled",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = ModelError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "dismantled" => Ok(RequestStatus::Dismantled),
            other => Err(ModelError::InvalidStatus(other.to_string())),
        }
    }
}

/// Connectivity product for a site: ranked VSAT service or the fixed
/// machine-to-machine carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Communication {
    #[cfg_attr(feature = "serde", serde(rename = "VSAT"))]
    Vsat,
    #[cfg_attr(feature = "serde", serde(rename = "M2M"))]
    M2m,
}

impl Communication {
    pub fn as_str(&self) -> &'static str {
        match self {
            Communication::Vsat => "VSAT",
            Communication::M2m => "M2M",
        }
    }
}

impl fmt::Display for Communication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Communication {
    type Err = ModelError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "VSAT" => Ok(Communication::Vsat),
            "M2M" => Ok(Communication::M2m),
            other => Err(ModelError::InvalidCommunication(other.to_string())),
        }
    }
}

/// A site installation request, the root record of the lifecycle.
///
/// Provider/price/days are either all populated (VSAT, fully allocated) or
/// all null (M2M fixed-carrier path). `relocation_pending` and
/// `dismantle_pending` track the at-most-one outstanding child request per
/// kind.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Installation {
    pub id: InstallationId,
    pub location: String,
    pub address: String,
    /// Branch person-in-charge contact.
    pub contact: String,
    pub area: String,
    pub province: String,
    pub communication: Communication,
    pub provider_id: Option<ProviderId>,
    pub provider_name: Option<String>,
    pub price_id: Option<PriceId>,
    pub price: Option<i64>,
    pub days: Option<i32>,
    pub status: RequestStatus,
    pub relocation_pending: bool,
    pub dismantle_pending: bool,
    pub batch_id: BatchId,
    pub created_at: DateTime<Utc>,
}

impl Installation {
    /// Whether the provider/price/days triple satisfies the allocation
    /// consistency invariant.
    pub fn terms_consistent(&self) -> bool {
        match self.communication {
            Communication::Vsat => {
                self.provider_id.is_some()
                    && self.price_id.is_some()
                    && self.days.is_some()
            }
            Communication::M2m => {
                self.provider_id.is_none()
                    && self.price_id.is_none()
                    && self.days.is_none()
            }
        }
    }
}

/// A request to move an existing installation to a new site.
///
/// Approval rewrites the referenced installation in place; it never creates
/// a new installation row.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Relocation {
    pub id: RelocationId,
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
    /// Copied from the source installation at creation time.
    pub provider_id: Option<ProviderId>,
    pub provider_name: Option<String>,
    pub status: RequestStatus,
    pub batch_id: BatchId,
    pub created_at: DateTime<Utc>,
}

/// A request to tear down an existing installation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dismantle {
    pub id: DismantleId,
    pub installation_id: InstallationId,
    pub location: String,
    /// Copied from the source installation at creation time.
    pub provider_id: Option<ProviderId>,
    pub provider_name: Option<String>,
    pub status: RequestStatus,
    pub batch_id: BatchId,
    pub created_at: DateTime<Utc>,
}
