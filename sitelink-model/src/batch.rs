//! Batch grouping types shared by the lifecycle summary queries.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::ModelError;
use crate::ids::BatchId;
use crate::request::RequestStatus;

/// The three request kinds the lifecycle manager tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RequestKind {
    Installation,
    Relocation,
    Dismantle,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Installation => "installation",
            RequestKind::Relocation => "relocation",
            RequestKind::Dismantle => "dismantle",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestKind {
    type Err = ModelError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "installation" => Ok(RequestKind::Installation),
            "relocation" => Ok(RequestKind::Relocation),
            "dismantle" => Ok(RequestKind::Dismantle),
            other => Err(ModelError::InvalidRequestKind(other.to_string())),
        }
    }
}

/// One representative row per distinct batch id in a summary view.
///
/// The representative is the most recently created record of the batch,
/// tie-broken by status ascending so pending work surfaces first.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BatchRow {
    pub batch_id: BatchId,
    pub kind: RequestKind,
    /// Id of the representative record within its kind's table.
    pub record_id: i64,
    pub location: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}
