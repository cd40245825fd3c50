//! Run descriptions.

use crate::cmp;
use crate::ids::{KnitId, RunId};
use crate::plans::{self, LogPoint, Mountpoint};
use crate::rfctime::Rfc3339;
use crate::status::RunStatus;
use serde::{Deserialize, Serialize};

/// Brief view of a Run, embedded in other responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(rename = "runId")]
    pub run_id: RunId,

    pub status: RunStatus,

    /// Last status change. Compared as an instant.
    #[serde(rename = "updatedAt")]
    pub updated_at: Rfc3339,

    /// How the worker exited, once it has.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit: Option<Exit>,

    pub plan: plans::Summary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exit {
    pub code: u8,
    pub message: String,
}

/// Full view of a Run.
///
/// Returned by `GET /api/runs/`, `GET /api/runs/{runId}`,
/// `PUT /api/runs/{runId}/abort`, `PUT /api/runs/{runId}/tearoff` and
/// `PUT /api/runs/{runId}/retry`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detail {
    #[serde(flatten)]
    pub summary: Summary,

    #[serde(default)]
    pub inputs: Vec<Assignment>,

    #[serde(default)]
    pub outputs: Vec<Assignment>,

    #[serde(default)]
    pub log: Option<LogSummary>,
}

impl PartialEq for Detail {
    fn eq(&self, other: &Self) -> bool {
        self.summary == other.summary
            && cmp::slice_eq_unordered(&self.inputs, &other.inputs)
            && cmp::slice_eq_unordered(&self.outputs, &other.outputs)
            && cmp::option_eq(&self.log, &other.log)
    }
}

/// A mountpoint of a Run and the Data assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    #[serde(flatten)]
    pub mountpoint: Mountpoint,

    #[serde(rename = "knitId")]
    pub knit_id: KnitId,
}

/// The log of a Run and the Data holding it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSummary {
    #[serde(flatten)]
    pub log_point: LogPoint,

    #[serde(rename = "knitId")]
    pub knit_id: KnitId,
}
