//! Data descriptions.

use crate::cmp;
use crate::ids::KnitId;
use crate::plans::{self, LogPoint, Mountpoint};
use crate::runs;
use crate::tags::Tag;
use serde::{Deserialize, Serialize};

/// Brief view of a Data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    #[serde(rename = "knitid", alias = "knitId")]
    pub knit_id: KnitId,

    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl PartialEq for Summary {
    fn eq(&self, other: &Self) -> bool {
        self.knit_id == other.knit_id && cmp::slice_eq_unordered(&self.tags, &other.tags)
    }
}

/// Full view of a Data.
///
/// Returned by `GET /api/data/`, `POST /api/data/` and
/// `PUT /api/data/{knitId}`. `GET /api/data/{knitId}` returns the content
/// itself instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detail {
    #[serde(rename = "knitId")]
    pub knit_id: KnitId,

    #[serde(default)]
    pub tags: Vec<Tag>,

    /// The Run, and its output, that produced this Data.
    pub upstream: AssignedTo,

    /// Runs, and their inputs, that use this Data.
    #[serde(default)]
    pub downstreams: Vec<AssignedTo>,

    /// Plans, and their inputs, this Data can be fed to.
    #[serde(default)]
    pub nomination: Vec<NominatedBy>,
}

impl PartialEq for Detail {
    fn eq(&self, other: &Self) -> bool {
        self.knit_id == other.knit_id
            && self.upstream == other.upstream
            && cmp::slice_eq_unordered(&self.tags, &other.tags)
            && cmp::slice_eq_unordered(&self.downstreams, &other.downstreams)
            && cmp::slice_eq_unordered(&self.nomination, &other.nomination)
    }
}

/// A Run's mountpoint, seen from the Data assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignedTo {
    pub mountpoint: Mountpoint,
    pub run: runs::Summary,
}

/// A Plan's input, seen from the Data it can take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NominatedBy {
    #[serde(flatten)]
    pub mountpoint: Mountpoint,

    pub plan: plans::Summary,
}

/// Origin of a Data: a Run's output, or a Run's log.
///
/// `mountpoint` and `log` are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedFrom {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mountpoint: Option<Mountpoint>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<LogPoint>,

    pub run: runs::Summary,
}
