//! Lifecycle status of Runs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a Run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// The Plan is deactivated; the Run will not start until it is activated.
    Deactivated,
    /// Waiting for the platform to pick it up.
    #[default]
    Waiting,
    /// Ready to be started.
    Ready,
    /// Worker is being started.
    Starting,
    /// Worker is running.
    Running,
    /// Worker has finished successfully; outputs are being recorded.
    Completing,
    /// Worker has failed or was aborted; outputs are being recorded.
    Aborting,
    /// Finished successfully.
    Succeeded,
    /// Finished unsuccessfully.
    Failed,
    /// Torn off by an upstream change; its outputs are gone.
    Invalidated,
}

impl RunStatus {
    /// Returns true if the run is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Invalidated)
    }

    /// Returns true if the run is still active (not terminal).
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deactivated => "deactivated",
            Self::Waiting => "waiting",
            Self::Ready => "ready",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Completing => "completing",
            Self::Aborting => "aborting",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Invalidated => "invalidated",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
