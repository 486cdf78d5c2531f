//! Workflow processing modes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MigrationError;

/// How a workflow groups origin changes into destination changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowMode {
    /// All pending changes become one destination change.
    #[default]
    Squash,
    /// One destination change per origin change.
    Iterative,
    /// Each change is proposed for review at the destination.
    ChangeRequest,
    /// Pending changes are imported back from the source of truth.
    ChangeRequestFromSot,
}

impl WorkflowMode {
    /// All modes, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::Squash,
        Self::Iterative,
        Self::ChangeRequest,
        Self::ChangeRequestFromSot,
    ];

    /// Upper-case name used in migration files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Squash => "SQUASH",
            Self::Iterative => "ITERATIVE",
            Self::ChangeRequest => "CHANGE_REQUEST",
            Self::ChangeRequestFromSot => "CHANGE_REQUEST_FROM_SOT",
        }
    }

    /// Whether the reversibility check runs when not configured explicitly.
    pub fn checks_reversibility_by_default(self) -> bool {
        self == Self::ChangeRequest
    }
}

impl fmt::Display for WorkflowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowMode {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MigrationError::config(format!("unknown workflow mode: {s:?}")))
    }
}
