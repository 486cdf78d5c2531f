//! Error types for migration passes.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the core.
pub type Result<T, E = MigrationError> = std::result::Result<T, E>;

/// Failures raised while building or applying a migration.
#[derive(Error, Debug)]
pub enum MigrationError {
    /// Invalid or contradictory parameters caught at construction time.
    #[error("configuration error: {0}")]
    Config(String),

    /// A transform failed a precondition while applying.
    #[error("{0}")]
    Apply(String),

    /// Filesystem failure on a specific path.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// Path that was being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Aggregated per-file report from `verify_match`.
    #[error("{} file(s) failed the validation of {description}:\n{}", .failures.len(), .failures.join("\n"))]
    Verification {
        /// Description of the failing transform.
        description: String,
        /// One entry per offending file.
        failures: Vec<String>,
    },

    /// A reverse was requested from a transform that cannot provide one.
    #[error("{0}")]
    Reversibility(String),
}

impl MigrationError {
    /// Wraps an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Builds a [`MigrationError::Config`] from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Builds a [`MigrationError::Apply`] from any displayable message.
    pub fn apply(msg: impl Into<String>) -> Self {
        Self::Apply(msg.into())
    }
}
