//! Boundary between the migration core and the systems it reads from and
//! writes to.
//!
//! The core never talks to a version control system directly. An
//! [`Origin`] produces [`Change`]s and materializes a working tree; a
//! [`Destination`] consumes the transformed tree. [`crate::folder`] has
//! implementations backed by plain directories.

use std::fmt;
use std::path::Path;

use crate::data::Change;
use crate::error::Result;
use crate::fs::FileSystem;
use crate::glob::Glob;
use crate::workflow::PassResult;

/// Where changes come from.
pub trait Origin: fmt::Debug + Send + Sync {
    /// Human readable location.
    fn url(&self) -> String;

    /// Changes newer than `baseline`, newest first.
    fn changes(&self, fs: &dyn FileSystem, baseline: Option<&str>) -> Result<Vec<Change>>;

    /// Writes the origin tree into `work_dir`.
    fn checkout(&self, fs: &dyn FileSystem, work_dir: &Path) -> Result<()>;
}

/// Where transformed trees go.
pub trait Destination: fmt::Debug + Send + Sync {
    /// Human readable location.
    fn url(&self) -> String;

    /// Replaces the files matching `destination_files` with the pass output
    /// found in `work_dir`.
    fn write(
        &self,
        fs: &dyn FileSystem,
        work_dir: &Path,
        destination_files: &Glob,
        result: &PassResult,
    ) -> Result<()>;
}
