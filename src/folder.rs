//! Plain directories as origin and destination.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info};

use crate::data::Change;
use crate::error::{MigrationError, Result};
use crate::fs::{copy_file, FileSystem};
use crate::glob::Glob;
use crate::vcs::{Destination, Origin};
use crate::workflow::PassResult;

/// Author recorded on changes read from a folder.
pub const FOLDER_ORIGIN_AUTHOR: &str = "folder.origin <>";

/// Reads the whole tree below a directory as a single change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderOrigin {
    path: PathBuf,
}

impl FolderOrigin {
    /// Origin rooted at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Root directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn list_files(&self, fs: &dyn FileSystem) -> Result<Vec<String>> {
        if !fs.exists(&self.path) {
            return Err(MigrationError::apply(format!(
                "origin path does not exist: {}",
                self.path.display()
            )));
        }
        if !fs.is_dir(&self.path) {
            return Err(MigrationError::apply(format!(
                "origin path is not a directory: {}",
                self.path.display()
            )));
        }
        fs.list_files(&self.path)
            .map_err(|e| MigrationError::io(&self.path, e))
    }
}

/// Stable reference derived from the file list.
fn folder_ref(files: &[String]) -> String {
    let mut hasher = DefaultHasher::new();
    files.hash(&mut hasher);
    format!("folder-{:012x}", hasher.finish() & 0xffff_ffff_ffff)
}

impl Origin for FolderOrigin {
    fn url(&self) -> String {
        self.path.display().to_string()
    }

    fn changes(&self, fs: &dyn FileSystem, _baseline: Option<&str>) -> Result<Vec<Change>> {
        let files = self.list_files(fs)?;
        let mut change = Change::new(
            folder_ref(&files),
            FOLDER_ORIGIN_AUTHOR,
            format!("Files from folder: {}", self.path.display()),
        );
        change.files = files;
        change.date = Some(Local::now().fixed_offset());
        Ok(vec![change])
    }

    fn checkout(&self, fs: &dyn FileSystem, work_dir: &Path) -> Result<()> {
        fs.mkdir_all(work_dir)
            .map_err(|e| MigrationError::io(work_dir, e))?;
        for rel in self.list_files(fs)? {
            let src = self.path.join(&rel);
            copy_file(fs, &src, &work_dir.join(&rel)).map_err(|e| MigrationError::io(&src, e))?;
        }
        debug!("checked out {} into {}", self.path.display(), work_dir.display());
        Ok(())
    }
}

/// Writes pass output into a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderDestination {
    path: PathBuf,
}

impl FolderDestination {
    /// Destination rooted at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Root directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the existing files the workflow owns.
    fn clear(&self, fs: &dyn FileSystem, destination_files: &Glob) -> Result<usize> {
        if !fs.exists(&self.path) {
            return Ok(0);
        }
        let existing = fs
            .list_files(&self.path)
            .map_err(|e| MigrationError::io(&self.path, e))?;
        let mut removed = 0;
        for rel in existing.iter().filter(|rel| destination_files.matches(rel)) {
            let path = self.path.join(rel);
            fs.remove(&path).map_err(|e| MigrationError::io(&path, e))?;
            removed += 1;
        }
        Ok(removed)
    }
}

impl Destination for FolderDestination {
    fn url(&self) -> String {
        self.path.display().to_string()
    }

    fn write(
        &self,
        fs: &dyn FileSystem,
        work_dir: &Path,
        destination_files: &Glob,
        result: &PassResult,
    ) -> Result<()> {
        if result.dry_run {
            info!(
                "dry run: not writing {} file(s) to {}",
                result.files.len(),
                self.path.display()
            );
            return Ok(());
        }

        fs.mkdir_all(&self.path)
            .map_err(|e| MigrationError::io(&self.path, e))?;
        let removed = self.clear(fs, destination_files)?;
        for rel in &result.files {
            let src = work_dir.join(rel);
            copy_file(fs, &src, &self.path.join(rel)).map_err(|e| MigrationError::io(&src, e))?;
        }
        info!(
            "wrote {} file(s) to {} (replaced {removed})",
            result.files.len(),
            self.path.display()
        );
        Ok(())
    }
}
