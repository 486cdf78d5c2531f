//! Workflow composition and execution.
//!
//! A [`Workflow`] binds an author policy, an ordered list of
//! transformations, and origin/destination file scopes. It is built once
//! through [`WorkflowBuilder`] and is read-only afterwards.

pub mod mode;
mod pass;

pub use mode::WorkflowMode;
pub use pass::PassResult;

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::authoring::Authoring;
use crate::data::Change;
use crate::error::{MigrationError, Result};
use crate::fs::FileSystem;
use crate::glob::Glob;
use crate::transform::{reverse_all, Transform, Transformation};
use crate::vcs::{Destination, Origin};

/// A configured migration.
#[derive(Debug, Clone)]
pub struct Workflow {
    name: String,
    origin: Option<Arc<dyn Origin>>,
    destination: Option<Arc<dyn Destination>>,
    authoring: Authoring,
    transformations: Vec<Transformation>,
    origin_files: Glob,
    destination_files: Glob,
    mode: WorkflowMode,
    reversible_check: bool,
}

/// Builder for [`Workflow`].
#[derive(Debug)]
pub struct WorkflowBuilder {
    name: String,
    origin: Option<Arc<dyn Origin>>,
    destination: Option<Arc<dyn Destination>>,
    authoring: Authoring,
    transformations: Vec<Transformation>,
    origin_files: Glob,
    destination_files: Glob,
    mode: WorkflowMode,
    reversible_check: Option<bool>,
}

impl WorkflowBuilder {
    /// Sets the origin.
    #[must_use]
    pub fn origin(mut self, origin: Arc<dyn Origin>) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Sets the destination.
    #[must_use]
    pub fn destination(mut self, destination: Arc<dyn Destination>) -> Self {
        self.destination = Some(destination);
        self
    }

    /// Appends one transformation.
    #[must_use]
    pub fn transformation(mut self, transformation: impl Into<Transformation>) -> Self {
        self.transformations.push(transformation.into());
        self
    }

    /// Replaces the transformation list.
    #[must_use]
    pub fn transformations(mut self, transformations: Vec<Transformation>) -> Self {
        self.transformations = transformations;
        self
    }

    /// Files read from the origin. Defaults to all files.
    #[must_use]
    pub fn origin_files(mut self, glob: Glob) -> Self {
        self.origin_files = glob;
        self
    }

    /// Files owned by the workflow at the destination. Defaults to all files.
    #[must_use]
    pub fn destination_files(mut self, glob: Glob) -> Self {
        self.destination_files = glob;
        self
    }

    /// Processing mode. Defaults to [`WorkflowMode::Squash`].
    #[must_use]
    pub fn mode(mut self, mode: WorkflowMode) -> Self {
        self.mode = mode;
        self
    }

    /// Overrides the mode's reversibility-check default.
    #[must_use]
    pub fn reversible_check(mut self, enabled: bool) -> Self {
        self.reversible_check = Some(enabled);
        self
    }

    /// Validates and freezes the workflow.
    pub fn build(self) -> Result<Workflow> {
        if self.name.trim().is_empty() {
            return Err(MigrationError::config("workflow name cannot be empty"));
        }
        Ok(Workflow {
            reversible_check: self
                .reversible_check
                .unwrap_or_else(|| self.mode.checks_reversibility_by_default()),
            name: self.name,
            origin: self.origin,
            destination: self.destination,
            authoring: self.authoring,
            transformations: self.transformations,
            origin_files: self.origin_files,
            destination_files: self.destination_files,
            mode: self.mode,
        })
    }
}

impl Workflow {
    /// Starts building a workflow named `name`.
    pub fn builder(name: impl Into<String>, authoring: Authoring) -> WorkflowBuilder {
        WorkflowBuilder {
            name: name.into(),
            origin: None,
            destination: None,
            authoring,
            transformations: Vec::new(),
            origin_files: Glob::all_files(),
            destination_files: Glob::all_files(),
            mode: WorkflowMode::default(),
            reversible_check: None,
        }
    }

    /// Workflow name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Origin, when configured.
    pub fn origin(&self) -> Option<&dyn Origin> {
        self.origin.as_deref()
    }

    /// Destination, when configured.
    pub fn destination(&self) -> Option<&dyn Destination> {
        self.destination.as_deref()
    }

    /// Author policy.
    pub fn authoring(&self) -> &Authoring {
        &self.authoring
    }

    /// Transformations, in application order.
    pub fn transformations(&self) -> &[Transformation] {
        &self.transformations
    }

    /// The pipeline that undoes this workflow.
    pub fn reversed_transformations(&self) -> Vec<Transformation> {
        reverse_all(&self.transformations)
    }

    /// Files read from the origin.
    pub fn origin_files(&self) -> &Glob {
        &self.origin_files
    }

    /// Files owned at the destination.
    pub fn destination_files(&self) -> &Glob {
        &self.destination_files
    }

    /// Processing mode.
    pub fn mode(&self) -> WorkflowMode {
        self.mode
    }

    /// Whether each pass verifies that the pipeline reverses cleanly.
    pub fn reversible_check(&self) -> bool {
        self.reversible_check
    }

    /// One line per transformation, numbered from 1.
    pub fn describe(&self, reverse: bool) -> Vec<String> {
        let pipeline = if reverse {
            self.reversed_transformations()
        } else {
            self.transformations.clone()
        };
        pipeline
            .iter()
            .enumerate()
            .map(|(i, t)| format!("{}. [{}] {}", i + 1, t.kind(), t.describe()))
            .collect()
    }

    /// Groups newest-first `changes` into passes.
    ///
    /// Squash produces a single pass; every other mode produces one pass
    /// per change, oldest first.
    pub fn passes(&self, changes: Vec<Change>) -> Vec<Vec<Change>> {
        if changes.is_empty() {
            return Vec::new();
        }
        match self.mode {
            WorkflowMode::Squash => vec![changes],
            WorkflowMode::Iterative
            | WorkflowMode::ChangeRequest
            | WorkflowMode::ChangeRequestFromSot => {
                changes.into_iter().rev().map(|change| vec![change]).collect()
            }
        }
    }

    /// Migrates every pending change from the origin to the destination.
    ///
    /// Each pass checks the origin out into a fresh `work_dir`, runs
    /// [`Workflow::run_pass`], and hands the result to the destination.
    pub fn run(
        &self,
        fs: &dyn FileSystem,
        work_dir: &Path,
        baseline: Option<&str>,
        dry_run: bool,
    ) -> Result<Vec<PassResult>> {
        let origin = self.origin().ok_or_else(|| {
            MigrationError::config(format!("workflow '{}' has no origin", self.name))
        })?;
        let destination = self.destination().ok_or_else(|| {
            MigrationError::config(format!("workflow '{}' has no destination", self.name))
        })?;

        let changes = origin.changes(fs, baseline)?;
        info!(
            "workflow '{}': {} change(s) from {}",
            self.name,
            changes.len(),
            origin.url()
        );

        let mut results = Vec::new();
        for pass in self.passes(changes) {
            fs.remove_all(work_dir)
                .and_then(|()| fs.mkdir_all(work_dir))
                .map_err(|e| MigrationError::io(work_dir, e))?;
            origin.checkout(fs, work_dir)?;
            let result = self.run_pass(fs, work_dir, pass, dry_run)?;
            destination.write(fs, work_dir, &self.destination_files, &result)?;
            results.push(result);
        }
        Ok(results)
    }
}
