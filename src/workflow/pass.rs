//! Running one pass of a workflow over a checked-out tree.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, info_span};

use crate::data::Change;
use crate::error::{MigrationError, Result};
use crate::fs::{snapshot, FileSystem, MemoryFileSystem};
use crate::transform::{Context, Transform, Transformation};
use crate::workflow::Workflow;

/// Root of the in-memory tree used by the reversibility check.
const REVERSIBLE_CHECK_ROOT: &str = "/reversible-check";

/// Outcome of one pass.
#[derive(Debug, Clone, Serialize)]
pub struct PassResult {
    /// Destination message.
    pub message: String,
    /// Destination author.
    pub author: String,
    /// Changes included in the pass, after message transforms.
    pub changes: Vec<Change>,
    /// Output files, relative to the working tree, that the destination owns.
    pub files: Vec<String>,
    /// The destination write was skipped.
    pub dry_run: bool,
}

fn apply_all(transformations: &[Transformation], ctx: &mut Context<'_>) -> Result<()> {
    for (index, transformation) in transformations.iter().enumerate() {
        let span = info_span!("transform", index, kind = transformation.kind());
        let _enter = span.enter();
        debug!("{}", transformation.describe());
        transformation.apply(ctx)?;
    }
    Ok(())
}

impl Workflow {
    /// Applies the pipeline to the tree already checked out in `work_dir`.
    ///
    /// `changes` are newest first. The newest change supplies the starting
    /// message and the original author.
    pub fn run_pass(
        &self,
        fs: &dyn FileSystem,
        work_dir: &Path,
        changes: Vec<Change>,
        dry_run: bool,
    ) -> Result<PassResult> {
        let span = info_span!("pass", workflow = %self.name, changes = changes.len());
        let _enter = span.enter();

        self.prune_origin_files(fs, work_dir)?;
        if self.reversible_check {
            self.check_reversible(fs, work_dir, &changes)?;
        }

        let original = changes.first().and_then(Change::parsed_author);
        let author = self.authoring.resolve_author(original.as_ref());
        let message = changes
            .first()
            .map(|change| change.message.clone())
            .unwrap_or_default();

        let mut ctx = Context::new(fs, work_dir)
            .with_message(message)
            .with_author(author.to_string())
            .with_changes(changes)
            .with_dry_run(dry_run);
        apply_all(&self.transformations, &mut ctx)?;

        let files: Vec<String> = fs
            .list_files(work_dir)
            .map_err(|e| MigrationError::io(work_dir, e))?
            .into_iter()
            .filter(|rel| self.destination_files.matches(rel))
            .collect();
        info!(
            "pass complete: {} file(s), author {}",
            files.len(),
            ctx.author
        );

        Ok(PassResult {
            message: ctx.message,
            author: ctx.author,
            changes: ctx.changes,
            files,
            dry_run,
        })
    }

    fn prune_origin_files(&self, fs: &dyn FileSystem, work_dir: &Path) -> Result<()> {
        if self.origin_files.is_all_files() {
            return Ok(());
        }
        let files = fs
            .list_files(work_dir)
            .map_err(|e| MigrationError::io(work_dir, e))?;
        for rel in files.iter().filter(|rel| !self.origin_files.matches(rel)) {
            let path = work_dir.join(rel);
            debug!("dropping {rel}: outside origin_files");
            fs.remove(&path).map_err(|e| MigrationError::io(&path, e))?;
        }
        Ok(())
    }

    /// Runs the pipeline and its reverse on a copy of the tree and fails
    /// if the copy does not come back unchanged.
    fn check_reversible(
        &self,
        fs: &dyn FileSystem,
        work_dir: &Path,
        changes: &[Change],
    ) -> Result<()> {
        let root = Path::new(REVERSIBLE_CHECK_ROOT);
        let before = snapshot(fs, work_dir).map_err(|e| MigrationError::io(work_dir, e))?;
        let sandbox =
            MemoryFileSystem::from_snapshot(root, &before).map_err(|e| MigrationError::io(root, e))?;

        let mut ctx = Context::new(&sandbox, root)
            .with_message(
                changes
                    .first()
                    .map(|change| change.message.clone())
                    .unwrap_or_default(),
            )
            .with_changes(changes.to_vec())
            .with_dry_run(true);
        apply_all(&self.transformations, &mut ctx)?;
        apply_all(&self.reversed_transformations(), &mut ctx)?;

        let after = snapshot(&sandbox, root).map_err(|e| MigrationError::io(root, e))?;
        let differing: BTreeSet<&String> = before
            .keys()
            .chain(after.keys())
            .filter(|rel| before.get(*rel) != after.get(*rel))
            .collect();
        if differing.is_empty() {
            debug!("reversible check passed");
            return Ok(());
        }
        let listing: Vec<&str> = differing.iter().map(|rel| rel.as_str()).collect();
        Err(MigrationError::Reversibility(format!(
            "workflow '{}' is not reversible, these files differ after applying the reverse:\n{}",
            self.name,
            listing.join("\n")
        )))
    }
}
