//! `move` and `copy`.

use std::path::Path;

use tracing::debug;

use super::{join_rel, resolve, validate_relative, Remove};
use crate::error::{MigrationError, Result};
use crate::fs::{copy_file, FileSystem};
use crate::glob::Glob;
use crate::transform::{Context, ErrorTransform, Noop, Transform, Transformation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Move,
    Copy,
}

/// Validated source/destination pair shared by move and copy.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Relocation {
    before: String,
    after: String,
    paths: Glob,
    overwrite: bool,
}

impl Relocation {
    fn new(
        verb: &str,
        before: impl Into<String>,
        after: impl Into<String>,
        paths: Option<Glob>,
        overwrite: bool,
    ) -> Result<Self> {
        let before = before.into();
        let after = after.into();
        validate_relative("before", &before)?;
        validate_relative("after", &after)?;
        if before == after {
            return Err(MigrationError::config(format!(
                "{verb} from the same folder to the same folder is a noop"
            )));
        }
        Ok(Self {
            before,
            after,
            paths: paths.unwrap_or_default(),
            overwrite,
        })
    }

    fn run(&self, ctx: &Context<'_>, mode: Mode) -> Result<()> {
        let work_dir = ctx.require_work_dir()?;
        let fs = ctx.fs();
        let src = resolve(work_dir, &self.before);

        if !fs.exists(&src) {
            return Err(MigrationError::apply(format!(
                "source path {:?} does not exist",
                self.before
            )));
        }

        if !fs.is_dir(&src) {
            return self.transfer(fs, work_dir, &self.before, &self.after, mode);
        }

        let files = fs
            .list_files(&src)
            .map_err(|e| MigrationError::io(&src, e))?;
        for rel in files.iter().filter(|rel| self.paths.matches(rel)) {
            self.transfer(
                fs,
                work_dir,
                &join_rel(&self.before, rel),
                &join_rel(&self.after, rel),
                mode,
            )?;
        }
        if mode == Mode::Move {
            prune_empty_dirs(fs, &src, !self.before.is_empty());
        }
        Ok(())
    }

    fn transfer(
        &self,
        fs: &dyn FileSystem,
        work_dir: &Path,
        from: &str,
        to: &str,
        mode: Mode,
    ) -> Result<()> {
        let src = resolve(work_dir, from);
        let dst = resolve(work_dir, to);
        if !self.overwrite && fs.exists(&dst) {
            return Err(MigrationError::apply(format!(
                "destination {to:?} already exists (set overwrite to replace it)"
            )));
        }
        if let Some(parent) = dst.parent() {
            fs.mkdir_all(parent)
                .map_err(|e| MigrationError::io(parent, e))?;
        }
        let moved = match mode {
            Mode::Move => fs.rename(&src, &dst),
            Mode::Copy => copy_file(fs, &src, &dst),
        };
        moved.map_err(|e| MigrationError::io(&src, e))
    }
}

/// Removes directories left empty below `root`, deepest first.
///
/// Failures are ignored: a directory that cannot be removed is left behind.
fn prune_empty_dirs(fs: &dyn FileSystem, root: &Path, include_root: bool) {
    let mut dirs = fs.list_dirs(root).unwrap_or_default();
    dirs.sort_by_key(|d| std::cmp::Reverse(d.matches('/').count()));
    for dir in dirs {
        if let Err(e) = fs.remove(&root.join(&dir)) {
            debug!("leaving {dir}: {e}");
        }
    }
    if include_root {
        if let Err(e) = fs.remove(root) {
            debug!("leaving {}: {e}", root.display());
        }
    }
}

/// Renames a file or directory within the working tree.
///
/// When `before` is a directory only files matching `paths` move, and
/// directories left empty are pruned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveFiles(Relocation);

impl MoveFiles {
    /// Creates a move from `before` to `after`; `paths` defaults to all files.
    pub fn new(
        before: impl Into<String>,
        after: impl Into<String>,
        paths: Option<Glob>,
        overwrite: bool,
    ) -> Result<Self> {
        Relocation::new("moving", before, after, paths, overwrite).map(Self)
    }

    /// Source path.
    pub fn before(&self) -> &str {
        &self.0.before
    }

    /// Destination path.
    pub fn after(&self) -> &str {
        &self.0.after
    }
}

impl Transform for MoveFiles {
    fn apply(&self, ctx: &mut Context<'_>) -> Result<()> {
        self.0.run(ctx, Mode::Move)
    }

    fn reverse(&self) -> Transformation {
        if self.0.overwrite {
            return Noop::reversing(self.clone().into()).into();
        }
        Self(Relocation {
            before: self.0.after.clone(),
            after: self.0.before.clone(),
            paths: self.0.paths.clone(),
            overwrite: false,
        })
        .into()
    }

    fn describe(&self) -> String {
        format!("Moving {} to {}", self.0.before, self.0.after)
    }
}

/// Copies a file or directory within the working tree, keeping the source.
///
/// File modes are preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyFiles(Relocation);

impl CopyFiles {
    /// Creates a copy from `before` to `after`; `paths` defaults to all files.
    pub fn new(
        before: impl Into<String>,
        after: impl Into<String>,
        paths: Option<Glob>,
        overwrite: bool,
    ) -> Result<Self> {
        Relocation::new("copying", before, after, paths, overwrite).map(Self)
    }
}

impl Transform for CopyFiles {
    fn apply(&self, ctx: &mut Context<'_>) -> Result<()> {
        self.0.run(ctx, Mode::Copy)
    }

    fn reverse(&self) -> Transformation {
        let after = &self.0.after;
        if after.is_empty() {
            return ErrorTransform::new(
                "a copy into the tree root cannot be reversed",
                self.clone().into(),
            )
            .into();
        }
        let cleanup = Glob::from_patterns([after.clone(), format!("{after}/**")])
            .and_then(Remove::new);
        match cleanup {
            Ok(remove) => remove.into(),
            Err(e) => ErrorTransform::new(e.to_string(), self.clone().into()).into(),
        }
    }

    fn describe(&self) -> String {
        format!("Copying {} to {}", self.0.before, self.0.after)
    }
}
