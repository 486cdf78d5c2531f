//! `remove`.

use tracing::debug;

use crate::error::{MigrationError, Result};
use crate::glob::Glob;
use crate::transform::{Context, Noop, Transform, Transformation};

/// Deletes every file and directory matching `paths`, deepest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remove {
    paths: Glob,
}

impl Remove {
    /// Creates a removal scoped to `paths`.
    pub fn new(paths: Glob) -> Result<Self> {
        Ok(Self { paths })
    }

    /// Paths removed.
    pub fn paths(&self) -> &Glob {
        &self.paths
    }
}

impl Transform for Remove {
    fn apply(&self, ctx: &mut Context<'_>) -> Result<()> {
        let work_dir = ctx.require_work_dir()?;
        let fs = ctx.fs();

        let mut targets: Vec<String> = fs
            .list_files(work_dir)
            .and_then(|files| Ok([files, fs.list_dirs(work_dir)?].concat()))
            .map_err(|e| MigrationError::io(work_dir, e))?
            .into_iter()
            .filter(|rel| self.paths.matches(rel))
            .collect();
        targets.sort_by(|a, b| {
            b.matches('/')
                .count()
                .cmp(&a.matches('/').count())
                .then_with(|| b.cmp(a))
        });

        for rel in &targets {
            let path = work_dir.join(rel);
            if !fs.exists(&path) {
                continue;
            }
            debug!("removing {rel}");
            fs.remove_all(&path)
                .map_err(|e| MigrationError::io(&path, e))?;
        }
        Ok(())
    }

    fn reverse(&self) -> Transformation {
        Noop::reversing(self.clone().into()).into()
    }

    fn describe(&self) -> String {
        format!("Removing files matching {}", self.paths)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::fs::FileSystem;
    use crate::transform::files::test_support::{files, tree, WORK};

    #[test]
    fn removes_matching_files_and_dirs() {
        let fs = tree(&[
            ("keep.txt", "k"),
            ("build/out/a.o", "a"),
            ("build/b.o", "b"),
            ("src/c.o", "c"),
            ("src/c.rs", "c"),
        ]);
        let paths = Glob::from_patterns(["build", "build/**", "**/*.o"]).unwrap();
        let mut ctx = Context::new(&fs, WORK);
        Remove::new(paths).unwrap().apply(&mut ctx).unwrap();
        assert_eq!(files(&fs), ["keep.txt", "src/c.rs"]);
        assert!(!fs.exists(Path::new("/work/build")));
    }

    #[test]
    fn reverse_is_noop_and_describes_glob() {
        let remove = Remove::new(Glob::from_patterns(["a/**"]).unwrap()).unwrap();
        assert_eq!(remove.reverse().kind(), "noop");
        assert_eq!(
            remove.describe(),
            r#"Removing files matching glob(include = ["a/**"])"#
        );
    }

    #[test]
    fn missing_work_dir_fails() {
        let fs = tree(&[]);
        let mut ctx = Context::new(&fs, "/elsewhere");
        let err = Remove::new(Glob::all_files())
            .unwrap()
            .apply(&mut ctx)
            .unwrap_err();
        assert!(matches!(err, MigrationError::Io { .. }));
    }
}
