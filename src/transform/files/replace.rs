//! `replace`.

use crate::error::{MigrationError, Result};
use crate::glob::Glob;
use crate::transform::{Context, ErrorTransform, Transform, Transformation};

/// Literal substitution of `before` with `after` in matching files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replace {
    before: String,
    after: String,
    paths: Glob,
}

impl Replace {
    /// Creates a replacement; `paths` defaults to all files.
    pub fn new(
        before: impl Into<String>,
        after: impl Into<String>,
        paths: Option<Glob>,
    ) -> Result<Self> {
        let before = before.into();
        if before.is_empty() {
            return Err(MigrationError::config("replace: 'before' cannot be empty"));
        }
        Ok(Self {
            before,
            after: after.into(),
            paths: paths.unwrap_or_default(),
        })
    }
}

/// Replaces every occurrence of `needle`, or returns `None` when absent.
fn replace_bytes(haystack: &[u8], needle: &[u8], replacement: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(haystack.len());
    let mut rest = haystack;
    let mut found = false;
    while let Some(pos) = rest.windows(needle.len()).position(|w| w == needle) {
        found = true;
        out.extend_from_slice(&rest[..pos]);
        out.extend_from_slice(replacement);
        rest = &rest[pos + needle.len()..];
    }
    if !found {
        return None;
    }
    out.extend_from_slice(rest);
    Some(out)
}

impl Transform for Replace {
    fn apply(&self, ctx: &mut Context<'_>) -> Result<()> {
        let work_dir = ctx.require_work_dir()?;
        let fs = ctx.fs();
        let files = fs
            .list_files(work_dir)
            .map_err(|e| MigrationError::io(work_dir, e))?;

        for rel in files.iter().filter(|rel| self.paths.matches(rel)) {
            let path = work_dir.join(rel);
            if fs.is_symlink(&path) {
                continue;
            }
            let content = fs
                .read_file(&path)
                .map_err(|e| MigrationError::io(&path, e))?;
            let Some(updated) =
                replace_bytes(&content, self.before.as_bytes(), self.after.as_bytes())
            else {
                continue;
            };
            if updated == content {
                continue;
            }
            let mode = fs
                .stat(&path)
                .map_err(|e| MigrationError::io(&path, e))?
                .mode;
            fs.write_file(&path, &updated, mode)
                .map_err(|e| MigrationError::io(&path, e))?;
        }
        Ok(())
    }

    fn reverse(&self) -> Transformation {
        if self.after.is_empty() {
            return ErrorTransform::new(
                format!(
                    "replacing {:?} with an empty string cannot be reversed",
                    self.before
                ),
                self.clone().into(),
            )
            .into();
        }
        Self {
            before: self.after.clone(),
            after: self.before.clone(),
            paths: self.paths.clone(),
        }
        .into()
    }

    fn describe(&self) -> String {
        format!("Replacing {:?} with {:?}", self.before, self.after)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::fs::FileSystem;
    use crate::transform::files::test_support::{read, tree, WORK};

    #[test]
    fn replaces_in_matching_files_only() {
        let fs = tree(&[
            ("src/a.java", "import com.internal.Foo;\ncom.internal.Bar"),
            ("docs/a.md", "com.internal"),
        ]);
        let paths = Glob::from_patterns(["src/**"]).unwrap();
        let mut ctx = Context::new(&fs, WORK);
        Replace::new("com.internal", "org.public", Some(paths))
            .unwrap()
            .apply(&mut ctx)
            .unwrap();
        assert_eq!(
            read(&fs, "src/a.java"),
            "import org.public.Foo;\norg.public.Bar"
        );
        assert_eq!(read(&fs, "docs/a.md"), "com.internal");
    }

    #[test]
    fn keeps_mode_and_binary_content() {
        let fs = tree(&[]);
        fs.write_file(Path::new("/work/bin"), &[0xff, b'a', b'b', 0x00, b'a', b'b'], 0o755)
            .unwrap();
        let mut ctx = Context::new(&fs, WORK);
        Replace::new("ab", "xyz", None)
            .unwrap()
            .apply(&mut ctx)
            .unwrap();
        assert_eq!(
            fs.read_file(Path::new("/work/bin")).unwrap(),
            [0xff, b'x', b'y', b'z', 0x00, b'x', b'y', b'z']
        );
        assert_eq!(fs.stat(Path::new("/work/bin")).unwrap().mode, 0o755);
    }

    #[test]
    fn reverse_twice_matches_original() {
        let r = Replace::new("foo", "bar", None).unwrap();
        let Transformation::Replace(reversed) = r.reverse() else {
            panic!("expected replace");
        };
        assert_eq!(reversed.describe(), r#"Replacing "bar" with "foo""#);
        let Transformation::Replace(twice) = reversed.reverse() else {
            panic!("expected replace");
        };
        assert_eq!(twice, r);
    }

    #[test]
    fn round_trip_restores_content() {
        let fs = tree(&[("a.txt", "hello world")]);
        let r = Replace::new("world", "there", None).unwrap();
        let mut ctx = Context::new(&fs, WORK);
        r.apply(&mut ctx).unwrap();
        assert_eq!(read(&fs, "a.txt"), "hello there");
        r.reverse().apply(&mut ctx).unwrap();
        assert_eq!(read(&fs, "a.txt"), "hello world");
    }

    #[test]
    fn rejects_empty_before_and_guards_empty_after() {
        assert!(Replace::new("", "x", None).is_err());
        let r = Replace::new("x", "", None).unwrap();
        assert_eq!(r.reverse().kind(), "error");
    }

    #[test]
    fn replace_bytes_handles_edges() {
        assert_eq!(replace_bytes(b"aaa", b"aa", b"b"), Some(b"ba".to_vec()));
        assert_eq!(replace_bytes(b"abc", b"x", b"y"), None);
        assert_eq!(replace_bytes(b"", b"x", b"y"), None);
    }
}
