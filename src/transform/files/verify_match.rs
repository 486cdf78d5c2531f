//! `verify_match`.

use regex::bytes::Regex;

use crate::error::{MigrationError, Result};
use crate::glob::Glob;
use crate::transform::{Context, Noop, Transform, Transformation};

const EXCERPT_LEN: usize = 50;

/// Checks that every matching file contains (or lacks) a regex match.
///
/// Failures from all files are collected into one
/// [`MigrationError::Verification`]. The tree is never modified.
#[derive(Debug, Clone)]
pub struct VerifyMatch {
    pattern: String,
    regex: Regex,
    paths: Glob,
    verify_no_match: bool,
    also_on_reversal: bool,
    failure_message: Option<String>,
}

impl VerifyMatch {
    /// Compiles `pattern` in multi-line mode; `paths` defaults to all files.
    pub fn new(
        pattern: impl Into<String>,
        paths: Option<Glob>,
        verify_no_match: bool,
        also_on_reversal: bool,
        failure_message: Option<String>,
    ) -> Result<Self> {
        let pattern = pattern.into();
        let regex = Regex::new(&format!("(?m){pattern}")).map_err(|e| {
            MigrationError::config(format!("invalid verify_match regex {pattern:?}: {e}"))
        })?;
        Ok(Self {
            pattern,
            regex,
            paths: paths.unwrap_or_default(),
            verify_no_match,
            also_on_reversal,
            failure_message: failure_message.filter(|m| !m.is_empty()),
        })
    }

    fn check(&self, rel: &str, content: &[u8]) -> Option<String> {
        let failure = if self.verify_no_match {
            let found = self.regex.find(content)?;
            let line = content[..found.start()]
                .iter()
                .filter(|&&b| b == b'\n')
                .count()
                + 1;
            let excerpt = truncate(&String::from_utf8_lossy(found.as_bytes()), EXCERPT_LEN);
            format!("{rel} - Unexpected match found at line {line} - '{excerpt}'")
        } else {
            if self.regex.is_match(content) {
                return None;
            }
            format!("{rel} - Expected string was not present")
        };
        Some(match &self.failure_message {
            Some(extra) => format!("{failure}\n{extra}"),
            None => failure,
        })
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{cut}...")
}

impl Transform for VerifyMatch {
    fn apply(&self, ctx: &mut Context<'_>) -> Result<()> {
        let work_dir = ctx.require_work_dir()?;
        let fs = ctx.fs();
        let files = fs
            .list_files(work_dir)
            .map_err(|e| MigrationError::io(work_dir, e))?;

        let mut failures = Vec::new();
        for rel in files.iter().filter(|rel| self.paths.matches(rel)) {
            let path = work_dir.join(rel);
            if fs.is_symlink(&path) {
                continue;
            }
            let content = fs
                .read_file(&path)
                .map_err(|e| MigrationError::io(&path, e))?;
            if let Some(failure) = self.check(rel, &content) {
                failures.push(failure);
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(MigrationError::Verification {
                description: self.describe(),
                failures,
            })
        }
    }

    fn reverse(&self) -> Transformation {
        if self.also_on_reversal {
            self.clone().into()
        } else {
            Noop::reversing(self.clone().into()).into()
        }
    }

    fn describe(&self) -> String {
        let verb = if self.verify_no_match {
            "verify_no_match"
        } else {
            "verify_match"
        };
        format!("{verb} '{}'", self.pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::files::test_support::{tree, WORK};

    fn verify(fs: &crate::fs::MemoryFileSystem, v: &VerifyMatch) -> Result<()> {
        let mut ctx = Context::new(fs, WORK);
        v.apply(&mut ctx)
    }

    #[test]
    fn passes_when_every_file_matches() {
        let fs = tree(&[("a.txt", "x\nTODO: a"), ("b/c.txt", "TODO")]);
        let v = VerifyMatch::new("TODO", None, false, false, None).unwrap();
        verify(&fs, &v).unwrap();
    }

    #[test]
    fn reports_every_missing_file() {
        let fs = tree(&[("a.txt", "nothing"), ("b.txt", "here"), ("c.md", "TODO")]);
        let paths = Glob::from_patterns(["*.txt"]).unwrap();
        let v = VerifyMatch::new("TODO", Some(paths), false, false, None).unwrap();
        let err = verify(&fs, &v).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @r"
2 file(s) failed the validation of verify_match 'TODO':
a.txt - Expected string was not present
b.txt - Expected string was not present
");
        match err {
            MigrationError::Verification { failures, .. } => assert_eq!(failures.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn no_match_reports_line_and_excerpt() {
        let long = "x".repeat(60);
        let fs = tree(&[
            ("a.txt", "one\ntwo\nsecret-key\n"),
            ("b.txt", &format!("{long}\n")),
        ]);
        let v = VerifyMatch::new(
            "^(secret-key|x+)$",
            None,
            true,
            false,
            Some("remove internal data".to_string()),
        )
        .unwrap();
        let err = verify(&fs, &v).unwrap_err();
        let MigrationError::Verification { failures, description } = err else {
            panic!("expected verification failure");
        };
        assert_eq!(description, "verify_no_match '^(secret-key|x+)$'");
        assert_eq!(
            failures[0],
            "a.txt - Unexpected match found at line 3 - 'secret-key'\nremove internal data"
        );
        assert_eq!(
            failures[1],
            format!(
                "b.txt - Unexpected match found at line 1 - '{}...'\nremove internal data",
                "x".repeat(50)
            )
        );
    }

    #[test]
    fn reverse_depends_on_flag() {
        let v = VerifyMatch::new("a", None, false, true, None).unwrap();
        assert_eq!(v.reverse().kind(), "verify_match");
        let v = VerifyMatch::new("a", None, false, false, None).unwrap();
        assert_eq!(v.reverse().kind(), "noop");
    }

    #[test]
    fn invalid_regex_is_config_error() {
        let err = VerifyMatch::new("(", None, false, false, None).unwrap_err();
        assert!(matches!(err, MigrationError::Config(_)));
    }
}
