//! Transformations over the files of the working tree.

mod relocate;
mod remove;
mod replace;
mod verify_match;

pub use relocate::{CopyFiles, MoveFiles};
pub use remove::Remove;
pub use replace::Replace;
pub use verify_match::VerifyMatch;

use std::path::{Component, Path, PathBuf};

use crate::error::{MigrationError, Result};

/// Validates a tree-relative path given in a migration definition.
///
/// The empty string names the tree root.
fn validate_relative(field: &str, path: &str) -> Result<()> {
    let p = Path::new(path);
    if p.is_absolute() || path.starts_with('/') {
        return Err(MigrationError::config(format!(
            "{field} must be relative to the working tree, got {path:?}"
        )));
    }
    if p.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(MigrationError::config(format!(
            "{field} cannot reference a parent directory: {path:?}"
        )));
    }
    Ok(())
}

/// Joins a tree-relative path onto the working directory.
fn resolve(work_dir: &Path, rel: &str) -> PathBuf {
    if rel.is_empty() {
        work_dir.to_path_buf()
    } else {
        work_dir.join(rel)
    }
}

/// Joins two `/`-separated relative paths, either of which may be empty.
fn join_rel(base: &str, rel: &str) -> String {
    match (base.is_empty(), rel.is_empty()) {
        (true, _) => rel.to_string(),
        (_, true) => base.to_string(),
        _ => format!("{base}/{rel}"),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    use crate::fs::{FileSystem, MemoryFileSystem, DEFAULT_FILE_MODE};

    pub const WORK: &str = "/work";

    /// Memory filesystem with `files` written below [`WORK`].
    pub fn tree(files: &[(&str, &str)]) -> MemoryFileSystem {
        let fs = MemoryFileSystem::new();
        fs.mkdir_all(Path::new(WORK)).unwrap();
        for (path, content) in files {
            fs.write_file(
                &Path::new(WORK).join(path),
                content.as_bytes(),
                DEFAULT_FILE_MODE,
            )
            .unwrap();
        }
        fs
    }

    pub fn files(fs: &MemoryFileSystem) -> Vec<String> {
        fs.list_files(Path::new(WORK)).unwrap()
    }

    pub fn read(fs: &MemoryFileSystem, rel: &str) -> String {
        String::from_utf8(fs.read_file(&Path::new(WORK).join(rel)).unwrap()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_are_validated() {
        assert!(validate_relative("before", "src/a").is_ok());
        assert!(validate_relative("before", "").is_ok());
        assert!(validate_relative("before", "/etc").is_err());
        assert!(validate_relative("after", "a/../../b").is_err());
    }

    #[test]
    fn join_rel_handles_root() {
        assert_eq!(join_rel("", "a"), "a");
        assert_eq!(join_rel("a", ""), "a");
        assert_eq!(join_rel("a", "b/c"), "a/b/c");
    }
}
