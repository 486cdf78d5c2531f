//! Filesystem capability used by file transforms.
//!
//! Transforms never touch `std::fs` directly; they go through a
//! [`FileSystem`] handle so the same pipeline can run against a real
//! checkout ([`OsFileSystem`]) or a sandboxed tree ([`MemoryFileSystem`]).

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Component, Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use walkdir::WalkDir;

/// Default permission bits for new files.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

const DEFAULT_DIR_MODE: u32 = 0o755;

/// Metadata returned by [`FileSystem::stat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// Size in bytes (zero for directories).
    pub size: u64,
    /// Permission bits.
    pub mode: u32,
}

/// Operations file transforms need from a working tree.
///
/// Listing methods return paths relative to the listed directory, joined
/// with `/` and sorted.
pub trait FileSystem: fmt::Debug + Send + Sync {
    /// Reads the full contents of a file.
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;
    /// Writes a file, replacing any previous content, and applies `mode`.
    fn write_file(&self, path: &Path, data: &[u8], mode: u32) -> io::Result<()>;
    /// Lists every non-directory entry below `dir`, recursively.
    fn list_files(&self, dir: &Path) -> io::Result<Vec<String>>;
    /// Lists every directory below `dir`, recursively, excluding `dir`.
    fn list_dirs(&self, dir: &Path) -> io::Result<Vec<String>>;
    /// Returns true if anything exists at `path`.
    fn exists(&self, path: &Path) -> bool;
    /// Returns true if `path` is a directory.
    fn is_dir(&self, path: &Path) -> bool;
    /// Creates a directory and any missing parents.
    fn mkdir_all(&self, path: &Path) -> io::Result<()>;
    /// Removes a file or an empty directory.
    fn remove(&self, path: &Path) -> io::Result<()>;
    /// Removes `path` and everything below it. Missing paths are not an error.
    fn remove_all(&self, path: &Path) -> io::Result<()>;
    /// Returns metadata for `path`.
    fn stat(&self, path: &Path) -> io::Result<FileStat>;
    /// Returns the target of a symbolic link.
    fn read_link(&self, path: &Path) -> io::Result<PathBuf>;
    /// Returns true if `path` is a symbolic link.
    fn is_symlink(&self, path: &Path) -> bool;
    /// Moves a file or directory.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// Copies a single file, creating parent directories and keeping its mode.
pub fn copy_file(fs: &dyn FileSystem, src: &Path, dst: &Path) -> io::Result<()> {
    let data = fs.read_file(src)?;
    let mode = fs.stat(src)?.mode;
    if let Some(parent) = dst.parent() {
        fs.mkdir_all(parent)?;
    }
    fs.write_file(dst, &data, mode)
}

/// A file captured by [`snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    /// File content.
    pub data: Vec<u8>,
    /// Permission bits.
    pub mode: u32,
}

/// Relative path to content for every file below a directory.
pub type Snapshot = BTreeMap<String, SnapshotEntry>;

/// Captures every file below `dir`.
pub fn snapshot(fs: &dyn FileSystem, dir: &Path) -> io::Result<Snapshot> {
    let mut out = Snapshot::new();
    for rel in fs.list_files(dir)? {
        let path = dir.join(&rel);
        let data = fs.read_file(&path)?;
        let mode = fs.stat(&path)?.mode;
        out.insert(rel, SnapshotEntry { data, mode });
    }
    Ok(out)
}

fn relative_string(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

// ── OS-backed ───────────────────────────────────────────────────────

/// [`FileSystem`] backed by the host filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl OsFileSystem {
    /// Creates a new handle.
    pub fn new() -> Self {
        Self
    }

    fn walk(dir: &Path, want_dirs: bool) -> io::Result<Vec<String>> {
        if !dir.is_dir() {
            return Err(io::Error::new(
                ErrorKind::NotFound,
                format!("{} is not a directory", dir.display()),
            ));
        }
        let mut out = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            if entry.file_type().is_dir() != want_dirs {
                continue;
            }
            if let Ok(rel) = entry.path().strip_prefix(dir) {
                out.push(relative_string(rel));
            }
        }
        out.sort();
        Ok(out)
    }
}

#[cfg(unix)]
fn mode_of(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn mode_of(meta: &fs::Metadata) -> u32 {
    if meta.permissions().readonly() {
        0o444
    } else if meta.is_dir() {
        DEFAULT_DIR_MODE
    } else {
        DEFAULT_FILE_MODE
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

impl FileSystem for OsFileSystem {
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write_file(&self, path: &Path, data: &[u8], mode: u32) -> io::Result<()> {
        fs::write(path, data)?;
        set_mode(path, mode)
    }

    fn list_files(&self, dir: &Path) -> io::Result<Vec<String>> {
        Self::walk(dir, false)
    }

    fn list_dirs(&self, dir: &Path) -> io::Result<Vec<String>> {
        Self::walk(dir, true)
    }

    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn mkdir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        if fs::symlink_metadata(path)?.is_dir() {
            fs::remove_dir(path)
        } else {
            fs::remove_file(path)
        }
    }

    fn remove_all(&self, path: &Path) -> io::Result<()> {
        match fs::symlink_metadata(path) {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
            Ok(_) => fs::remove_file(path),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let meta = fs::metadata(path)?;
        Ok(FileStat {
            is_dir: meta.is_dir(),
            size: if meta.is_dir() { 0 } else { meta.len() },
            mode: mode_of(&meta),
        })
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        fs::read_link(path)
    }

    fn is_symlink(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        match fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(e),
            Err(e) => {
                // Cross-device moves cannot be renamed; copy then delete.
                if fs::symlink_metadata(from)?.is_dir() {
                    return Err(e);
                }
                tracing::debug!("rename of {} failed ({e}), copying instead", from.display());
                copy_file(self, from, to)?;
                fs::remove_file(from)
            }
        }
    }
}

// ── In-memory ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Node {
    File { data: Vec<u8>, mode: u32 },
    Dir,
}

/// [`FileSystem`] kept entirely in memory. Symbolic links are not supported.
///
/// Parent directories are created implicitly when files are written.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    nodes: RwLock<BTreeMap<PathBuf, Node>>,
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn poisoned() -> io::Error {
    io::Error::other("memory filesystem lock poisoned")
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        ErrorKind::NotFound,
        format!("{}: no such file or directory", path.display()),
    )
}

fn insert_parents(nodes: &mut BTreeMap<PathBuf, Node>, path: &Path) -> io::Result<()> {
    let mut current = path.parent();
    while let Some(dir) = current {
        if dir.as_os_str().is_empty() {
            break;
        }
        match nodes.get(dir) {
            Some(Node::File { .. }) => {
                return Err(io::Error::other(format!("{} is a file", dir.display())))
            }
            Some(Node::Dir) => break,
            None => {
                nodes.insert(dir.to_path_buf(), Node::Dir);
            }
        }
        current = dir.parent();
    }
    Ok(())
}

impl MemoryFileSystem {
    /// Creates an empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a filesystem holding `snapshot` below `root`.
    pub fn from_snapshot(root: &Path, snapshot: &Snapshot) -> io::Result<Self> {
        let fs = Self::new();
        fs.mkdir_all(root)?;
        for (rel, entry) in snapshot {
            fs.write_file(&root.join(rel), &entry.data, entry.mode)?;
        }
        Ok(fs)
    }

    fn read(&self) -> io::Result<RwLockReadGuard<'_, BTreeMap<PathBuf, Node>>> {
        self.nodes.read().map_err(|_| poisoned())
    }

    fn write(&self) -> io::Result<RwLockWriteGuard<'_, BTreeMap<PathBuf, Node>>> {
        self.nodes.write().map_err(|_| poisoned())
    }

    fn list(&self, dir: &Path, want_dirs: bool) -> io::Result<Vec<String>> {
        let dir = normalize(dir);
        let nodes = self.read()?;
        if !matches!(nodes.get(&dir), Some(Node::Dir)) {
            return Err(not_found(&dir));
        }
        let mut out: Vec<String> = nodes
            .iter()
            .filter(|(_, node)| matches!(node, Node::Dir) == want_dirs)
            .filter_map(|(path, _)| path.strip_prefix(&dir).ok())
            .filter(|rel| !rel.as_os_str().is_empty())
            .map(relative_string)
            .collect();
        out.sort();
        Ok(out)
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        let path = normalize(path);
        match self.read()?.get(&path) {
            Some(Node::File { data, .. }) => Ok(data.clone()),
            Some(Node::Dir) => Err(io::Error::other(format!("{} is a directory", path.display()))),
            None => Err(not_found(&path)),
        }
    }

    fn write_file(&self, path: &Path, data: &[u8], mode: u32) -> io::Result<()> {
        let path = normalize(path);
        let mut nodes = self.write()?;
        if matches!(nodes.get(&path), Some(Node::Dir)) {
            return Err(io::Error::other(format!("{} is a directory", path.display())));
        }
        insert_parents(&mut nodes, &path)?;
        nodes.insert(
            path,
            Node::File {
                data: data.to_vec(),
                mode,
            },
        );
        Ok(())
    }

    fn list_files(&self, dir: &Path) -> io::Result<Vec<String>> {
        self.list(dir, false)
    }

    fn list_dirs(&self, dir: &Path) -> io::Result<Vec<String>> {
        self.list(dir, true)
    }

    fn exists(&self, path: &Path) -> bool {
        let path = normalize(path);
        self.read().is_ok_and(|nodes| nodes.contains_key(&path))
    }

    fn is_dir(&self, path: &Path) -> bool {
        let path = normalize(path);
        self.read()
            .is_ok_and(|nodes| matches!(nodes.get(&path), Some(Node::Dir)))
    }

    fn mkdir_all(&self, path: &Path) -> io::Result<()> {
        let path = normalize(path);
        let mut nodes = self.write()?;
        match nodes.get(&path) {
            Some(Node::Dir) => Ok(()),
            Some(Node::File { .. }) => Err(io::Error::new(
                ErrorKind::AlreadyExists,
                format!("{} is a file", path.display()),
            )),
            None => {
                insert_parents(&mut nodes, &path)?;
                nodes.insert(path, Node::Dir);
                Ok(())
            }
        }
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        let path = normalize(path);
        let mut nodes = self.write()?;
        match nodes.get(&path) {
            None => Err(not_found(&path)),
            Some(Node::Dir) => {
                let has_children = nodes
                    .keys()
                    .any(|k| k != &path && k.starts_with(&path));
                if has_children {
                    return Err(io::Error::other(format!("directory {} is not empty", path.display())));
                }
                nodes.remove(&path);
                Ok(())
            }
            Some(Node::File { .. }) => {
                nodes.remove(&path);
                Ok(())
            }
        }
    }

    fn remove_all(&self, path: &Path) -> io::Result<()> {
        let path = normalize(path);
        self.write()?.retain(|k, _| !k.starts_with(&path));
        Ok(())
    }

    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let path = normalize(path);
        match self.read()?.get(&path) {
            Some(Node::File { data, mode }) => Ok(FileStat {
                is_dir: false,
                size: data.len() as u64,
                mode: *mode,
            }),
            Some(Node::Dir) => Ok(FileStat {
                is_dir: true,
                size: 0,
                mode: DEFAULT_DIR_MODE,
            }),
            None => Err(not_found(&path)),
        }
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        Err(io::Error::new(
            ErrorKind::InvalidInput,
            format!(
                "{}: symbolic links are not supported in memory",
                path.display()
            ),
        ))
    }

    fn is_symlink(&self, _path: &Path) -> bool {
        false
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let from = normalize(from);
        let to = normalize(to);
        let mut nodes = self.write()?;
        if !nodes.contains_key(&from) {
            return Err(not_found(&from));
        }
        let moved: Vec<(PathBuf, Node)> = nodes
            .iter()
            .filter(|(k, _)| k.starts_with(&from))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        nodes.retain(|k, _| !k.starts_with(&from));
        insert_parents(&mut nodes, &to)?;
        for (path, node) in moved {
            let rel = path.strip_prefix(&from).unwrap_or(Path::new(""));
            let target = if rel.as_os_str().is_empty() {
                to.clone()
            } else {
                to.join(rel)
            };
            nodes.insert(target, node);
        }
        Ok(())
    }
}
