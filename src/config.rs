//! Migration files.
//!
//! A migration file is a YAML document listing workflows:
//!
//! ```yaml
//! workflows:
//!   - name: export
//!     origin: {folder: ./internal}
//!     destination: {folder: ./public}
//!     authoring: {mode: OVERWRITE, default: "Bot <bot@example.com>"}
//!     origin_files: {include: ["**"], exclude: ["secret/**"]}
//!     transformations:
//!       - {type: replace, before: internal, after: public}
//! ```
//!
//! Everything is validated through the same constructors the library
//! exposes, so a file that loads is a workflow that can run.

pub mod transform;

pub use transform::TransformConfig;

use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::authoring::{Authoring, AuthoringMode};
use crate::data::yaml::{from_yaml, read_yaml_file};
use crate::folder::{FolderDestination, FolderOrigin};
use crate::glob::{resolve_files, GlobSpec};
use crate::workflow::{Workflow, WorkflowMode};

/// Environment variable naming the migration file.
pub const CONFIG_ENV_VAR: &str = "TREESHIFT_CONFIG";

/// File name looked up in the current and home directories.
pub const DEFAULT_CONFIG_FILE: &str = "migration.yaml";

/// Top-level document.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationFile {
    /// Workflows, in file order.
    pub workflows: Vec<WorkflowConfig>,
}

/// One workflow entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowConfig {
    /// Unique name.
    pub name: String,
    /// Where changes come from.
    #[serde(default)]
    pub origin: Option<EndpointConfig>,
    /// Where results go.
    #[serde(default)]
    pub destination: Option<EndpointConfig>,
    /// Author policy.
    pub authoring: AuthoringConfig,
    /// Files read from the origin.
    #[serde(default)]
    pub origin_files: Option<GlobSpec>,
    /// Files owned at the destination.
    #[serde(default)]
    pub destination_files: Option<GlobSpec>,
    /// Processing mode, case-insensitive.
    #[serde(default)]
    pub mode: Option<String>,
    /// Run the reversibility check; defaults by mode.
    #[serde(default)]
    pub reversible_check: Option<bool>,
    /// Transformations, in order.
    #[serde(default)]
    pub transformations: Vec<TransformConfig>,
}

/// Origin or destination location.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointConfig {
    /// A local directory, relative to the migration file.
    Folder(PathBuf),
}

impl EndpointConfig {
    fn path(&self, base_dir: &Path) -> PathBuf {
        match self {
            Self::Folder(path) => base_dir.join(path),
        }
    }
}

/// `authoring:` block.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthoringConfig {
    /// `PASS_THRU` (default), `OVERWRITE` or `ALLOWED`.
    #[serde(default)]
    pub mode: Option<String>,
    /// Fallback author, `Name <email>`.
    pub default: String,
    /// Entries for `ALLOWED`: emails, full authors or `/regex/`.
    #[serde(default)]
    pub allowlist: Vec<String>,
}

impl AuthoringConfig {
    /// Builds the policy.
    pub fn to_authoring(&self) -> crate::error::Result<Authoring> {
        let mode = match &self.mode {
            Some(mode) => mode.parse()?,
            None => AuthoringMode::PassThru,
        };
        Authoring::from_mode(mode, &self.default, self.allowlist.as_slice())
    }
}

impl WorkflowConfig {
    /// Builds the workflow, resolving folder paths against `base_dir`.
    pub fn to_workflow(&self, base_dir: &Path) -> Result<Workflow> {
        let authoring = self.authoring.to_authoring().context("invalid authoring")?;
        let mode: WorkflowMode = match &self.mode {
            Some(mode) => mode.parse()?,
            None => WorkflowMode::default(),
        };

        let mut builder = Workflow::builder(&self.name, authoring)
            .mode(mode)
            .origin_files(
                resolve_files(self.origin_files.as_ref()).context("invalid origin_files")?,
            )
            .destination_files(
                resolve_files(self.destination_files.as_ref())
                    .context("invalid destination_files")?,
            );
        if let Some(enabled) = self.reversible_check {
            builder = builder.reversible_check(enabled);
        }
        if let Some(origin) = &self.origin {
            builder = builder.origin(Arc::new(FolderOrigin::new(origin.path(base_dir))));
        }
        if let Some(destination) = &self.destination {
            builder =
                builder.destination(Arc::new(FolderDestination::new(destination.path(base_dir))));
        }
        for (index, entry) in self.transformations.iter().enumerate() {
            let transformation = entry
                .build()
                .with_context(|| format!("invalid transformation #{}", index + 1))?;
            builder = builder.transformation(transformation);
        }
        Ok(builder.build()?)
    }
}

/// A loaded, validated migration file.
#[derive(Debug, Clone)]
pub struct Migration {
    path: PathBuf,
    workflows: Vec<Workflow>,
}

impl Migration {
    /// Loads and validates the file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let file: MigrationFile = read_yaml_file(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_file(path, &file, base_dir)
            .with_context(|| format!("Invalid migration file: {}", path.display()))
    }

    /// Parses a document; relative folders resolve against `base_dir`.
    pub fn parse(yaml: &str, base_dir: &Path) -> Result<Self> {
        let file: MigrationFile = from_yaml(yaml)?;
        Self::from_file(Path::new("<inline>"), &file, base_dir)
    }

    fn from_file(path: &Path, file: &MigrationFile, base_dir: &Path) -> Result<Self> {
        if file.workflows.is_empty() {
            bail!("no workflows defined");
        }
        let mut seen = HashSet::new();
        let mut workflows = Vec::with_capacity(file.workflows.len());
        for config in &file.workflows {
            if !seen.insert(config.name.as_str()) {
                bail!("duplicate workflow name '{}'", config.name);
            }
            let workflow = config
                .to_workflow(base_dir)
                .with_context(|| format!("workflow '{}'", config.name))?;
            workflows.push(workflow);
        }
        debug!("loaded {} workflow(s) from {}", workflows.len(), path.display());
        Ok(Self {
            path: path.to_path_buf(),
            workflows,
        })
    }

    /// File the migration was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All workflows, in file order.
    pub fn workflows(&self) -> &[Workflow] {
        &self.workflows
    }

    /// The workflow called `name`, or the only one when `name` is `None`.
    pub fn workflow(&self, name: Option<&str>) -> Result<&Workflow> {
        match name {
            Some(name) => self
                .workflows
                .iter()
                .find(|workflow| workflow.name() == name)
                .with_context(|| format!("no workflow named '{name}'")),
            None => match self.workflows.as_slice() {
                [only] => Ok(only),
                many => {
                    let names: Vec<&str> = many.iter().map(Workflow::name).collect();
                    bail!(
                        "multiple workflows defined, pick one with --workflow: {}",
                        names.join(", ")
                    )
                }
            },
        }
    }
}

/// Finds the migration file.
///
/// Priority:
/// 1. `override_path` (from `--config`)
/// 2. `TREESHIFT_CONFIG` environment variable
/// 3. `./migration.yaml`
/// 4. `$HOME/.treeshift/migration.yaml`
pub fn resolve_config_path(override_path: Option<&Path>) -> Result<PathBuf> {
    let cwd = env::current_dir().context("Failed to determine current directory")?;
    let env_path = env::var(CONFIG_ENV_VAR).ok();
    let home = dirs::home_dir();
    find_config_path(override_path, env_path.as_deref(), &cwd, home.as_deref()).with_context(
        || {
            format!(
                "No migration file found: pass --config, set {CONFIG_ENV_VAR}, or create {DEFAULT_CONFIG_FILE}"
            )
        },
    )
}

fn find_config_path(
    override_path: Option<&Path>,
    env_path: Option<&str>,
    cwd: &Path,
    home: Option<&Path>,
) -> Option<PathBuf> {
    if let Some(path) = override_path {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env_path.filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    let local = cwd.join(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }
    home.map(|home| home.join(".treeshift").join(DEFAULT_CONFIG_FILE))
        .filter(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIGRATION: &str = r#"
workflows:
  - name: export
    origin: {folder: internal}
    destination: {folder: public}
    authoring:
      mode: allowed
      default: "Bot <bot@example.com>"
      allowlist: ["/.*@example\\.com$/"]
    origin_files: {include: ["**"], exclude: ["secret/**"]}
    destination_files: ["src/**"]
    mode: change_request
    transformations:
      - {type: move, before: lib, after: src}
      - {type: replace, before: internal, after: public}
      - {type: squash_notes, max: 10}
  - name: docs
    authoring: {mode: OVERWRITE, default: "Docs <docs@example.com>"}
    reversible_check: false
"#;

    #[test]
    fn loads_workflows() {
        let migration = Migration::parse(MIGRATION, Path::new("/repo")).unwrap();
        assert_eq!(migration.workflows().len(), 2);

        let export = migration.workflow(Some("export")).unwrap();
        assert_eq!(export.mode(), WorkflowMode::ChangeRequest);
        assert!(export.reversible_check());
        assert_eq!(export.authoring().mode(), AuthoringMode::Allowed);
        assert_eq!(export.transformations().len(), 3);
        assert!(export.origin_files().matches("lib/a.rs"));
        assert!(!export.origin_files().matches("secret/key"));
        assert!(!export.destination_files().matches("README.md"));
        assert_eq!(export.origin().unwrap().url(), "/repo/internal");
        assert_eq!(export.destination().unwrap().url(), "/repo/public");

        let docs = migration.workflow(Some("docs")).unwrap();
        assert_eq!(docs.mode(), WorkflowMode::Squash);
        assert!(docs.origin().is_none());
    }

    #[test]
    fn workflow_selection() {
        let migration = Migration::parse(MIGRATION, Path::new("/repo")).unwrap();
        let err = migration.workflow(None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "multiple workflows defined, pick one with --workflow: export, docs"
        );
        assert!(migration.workflow(Some("nope")).is_err());
    }

    #[test]
    fn rejects_invalid_entries() {
        let bad_mode = "workflows:\n  - name: a\n    authoring: {default: \"A <a@x>\"}\n    mode: batch\n";
        let err = Migration::parse(bad_mode, Path::new(".")).unwrap_err();
        assert!(format!("{err:#}").contains(r#"unknown workflow mode: "batch""#));

        let duplicate = "workflows:\n  - name: a\n    authoring: {default: \"A <a@x>\"}\n  - name: a\n    authoring: {default: \"A <a@x>\"}\n";
        let err = Migration::parse(duplicate, Path::new(".")).unwrap_err();
        assert_eq!(err.to_string(), "duplicate workflow name 'a'");

        let bad_transform = "workflows:\n  - name: a\n    authoring: {default: \"A <a@x>\"}\n    transformations:\n      - {type: move, before: x, after: x}\n";
        let err = Migration::parse(bad_transform, Path::new(".")).unwrap_err();
        assert!(format!("{err:#}").contains("invalid transformation #1"));

        let unknown_field = "workflows:\n  - name: a\n    authoring: {default: \"A <a@x>\"}\n    colour: blue\n";
        assert!(Migration::parse(unknown_field, Path::new(".")).is_err());

        assert!(Migration::parse("workflows: []\n", Path::new(".")).is_err());
    }

    #[test]
    fn config_path_priority() {
        let dir = tempfile::tempdir().unwrap();
        let home = tempfile::tempdir().unwrap();
        let explicit = Path::new("/explicit.yaml");

        assert_eq!(
            find_config_path(Some(explicit), Some("/env.yaml"), dir.path(), None),
            Some(explicit.to_path_buf())
        );
        assert_eq!(
            find_config_path(None, Some("/env.yaml"), dir.path(), None),
            Some(PathBuf::from("/env.yaml"))
        );
        assert_eq!(find_config_path(None, Some(""), dir.path(), Some(home.path())), None);

        let home_file = home.path().join(".treeshift").join(DEFAULT_CONFIG_FILE);
        std::fs::create_dir_all(home_file.parent().unwrap()).unwrap();
        std::fs::write(&home_file, "workflows: []").unwrap();
        assert_eq!(
            find_config_path(None, None, dir.path(), Some(home.path())),
            Some(home_file)
        );

        let local = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&local, "workflows: []").unwrap();
        assert_eq!(
            find_config_path(None, None, dir.path(), Some(home.path())),
            Some(local)
        );
    }

    #[test]
    fn load_reads_file_relative_to_its_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("migration.yaml");
        std::fs::write(
            &path,
            "workflows:\n  - name: a\n    origin: {folder: src}\n    authoring: {default: \"A <a@x>\"}\n",
        )
        .unwrap();
        let migration = Migration::load(&path).unwrap();
        assert_eq!(migration.path(), path);
        assert_eq!(
            migration.workflow(None).unwrap().origin().unwrap().url(),
            dir.path().join("src").display().to_string()
        );
    }
}
