//! Run command: migrates pending changes.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;

use crate::data::{OutputFormat, RunReport};
use crate::fs::OsFileSystem;

/// Run command options.
#[derive(Parser)]
pub struct RunCommand {
    /// Workflow to run; optional when the file defines only one.
    #[arg(long)]
    pub workflow: Option<String>,

    /// Runs every transformation but skips the destination write.
    #[arg(long)]
    pub dry_run: bool,

    /// Last migrated origin reference.
    #[arg(long)]
    pub baseline: Option<String>,

    /// Output format: text (default), json, yaml.
    #[arg(long, default_value = "text")]
    pub format: String,

    /// Empty directory for checkouts (defaults to a temporary directory).
    #[arg(long)]
    pub work_dir: Option<PathBuf>,
}

impl RunCommand {
    /// Executes the run command.
    pub fn execute(self, config: Option<&Path>) -> Result<()> {
        let output_format: OutputFormat = self
            .format
            .parse()
            .map_err(anyhow::Error::msg)
            .context("Invalid --format")?;

        let migration = super::load_migration(config)?;
        let workflow = migration.workflow(self.workflow.as_deref())?;

        let scratch = tempfile::Builder::new()
            .prefix("treeshift-")
            .tempdir()
            .context("Failed to create scratch directory")?;
        let work_dir = checkout_dir(self.work_dir.as_deref(), scratch.path())?;

        let passes = workflow
            .run(
                &OsFileSystem::new(),
                &work_dir,
                self.baseline.as_deref(),
                self.dry_run,
            )
            .with_context(|| format!("Failed to run workflow '{}'", workflow.name()))?;

        let report = RunReport::new(workflow, self.dry_run, passes);
        output_report(&report, output_format)
    }
}

/// Picks the checkout directory. The workflow wipes it before every pass,
/// so a user-supplied directory must be missing or empty.
fn checkout_dir(requested: Option<&Path>, scratch: &Path) -> Result<PathBuf> {
    let Some(dir) = requested else {
        return Ok(scratch.join("work"));
    };
    if dir.is_file() {
        bail!("--work-dir {} is a file", dir.display());
    }
    if dir.is_dir() {
        let mut entries = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read --work-dir {}", dir.display()))?;
        if entries.next().is_some() {
            bail!(
                "--work-dir {} is not empty; it is cleared before every pass",
                dir.display()
            );
        }
    }
    Ok(dir.to_path_buf())
}

fn output_report(report: &RunReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            print!("{}", report.to_text());
            if !report.passes.is_empty() {
                let verb = if report.dry_run { "Would write" } else { "Wrote" };
                println!(
                    "\n✅ {verb} {} file(s) in {} pass(es)",
                    report.file_count(),
                    report.passes.len()
                );
            }
            Ok(())
        }
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(report).context("Failed to serialize report to JSON")?;
            println!("{json}");
            Ok(())
        }
        OutputFormat::Yaml => {
            let yaml = crate::data::to_yaml(report).context("Failed to serialize report to YAML")?;
            println!("{yaml}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_scratch_checkout() {
        let scratch = tempfile::tempdir().unwrap();
        assert_eq!(
            checkout_dir(None, scratch.path()).unwrap(),
            scratch.path().join("work")
        );
    }

    #[test]
    fn accepts_missing_or_empty_work_dir() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("checkout");
        assert_eq!(checkout_dir(Some(&missing), root.path()).unwrap(), missing);
        assert_eq!(
            checkout_dir(Some(root.path()), Path::new("/unused")).unwrap(),
            root.path()
        );
    }

    #[test]
    fn refuses_non_empty_work_dir() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("keep.txt"), "data").unwrap();
        let err = checkout_dir(Some(root.path()), Path::new("/unused")).unwrap_err();
        assert!(err.to_string().contains("is not empty"), "{err}");
        assert!(root.path().join("keep.txt").exists());

        let file = root.path().join("keep.txt");
        let err = checkout_dir(Some(&file), Path::new("/unused")).unwrap_err();
        assert!(err.to_string().contains("is a file"), "{err}");
    }
}
