//! Command line interface for treeshift.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;

use crate::config::{resolve_config_path, Migration};

pub mod describe;
pub mod run;
pub mod validate;

/// treeshift: moves code between trees through a declared pipeline.
#[derive(Parser)]
#[command(name = "treeshift")]
#[command(about = "Moves code between trees through a declared pipeline", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the migration file (defaults to $TREESHIFT_CONFIG, then ./migration.yaml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Runs a workflow from origin to destination.
    Run(run::RunCommand),
    /// Loads the migration file and checks every workflow.
    Validate(validate::ValidateCommand),
    /// Lists the transformation pipeline of a workflow.
    Describe(describe::DescribeCommand),
}

impl Cli {
    /// Executes the CLI command.
    pub fn execute(self) -> Result<()> {
        let config = self.config.as_deref();
        match self.command {
            Commands::Run(run_cmd) => run_cmd.execute(config),
            Commands::Validate(validate_cmd) => validate_cmd.execute(config),
            Commands::Describe(describe_cmd) => describe_cmd.execute(config),
        }
    }
}

/// Resolves and loads the migration file.
fn load_migration(config: Option<&Path>) -> Result<Migration> {
    let path = resolve_config_path(config)?;
    debug!("using migration file {}", path.display());
    Migration::load(&path)
}
