//! Validate command: loads the migration file and reports on each workflow.

use std::path::Path;

use anyhow::Result;
use clap::Parser;

use crate::transform::Transformation;
use crate::workflow::Workflow;

/// Validate command options.
#[derive(Parser)]
pub struct ValidateCommand {}

/// Reverse steps that would fail if the workflow ran backwards.
fn irreversible_steps(workflow: &Workflow) -> usize {
    workflow
        .reversed_transformations()
        .iter()
        .filter(|t| matches!(t, Transformation::Error(_)))
        .count()
}

impl ValidateCommand {
    /// Executes the validate command.
    pub fn execute(self, config: Option<&Path>) -> Result<()> {
        let migration = super::load_migration(config)?;
        println!("📄 {}", migration.path().display());
        for workflow in migration.workflows() {
            println!(
                "✅ {}: {}, {} transformation(s), reversible check {}",
                workflow.name(),
                workflow.mode(),
                workflow.transformations().len(),
                if workflow.reversible_check() { "on" } else { "off" },
            );
            let irreversible = irreversible_steps(workflow);
            if irreversible > 0 {
                println!("   ⚠️  {irreversible} step(s) cannot be reversed");
            }
        }
        Ok(())
    }
}
