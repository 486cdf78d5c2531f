//! Describe command: prints a workflow's pipeline.

use std::path::Path;

use anyhow::Result;
use clap::Parser;

/// Describe command options.
#[derive(Parser)]
pub struct DescribeCommand {
    /// Workflow to describe; optional when the file defines only one.
    #[arg(long)]
    pub workflow: Option<String>,

    /// Shows the reversed pipeline instead.
    #[arg(long)]
    pub reverse: bool,
}

impl DescribeCommand {
    /// Executes the describe command.
    pub fn execute(self, config: Option<&Path>) -> Result<()> {
        let migration = super::load_migration(config)?;
        let workflow = migration.workflow(self.workflow.as_deref())?;

        let direction = if self.reverse { "reverse" } else { "forward" };
        println!("{} ({}, {direction})", workflow.name(), workflow.mode());
        if let Some(origin) = workflow.origin() {
            println!("  origin:      {}", origin.url());
        }
        if let Some(destination) = workflow.destination() {
            println!("  destination: {}", destination.url());
        }
        println!("  authoring:   {}", workflow.authoring().mode());

        let steps = workflow.describe(self.reverse);
        if steps.is_empty() {
            println!("\nNo transformations.");
            return Ok(());
        }
        println!();
        for step in steps {
            println!("{step}");
        }
        Ok(())
    }
}
