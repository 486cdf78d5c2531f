//! Reports printed by the command line.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::workflow::{PassResult, Workflow, WorkflowMode};

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text format.
    #[default]
    Text,
    /// JSON format.
    Json,
    /// YAML format.
    Yaml,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "yaml" => Ok(Self::Yaml),
            _ => Err(format!("unknown output format '{s}' (expected text, json or yaml)")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
            Self::Yaml => write!(f, "yaml"),
        }
    }
}

/// Result of `treeshift run`.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Workflow name.
    pub workflow: String,
    /// Processing mode.
    pub mode: WorkflowMode,
    /// Destination writes were skipped.
    pub dry_run: bool,
    /// One entry per pass, in execution order.
    pub passes: Vec<PassResult>,
}

impl RunReport {
    /// Collects the passes of one workflow run.
    pub fn new(workflow: &Workflow, dry_run: bool, passes: Vec<PassResult>) -> Self {
        Self {
            workflow: workflow.name().to_string(),
            mode: workflow.mode(),
            dry_run,
            passes,
        }
    }

    /// Total output files across passes.
    pub fn file_count(&self) -> usize {
        self.passes.iter().map(|pass| pass.files.len()).sum()
    }

    /// Human-readable rendering.
    pub fn to_text(&self) -> String {
        let mut out = format!("Workflow: {} ({})", self.workflow, self.mode);
        if self.dry_run {
            out.push_str(" [dry run]");
        }
        out.push('\n');
        if self.passes.is_empty() {
            out.push_str("No pending changes.\n");
            return out;
        }
        let total = self.passes.len();
        for (index, pass) in self.passes.iter().enumerate() {
            out.push_str(&format!(
                "\nPass {}/{total}: {} change(s), {} file(s)\n",
                index + 1,
                pass.changes.len(),
                pass.files.len()
            ));
            out.push_str(&format!("  Author: {}\n", pass.author));
            out.push_str("  Message:\n");
            for line in pass.message.lines() {
                out.push_str(&format!("    {line}\n"));
            }
            out.push_str("  Files:\n");
            for file in &pass.files {
                out.push_str(&format!("    {file}\n"));
            }
        }
        out
    }
}
