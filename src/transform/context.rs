//! Mutable state threaded through a transformation pipeline.

use std::path::{Path, PathBuf};

use crate::data::{Change, Labels};
use crate::error::{MigrationError, Result};
use crate::fs::FileSystem;

/// Working state for one pass.
///
/// Owned by the pipeline executor; each transform borrows it mutably for
/// the duration of a single `apply` call.
#[derive(Debug)]
pub struct Context<'a> {
    work_dir: PathBuf,
    fs: &'a dyn FileSystem,
    /// When set, adapters skip writing results back to the destination.
    pub dry_run: bool,
    /// Commit message being built.
    pub message: String,
    /// Author string recorded at the destination.
    pub author: String,
    /// Changes migrated in this pass, newest first.
    pub changes: Vec<Change>,
    /// Labels supplied alongside the message.
    pub labels: Labels,
}

impl<'a> Context<'a> {
    /// Creates a context over `work_dir` with an empty message.
    pub fn new(fs: &'a dyn FileSystem, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            fs,
            dry_run: false,
            message: String::new(),
            author: String::new(),
            changes: Vec::new(),
            labels: Labels::new(),
        }
    }

    /// Sets the initial message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Sets the initial author.
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Sets the changes for this pass.
    #[must_use]
    pub fn with_changes(mut self, changes: Vec<Change>) -> Self {
        self.changes = changes;
        self
    }

    /// Sets the pre-populated labels.
    #[must_use]
    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    /// Sets the dry-run flag.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Filesystem capability for this pass.
    pub fn fs(&self) -> &'a dyn FileSystem {
        self.fs
    }

    /// Root of the working tree.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Root of the working tree, failing when none was configured.
    pub fn require_work_dir(&self) -> Result<&Path> {
        if self.work_dir.as_os_str().is_empty() {
            return Err(MigrationError::apply("working directory is not set"));
        }
        Ok(&self.work_dir)
    }

    /// Labels present in the current message.
    pub fn message_labels(&self) -> Labels {
        Labels::parse(&self.message)
    }

    /// First value of `name` from the supplied labels, the message, or
    /// any change, in that order.
    pub fn get_label(&self, name: &str) -> Option<String> {
        if let Some(value) = self.labels.first(name) {
            return Some(value.to_string());
        }
        if let Some(value) = self.message_labels().first(name) {
            return Some(value.to_string());
        }
        self.changes
            .iter()
            .find_map(|change| change.label_values(name).into_iter().next())
    }

    /// Every distinct value of `name` across all label sources.
    pub fn get_all_labels(&self, name: &str) -> Vec<String> {
        let message_labels = self.message_labels();
        let change_values: Vec<String> = self
            .changes
            .iter()
            .flat_map(|change| change.label_values(name))
            .collect();

        let mut out: Vec<String> = Vec::new();
        let candidates = self
            .labels
            .all(name)
            .iter()
            .chain(message_labels.all(name))
            .chain(&change_values);
        for value in candidates {
            let value = value.trim();
            if !value.is_empty() && !out.iter().any(|v| v == value) {
                out.push(value.to_string());
            }
        }
        out
    }

    /// Records `name` and appends `NAME<separator>value` to the message.
    pub fn add_label(&mut self, name: &str, value: &str, separator: &str) {
        let mut message = self.message.clone();
        if !message.is_empty() && !message.ends_with('\n') {
            message.push('\n');
        }
        message.push_str(&format!("{name}{separator}{value}\n"));
        self.labels.add(name, value);
        self.message = message;
    }

    /// Removes every `name` line from the message and the supplied labels.
    pub fn remove_label(&mut self, name: &str) {
        self.message = strip_label_lines(&self.message, name, None);
        self.labels.remove(name);
    }

    /// Removes the `name` lines whose value is `value`.
    pub fn remove_label_with_value(&mut self, name: &str, value: &str) {
        self.message = strip_label_lines(&self.message, name, Some(value));
        self.labels.remove_value(name, value);
    }
}

fn label_line_value<'l>(line: &'l str, name: &str) -> Option<&'l str> {
    let rest = line.strip_prefix(name)?;
    let rest = rest.trim_start_matches([' ', '\t']);
    let value = rest.strip_prefix([':', '='])?;
    Some(value.trim())
}

fn strip_label_lines(message: &str, name: &str, value: Option<&str>) -> String {
    message
        .split_inclusive('\n')
        .filter(|line| match label_line_value(line, name) {
            Some(found) => value.is_some_and(|v| v != found),
            None => true,
        })
        .collect()
}
