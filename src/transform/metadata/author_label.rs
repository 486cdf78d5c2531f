//! `save_author` and `restore_author`.

use tracing::debug;

use crate::authoring::Author;
use crate::error::Result;
use crate::transform::metadata::{validate_label_name, validate_separator};
use crate::transform::{Context, Transform, Transformation};

/// Label used when none is configured.
pub const DEFAULT_AUTHOR_LABEL: &str = "ORIGINAL_AUTHOR";

/// Records the current author as a message label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveAuthor {
    label: String,
    separator: String,
}

impl SaveAuthor {
    /// Saves under `label` (default `ORIGINAL_AUTHOR`) joined by `separator` (default `=`).
    pub fn new(label: Option<String>, separator: Option<String>) -> Result<Self> {
        let label = label.unwrap_or_else(|| DEFAULT_AUTHOR_LABEL.to_string());
        let separator = separator.unwrap_or_else(|| "=".to_string());
        validate_label_name("save_author label", &label)?;
        validate_separator(&separator)?;
        Ok(Self { label, separator })
    }
}

impl Transform for SaveAuthor {
    fn apply(&self, ctx: &mut Context<'_>) -> Result<()> {
        if ctx.author.is_empty() {
            return Ok(());
        }
        let author = ctx.author.clone();
        ctx.add_label(&self.label, &author, &self.separator);
        Ok(())
    }

    fn reverse(&self) -> Transformation {
        RestoreAuthor {
            label: self.label.clone(),
            separator: self.separator.clone(),
            search_all_changes: false,
        }
        .into()
    }

    fn describe(&self) -> String {
        format!("Saving author as label '{}'", self.label)
    }
}

/// Sets the author from a label saved by [`SaveAuthor`] and drops the label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreAuthor {
    label: String,
    separator: String,
    search_all_changes: bool,
}

impl RestoreAuthor {
    /// Reads `label` from the first change, or from every change when
    /// `search_all_changes` is set (later changes win).
    pub fn new(
        label: Option<String>,
        separator: Option<String>,
        search_all_changes: bool,
    ) -> Result<Self> {
        let label = label.unwrap_or_else(|| DEFAULT_AUTHOR_LABEL.to_string());
        let separator = separator.unwrap_or_else(|| "=".to_string());
        validate_label_name("restore_author label", &label)?;
        validate_separator(&separator)?;
        Ok(Self {
            label,
            separator,
            search_all_changes,
        })
    }

    fn saved_author(&self, ctx: &Context<'_>) -> Option<String> {
        let mut found = None;
        for change in &ctx.changes {
            if let Some(value) = change.label_values(&self.label).pop() {
                found = Some(value);
            }
            if !self.search_all_changes {
                break;
            }
        }
        found.or_else(|| ctx.get_label(&self.label))
    }
}

impl Transform for RestoreAuthor {
    fn apply(&self, ctx: &mut Context<'_>) -> Result<()> {
        let Some(saved) = self.saved_author(ctx) else {
            return Ok(());
        };
        match Author::parse(&saved) {
            Ok(author) => {
                ctx.author = author.to_string();
                let before = ctx.message.clone();
                ctx.remove_label(&self.label);
                // Labels saved at the end leave the newline `add_label` inserted.
                if ctx.message.len() < before.len() && before.starts_with(&ctx.message) {
                    if let Some(trimmed) = ctx.message.strip_suffix('\n') {
                        ctx.message = trimmed.to_string();
                    }
                }
            }
            Err(e) => debug!("ignoring saved author {saved:?}: {e}"),
        }
        Ok(())
    }

    fn reverse(&self) -> Transformation {
        SaveAuthor {
            label: self.label.clone(),
            separator: self.separator.clone(),
        }
        .into()
    }

    fn describe(&self) -> String {
        "Restoring original author".to_string()
    }
}
