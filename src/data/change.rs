//! A single unit of migration history.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::labels::{first_line, Labels};
use crate::authoring::Author;

/// One origin revision being migrated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    /// Origin reference (commit id, folder hash, ...).
    #[serde(rename = "ref")]
    pub reference: String,
    /// Raw author string as recorded by the origin.
    pub author: String,
    /// Full commit message.
    pub message: String,
    /// Author after `map_author` with `map_all_changes`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapped_author: Option<String>,
    /// Whether the revision is a merge.
    #[serde(default)]
    pub is_merge: bool,
    /// Labels attached by the origin in addition to those in the message.
    #[serde(default, skip_serializing_if = "Labels::is_empty")]
    pub labels: Labels,
    /// Files touched by the revision.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    /// Commit date with its original offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<FixedOffset>>,
}

impl Change {
    /// Creates a non-merge change with no extra labels or files.
    pub fn new(
        reference: impl Into<String>,
        author: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            reference: reference.into(),
            author: author.into(),
            message: message.into(),
            mapped_author: None,
            is_merge: false,
            labels: Labels::new(),
            files: Vec::new(),
            date: None,
        }
    }

    /// Marks the change as a merge.
    #[must_use]
    pub fn merge(mut self) -> Self {
        self.is_merge = true;
        self
    }

    /// Attaches an origin label.
    #[must_use]
    pub fn with_label(mut self, name: &str, value: &str) -> Self {
        self.labels.add(name, value);
        self
    }

    /// First line of the message.
    pub fn first_line_message(&self) -> &str {
        first_line(&self.message)
    }

    /// Mapped author when present, otherwise the raw author.
    pub fn effective_author(&self) -> &str {
        self.mapped_author.as_deref().unwrap_or(&self.author)
    }

    /// Parsed raw author, if it is well formed.
    pub fn parsed_author(&self) -> Option<Author> {
        Author::parse(&self.author).ok()
    }

    /// Values of `name` from origin labels, then from the message.
    pub fn label_values(&self, name: &str) -> Vec<String> {
        let from_message = Labels::parse(&self.message);
        self.labels
            .all(name)
            .iter()
            .chain(from_message.all(name))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_values_merge_sources() {
        let change = Change::new("abc", "A <a@x.com>", "Title\n\nBUG=2\n").with_label("BUG", "1");
        assert_eq!(change.label_values("BUG"), ["1", "2"]);
        assert!(change.label_values("NONE").is_empty());
    }

    #[test]
    fn effective_author_prefers_mapping() {
        let mut change = Change::new("abc", "A <a@x.com>", "m");
        assert_eq!(change.effective_author(), "A <a@x.com>");
        change.mapped_author = Some("B <b@x.com>".to_string());
        assert_eq!(change.effective_author(), "B <b@x.com>");
        assert_eq!(change.parsed_author().unwrap().email(), "a@x.com");
    }

    #[test]
    fn deserializes_minimal_yaml() {
        let change: Change = serde_yaml::from_str(
            "ref: r1\nauthor: \"A <a@x.com>\"\nmessage: |\n  Title\n  X=1\ndate: 2024-05-01T10:00:00+02:00\n",
        )
        .unwrap();
        assert_eq!(change.reference, "r1");
        assert_eq!(change.first_line_message(), "Title");
        assert!(!change.is_merge);
        assert_eq!(change.date.unwrap().offset().local_minus_utc(), 7200);
    }
}
