//! `squash_notes`.

use crate::data::Change;
use crate::error::Result;
use crate::transform::metadata::resolve_template;
use crate::transform::{Context, Noop, Transform, Transformation};

const MAX_COMPACT_DESCRIPTION: usize = 60;

/// Replaces the message with a summary of the pass's changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SquashNotes {
    /// Text placed before the list; may reference labels as `${NAME}`.
    pub prefix: String,
    /// Changes listed before the "(And N more changes)" trailer.
    pub max: usize,
    /// One line per change instead of a full block.
    pub compact: bool,
    /// Include each change's reference.
    pub show_ref: bool,
    /// Include each change's author.
    pub show_author: bool,
    /// Include the change description.
    pub show_description: bool,
    /// List changes oldest first.
    pub oldest_first: bool,
    /// Include merge changes.
    pub use_merge: bool,
}

impl Default for SquashNotes {
    fn default() -> Self {
        Self {
            prefix: "Imported changes:\n\n".to_string(),
            max: 100,
            compact: true,
            show_ref: true,
            show_author: true,
            show_description: true,
            oldest_first: false,
            use_merge: true,
        }
    }
}

fn cut_if_long(text: &str) -> String {
    if text.chars().count() < MAX_COMPACT_DESCRIPTION {
        return text.to_string();
    }
    let cut: String = text.chars().take(MAX_COMPACT_DESCRIPTION - 3).collect();
    format!("{cut}...")
}

impl SquashNotes {
    fn compact_entry(&self, change: &Change) -> String {
        let mut parts = Vec::new();
        if self.show_ref {
            parts.push(change.reference.clone());
        }
        if self.show_description {
            parts.push(cut_if_long(change.first_line_message()));
        }
        if self.show_author {
            parts.push(format!("by {}", change.effective_author()));
        }
        format!("  - {}\n", parts.join(" "))
    }

    fn full_entry(&self, change: &Change, index: usize, total: usize) -> String {
        let mut parts = vec![if self.show_ref {
            change.reference.clone()
        } else {
            format!("Change {} of {total}", index + 1)
        }];
        if self.show_author {
            parts.push(format!("by {}", change.effective_author()));
        }
        let mut entry = format!("--\n{}", parts.join(" "));
        if self.show_description {
            entry.push_str(":\n\n");
            entry.push_str(&change.message);
        }
        entry.push('\n');
        entry
    }
}

impl Transform for SquashNotes {
    fn apply(&self, ctx: &mut Context<'_>) -> Result<()> {
        let mut message = resolve_template(&self.prefix, ctx).text;
        if self.max == 0 {
            ctx.message = message;
            return Ok(());
        }

        let mut changes: Vec<&Change> = ctx.changes.iter().collect();
        if self.oldest_first {
            changes.reverse();
        }
        if !self.use_merge {
            changes.retain(|change| !change.is_merge);
        }

        let total = changes.len();
        for (index, change) in changes.iter().take(self.max).enumerate() {
            if self.compact {
                message.push_str(&self.compact_entry(change));
            } else {
                message.push_str(&self.full_entry(change, index, total));
            }
        }
        if total > self.max {
            message.push_str(&format!("  (And {} more changes)\n", total - self.max));
        }
        ctx.message = message;
        Ok(())
    }

    fn reverse(&self) -> Transformation {
        Noop::reversing(self.clone().into()).into()
    }

    fn describe(&self) -> String {
        "squash_notes".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;

    fn changes() -> Vec<Change> {
        vec![
            Change::new("4", "D <d@x.com>", "Fourth change\n\nbody"),
            Change::new("3", "C <c@x.com>", "Third change").merge(),
            Change::new("2", "B <b@x.com>", "Second change"),
            Change::new("1", "A <a@x.com>", "First change"),
        ]
    }

    fn squash(notes: &SquashNotes) -> String {
        let fs = MemoryFileSystem::new();
        let mut ctx = Context::new(&fs, "/w")
            .with_message("original")
            .with_changes(changes());
        notes.apply(&mut ctx).unwrap();
        ctx.message
    }

    #[test]
    fn compact_default() {
        insta::assert_snapshot!(squash(&SquashNotes::default()), @r"
Imported changes:

  - 4 Fourth change by D <d@x.com>
  - 3 Third change by C <c@x.com>
  - 2 Second change by B <b@x.com>
  - 1 First change by A <a@x.com>
");
    }

    #[test]
    fn truncates_after_max() {
        let notes = SquashNotes {
            max: 2,
            ..SquashNotes::default()
        };
        let message = squash(&notes);
        let entries: Vec<&str> = message
            .lines()
            .filter(|line| line.starts_with("  - "))
            .collect();
        assert_eq!(
            entries,
            [
                "  - 4 Fourth change by D <d@x.com>",
                "  - 3 Third change by C <c@x.com>"
            ]
        );
        assert!(!message.contains("Second change"), "{message}");
        assert!(message.ends_with("  (And 2 more changes)\n"), "{message}");
    }

    #[test]
    fn oldest_first_without_merges() {
        let notes = SquashNotes {
            prefix: String::new(),
            oldest_first: true,
            use_merge: false,
            show_author: false,
            ..SquashNotes::default()
        };
        assert_eq!(
            squash(&notes),
            "  - 1 First change\n  - 2 Second change\n  - 4 Fourth change\n"
        );
    }

    #[test]
    fn full_entries_without_refs() {
        let notes = SquashNotes {
            prefix: String::new(),
            max: 1,
            compact: false,
            show_ref: false,
            ..SquashNotes::default()
        };
        insta::assert_snapshot!(squash(&notes), @r"
--
Change 1 of 4 by D <d@x.com>:

Fourth change

body
  (And 3 more changes)
");
    }

    #[test]
    fn zero_max_keeps_prefix_only() {
        let notes = SquashNotes {
            prefix: "Only prefix".to_string(),
            max: 0,
            ..SquashNotes::default()
        };
        assert_eq!(squash(&notes), "Only prefix");
    }

    #[test]
    fn uses_mapped_author_and_cuts_long_lines() {
        let fs = MemoryFileSystem::new();
        let mut change = Change::new("r", "Old <old@x.com>", "x".repeat(80));
        change.mapped_author = Some("New <new@x.com>".to_string());
        let mut ctx = Context::new(&fs, "/w").with_changes(vec![change]);
        SquashNotes {
            prefix: String::new(),
            ..SquashNotes::default()
        }
        .apply(&mut ctx)
        .unwrap();
        assert_eq!(
            ctx.message,
            format!("  - r {}... by New <new@x.com>\n", "x".repeat(57))
        );
    }

    #[test]
    fn prefix_resolves_labels() {
        let fs = MemoryFileSystem::new();
        let mut ctx = Context::new(&fs, "/w")
            .with_message("t\n\nPROJECT=core\n")
            .with_changes(vec![Change::new("1", "A <a@x.com>", "one")]);
        SquashNotes {
            prefix: "Import for ${PROJECT} ${MISSING}\n".to_string(),
            ..SquashNotes::default()
        }
        .apply(&mut ctx)
        .unwrap();
        assert_eq!(
            ctx.message,
            "Import for core ${MISSING}\n  - 1 one by A <a@x.com>\n"
        );
    }
}
