//! `replace_message` and `add_header`.

use crate::error::Result;
use crate::transform::metadata::resolve_template;
use crate::transform::{Context, Noop, Transform, Transformation};

/// Replaces the whole message with a `${LABEL}` template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceMessage {
    text: String,
    ignore_label_not_found: bool,
}

impl ReplaceMessage {
    /// With `ignore_label_not_found`, unknown labels stay as literal tokens.
    pub fn new(text: impl Into<String>, ignore_label_not_found: bool) -> Self {
        Self {
            text: text.into(),
            ignore_label_not_found,
        }
    }
}

impl Transform for ReplaceMessage {
    fn apply(&self, ctx: &mut Context<'_>) -> Result<()> {
        let resolved = resolve_template(&self.text, ctx);
        ctx.message = if self.ignore_label_not_found {
            resolved.text
        } else {
            resolved.require_all()?
        };
        Ok(())
    }

    fn reverse(&self) -> Transformation {
        Noop::reversing(self.clone().into()).into()
    }

    fn describe(&self) -> String {
        "Replacing commit message".to_string()
    }
}

/// Prepends a `${LABEL}` template to the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddHeader {
    text: String,
    ignore_label_not_found: bool,
    new_line: bool,
}

impl AddHeader {
    /// With `ignore_label_not_found`, a header referencing an unknown label
    /// is skipped instead of failing. `new_line` separates header and message.
    pub fn new(text: impl Into<String>, ignore_label_not_found: bool, new_line: bool) -> Self {
        Self {
            text: text.into(),
            ignore_label_not_found,
            new_line,
        }
    }
}

impl Transform for AddHeader {
    fn apply(&self, ctx: &mut Context<'_>) -> Result<()> {
        let resolved = resolve_template(&self.text, ctx);
        if !resolved.missing.is_empty() && self.ignore_label_not_found {
            return Ok(());
        }
        let mut header = resolved.require_all()?;
        if header.is_empty() {
            return Ok(());
        }
        if self.new_line {
            header.push('\n');
        }
        ctx.message.insert_str(0, &header);
        Ok(())
    }

    fn reverse(&self) -> Transformation {
        Noop::reversing(self.clone().into()).into()
    }

    fn describe(&self) -> String {
        "Adding header to commit message".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MigrationError;
    use crate::fs::MemoryFileSystem;

    #[test]
    fn replace_message_uses_labels() {
        let fs = MemoryFileSystem::new();
        let mut ctx = Context::new(&fs, "/w").with_message("internal text\n\nBUG=123\n");
        ReplaceMessage::new("Public fix for ${BUG}", false)
            .apply(&mut ctx)
            .unwrap();
        assert_eq!(ctx.message, "Public fix for 123");
    }

    #[test]
    fn replace_message_missing_label() {
        let fs = MemoryFileSystem::new();
        let mut ctx = Context::new(&fs, "/w").with_message("text");
        let err = ReplaceMessage::new("${NOPE}", false)
            .apply(&mut ctx)
            .unwrap_err();
        assert!(matches!(err, MigrationError::Apply(_)));
        assert_eq!(ctx.message, "text");

        ReplaceMessage::new("keep ${NOPE}", true)
            .apply(&mut ctx)
            .unwrap();
        assert_eq!(ctx.message, "keep ${NOPE}");
    }

    #[test]
    fn add_header_prepends() {
        let fs = MemoryFileSystem::new();
        let mut ctx = Context::new(&fs, "/w").with_message("Body\n\nTEAM=core\n");
        AddHeader::new("[${TEAM}]", false, true)
            .apply(&mut ctx)
            .unwrap();
        assert_eq!(ctx.message, "[core]\nBody\n\nTEAM=core\n");

        AddHeader::new("x: ", false, false).apply(&mut ctx).unwrap();
        assert!(ctx.message.starts_with("x: [core]\n"));
    }

    #[test]
    fn add_header_skips_on_missing_label_when_ignored() {
        let fs = MemoryFileSystem::new();
        let mut ctx = Context::new(&fs, "/w").with_message("Body");
        AddHeader::new("[${NOPE}]", true, true)
            .apply(&mut ctx)
            .unwrap();
        assert_eq!(ctx.message, "Body");
        assert!(AddHeader::new("[${NOPE}]", false, true)
            .apply(&mut ctx)
            .is_err());
    }
}
