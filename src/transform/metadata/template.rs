//! `${LABEL}` substitution.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{MigrationError, Result};
use crate::transform::Context;

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static TEMPLATE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z][A-Za-z0-9_-]*)\}").unwrap());

/// A template with every known label substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Resulting text; unresolved tokens are kept verbatim.
    pub text: String,
    /// Labels that could not be found, in order of appearance.
    pub missing: Vec<String>,
}

impl Resolved {
    /// The text, or an error naming the first missing label.
    pub fn require_all(self) -> Result<String> {
        match self.missing.first() {
            Some(name) => Err(MigrationError::apply(format!(
                "cannot find label '{name}' in message or changes"
            ))),
            None => Ok(self.text),
        }
    }
}

/// Substitutes `${NAME}` tokens with the first value of each label.
pub fn resolve_template(template: &str, ctx: &Context<'_>) -> Resolved {
    let mut text = String::with_capacity(template.len());
    let mut missing = Vec::new();
    let mut last = 0;
    for caps in TEMPLATE_TOKEN.captures_iter(template) {
        let (Some(token), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        text.push_str(&template[last..token.start()]);
        match ctx.get_label(name.as_str()) {
            Some(value) => text.push_str(&value),
            None => {
                text.push_str(token.as_str());
                missing.push(name.as_str().to_string());
            }
        }
        last = token.end();
    }
    text.push_str(&template[last..]);
    Resolved { text, missing }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;

    #[test]
    fn substitutes_known_labels() {
        let fs = MemoryFileSystem::new();
        let ctx = Context::new(&fs, "/w").with_message("Title\n\nBUG=42\nTEAM: core\n");
        let resolved = resolve_template("Fixes ${BUG} for ${TEAM}.", &ctx);
        assert!(resolved.missing.is_empty());
        assert_eq!(resolved.require_all().unwrap(), "Fixes 42 for core.");
    }

    #[test]
    fn keeps_unknown_tokens_and_reports_them() {
        let fs = MemoryFileSystem::new();
        let ctx = Context::new(&fs, "/w");
        let resolved = resolve_template("a ${NOPE} b ${ALSO}", &ctx);
        assert_eq!(resolved.text, "a ${NOPE} b ${ALSO}");
        assert_eq!(resolved.missing, ["NOPE", "ALSO"]);
        let err = resolved.require_all().unwrap_err();
        assert_eq!(err.to_string(), "cannot find label 'NOPE' in message or changes");
    }

    #[test]
    fn leaves_plain_dollars_alone() {
        let fs = MemoryFileSystem::new();
        let ctx = Context::new(&fs, "/w");
        assert_eq!(resolve_template("$5 ${} ${1X}", &ctx).text, "$5 ${} ${1X}");
    }
}
