//! `scrubber`.

use regex::Regex;

use crate::error::{MigrationError, Result};
use crate::transform::{Context, Noop, Transform, Transformation};

/// Rewrites the message with a sequence of regex replacements.
///
/// The replacement follows [`Regex::replace_all`] syntax, so `$1` refers to
/// the first capture group. Use `${1}` when the group is followed by text.
#[derive(Debug, Clone)]
pub struct Scrubber {
    regexes: Vec<Regex>,
    replacement: String,
    msg_if_no_match: Option<String>,
    fail_if_no_match: bool,
}

impl Scrubber {
    /// Compiles every pattern in multi-line mode.
    pub fn new<S: AsRef<str>>(
        regexes: &[S],
        replacement: impl Into<String>,
        msg_if_no_match: Option<String>,
        fail_if_no_match: bool,
    ) -> Result<Self> {
        if regexes.is_empty() {
            return Err(MigrationError::config("scrubber requires at least one regex"));
        }
        let msg_if_no_match = msg_if_no_match.filter(|m| !m.is_empty());
        if fail_if_no_match && msg_if_no_match.is_some() {
            return Err(MigrationError::config(
                "scrubber: fail_if_no_match and msg_if_no_match cannot be used together",
            ));
        }
        let regexes = regexes
            .iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Regex::new(&format!("(?m){pattern}")).map_err(|e| {
                    MigrationError::config(format!("invalid scrubber regex {pattern:?}: {e}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            regexes,
            replacement: replacement.into(),
            msg_if_no_match,
            fail_if_no_match,
        })
    }
}

impl Transform for Scrubber {
    fn apply(&self, ctx: &mut Context<'_>) -> Result<()> {
        let mut message = ctx.message.clone();
        let mut matched = false;
        for regex in &self.regexes {
            if regex.is_match(&message) {
                matched = true;
                message = regex
                    .replace_all(&message, self.replacement.as_str())
                    .into_owned();
            }
        }

        if matched {
            ctx.message = message;
        } else if self.fail_if_no_match {
            return Err(MigrationError::apply(format!(
                "scrubber regex didn't match for description: {}",
                ctx.message
            )));
        } else if let Some(fallback) = &self.msg_if_no_match {
            ctx.message = fallback.clone();
        }
        Ok(())
    }

    fn reverse(&self) -> Transformation {
        Noop::reversing(self.clone().into()).into()
    }

    fn describe(&self) -> String {
        "Description scrubber".to_string()
    }
}
