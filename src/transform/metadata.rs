//! Transformations over the commit message, author, and labels.

mod author_label;
mod expose_label;
mod map_author;
mod message;
mod scrubber;
mod squash_notes;
mod template;

pub use author_label::{RestoreAuthor, SaveAuthor, DEFAULT_AUTHOR_LABEL};
pub use expose_label::ExposeLabel;
pub use map_author::{MapAuthor, MapAuthorOptions};
pub use message::{AddHeader, ReplaceMessage};
pub use scrubber::Scrubber;
pub use squash_notes::SquashNotes;
pub use template::{resolve_template, Resolved};

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{MigrationError, Result};

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static LABEL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").unwrap());

fn validate_label_name(field: &str, name: &str) -> Result<()> {
    if LABEL_NAME.is_match(name) {
        Ok(())
    } else {
        Err(MigrationError::config(format!(
            "{field} {name:?} is not a valid label name"
        )))
    }
}

fn validate_separator(separator: &str) -> Result<()> {
    if separator.trim_start().starts_with(['=', ':']) {
        Ok(())
    } else {
        Err(MigrationError::config(format!(
            "label separator {separator:?} must start with '=' or ':'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_names_and_separators() {
        assert!(validate_label_name("label", "ORIGINAL_AUTHOR").is_ok());
        assert!(validate_label_name("label", "Reviewed-by").is_ok());
        assert!(validate_label_name("label", "1BAD").is_err());
        assert!(validate_label_name("label", "has space").is_err());
        assert!(validate_separator("=").is_ok());
        assert!(validate_separator(": ").is_ok());
        assert!(validate_separator("->").is_err());
    }
}
