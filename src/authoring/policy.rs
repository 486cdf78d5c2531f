//! Destination author policies.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::author::Author;
use crate::error::{MigrationError, Result};

/// Which policy an [`Authoring`] applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthoringMode {
    /// Keep the original author, falling back to the default.
    PassThru,
    /// Always use the default author.
    Overwrite,
    /// Keep allow-listed authors, use the default for everyone else.
    Allowed,
}

impl fmt::Display for AuthoringMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PassThru => write!(f, "PASS_THRU"),
            Self::Overwrite => write!(f, "OVERWRITE"),
            Self::Allowed => write!(f, "ALLOWED"),
        }
    }
}

impl FromStr for AuthoringMode {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "PASS_THRU" => Ok(Self::PassThru),
            "OVERWRITE" => Ok(Self::Overwrite),
            "ALLOWED" => Ok(Self::Allowed),
            _ => Err(MigrationError::config(format!(
                "unknown authoring mode: {s:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
enum AllowEntry {
    Email(String),
    Author(String),
    Pattern(Regex),
}

impl AllowEntry {
    fn parse(raw: &str) -> Result<Self> {
        if raw.len() >= 2 && raw.starts_with('/') && raw.ends_with('/') {
            let pattern = &raw[1..raw.len() - 1];
            let re = Regex::new(pattern).map_err(|e| {
                MigrationError::config(format!("invalid allowlist pattern {raw:?}: {e}"))
            })?;
            return Ok(Self::Pattern(re));
        }
        if raw.contains('<') {
            return Ok(Self::Author(Author::parse(raw)?.to_string()));
        }
        Ok(Self::Email(raw.to_string()))
    }

    fn allows(&self, author: &Author) -> bool {
        match self {
            Self::Email(email) => author.email() == email,
            Self::Author(full) => author.to_string() == *full,
            Self::Pattern(re) => re.is_match(author.email()) || re.is_match(&author.to_string()),
        }
    }
}

/// Resolves the author recorded at the destination.
#[derive(Debug, Clone)]
pub struct Authoring {
    mode: AuthoringMode,
    default: Author,
    allowlist: Vec<AllowEntry>,
}

impl Authoring {
    /// Keeps the original author when one is known.
    pub fn pass_thru(default: &str) -> Result<Self> {
        Ok(Self {
            mode: AuthoringMode::PassThru,
            default: Author::parse(default)?,
            allowlist: Vec::new(),
        })
    }

    /// Always uses `default`.
    pub fn overwrite(default: &str) -> Result<Self> {
        Ok(Self {
            mode: AuthoringMode::Overwrite,
            default: Author::parse(default)?,
            allowlist: Vec::new(),
        })
    }

    /// Keeps authors matching an allowlist entry.
    ///
    /// Entries are an email, a full `Name <email>`, or a `/regex/` tested
    /// against both the email and the full author string.
    pub fn allowed<S: AsRef<str>>(default: &str, allowlist: &[S]) -> Result<Self> {
        if allowlist.is_empty() {
            return Err(MigrationError::config(
                "allowlist cannot be empty; use overwrite mode instead",
            ));
        }
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(allowlist.len());
        for raw in allowlist {
            let raw = raw.as_ref().trim();
            if !seen.insert(raw) {
                return Err(MigrationError::config(format!(
                    "duplicate allowlist entry '{raw}'"
                )));
            }
            entries.push(AllowEntry::parse(raw)?);
        }
        Ok(Self {
            mode: AuthoringMode::Allowed,
            default: Author::parse(default)?,
            allowlist: entries,
        })
    }

    /// Builds a policy for `mode`; the allowlist is ignored unless allowed mode.
    pub fn from_mode<S: AsRef<str>>(
        mode: AuthoringMode,
        default: &str,
        allowlist: &[S],
    ) -> Result<Self> {
        match mode {
            AuthoringMode::PassThru => Self::pass_thru(default),
            AuthoringMode::Overwrite => Self::overwrite(default),
            AuthoringMode::Allowed => Self::allowed(default, allowlist),
        }
    }

    /// Policy kind.
    pub fn mode(&self) -> AuthoringMode {
        self.mode
    }

    /// Author used when the original is missing or rejected.
    pub fn default_author(&self) -> &Author {
        &self.default
    }

    /// Effective destination author for `original`.
    pub fn resolve_author(&self, original: Option<&Author>) -> Author {
        match (self.mode, original) {
            (AuthoringMode::Overwrite, _) | (_, None) => self.default.clone(),
            (AuthoringMode::PassThru, Some(author)) => author.clone(),
            (AuthoringMode::Allowed, Some(author)) => {
                if self.allowlist.iter().any(|entry| entry.allows(author)) {
                    author.clone()
                } else {
                    self.default.clone()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT: &str = "Default <default@example.com>";

    fn author(s: &str) -> Author {
        Author::parse(s).unwrap()
    }

    #[test]
    fn pass_thru_keeps_original() {
        let policy = Authoring::pass_thru(DEFAULT).unwrap();
        let a = author("Jane <jane@x.com>");
        assert_eq!(policy.resolve_author(Some(&a)), a);
        assert_eq!(policy.resolve_author(None), author(DEFAULT));
        assert_eq!(policy.mode(), AuthoringMode::PassThru);
    }

    #[test]
    fn invalid_default_is_config_error() {
        let err = Authoring::pass_thru("not an author").unwrap_err();
        assert!(matches!(err, MigrationError::Config(_)));
        assert!(Authoring::overwrite("").is_err());
    }

    #[test]
    fn overwrite_ignores_original() {
        let policy = Authoring::overwrite(DEFAULT).unwrap();
        let resolved = policy.resolve_author(Some(&author("Jane <jane@x.com>")));
        assert_eq!(resolved.to_string(), DEFAULT);
    }

    #[test]
    fn allowed_by_regex() {
        let policy = Authoring::allowed(DEFAULT, &["/.*@myorg\\.com$/"]).unwrap();
        let employee = author("Employee <employee@myorg.com>");
        let external = author("External <external@other.com>");
        assert_eq!(policy.resolve_author(Some(&employee)), employee);
        assert_eq!(policy.resolve_author(Some(&external)), author(DEFAULT));
    }

    #[test]
    fn allowed_by_email_and_full_author() {
        let policy = Authoring::allowed(
            DEFAULT,
            &["jane@x.com", "Bob <bob@y.com>"],
        )
        .unwrap();
        let jane = author("Jane Q <jane@x.com>");
        assert_eq!(policy.resolve_author(Some(&jane)), jane);
        let bob = author("Bob <bob@y.com>");
        assert_eq!(policy.resolve_author(Some(&bob)), bob);
        let robert = author("Robert <bob@y.com>");
        assert_eq!(policy.resolve_author(Some(&robert)), author(DEFAULT));
    }

    #[test]
    fn allowed_validates_list() {
        let empty: [&str; 0] = [];
        assert!(Authoring::allowed(DEFAULT, &empty).is_err());
        assert!(Authoring::allowed(DEFAULT, &["a@x.com", "a@x.com"]).is_err());
        assert!(Authoring::allowed(DEFAULT, &["/([/"]).is_err());
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!(
            "pass_thru".parse::<AuthoringMode>().unwrap(),
            AuthoringMode::PassThru
        );
        assert_eq!(AuthoringMode::Allowed.to_string(), "ALLOWED");
        assert!("sometimes".parse::<AuthoringMode>().is_err());
    }
}
