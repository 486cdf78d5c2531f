//! `Name <email>` author identities.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::MigrationError;

#[allow(clippy::unwrap_used)] // Compile-time constant pattern
static AUTHOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<name>[^<]+)<(?P<email>[^>]*)>$").unwrap());

/// Failure to parse an author string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidAuthor {
    /// The string is not of the form `Name <email>`.
    #[error("invalid author '{0}': expected 'Name <email>'")]
    Malformed(String),
    /// The name part is blank.
    #[error("invalid author '{0}': name cannot be empty")]
    EmptyName(String),
}

impl From<InvalidAuthor> for MigrationError {
    fn from(err: InvalidAuthor) -> Self {
        Self::Config(err.to_string())
    }
}

/// A commit author.
///
/// Two authors are equal when they share a non-empty email, or when both
/// emails are empty and the names match.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Author {
    name: String,
    email: String,
}

impl Author {
    /// Creates an author from its parts.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Result<Self, InvalidAuthor> {
        let name = name.into().trim().to_string();
        let email = email.into().trim().to_string();
        if name.is_empty() {
            return Err(InvalidAuthor::EmptyName(format!("{name} <{email}>")));
        }
        Ok(Self { name, email })
    }

    /// Parses `Name <email>`, optionally wrapped in matching quotes.
    pub fn parse(raw: &str) -> Result<Self, InvalidAuthor> {
        let trimmed = raw.trim();
        let unquoted = ['"', '\'']
            .iter()
            .find_map(|q| {
                trimmed
                    .strip_prefix(*q)
                    .and_then(|s| s.strip_suffix(*q))
            })
            .unwrap_or(trimmed);

        let caps = AUTHOR_REGEX
            .captures(unquoted)
            .ok_or_else(|| InvalidAuthor::Malformed(raw.to_string()))?;
        let name = caps["name"].trim();
        if name.is_empty() {
            return Err(InvalidAuthor::EmptyName(raw.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            email: caps["email"].trim().to_string(),
        })
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Email address, possibly empty.
    pub fn email(&self) -> &str {
        &self.email
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

impl FromStr for Author {
    type Err = InvalidAuthor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Author {
    type Error = InvalidAuthor;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Author> for String {
    fn from(author: Author) -> Self {
        author.to_string()
    }
}

impl PartialEq for Author {
    fn eq(&self, other: &Self) -> bool {
        match (self.email.is_empty(), other.email.is_empty()) {
            (false, false) => self.email == other.email,
            (true, true) => self.name == other.name,
            _ => false,
        }
    }
}

impl Eq for Author {}

impl Hash for Author {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if self.email.is_empty() {
            ("name", &self.name).hash(state);
        } else {
            ("email", &self.email).hash(state);
        }
    }
}
