//! `map_author`.

use std::collections::{BTreeMap, BTreeSet};

use crate::authoring::Author;
use crate::error::{MigrationError, Result};
use crate::transform::{Context, ErrorTransform, Noop, Transform, Transformation};

/// Flags accepted by [`MapAuthor::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MapAuthorOptions {
    /// Allow reversing into the inverted table.
    pub reversible: bool,
    /// Reverse into a no-op instead.
    pub noop_reverse: bool,
    /// Fail on authors missing from the table.
    pub fail_if_not_found: bool,
    /// Same as `fail_if_not_found`, for the reversed table.
    pub reverse_fail_if_not_found: bool,
    /// Also map the author of every change in the pass.
    pub map_all_changes: bool,
}

/// Rewrites authors through a lookup table.
///
/// Keys are either full `Name <email>` authors, bare emails (containing
/// `@`), or bare names. Lookup tries them in that order.
#[derive(Debug, Clone)]
pub struct MapAuthor {
    by_author: BTreeMap<String, Author>,
    by_email: BTreeMap<String, Author>,
    by_name: BTreeMap<String, Author>,
    options: MapAuthorOptions,
}

impl MapAuthor {
    /// Builds the table, classifying each key.
    pub fn new<I, K, V>(authors: I, options: MapAuthorOptions) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut by_author = BTreeMap::new();
        let mut by_email = BTreeMap::new();
        let mut by_name = BTreeMap::new();
        for (key, value) in authors {
            let (key, value) = (key.as_ref().trim(), value.as_ref());
            let target = Author::parse(value).map_err(|e| {
                MigrationError::config(format!("invalid author mapping for {key:?}: {e}"))
            })?;
            if let Ok(author) = Author::parse(key) {
                by_author.insert(author.to_string(), target);
            } else if key.contains('@') {
                by_email.insert(key.to_string(), target);
            } else {
                by_name.insert(key.to_string(), target);
            }
        }

        let mapper = Self {
            by_author,
            by_email,
            by_name,
            options,
        };
        if options.reversible && !options.noop_reverse {
            mapper.check_reversible()?;
        }
        Ok(mapper)
    }

    fn check_reversible(&self) -> Result<()> {
        if !self.by_email.is_empty() || !self.by_name.is_empty() {
            return Err(MigrationError::config(
                "author mapping cannot be reversible when it maps bare emails or names",
            ));
        }
        let mut targets = BTreeSet::new();
        for target in self.by_author.values() {
            let rendered = target.to_string();
            if !targets.insert(rendered.clone()) {
                return Err(MigrationError::config(format!(
                    "author mapping cannot be reversible: {rendered} is the target of more than one author"
                )));
            }
        }
        Ok(())
    }

    fn not_found(&self, raw: &str) -> Result<Option<&Author>> {
        if self.options.fail_if_not_found {
            Err(MigrationError::apply(format!(
                "cannot find a mapping for author '{raw}'"
            )))
        } else {
            Ok(None)
        }
    }

    fn lookup(&self, raw: &str) -> Result<Option<&Author>> {
        if let Some(found) = self.by_author.get(raw.trim()) {
            return Ok(Some(found));
        }
        let Ok(author) = Author::parse(raw) else {
            return self.not_found(raw);
        };
        let found = self
            .by_author
            .get(&author.to_string())
            .or_else(|| {
                (!author.email().is_empty())
                    .then(|| self.by_email.get(author.email()))
                    .flatten()
            })
            .or_else(|| self.by_name.get(author.name()));
        match found {
            Some(found) => Ok(Some(found)),
            None => self.not_found(raw),
        }
    }

    /// Maps one author string; unmapped authors pass through unless the
    /// table fails on them.
    pub fn map(&self, raw: &str) -> Result<String> {
        Ok(match self.lookup(raw)? {
            Some(author) => author.to_string(),
            None => raw.to_string(),
        })
    }

    fn inverted(&self) -> Result<Self> {
        let mut by_author = BTreeMap::new();
        for (source, target) in &self.by_author {
            let source = Author::parse(source).map_err(MigrationError::from)?;
            by_author.insert(target.to_string(), source);
        }
        Ok(Self {
            by_author,
            by_email: BTreeMap::new(),
            by_name: BTreeMap::new(),
            options: MapAuthorOptions {
                fail_if_not_found: self.options.reverse_fail_if_not_found,
                reverse_fail_if_not_found: self.options.fail_if_not_found,
                ..self.options
            },
        })
    }
}

impl Transform for MapAuthor {
    fn apply(&self, ctx: &mut Context<'_>) -> Result<()> {
        let author = if ctx.author.is_empty() {
            None
        } else {
            Some(self.map(&ctx.author)?)
        };
        let mapped_changes = if self.options.map_all_changes {
            ctx.changes
                .iter()
                .map(|change| self.map(&change.author))
                .collect::<Result<Vec<_>>>()?
        } else {
            Vec::new()
        };

        if let Some(author) = author {
            ctx.author = author;
        }
        for (change, mapped) in ctx.changes.iter_mut().zip(mapped_changes) {
            change.mapped_author = Some(mapped);
        }
        Ok(())
    }

    fn reverse(&self) -> Transformation {
        if self.options.noop_reverse {
            return Noop::reversing(self.clone().into()).into();
        }
        if !self.options.reversible {
            return ErrorTransform::new(
                "author mapping doesn't have reversible enabled",
                self.clone().into(),
            )
            .into();
        }
        match self.inverted() {
            Ok(inverted) => inverted.into(),
            Err(e) => ErrorTransform::new(e.to_string(), self.clone().into()).into(),
        }
    }

    fn describe(&self) -> String {
        "Mapping authors".to_string()
    }
}
