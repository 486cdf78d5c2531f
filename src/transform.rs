//! Reversible transformations over a working tree and its commit metadata.
//!
//! Every operation is a variant of [`Transformation`], a closed set with
//! three operations: apply it to a [`Context`], obtain its reverse, and
//! describe it. Operations that cannot be undone reverse into [`Noop`] or
//! [`ErrorTransform`] placeholders instead of failing at assembly time.

pub mod context;
pub mod files;
pub mod metadata;

pub use context::Context;
pub use files::{CopyFiles, MoveFiles, Remove, Replace, VerifyMatch};
pub use metadata::{
    AddHeader, ExposeLabel, MapAuthor, MapAuthorOptions, ReplaceMessage, RestoreAuthor,
    SaveAuthor, Scrubber, SquashNotes,
};

use crate::error::{MigrationError, Result};

/// Behaviour shared by every transformation.
pub trait Transform {
    /// Applies the transformation to `ctx`.
    fn apply(&self, ctx: &mut Context<'_>) -> Result<()>;
    /// Returns the transformation that undoes this one.
    fn reverse(&self) -> Transformation;
    /// Human readable summary.
    fn describe(&self) -> String;
}

/// Does nothing. Stands in for the reverse of lossy operations.
#[derive(Debug, Clone, Default)]
pub struct Noop {
    original: Option<Box<Transformation>>,
}

impl Noop {
    /// A no-op that reverses to `original`.
    pub fn reversing(original: Transformation) -> Self {
        Self {
            original: Some(Box::new(original)),
        }
    }

    /// The transformation this no-op stands in for.
    pub fn original(&self) -> Option<&Transformation> {
        self.original.as_deref()
    }
}

impl Transform for Noop {
    fn apply(&self, _ctx: &mut Context<'_>) -> Result<()> {
        Ok(())
    }

    fn reverse(&self) -> Transformation {
        match &self.original {
            Some(original) => (**original).clone(),
            None => Transformation::Noop(self.clone()),
        }
    }

    fn describe(&self) -> String {
        "noop".to_string()
    }
}

/// Always fails when applied. Stands in for a reverse that cannot exist.
#[derive(Debug, Clone)]
pub struct ErrorTransform {
    message: String,
    original: Option<Box<Transformation>>,
}

impl ErrorTransform {
    /// A failing placeholder produced while reversing `original`.
    pub fn new(message: impl Into<String>, original: Transformation) -> Self {
        Self {
            message: message.into(),
            original: Some(Box::new(original)),
        }
    }

    /// Error reported by `apply`.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Transform for ErrorTransform {
    fn apply(&self, _ctx: &mut Context<'_>) -> Result<()> {
        Err(MigrationError::Reversibility(self.message.clone()))
    }

    fn reverse(&self) -> Transformation {
        match &self.original {
            Some(original) => (**original).clone(),
            None => Transformation::Error(self.clone()),
        }
    }

    fn describe(&self) -> String {
        "error transformation".to_string()
    }
}

/// Every supported transformation.
#[derive(Debug, Clone)]
pub enum Transformation {
    /// Rename files or directories.
    Move(MoveFiles),
    /// Duplicate files or directories.
    Copy(CopyFiles),
    /// Delete matching paths.
    Remove(Remove),
    /// Literal text substitution in file contents.
    Replace(Replace),
    /// Assert that file contents match, or do not match, a regex.
    VerifyMatch(VerifyMatch),
    /// Summarize the pass's changes into the message.
    SquashNotes(SquashNotes),
    /// Store the author as a message label.
    SaveAuthor(SaveAuthor),
    /// Restore the author from a message label.
    RestoreAuthor(RestoreAuthor),
    /// Replace the message from a template.
    ReplaceMessage(ReplaceMessage),
    /// Publish a label under a visible name.
    ExposeLabel(ExposeLabel),
    /// Prepend a templated header to the message.
    AddHeader(AddHeader),
    /// Regex rewrite of the message.
    Scrubber(Scrubber),
    /// Rewrite authors through a lookup table.
    MapAuthor(MapAuthor),
    /// Does nothing.
    Noop(Noop),
    /// Always fails.
    Error(ErrorTransform),
}

impl Transformation {
    /// A no-op with no original.
    pub fn noop() -> Self {
        Self::Noop(Noop::default())
    }

    /// Short name used in logs and migration files.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Move(_) => "move",
            Self::Copy(_) => "copy",
            Self::Remove(_) => "remove",
            Self::Replace(_) => "replace",
            Self::VerifyMatch(_) => "verify_match",
            Self::SquashNotes(_) => "squash_notes",
            Self::SaveAuthor(_) => "save_author",
            Self::RestoreAuthor(_) => "restore_author",
            Self::ReplaceMessage(_) => "replace_message",
            Self::ExposeLabel(_) => "expose_label",
            Self::AddHeader(_) => "add_header",
            Self::Scrubber(_) => "scrubber",
            Self::MapAuthor(_) => "map_author",
            Self::Noop(_) => "noop",
            Self::Error(_) => "error",
        }
    }

    fn inner(&self) -> &dyn Transform {
        match self {
            Self::Move(t) => t,
            Self::Copy(t) => t,
            Self::Remove(t) => t,
            Self::Replace(t) => t,
            Self::VerifyMatch(t) => t,
            Self::SquashNotes(t) => t,
            Self::SaveAuthor(t) => t,
            Self::RestoreAuthor(t) => t,
            Self::ReplaceMessage(t) => t,
            Self::ExposeLabel(t) => t,
            Self::AddHeader(t) => t,
            Self::Scrubber(t) => t,
            Self::MapAuthor(t) => t,
            Self::Noop(t) => t,
            Self::Error(t) => t,
        }
    }
}

impl Transform for Transformation {
    fn apply(&self, ctx: &mut Context<'_>) -> Result<()> {
        self.inner().apply(ctx)
    }

    fn reverse(&self) -> Transformation {
        self.inner().reverse()
    }

    fn describe(&self) -> String {
        self.inner().describe()
    }
}

macro_rules! impl_from_variant {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Transformation {
                fn from(t: $ty) -> Self {
                    Self::$variant(t)
                }
            }
        )*
    };
}

impl_from_variant!(
    Move(MoveFiles),
    Copy(CopyFiles),
    Remove(Remove),
    Replace(Replace),
    VerifyMatch(VerifyMatch),
    SquashNotes(SquashNotes),
    SaveAuthor(SaveAuthor),
    RestoreAuthor(RestoreAuthor),
    ReplaceMessage(ReplaceMessage),
    ExposeLabel(ExposeLabel),
    AddHeader(AddHeader),
    Scrubber(Scrubber),
    MapAuthor(MapAuthor),
    Noop(Noop),
    Error(ErrorTransform),
);

/// Reverses a pipeline: each step reversed, in reverse order.
pub fn reverse_all(transformations: &[Transformation]) -> Vec<Transformation> {
    transformations.iter().rev().map(Transform::reverse).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;

    #[test]
    fn noop_reverses_to_original() {
        let remove = Transformation::Remove(
            Remove::new(crate::glob::Glob::from_patterns(["a/**"]).unwrap()).unwrap(),
        );
        let noop = remove.reverse();
        assert_eq!(noop.kind(), "noop");
        assert_eq!(noop.describe(), "noop");
        assert_eq!(noop.reverse().kind(), "remove");
        assert_eq!(Transformation::noop().reverse().kind(), "noop");
    }

    #[test]
    fn error_transform_fails_only_when_applied() {
        let fs = MemoryFileSystem::new();
        let mut ctx = Context::new(&fs, "/work");
        let err = Transformation::Error(ErrorTransform::new(
            "cannot reverse",
            Transformation::noop(),
        ));
        assert_eq!(err.describe(), "error transformation");
        let failure = err.apply(&mut ctx).unwrap_err();
        assert!(matches!(failure, MigrationError::Reversibility(ref m) if m == "cannot reverse"));
        assert_eq!(err.reverse().kind(), "noop");
    }

    #[test]
    fn reverse_all_flips_order() {
        let a: Transformation = Replace::new("a", "b", None).unwrap().into();
        let b: Transformation = Replace::new("c", "d", None).unwrap().into();
        let reversed = reverse_all(&[a, b]);
        let described: Vec<String> = reversed.iter().map(Transform::describe).collect();
        assert_eq!(
            described,
            [r#"Replacing "d" with "c""#, r#"Replacing "b" with "a""#]
        );
    }
}
