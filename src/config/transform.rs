//! Declarative form of every transformation.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::Result;
use crate::glob::GlobSpec;
use crate::transform::{
    AddHeader, CopyFiles, ExposeLabel, MapAuthor, MapAuthorOptions, MoveFiles, Remove, Replace,
    ReplaceMessage, RestoreAuthor, SaveAuthor, Scrubber, SquashNotes, Transformation, VerifyMatch,
};

const fn default_true() -> bool {
    true
}

/// One entry of a workflow's `transformations` list, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum TransformConfig {
    /// `type: move`
    Move {
        /// Source path, relative to the working tree.
        before: String,
        /// Target path.
        after: String,
        /// Files to move when `before` is a directory.
        #[serde(default)]
        paths: Option<GlobSpec>,
        /// Replace existing targets.
        #[serde(default)]
        overwrite: bool,
    },
    /// `type: copy`
    Copy {
        /// Source path, relative to the working tree.
        before: String,
        /// Target path.
        after: String,
        /// Files to copy when `before` is a directory.
        #[serde(default)]
        paths: Option<GlobSpec>,
        /// Replace existing targets.
        #[serde(default)]
        overwrite: bool,
    },
    /// `type: remove`
    Remove {
        /// Paths to delete.
        paths: GlobSpec,
    },
    /// `type: replace`
    Replace {
        /// Literal text to find.
        before: String,
        /// Replacement text.
        after: String,
        /// Files to rewrite.
        #[serde(default)]
        paths: Option<GlobSpec>,
    },
    /// `type: verify_match`
    VerifyMatch {
        /// Regex checked against file contents.
        regex: String,
        /// Files to check.
        #[serde(default)]
        paths: Option<GlobSpec>,
        /// Require that no file matches.
        #[serde(default)]
        verify_no_match: bool,
        /// Also check when running in reverse.
        #[serde(default)]
        also_on_reversal: bool,
        /// Extra text appended to each failure.
        #[serde(default)]
        failure_message: Option<String>,
    },
    /// `type: squash_notes`
    SquashNotes {
        /// Text before the change list.
        #[serde(default)]
        prefix: Option<String>,
        /// Maximum changes listed.
        #[serde(default)]
        max: Option<usize>,
        /// One line per change.
        #[serde(default)]
        compact: Option<bool>,
        /// Show change references.
        #[serde(default)]
        show_ref: Option<bool>,
        /// Show change authors.
        #[serde(default)]
        show_author: Option<bool>,
        /// Show change descriptions.
        #[serde(default)]
        show_description: Option<bool>,
        /// List oldest changes first.
        #[serde(default)]
        oldest_first: bool,
        /// Include merges.
        #[serde(default = "default_true")]
        use_merge: bool,
    },
    /// `type: save_author`
    SaveAuthor {
        /// Label name.
        #[serde(default)]
        label: Option<String>,
        /// Separator between label and author.
        #[serde(default)]
        separator: Option<String>,
    },
    /// `type: restore_author`
    RestoreAuthor {
        /// Label name.
        #[serde(default)]
        label: Option<String>,
        /// Separator between label and author.
        #[serde(default)]
        separator: Option<String>,
        /// Look at every change, not only the newest.
        #[serde(default)]
        search_all_changes: bool,
    },
    /// `type: replace_message`
    ReplaceMessage {
        /// New message template.
        text: String,
        /// Keep unknown `${LABEL}` tokens instead of failing.
        #[serde(default)]
        ignore_label_not_found: bool,
    },
    /// `type: expose_label`
    ExposeLabel {
        /// Label to read.
        name: String,
        /// Label to write; defaults to `name`.
        #[serde(default)]
        new_name: Option<String>,
        /// Separator for the written label.
        #[serde(default)]
        separator: Option<String>,
        /// Skip silently when the label is absent.
        #[serde(default = "default_true")]
        ignore_label_not_found: bool,
        /// Expose every value instead of the first.
        #[serde(default)]
        all: bool,
        /// Join all values into one label with this separator.
        #[serde(default)]
        concat_separator: Option<String>,
    },
    /// `type: add_header`
    AddHeader {
        /// Header template.
        text: String,
        /// Skip the header when a label is missing.
        #[serde(default)]
        ignore_label_not_found: bool,
        /// Put a newline between header and message.
        #[serde(default = "default_true")]
        new_line: bool,
    },
    /// `type: scrubber`
    Scrubber {
        /// Regexes applied in order.
        regex: Vec<String>,
        /// Replacement text; `$1` refers to capture groups.
        #[serde(default)]
        replacement: String,
        /// Message used when nothing matched.
        #[serde(default)]
        msg_if_no_match: Option<String>,
        /// Fail when nothing matched.
        #[serde(default)]
        fail_if_no_match: bool,
    },
    /// `type: map_author`
    MapAuthor {
        /// Author, email or name to target author.
        authors: BTreeMap<String, String>,
        /// Allow reversing the table.
        #[serde(default)]
        reversible: bool,
        /// Reverse into a no-op.
        #[serde(default)]
        noop_reverse: bool,
        /// Fail on unmapped authors.
        #[serde(default)]
        fail_if_not_found: bool,
        /// Fail on unmapped authors when reversed.
        #[serde(default)]
        reverse_fail_if_not_found: bool,
        /// Also map every change's author.
        #[serde(default)]
        map_all_changes: bool,
    },
}

fn optional_glob(spec: Option<&GlobSpec>) -> Result<Option<crate::glob::Glob>> {
    spec.map(GlobSpec::to_glob).transpose()
}

impl TransformConfig {
    /// Validates the entry and builds the transformation.
    pub fn build(&self) -> Result<Transformation> {
        Ok(match self {
            Self::Move {
                before,
                after,
                paths,
                overwrite,
            } => MoveFiles::new(before, after, optional_glob(paths.as_ref())?, *overwrite)?.into(),
            Self::Copy {
                before,
                after,
                paths,
                overwrite,
            } => CopyFiles::new(before, after, optional_glob(paths.as_ref())?, *overwrite)?.into(),
            Self::Remove { paths } => Remove::new(paths.to_glob()?)?.into(),
            Self::Replace {
                before,
                after,
                paths,
            } => Replace::new(before, after, optional_glob(paths.as_ref())?)?.into(),
            Self::VerifyMatch {
                regex,
                paths,
                verify_no_match,
                also_on_reversal,
                failure_message,
            } => VerifyMatch::new(
                regex,
                optional_glob(paths.as_ref())?,
                *verify_no_match,
                *also_on_reversal,
                failure_message.clone(),
            )?
            .into(),
            Self::SquashNotes {
                prefix,
                max,
                compact,
                show_ref,
                show_author,
                show_description,
                oldest_first,
                use_merge,
            } => {
                let defaults = SquashNotes::default();
                SquashNotes {
                    prefix: prefix.clone().unwrap_or(defaults.prefix),
                    max: max.unwrap_or(defaults.max),
                    compact: compact.unwrap_or(defaults.compact),
                    show_ref: show_ref.unwrap_or(defaults.show_ref),
                    show_author: show_author.unwrap_or(defaults.show_author),
                    show_description: show_description.unwrap_or(defaults.show_description),
                    oldest_first: *oldest_first,
                    use_merge: *use_merge,
                }
                .into()
            }
            Self::SaveAuthor { label, separator } => {
                SaveAuthor::new(label.clone(), separator.clone())?.into()
            }
            Self::RestoreAuthor {
                label,
                separator,
                search_all_changes,
            } => RestoreAuthor::new(label.clone(), separator.clone(), *search_all_changes)?.into(),
            Self::ReplaceMessage {
                text,
                ignore_label_not_found,
            } => ReplaceMessage::new(text, *ignore_label_not_found).into(),
            Self::ExposeLabel {
                name,
                new_name,
                separator,
                ignore_label_not_found,
                all,
                concat_separator,
            } => ExposeLabel::new(
                name,
                new_name.clone(),
                separator.clone(),
                *ignore_label_not_found,
                *all,
                concat_separator.clone(),
            )?
            .into(),
            Self::AddHeader {
                text,
                ignore_label_not_found,
                new_line,
            } => AddHeader::new(text, *ignore_label_not_found, *new_line).into(),
            Self::Scrubber {
                regex,
                replacement,
                msg_if_no_match,
                fail_if_no_match,
            } => Scrubber::new(
                regex.as_slice(),
                replacement,
                msg_if_no_match.clone(),
                *fail_if_no_match,
            )?
            .into(),
            Self::MapAuthor {
                authors,
                reversible,
                noop_reverse,
                fail_if_not_found,
                reverse_fail_if_not_found,
                map_all_changes,
            } => MapAuthor::new(
                authors,
                MapAuthorOptions {
                    reversible: *reversible,
                    noop_reverse: *noop_reverse,
                    fail_if_not_found: *fail_if_not_found,
                    reverse_fail_if_not_found: *reverse_fail_if_not_found,
                    map_all_changes: *map_all_changes,
                },
            )?
            .into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MigrationError;
    use crate::transform::Transform;

    fn parse(yaml: &str) -> TransformConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn builds_file_transforms() {
        let t = parse("type: move\nbefore: a\nafter: b\n").build().unwrap();
        assert_eq!(t.describe(), "Moving a to b");

        let t = parse("type: remove\npaths: [\"**/*.o\"]\n").build().unwrap();
        assert_eq!(t.kind(), "remove");

        let t = parse("type: replace\nbefore: x\nafter: y\npaths: {include: [\"src/**\"], exclude: [\"src/gen/**\"]}\n")
            .build()
            .unwrap();
        assert_eq!(t.describe(), r#"Replacing "x" with "y""#);

        let t = parse("type: verify_match\nregex: TODO\nverify_no_match: true\n")
            .build()
            .unwrap();
        assert_eq!(t.describe(), "verify_no_match 'TODO'");
    }

    #[test]
    fn squash_notes_fills_defaults() {
        let t = parse("type: squash_notes\nmax: 3\n").build().unwrap();
        let Transformation::SquashNotes(notes) = t else {
            panic!("expected squash_notes");
        };
        assert_eq!(
            notes,
            SquashNotes {
                max: 3,
                ..SquashNotes::default()
            }
        );
    }

    #[test]
    fn expose_label_ignores_missing_by_default() {
        let config = parse("type: expose_label\nname: BUG\n");
        assert!(matches!(
            config,
            TransformConfig::ExposeLabel {
                ignore_label_not_found: true,
                ..
            }
        ));
        assert_eq!(config.build().unwrap().describe(), "Exposing label BUG as BUG");
    }

    #[test]
    fn map_author_reads_table() {
        let t = parse(
            "type: map_author\nreversible: true\nauthors:\n  \"A <a@old.com>\": \"A <a@new.com>\"\n",
        )
        .build()
        .unwrap();
        assert_eq!(t.reverse().kind(), "map_author");
    }

    #[test]
    fn construction_errors_surface() {
        let err = parse("type: scrubber\nregex: [a]\nmsg_if_no_match: m\nfail_if_no_match: true\n")
            .build()
            .unwrap_err();
        assert!(matches!(err, MigrationError::Config(_)));
        assert!(serde_yaml::from_str::<TransformConfig>("type: teleport\n").is_err());

        let err = serde_yaml::from_str::<TransformConfig>(
            "type: verify_match\nregex: TODO\nverify_no_mach: true\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("verify_no_mach"), "{err}");
        assert!(
            serde_yaml::from_str::<TransformConfig>("type: move\nbefore: a\nafter: b\noverwite: true\n")
                .is_err()
        );
    }
}
