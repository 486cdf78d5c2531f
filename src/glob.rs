//! Path pattern sets.
//!
//! A [`Glob`] is an include list of patterns plus an optional excluded
//! [`Glob`]. Patterns use single-segment wildcards (`*`, `?`, `[...]`,
//! `{a,b}`) and the `**` token, which spans zero or more whole segments.

use std::fmt;
use std::ops::{Add, Sub};

use globset::{GlobBuilder, GlobMatcher};
use serde::{Deserialize, Serialize};

use crate::error::{MigrationError, Result};

const WILDCARD_CHARS: &[char] = &['*', '?', '[', '{'];

/// Compiled form of a single include pattern.
#[derive(Debug, Clone)]
enum PatternMatcher {
    /// Pattern without `**`; matched against the whole path.
    Segment(GlobMatcher),
    /// Pattern split around its first `**`.
    Recursive {
        /// Number of leading segments and the matcher for them.
        prefix: Option<(usize, GlobMatcher)>,
        /// Pattern the remaining segments must end with.
        suffix: Option<Box<PatternMatcher>>,
    },
}

fn segment_matcher(pattern: &str) -> Result<GlobMatcher> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|e| MigrationError::config(format!("invalid glob pattern {pattern:?}: {e}")))
}

impl PatternMatcher {
    fn compile(pattern: &str) -> Result<Self> {
        let Some((head, tail)) = pattern.split_once("**") else {
            return Ok(Self::Segment(segment_matcher(pattern)?));
        };

        let prefix = if head.is_empty() {
            None
        } else {
            // `a**` behaves like `a*` followed by any number of segments.
            let head_pattern = match head.strip_suffix('/') {
                Some(dir) => dir.to_string(),
                None => format!("{head}*"),
            };
            let count = head_pattern.split('/').count();
            Some((count, segment_matcher(&head_pattern)?))
        };

        let rest = match tail.strip_prefix('/') {
            Some(rest) => rest.to_string(),
            None if tail.is_empty() => String::new(),
            None => format!("*{tail}"),
        };
        let suffix = if rest.is_empty() {
            None
        } else {
            Some(Box::new(Self::compile(&rest)?))
        };

        Ok(Self::Recursive { prefix, suffix })
    }

    fn is_match(&self, path: &str) -> bool {
        match self {
            Self::Segment(m) => m.is_match(path),
            Self::Recursive { prefix, suffix } => {
                let segments: Vec<&str> = path.split('/').collect();
                let start = match prefix {
                    Some((count, m)) => {
                        if segments.len() < *count || !m.is_match(segments[..*count].join("/")) {
                            return false;
                        }
                        *count
                    }
                    None => 0,
                };
                match suffix {
                    // `dir/**` also matches a file named `dir`.
                    None => segments.len() >= start,
                    Some(suffix) => {
                        (start..segments.len()).any(|i| suffix.is_match(&segments[i..].join("/")))
                    }
                }
            }
        }
    }
}

/// An include/exclude set of path patterns.
#[derive(Debug, Clone)]
pub struct Glob {
    include: Vec<String>,
    exclude: Option<Box<Glob>>,
    matchers: Vec<PatternMatcher>,
}

impl Glob {
    /// Builds a glob from include patterns and an optional exclude set.
    pub fn new<I, S>(include: I, exclude: Option<Self>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let include: Vec<String> = include.into_iter().map(Into::into).collect();
        if include.is_empty() {
            return Err(MigrationError::config("glob include list cannot be empty"));
        }
        let mut matchers = Vec::with_capacity(include.len());
        for pattern in &include {
            if pattern.is_empty() {
                return Err(MigrationError::config("glob pattern cannot be empty"));
            }
            if pattern.starts_with('/') {
                return Err(MigrationError::config(format!(
                    "glob pattern {pattern:?} cannot start with '/'"
                )));
            }
            matchers.push(PatternMatcher::compile(pattern)?);
        }
        Ok(Self {
            include,
            exclude: exclude.map(Box::new),
            matchers,
        })
    }

    /// Builds a glob with no exclude set.
    pub fn from_patterns<I, S>(include: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(include, None)
    }

    /// The glob matching every file.
    pub fn all_files() -> Self {
        Self {
            include: vec!["**".to_string()],
            exclude: None,
            matchers: vec![PatternMatcher::Recursive {
                prefix: None,
                suffix: None,
            }],
        }
    }

    /// Returns true for exactly `["**"]` with no exclude.
    pub fn is_all_files(&self) -> bool {
        self.exclude.is_none() && self.include.len() == 1 && self.include[0] == "**"
    }

    /// Include patterns.
    pub fn include(&self) -> &[String] {
        &self.include
    }

    /// Exclude set, if any.
    pub fn exclude(&self) -> Option<&Self> {
        self.exclude.as_deref()
    }

    /// Tests a `/`-separated path relative to the tree root.
    pub fn matches(&self, path: &str) -> bool {
        self.matchers.iter().any(|m| m.is_match(path))
            && !self.exclude.as_ref().is_some_and(|e| e.matches(path))
    }

    /// Union of two sets.
    ///
    /// Include lists are concatenated. The exclude set survives only when
    /// both sides share it; otherwise the result has none.
    pub fn union(&self, other: &Self) -> Self {
        let exclude = if self.exclude == other.exclude {
            self.exclude.clone()
        } else {
            None
        };
        Self {
            include: [self.include.clone(), other.include.clone()].concat(),
            exclude,
            matchers: [self.matchers.clone(), other.matchers.clone()].concat(),
        }
    }

    /// Paths matched by `self` but not by `other`.
    pub fn difference(&self, other: &Self) -> Self {
        let exclude = match &self.exclude {
            None => other.clone(),
            Some(existing) => existing.union(other),
        };
        Self {
            include: self.include.clone(),
            exclude: Some(Box::new(exclude)),
            matchers: self.matchers.clone(),
        }
    }

    /// Minimal directory prefixes that contain every matchable file.
    ///
    /// An empty string means the walk must start at the tree root.
    pub fn roots(&self) -> Vec<String> {
        let mut roots: Vec<String> = self.include.iter().map(|p| compute_root(p)).collect();
        roots.sort();
        roots.dedup();
        if roots.iter().any(String::is_empty) {
            return vec![String::new()];
        }
        roots
            .iter()
            .filter(|root| {
                !roots
                    .iter()
                    .any(|other| other != *root && root.starts_with(&format!("{other}/")))
            })
            .cloned()
            .collect()
    }
}

fn compute_root(pattern: &str) -> String {
    pattern
        .split('/')
        .take_while(|segment| !segment.contains(WILDCARD_CHARS))
        .collect::<Vec<_>>()
        .join("/")
}

impl Default for Glob {
    fn default() -> Self {
        Self::all_files()
    }
}

impl PartialEq for Glob {
    fn eq(&self, other: &Self) -> bool {
        self.include == other.include && self.exclude == other.exclude
    }
}

impl Eq for Glob {}

impl fmt::Display for Glob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "glob(include = {:?}", self.include)?;
        if let Some(exclude) = &self.exclude {
            if exclude.exclude.is_some() {
                write!(f, ", exclude = {exclude}")?;
            } else {
                write!(f, ", exclude = {:?}", exclude.include)?;
            }
        }
        write!(f, ")")
    }
}

impl Add for &Glob {
    type Output = Glob;

    fn add(self, rhs: Self) -> Glob {
        self.union(rhs)
    }
}

impl Sub for &Glob {
    type Output = Glob;

    fn sub(self, rhs: Self) -> Glob {
        self.difference(rhs)
    }
}

/// Declarative form of a glob: a bare pattern list or an include/exclude pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum GlobSpec {
    /// `["src/**", "BUILD"]`
    Patterns(Vec<String>),
    /// `{include: [...], exclude: [...]}`
    Set {
        /// Included patterns.
        include: Vec<String>,
        /// Excluded patterns.
        #[serde(default)]
        exclude: Vec<String>,
    },
}

impl GlobSpec {
    /// Normalizes into a [`Glob`].
    pub fn to_glob(&self) -> Result<Glob> {
        match self {
            Self::Patterns(include) => Glob::from_patterns(include.iter().cloned()),
            Self::Set { include, exclude } => {
                let exclude = if exclude.is_empty() {
                    None
                } else {
                    Some(Glob::from_patterns(exclude.iter().cloned())?)
                };
                Glob::new(include.iter().cloned(), exclude)
            }
        }
    }
}

/// Normalizes an optional file scope, defaulting to all files.
pub fn resolve_files(spec: Option<&GlobSpec>) -> Result<Glob> {
    spec.map_or_else(|| Ok(Glob::all_files()), GlobSpec::to_glob)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glob(patterns: &[&str]) -> Glob {
        Glob::from_patterns(patterns.iter().copied()).unwrap()
    }

    // ── construction ────────────────────────────────────────────────

    #[test]
    fn rejects_invalid_patterns() {
        assert!(Glob::from_patterns(Vec::<String>::new()).is_err());
        assert!(Glob::from_patterns([""]).is_err());
        let err = Glob::from_patterns(["/abs/**"]).unwrap_err();
        assert!(matches!(err, MigrationError::Config(_)));
        assert!(err.to_string().contains("cannot start with '/'"));
    }

    #[test]
    fn all_files_detection() {
        assert!(Glob::all_files().is_all_files());
        assert!(glob(&["**"]).is_all_files());
        assert!(!glob(&["**", "a"]).is_all_files());
        assert!(!(&Glob::all_files() - &glob(&["a"])).is_all_files());
    }

    // ── matching ────────────────────────────────────────────────────

    #[test]
    fn single_segment_wildcards_stay_in_segment() {
        let g = glob(&["*.txt"]);
        assert!(g.matches("a.txt"));
        assert!(!g.matches("dir/a.txt"));

        let g = glob(&["src/?.rs", "lib/[ab].rs", "doc/{x,y}.md"]);
        assert!(g.matches("src/a.rs"));
        assert!(!g.matches("src/ab.rs"));
        assert!(g.matches("lib/b.rs"));
        assert!(!g.matches("lib/c.rs"));
        assert!(g.matches("doc/y.md"));
    }

    #[test]
    fn double_star_spans_zero_or_more_segments() {
        let g = glob(&["**/*.java"]);
        assert!(g.matches("Foo.java"));
        assert!(g.matches("a/b/Foo.java"));
        assert!(!g.matches("a/b/Foo.kt"));

        let g = glob(&["src/**/test/*.rs"]);
        assert!(g.matches("src/test/a.rs"));
        assert!(g.matches("src/x/y/test/a.rs"));
        assert!(!g.matches("lib/test/a.rs"));

        let g = glob(&["src/**"]);
        assert!(g.matches("src/a"));
        assert!(g.matches("src/a/b/c"));
        assert!(g.matches("src"));
        assert!(!g.matches("srcs/a"));
        assert!(!g.matches("lib/src"));
    }

    #[test]
    fn double_star_glued_to_text() {
        assert!(glob(&["**.java"]).matches("a/b/C.java"));
        assert!(glob(&["te**"]).matches("test/deep/file"));
        assert!(!glob(&["te**"]).matches("other/test"));
    }

    #[test]
    fn exclude_wins_over_include() {
        let g = Glob::new(["**"], Some(glob(&["vendor/**"]))).unwrap();
        assert!(g.matches("src/a.rs"));
        assert!(!g.matches("vendor/lib/a.rs"));
    }

    // ── algebra ─────────────────────────────────────────────────────

    #[test]
    fn union_keeps_shared_exclude_only() {
        let ex = glob(&["*.tmp"]);
        let a = Glob::new(["a/**"], Some(ex.clone())).unwrap();
        let b = Glob::new(["b/**"], Some(ex.clone())).unwrap();
        let u = &a + &b;
        assert_eq!(u.include(), ["a/**", "b/**"]);
        assert_eq!(u.exclude(), Some(&ex));

        let c = glob(&["c/**"]);
        let u = &a + &c;
        assert!(u.exclude().is_none());
        assert!(u.matches("a/x.tmp"));
    }

    #[test]
    fn difference_nests_excludes() {
        let a = glob(&["**"]);
        let d = &(&a - &glob(&["a/**"])) - &glob(&["b/**"]);
        assert!(d.matches("c/x"));
        assert!(!d.matches("a/x"));
        assert!(!d.matches("b/x"));
        assert_eq!(
            d.to_string(),
            r#"glob(include = ["**"], exclude = ["a/**", "b/**"])"#
        );
    }

    #[test]
    fn display_renders_include_only() {
        assert_eq!(
            glob(&["a", "b/**"]).to_string(),
            r#"glob(include = ["a", "b/**"])"#
        );
    }

    // ── roots ───────────────────────────────────────────────────────

    #[test]
    fn roots_drop_nested_and_duplicates() {
        let g = glob(&["foo/bar/**", "foo/**", "baz/*.txt", "baz/**/x", "foobar/a"]);
        assert_eq!(g.roots(), vec!["baz", "foo", "foobar/a"]);
    }

    #[test]
    fn roots_collapse_to_tree_root() {
        assert_eq!(glob(&["a/**", "*.txt"]).roots(), vec![String::new()]);
        assert_eq!(Glob::all_files().roots(), vec![String::new()]);
    }

    // ── GlobSpec normalization ──────────────────────────────────────────

    #[test]
    fn glob_spec_from_yaml() {
        let list: GlobSpec = serde_yaml::from_str("[\"src/**\"]").unwrap();
        assert_eq!(list.to_glob().unwrap(), glob(&["src/**"]));

        let set: GlobSpec =
            serde_yaml::from_str("include: [\"**\"]\nexclude: [\"*.md\"]\n").unwrap();
        let g = set.to_glob().unwrap();
        assert!(g.matches("a.rs"));
        assert!(!g.matches("README.md"));

        assert!(resolve_files(None).unwrap().is_all_files());
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        const POOL: &[&str] = &[
            "**",
            "a/**",
            "**/*.java",
            "b/*",
            "a/b/**",
            "*.txt",
            "c/**/x.txt",
            "a/?.java",
        ];

        fn arb_glob() -> impl Strategy<Value = Glob> {
            proptest::sample::subsequence(POOL.to_vec(), 1..=3)
                .prop_map(|patterns| Glob::from_patterns(patterns).unwrap())
        }

        fn arb_path() -> impl Strategy<Value = String> {
            proptest::collection::vec(
                prop_oneof![
                    Just("a"),
                    Just("b"),
                    Just("c"),
                    Just("x.txt"),
                    Just("Y.java"),
                    Just("z.java")
                ],
                1..5,
            )
            .prop_map(|segments| segments.join("/"))
        }

        proptest! {
            #[test]
            fn union_is_commutative(a in arb_glob(), b in arb_glob(), path in arb_path()) {
                prop_assert_eq!((&a + &b).matches(&path), (&b + &a).matches(&path));
            }

            #[test]
            fn union_is_associative(
                a in arb_glob(),
                b in arb_glob(),
                c in arb_glob(),
                path in arb_path(),
            ) {
                let left = &(&a + &b) + &c;
                let right = &a + &(&b + &c);
                prop_assert_eq!(left.matches(&path), right.matches(&path));
            }

            #[test]
            fn union_matches_either_side(a in arb_glob(), b in arb_glob(), path in arb_path()) {
                prop_assert_eq!(
                    (&a + &b).matches(&path),
                    a.matches(&path) || b.matches(&path)
                );
            }

            #[test]
            fn difference_of_union_recovers_left_side(
                a in arb_glob(),
                b in arb_glob(),
                path in arb_path(),
            ) {
                let d = &(&a + &b) - &b;
                if a.matches(&path) && !b.matches(&path) {
                    prop_assert!(d.matches(&path));
                }
                if b.matches(&path) {
                    prop_assert!(!d.matches(&path));
                }
            }

            #[test]
            fn sequential_differences_commute(
                a in arb_glob(),
                b in arb_glob(),
                c in arb_glob(),
                path in arb_path(),
            ) {
                let left = &(&a - &b) - &c;
                let right = &(&a - &c) - &b;
                prop_assert_eq!(left.matches(&path), right.matches(&path));
            }
        }
    }
}
