//! Message labels: `NAME=value` and `NAME: value` lines.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static LABEL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([A-Za-z][A-Za-z0-9_-]*)[ \t]*[:=][ \t]*(.+?)[ \t\r]*$").unwrap()
});

/// Multi-valued label map that keeps insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Labels {
    entries: Vec<(String, Vec<String>)>,
}

impl Labels {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extracts every label line from `text`.
    pub fn parse(text: &str) -> Self {
        LABEL_LINE
            .captures_iter(text)
            .map(|caps| (caps[1].to_string(), caps[2].trim().to_string()))
            .collect()
    }

    /// Appends a value for `name`.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((name, vec![value])),
        }
    }

    /// First value recorded for `name`.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.all(name).first().map(String::as_str)
    }

    /// Last value recorded for `name`.
    pub fn last(&self, name: &str) -> Option<&str> {
        self.all(name).last().map(String::as_str)
    }

    /// Every value recorded for `name`, oldest first.
    pub fn all(&self, name: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
            .unwrap_or_default()
    }

    /// Returns true if `name` has at least one value.
    pub fn contains(&self, name: &str) -> bool {
        !self.all(name).is_empty()
    }

    /// Drops every value of `name`.
    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|(n, _)| n != name);
    }

    /// Drops one specific value of `name`.
    pub fn remove_value(&mut self, name: &str, value: &str) {
        if let Some((_, values)) = self.entries.iter_mut().find(|(n, _)| n == name) {
            values.retain(|v| v != value);
        }
        self.entries.retain(|(_, values)| !values.is_empty());
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no label is recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates names with their values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Labels {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut labels = Self::new();
        for (name, value) in iter {
            labels.add(name, value);
        }
        labels
    }
}

impl Serialize for Labels {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, values) in &self.entries {
            map.serialize_entry(name, values)?;
        }
        map.end()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

struct LabelsVisitor;

impl<'de> Visitor<'de> for LabelsVisitor {
    type Value = Labels;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of label names to a value or list of values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Labels, A::Error> {
        let mut labels = Labels::new();
        while let Some((name, values)) = access.next_entry::<String, OneOrMany>()? {
            match values {
                OneOrMany::One(value) => labels.add(name, value),
                OneOrMany::Many(values) => {
                    for value in values {
                        labels.add(name.clone(), value);
                    }
                }
            }
        }
        Ok(labels)
    }
}

impl<'de> Deserialize<'de> for Labels {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(LabelsVisitor)
    }
}

/// A commit message together with the labels found in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeMessage {
    text: String,
    labels: Labels,
}

impl ChangeMessage {
    /// Parses labels out of `text`.
    pub fn parse(text: impl Into<String>) -> Self {
        let text = text.into();
        let labels = Labels::parse(&text);
        Self { text, labels }
    }

    /// Full message text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Labels present in the text.
    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// The first line, without its newline.
    pub fn first_line(&self) -> &str {
        first_line(&self.text)
    }
}

/// The first line of `text`, without its newline.
pub fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}
