//! YAML reading and writing for migration files and reports.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use yaml_rust_davvid::{Yaml, YamlEmitter};

/// Serializes `data` to YAML, emitting multi-line strings as literal blocks.
///
/// Commit messages are multi-line, and literal blocks keep them readable.
pub fn to_yaml<T: Serialize>(data: &T) -> Result<String> {
    let value = serde_yaml::to_value(data).context("Failed to serialize to YAML value")?;
    let doc = to_emitter_value(&value);

    let mut output = String::new();
    let mut emitter = YamlEmitter::new(&mut output);
    emitter.multiline_strings(true);
    emitter.dump(&doc).context("Failed to emit YAML")?;
    output.push('\n');
    Ok(output)
}

fn to_emitter_value(value: &serde_yaml::Value) -> Yaml {
    match value {
        serde_yaml::Value::Null => Yaml::Null,
        serde_yaml::Value::Bool(b) => Yaml::Boolean(*b),
        serde_yaml::Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Yaml::Integer(i),
            (None, Some(f)) => Yaml::Real(f.to_string()),
            (None, None) => Yaml::String(n.to_string()),
        },
        serde_yaml::Value::String(s) => Yaml::String(s.clone()),
        serde_yaml::Value::Sequence(seq) => Yaml::Array(seq.iter().map(to_emitter_value).collect()),
        serde_yaml::Value::Mapping(map) => Yaml::Hash(
            map.iter()
                .map(|(k, v)| (to_emitter_value(k), to_emitter_value(v)))
                .collect(),
        ),
        serde_yaml::Value::Tagged(tagged) => to_emitter_value(&tagged.value),
    }
}

/// Deserializes a YAML document.
pub fn from_yaml<T: DeserializeOwned>(yaml: &str) -> Result<T> {
    serde_yaml::from_str(yaml).context("Failed to deserialize YAML")
}

/// Reads and parses a YAML file.
pub fn read_yaml_file<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    from_yaml(&content).with_context(|| format!("Failed to parse file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Change;

    #[test]
    fn multiline_messages_become_literal_blocks() {
        let change = Change::new("r1", "A <a@x.com>", "Title\n\nBody line\n");
        let yaml = to_yaml(&vec![change]).unwrap();
        assert!(yaml.contains("message: |"), "{yaml}");
        assert!(yaml.contains("Body line"), "{yaml}");
        assert!(!yaml.contains("mapped_author"));
    }

    #[test]
    fn from_yaml_parses_change_list() {
        let changes: Vec<Change> =
            from_yaml("- ref: r1\n  author: \"A <a@x.com>\"\n  message: hi\n").unwrap();
        assert_eq!(changes[0].message, "hi");
    }

    #[test]
    fn read_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_yaml_file::<Vec<Change>, _>(dir.path().join("none.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
    }
}
