//! Ansible `group_vars/all.yml` adapter.
//!
//! Read-modify-write without locking: the last writer wins.

use crate::error::{DeployError, Result};
use serde_yaml::{Mapping, Number, Value};
use std::path::{Path, PathBuf};

pub type ConfigDocument = Mapping;

/// Keys shared by every component; always part of a filtered view.
pub const ALWAYS_INCLUDED_KEYS: [&str; 3] = ["components", "bazel_version", "java_home_map"];

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn read(&self) -> Result<ConfigDocument> {
        let raw = std::fs::read_to_string(&self.path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                DeployError::config(format!(
                    "Configuration file not found at {}",
                    self.path.display()
                ))
            } else {
                DeployError::config(format!("Failed to read {}: {err}", self.path.display()))
            }
        })?;
        parse_document(&raw)
            .map_err(|msg| DeployError::config(format!("{}: {msg}", self.path.display())))
    }

    pub fn write(&self, doc: &ConfigDocument) -> Result<()> {
        let rendered = render(doc)?;
        std::fs::write(&self.path, rendered).map_err(|err| {
            DeployError::config(format!("Failed to write {}: {err}", self.path.display()))
        })
    }

    /// Coerce `raw`, set `key`, persist the whole document. Returns the stored value.
    pub fn update(&self, key: &str, raw: &str) -> Result<Value> {
        let mut doc = self.read()?;
        let value = coerce_value(raw);
        doc.insert(Value::String(key.to_string()), value.clone());
        self.write(&doc)?;
        log::info!("Updated {key} in {}", self.path.display());
        Ok(value)
    }
}

fn parse_document(raw: &str) -> std::result::Result<ConfigDocument, String> {
    match serde_yaml::from_str::<Value>(raw) {
        Ok(Value::Mapping(map)) => Ok(map),
        Ok(Value::Null) => Ok(Mapping::new()),
        Ok(other) => Err(format!(
            "expected a mapping at the top level, found {}",
            kind_of(&other)
        )),
        Err(err) => Err(format!("malformed YAML: {err}")),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Digits -> integer, `true`/`false` (any case) -> boolean, anything else stays a string.
pub fn coerce_value(raw: &str) -> Value {
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(n) = raw.parse::<u64>() {
            return Value::Number(Number::from(n));
        }
    }
    if raw.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    Value::String(raw.to_string())
}

/// Keys containing `component` (case-insensitive) plus [`ALWAYS_INCLUDED_KEYS`], in document order.
pub fn filter_by_component(doc: &ConfigDocument, component: &str) -> ConfigDocument {
    let needle = component.to_lowercase();
    doc.iter()
        .filter(|(key, _)| {
            key.as_str().is_some_and(|key| {
                key.to_lowercase().contains(&needle) || ALWAYS_INCLUDED_KEYS.contains(&key)
            })
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

pub fn render(doc: &ConfigDocument) -> Result<String> {
    serde_yaml::to_string(doc)
        .map_err(|err| DeployError::config(format!("Failed to render configuration: {err}")))
}

/// Scalar rendering for one-line status messages.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
