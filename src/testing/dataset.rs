//! Parameterized datasets: ordered scenarios fed to one test method.
//!
//! Datasets come either from inline literals or from fixture documents on
//! disk. A fixture document is one top-level JSON object; named branches of
//! it back distinct datasets. Fixtures are read fresh on every lookup so that
//! test methods never share a cache.

use std::fmt::Display;
use std::fs;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{error, info};

use crate::error::FixtureError;

/// One unit of parameterized execution.
///
/// `expected` is an informal hint for logs and reports; it never drives
/// branching.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario<T> {
    pub label: String,
    pub input: T,
    pub expected: String,
}

impl<T> Scenario<T> {
    pub fn new(label: impl Into<String>, input: T, expected: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            input,
            expected: expected.into(),
        }
    }
}

/// Ordered, never-empty sequence of scenarios.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset<T> {
    name: String,
    scenarios: Vec<Scenario<T>>,
}

impl<T> Dataset<T> {
    /// Fails with [`FixtureError::Empty`] rather than yielding a dataset that
    /// would make its test method pass vacuously.
    pub fn new(name: impl Into<String>, scenarios: Vec<Scenario<T>>) -> Result<Self, FixtureError> {
        let name = name.into();
        if scenarios.is_empty() {
            return Err(FixtureError::Empty(name));
        }
        Ok(Self { name, scenarios })
    }

    /// Inline literals; each value's `Display` form becomes its label.
    pub fn inline<I>(name: impl Into<String>, expected: &str, values: I) -> Result<Self, FixtureError>
    where
        I: IntoIterator<Item = T>,
        T: Display,
    {
        let scenarios = values
            .into_iter()
            .map(|value| Scenario::new(value.to_string(), value, expected))
            .collect();
        Self::new(name, scenarios)
    }

    /// A single-scenario dataset.
    pub fn single(
        name: impl Into<String>,
        label: impl Into<String>,
        input: T,
        expected: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            scenarios: vec![Scenario::new(label, input, expected)],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn scenarios(&self) -> &[Scenario<T>] {
        &self.scenarios
    }
}

impl<T> IntoIterator for Dataset<T> {
    type Item = Scenario<T>;
    type IntoIter = std::vec::IntoIter<Scenario<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.scenarios.into_iter()
    }
}

/// Root directory holding fixture documents.
#[derive(Debug, Clone)]
pub struct FixtureStore {
    root: PathBuf,
}

impl FixtureStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Reads and parses `relative` under the root. Never cached.
    pub fn document(&self, relative: &str) -> Result<FixtureDocument, FixtureError> {
        let path = self.root.join(relative);
        info!("reading JSON file from: {}", path.display());

        let raw = fs::read_to_string(&path).map_err(|source| {
            error!("failed to read JSON file: {}", path.display());
            FixtureError::Read {
                path: path.clone(),
                source,
            }
        })?;
        let value: Value = serde_json::from_str(&raw).map_err(|source| {
            error!("failed to parse JSON file: {}", path.display());
            FixtureError::Parse {
                path: path.clone(),
                source,
            }
        })?;
        match value {
            Value::Object(entries) => Ok(FixtureDocument { path, entries }),
            _ => Err(FixtureError::NotAnObject { path }),
        }
    }
}

/// One parsed fixture file.
#[derive(Debug, Clone)]
pub struct FixtureDocument {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl FixtureDocument {
    /// The whole document as one typed value (happy-path fixtures).
    pub fn whole<T: DeserializeOwned>(&self) -> Result<T, FixtureError> {
        serde_json::from_value(Value::Object(self.entries.clone())).map_err(|source| {
            FixtureError::Decode {
                context: self.path.display().to_string(),
                source,
            }
        })
    }

    /// Named branch, by exact key. A missing key is a hard error.
    pub fn branch_value(&self, key: &str) -> Result<&Value, FixtureError> {
        self.entries.get(key).ok_or_else(|| FixtureError::MissingKey {
            path: self.path.clone(),
            key: key.to_string(),
        })
    }

    /// Named branch decoded into a typed value.
    pub fn branch<T: DeserializeOwned>(&self, key: &str) -> Result<T, FixtureError> {
        let value = self.branch_value(key)?;
        T::deserialize(value).map_err(|source| FixtureError::Decode {
            context: format!("{}#{key}", self.path.display()),
            source,
        })
    }

    /// Named branch as a raw request body. A string branch is taken verbatim
    /// (this is how malformed JSON is stored); anything else is re-serialized.
    pub fn branch_raw(&self, key: &str) -> Result<String, FixtureError> {
        Ok(match self.branch_value(key)? {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Login {
        username: String,
    }

    fn store_with(file: &str, contents: &str) -> (tempfile::TempDir, FixtureStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        let store = FixtureStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn inline_dataset_keeps_order_and_labels() {
        let dataset = Dataset::inline("validProductIds", "200 OK", [1, 5, 10]).unwrap();
        let labels: Vec<_> = dataset.scenarios().iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["1", "5", "10"]);
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.scenarios()[0].expected, "200 OK");
    }

    #[test]
    fn empty_dataset_is_an_error() {
        let err = Dataset::<i64>::inline("nothing", "-", []).unwrap_err();
        assert!(matches!(err, FixtureError::Empty(name) if name == "nothing"));
    }

    #[test]
    fn reads_whole_and_branch_values() {
        let (_dir, store) = store_with(
            "auth/creds.json",
            r#"{"invalidUsername":{"username":"ghost","password":"x"},"malformedJson":"{\"username\": ","missingFields":{"title":"x"}}"#,
        );
        let doc = store.document("auth/creds.json").unwrap();

        let login: Login = doc.branch("invalidUsername").unwrap();
        assert_eq!(login.username, "ghost");
        assert_eq!(doc.branch_raw("malformedJson").unwrap(), "{\"username\": ");
        assert_eq!(doc.branch_raw("missingFields").unwrap(), r#"{"title":"x"}"#);
    }

    #[test]
    fn missing_branch_is_a_fixture_error() {
        let (_dir, store) = store_with("doc.json", r#"{"present":1}"#);
        let doc = store.document("doc.json").unwrap();
        let err = doc.branch_raw("absent").unwrap_err();
        assert!(matches!(err, FixtureError::MissingKey { ref key, .. } if key == "absent"));
    }

    #[test]
    fn missing_file_and_bad_json_fail_loudly() {
        let (_dir, store) = store_with("broken.json", "{not json");
        assert!(matches!(
            store.document("nope.json"),
            Err(FixtureError::Read { .. })
        ));
        assert!(matches!(
            store.document("broken.json"),
            Err(FixtureError::Parse { .. })
        ));
    }

    #[test]
    fn top_level_must_be_an_object() {
        let (_dir, store) = store_with("list.json", "[1,2]");
        assert!(matches!(
            store.document("list.json"),
            Err(FixtureError::NotAnObject { .. })
        ));
    }

    #[test]
    fn decode_mismatch_reports_context() {
        let (_dir, store) = store_with("doc.json", r#"{"user":{"username":3}}"#);
        let doc = store.document("doc.json").unwrap();
        let err = doc.branch::<Login>("user").unwrap_err();
        assert!(err.to_string().contains("doc.json#user"));
    }
}
