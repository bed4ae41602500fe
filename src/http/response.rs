use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::DecodeError;

/// Normalized outcome of one HTTP call, whatever its status code.
///
/// Immutable after construction. The structured view is parsed on first use
/// and cached.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: u16,
    elapsed_ms: u64,
    headers: BTreeMap<String, String>,
    body: String,
    parsed: OnceLock<Result<Value, String>>,
}

impl ApiResponse {
    pub fn new(
        status: u16,
        elapsed_ms: u64,
        headers: BTreeMap<String, String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            status,
            elapsed_ms,
            headers,
            body: body.into(),
            parsed: OnceLock::new(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Header lookup by lowercase name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Structured view of the body, or the parse error message.
    pub fn json(&self) -> Result<&Value, &str> {
        self.parsed
            .get_or_init(|| serde_json::from_str(&self.body).map_err(|err| err.to_string()))
            .as_ref()
            .map_err(String::as_str)
    }

    /// Schema-free lookup by dotted path, e.g. `rating.rate` or `products.0.quantity`.
    pub fn field(&self, path: &str) -> Option<&Value> {
        let root = self.json().ok()?;
        if path.is_empty() || path == "$" {
            return Some(root);
        }
        path.split('.').try_fold(root, |value, key| match value {
            Value::Object(map) => map.get(key),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|index| items.get(index)),
            _ => None,
        })
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        self.json().ok().and_then(Value::as_array)
    }

    /// Typed view built from the cached structured view.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        let value = self
            .json()
            .map_err(|reason| DecodeError::Malformed(reason.to_string()))?;
        Ok(T::deserialize(value)?)
    }
}
