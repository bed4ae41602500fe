use std::path::PathBuf;

use thiserror::Error;

/// Failure of the dispatcher itself. Remote 4xx/5xx answers are never
/// reported through this type; they are ordinary responses.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("endpoint `{template}` references `{{{name}}}` but no value was supplied")]
    UnresolvedPlaceholder { template: String, name: String },
    #[error("invalid URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("request to {url} timed out after {timeout_ms} ms")]
    Timeout { url: String, timeout_ms: u64 },
    #[error("could not connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to read response from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid header `{name}`: {reason}")]
    Header { name: String, reason: String },
    #[error("structured bodies are sent as JSON, but the content type is `{content_type}`")]
    NonJsonContentType { content_type: String },
    #[error("failed to serialize request body: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout { .. })
    }
}

/// A response body that does not fit the requested typed view.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("body is not valid JSON: {0}")]
    Malformed(String),
    #[error(transparent)]
    Shape(#[from] serde_json::Error),
}

/// Missing or malformed external dataset.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixture file `{}`: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse fixture file `{}`: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("fixture file `{}` must contain one top-level JSON object", path.display())]
    NotAnObject { path: PathBuf },
    #[error("fixture file `{}` has no key `{key}`", path.display())]
    MissingKey { path: PathBuf, key: String },
    #[error("fixture `{context}` does not match the expected shape: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("dataset `{0}` is empty")]
    Empty(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base URL `{url}`: {reason}")]
    BaseUrl { url: String, reason: String },
    #[error("fixture directory `{}` does not exist", .0.display())]
    FixtureDir(PathBuf),
    #[error("no test method matches `{0}`")]
    UnknownSelection(String),
    #[error("failed to write report `{}`: {reason}", path.display())]
    Report { path: PathBuf, reason: String },
}
