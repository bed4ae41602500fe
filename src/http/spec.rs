use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use tracing::debug;

use crate::error::TransportError;

pub const JSON: &str = "application/json";
pub const DEFAULT_USER_AGENT: &str = "FakeStore-Automation-Framework";

/// Immutable per-context request defaults.
///
/// Build a fresh spec per authentication context with [`RequestSpec::with_bearer`]
/// instead of mutating a shared one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    base_url: String,
    default_headers: BTreeMap<String, String>,
    content_type: String,
    accept: String,
    credential: Option<String>,
}

impl RequestSpec {
    pub fn builder(base_url: impl Into<String>) -> RequestSpecBuilder {
        RequestSpecBuilder {
            base_url: base_url.into(),
            default_headers: BTreeMap::new(),
            content_type: JSON.to_string(),
            accept: JSON.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Anonymous JSON spec with the default user agent.
    pub fn anonymous(base_url: impl Into<String>) -> Self {
        Self::builder(base_url).build()
    }

    /// A new spec that carries `token` as a bearer credential. `self` is untouched.
    pub fn with_bearer(&self, token: impl Into<String>) -> Self {
        debug!("building request specification with authentication");
        Self {
            credential: Some(token.into()),
            ..self.clone()
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn accept(&self) -> &str {
        &self.accept
    }

    pub fn default_headers(&self) -> &BTreeMap<String, String> {
        &self.default_headers
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    /// Headers sent with every call. Content-Type is added by the dispatcher
    /// only when a body is present.
    pub(crate) fn header_map(&self) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        for (key, value) in &self.default_headers {
            let header_name = HeaderName::from_bytes(key.as_bytes()).map_err(|err| {
                TransportError::Header {
                    name: key.clone(),
                    reason: err.to_string(),
                }
            })?;
            headers.insert(header_name, header_value(key, value)?);
        }
        headers.insert(ACCEPT, header_value("Accept", &self.accept)?);
        if let Some(token) = &self.credential {
            headers.insert(
                AUTHORIZATION,
                header_value("Authorization", &format!("Bearer {token}"))?,
            );
        }
        Ok(headers)
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, TransportError> {
    HeaderValue::from_str(value).map_err(|err| TransportError::Header {
        name: name.to_string(),
        reason: err.to_string(),
    })
}

#[derive(Debug, Clone)]
pub struct RequestSpecBuilder {
    base_url: String,
    default_headers: BTreeMap<String, String>,
    content_type: String,
    accept: String,
    user_agent: String,
}

impl RequestSpecBuilder {
    /// Header names are case-insensitive; they are stored lowercased so a
    /// later call with different casing replaces the earlier one.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Media type sent with request bodies. Structured bodies require a JSON
    /// type; anything else only applies to raw bodies.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = accept.into();
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> RequestSpec {
        debug!(base_url = %self.base_url, "building default request specification");
        let mut default_headers = self.default_headers;
        default_headers
            .entry(USER_AGENT.as_str().to_string())
            .or_insert(self.user_agent);
        RequestSpec {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            default_headers,
            content_type: self.content_type,
            accept: self.accept,
            credential: None,
        }
    }
}
