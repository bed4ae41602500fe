use std::collections::BTreeMap;
use std::fmt::Display;

use serde::Serialize;
use serde_json::Value;

use super::endpoint::EndpointTemplate;
use super::method::HttpMethod;
use crate::error::TransportError;

/// Request body. The three states are deliberately distinct: `Raw` is sent
/// byte-for-byte (malformed payloads), `Absent` sends no body at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    #[default]
    Absent,
    Json(Value),
    Raw(String),
}

impl Body {
    pub fn json<T: Serialize>(payload: &T) -> Result<Self, TransportError> {
        Ok(Body::Json(serde_json::to_value(payload)?))
    }

    pub fn raw(text: impl Into<String>) -> Self {
        Body::Raw(text.into())
    }
}

/// One HTTP call to perform. Created per call and discarded afterwards.
#[derive(Debug, Clone)]
pub struct CallInput {
    pub endpoint: EndpointTemplate,
    pub method: HttpMethod,
    pub path_params: BTreeMap<String, String>,
    pub query_params: Vec<(String, String)>,
    pub body: Body,
}

impl CallInput {
    pub fn new(method: HttpMethod, endpoint: EndpointTemplate) -> Self {
        Self {
            endpoint,
            method,
            path_params: BTreeMap::new(),
            query_params: Vec::new(),
            body: Body::Absent,
        }
    }

    pub fn get(endpoint: EndpointTemplate) -> Self {
        Self::new(HttpMethod::Get, endpoint)
    }

    pub fn post(endpoint: EndpointTemplate) -> Self {
        Self::new(HttpMethod::Post, endpoint)
    }

    pub fn put(endpoint: EndpointTemplate) -> Self {
        Self::new(HttpMethod::Put, endpoint)
    }

    pub fn delete(endpoint: EndpointTemplate) -> Self {
        Self::new(HttpMethod::Delete, endpoint)
    }

    /// Any `Display` value is accepted, including values the server should reject.
    pub fn path(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.path_params.insert(name.into(), value.to_string());
        self
    }

    /// Appended verbatim, in insertion order.
    pub fn query(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.query_params.push((name.into(), value.to_string()));
        self
    }

    pub fn body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BY_ID: EndpointTemplate = EndpointTemplate::new("/products/{id}");

    #[test]
    fn builder_collects_params_in_order() {
        let call = CallInput::get(EndpointTemplate::new("/products"))
            .query("limit", -1)
            .query("sort", "desc");
        assert_eq!(
            call.query_params,
            vec![
                ("limit".to_string(), "-1".to_string()),
                ("sort".to_string(), "desc".to_string())
            ]
        );
        assert!(matches!(call.body, Body::Absent));
    }

    #[test]
    fn path_params_take_string_form() {
        let call = CallInput::delete(BY_ID).path("id", "abc");
        assert_eq!(call.path_params.get("id").map(String::as_str), Some("abc"));
        assert_eq!(call.method, HttpMethod::Delete);
    }

    #[test]
    fn structured_body_serializes_through_serde() {
        #[derive(Serialize)]
        struct Login<'a> {
            username: &'a str,
        }
        let body = Body::json(&Login { username: "mor_2314" }).unwrap();
        assert_eq!(body, Body::Json(json!({"username": "mor_2314"})));
    }

    #[test]
    fn raw_body_is_kept_as_is() {
        let call = CallInput::post(BY_ID).body(Body::raw("{\"username\": "));
        assert_eq!(call.body, Body::Raw("{\"username\": ".into()));
    }
}
