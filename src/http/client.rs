use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Url};
use tracing::{debug, info};

use super::request::{Body, CallInput};
use super::response::ApiResponse;
use super::spec::{JSON, RequestSpec};
use crate::error::TransportError;

/// Performs exactly one HTTP call per [`Dispatcher::perform`].
///
/// Any status code the server answers with is a successful dispatch. Only
/// transport faults (unresolvable URL, connect failure, timeout) are errors.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: Client,
    timeout_ms: Option<u64>,
}

impl Dispatcher {
    /// `timeout_ms` of zero disables the client-side timeout.
    pub fn new(timeout_ms: u64) -> Result<Self, TransportError> {
        let mut builder = Client::builder().redirect(reqwest::redirect::Policy::limited(10));
        if timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        let client = builder.build().map_err(TransportError::Client)?;
        Ok(Self {
            client,
            timeout_ms: (timeout_ms > 0).then_some(timeout_ms),
        })
    }

    pub async fn perform(
        &self,
        spec: &RequestSpec,
        call: &CallInput,
    ) -> Result<ApiResponse, TransportError> {
        let url = build_url(spec, call)?;
        info!(method = %call.method, endpoint = %call.endpoint, mutating = call.method.is_mutating(), "sending {} request to {}", call.method, url.path());

        let mut request = self
            .client
            .request(call.method.into(), url.clone())
            .headers(spec.header_map()?);

        match &call.body {
            Body::Absent => {}
            Body::Json(payload) => {
                let bytes = json_body(spec, payload)?;
                debug!("request body: {payload}");
                request = request
                    .header(CONTENT_TYPE, content_type(spec)?)
                    .body(bytes);
            }
            Body::Raw(raw) => {
                debug!("request body: {raw}");
                request = request
                    .header(CONTENT_TYPE, content_type(spec)?)
                    .body(raw.clone());
            }
        }

        let started = Instant::now();
        let response = request
            .send()
            .await
            .map_err(|err| self.classify(url.as_str(), err))?;

        let status = response.status().as_u16();
        let mut headers = BTreeMap::new();
        for (key, value) in response.headers() {
            headers.insert(
                key.to_string(),
                value.to_str().unwrap_or_default().to_string(),
            );
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| match self.classify(url.as_str(), err) {
                TransportError::Request { url, source } => TransportError::Body { url, source },
                other => other,
            })?;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        let body = String::from_utf8_lossy(&bytes).into_owned();

        info!(status, elapsed_ms, "received response with status code: {status}");
        debug!("response body: {body}");

        Ok(ApiResponse::new(status, elapsed_ms, headers, body))
    }

    fn classify(&self, url: &str, err: reqwest::Error) -> TransportError {
        let url = url.to_string();
        if err.is_timeout() {
            TransportError::Timeout {
                url,
                timeout_ms: self.timeout_ms.unwrap_or_default(),
            }
        } else if err.is_connect() {
            TransportError::Connect { url, source: err }
        } else {
            TransportError::Request { url, source: err }
        }
    }
}

/// Structured payloads are always encoded with `serde_json`, so the
/// [`RequestSpec`] must declare a JSON media type (`application/json` or a
/// `+json` suffix).
/// Raw bodies go out under whatever type it declares.
fn json_body(spec: &RequestSpec, payload: &serde_json::Value) -> Result<Vec<u8>, TransportError> {
    let essence = spec
        .content_type()
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if essence != JSON && !essence.ends_with("+json") {
        return Err(TransportError::NonJsonContentType {
            content_type: spec.content_type().to_string(),
        });
    }
    Ok(serde_json::to_vec(payload)?)
}

fn content_type(spec: &RequestSpec) -> Result<HeaderValue, TransportError> {
    HeaderValue::from_str(spec.content_type()).map_err(|err| TransportError::Header {
        name: CONTENT_TYPE.to_string(),
        reason: err.to_string(),
    })
}

/// Base URL + resolved template segments (each percent-encoded as one
/// segment) + query parameters in call order.
pub(crate) fn build_url(spec: &RequestSpec, call: &CallInput) -> Result<Url, TransportError> {
    let invalid = |reason: String| TransportError::InvalidUrl {
        url: format!("{}{}", spec.base_url(), call.endpoint),
        reason,
    };

    let segments = call.endpoint.resolve(&call.path_params)?;
    let mut url = Url::parse(spec.base_url()).map_err(|err| invalid(err.to_string()))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| invalid("base URL cannot carry a path".to_string()))?;
        path.pop_if_empty();
        path.extend(&segments);
    }

    if !call.query_params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &call.query_params {
            pairs.append_pair(key, value);
        }
    }

    Ok(url)
}
