//! Stateless checks over an [`ApiResponse`].
//!
//! Every check returns `Ok(())` or an [`AssertionFailure`] carrying a precise
//! expected/actual message, so scenario bodies can chain them with `?` and
//! stop at the first mismatch.

use std::fmt::{Debug, Display};

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::http::ApiResponse;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AssertionFailure {
    pub message: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

impl AssertionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            expected: None,
            actual: None,
        }
    }

    pub fn mismatch(message: impl Into<String>, expected: impl Display, actual: impl Display) -> Self {
        Self {
            message: message.into(),
            expected: Some(expected.to_string()),
            actual: Some(actual.to_string()),
        }
    }
}

pub type Check = Result<(), AssertionFailure>;

/// Plain boolean check, for call-site conditions the library has no name for.
pub fn ensure(condition: bool, message: impl Into<String>) -> Check {
    if condition {
        Ok(())
    } else {
        Err(AssertionFailure::new(message))
    }
}

/// Logical OR over already evaluated checks. Passes when any passes;
/// otherwise reports every alternative.
///
/// This is how call sites accept a set of statuses when the remote service
/// itself is inconsistent (e.g. 200 or 201 on create).
pub fn any_of<I>(checks: I) -> Check
where
    I: IntoIterator<Item = Check>,
{
    let mut failures = Vec::new();
    for check in checks {
        match check {
            Ok(()) => return Ok(()),
            Err(failure) => failures.push(failure),
        }
    }
    if failures.is_empty() {
        return Err(AssertionFailure::new("no alternatives were given"));
    }

    let message = failures
        .iter()
        .map(|failure| failure.message.as_str())
        .collect::<Vec<_>>()
        .join(" | or | ");
    let expected = failures
        .iter()
        .filter_map(|failure| failure.expected.as_deref())
        .collect::<Vec<_>>()
        .join(" or ");
    let actual = failures.iter().find_map(|failure| failure.actual.clone());
    Err(AssertionFailure {
        message,
        expected: (!expected.is_empty()).then_some(expected),
        actual,
    })
}

/// Exact match only.
pub fn status_code(response: &ApiResponse, expected: StatusCode) -> Check {
    let expected = expected.as_u16();
    let actual = response.status();
    info!("validating status code - expected: {expected}, actual: {actual}");
    if actual == expected {
        Ok(())
    } else {
        Err(AssertionFailure::mismatch(
            format!("Status code mismatch! Expected: {expected}, but got: {actual}"),
            expected,
            actual,
        ))
    }
}

/// Status must be one of `accepted`.
pub fn status_in(response: &ApiResponse, accepted: &[StatusCode]) -> Check {
    any_of(accepted.iter().map(|expected| status_code(response, *expected)))
}

pub fn body_not_empty(response: &ApiResponse) -> Check {
    info!("validating response body is not empty");
    if response.body().trim().is_empty() {
        Err(AssertionFailure::mismatch(
            "Response body is empty!",
            "non-empty body",
            "empty body",
        ))
    } else {
        Ok(())
    }
}

/// Smoke-level SLA check against a single observed call.
pub fn response_time_below(response: &ApiResponse, max_ms: u64) -> Check {
    let actual = response.elapsed_ms();
    info!("validating response time - expected: < {max_ms} ms, actual: {actual} ms");
    if actual < max_ms {
        Ok(())
    } else {
        Err(AssertionFailure::mismatch(
            format!("Response time exceeded! Expected: < {max_ms} ms, but got: {actual} ms"),
            format!("< {max_ms} ms"),
            format!("{actual} ms"),
        ))
    }
}

/// Passes when the field is present and not null.
pub fn field_exists(response: &ApiResponse, path: &str) -> Check {
    info!("validating field '{path}' exists in response");
    match response.field(path) {
        Some(value) if !value.is_null() => Ok(()),
        _ => Err(AssertionFailure::mismatch(
            format!("Field '{path}' does not exist in response!"),
            format!("field '{path}'"),
            "missing",
        )),
    }
}

pub fn field_equals(response: &ApiResponse, path: &str, expected: impl Into<Value>) -> Check {
    let expected = expected.into();
    let actual = response.field(path).cloned().unwrap_or(Value::Null);
    info!("validating field '{path}' - expected: {expected}, actual: {actual}");
    if json_eq(&actual, &expected) {
        Ok(())
    } else {
        Err(AssertionFailure::mismatch(
            format!("Field '{path}' value mismatch! Expected: {expected}, but got: {actual}"),
            expected,
            actual,
        ))
    }
}

pub fn is_array(response: &ApiResponse) -> Check {
    info!("validating response is an array");
    match response.json() {
        Ok(Value::Array(_)) => Ok(()),
        Ok(other) => Err(AssertionFailure::mismatch(
            "Response is not an array!",
            "JSON array",
            json_kind(other),
        )),
        Err(reason) => Err(AssertionFailure::mismatch(
            format!("Response is not an array! Body is not JSON: {reason}"),
            "JSON array",
            "unparseable body",
        )),
    }
}

pub fn array_len(response: &ApiResponse, expected: usize) -> Check {
    is_array(response)?;
    let actual = response.as_array().map(Vec::len).unwrap_or_default();
    info!("validating array size - expected: {expected}, actual: {actual}");
    if actual == expected {
        Ok(())
    } else {
        Err(AssertionFailure::mismatch(
            format!("Array size mismatch! Expected: {expected}, but got: {actual}"),
            expected,
            actual,
        ))
    }
}

pub fn array_not_empty(response: &ApiResponse) -> Check {
    is_array(response)?;
    info!("validating array is not empty");
    match response.as_array() {
        Some(items) if !items.is_empty() => Ok(()),
        _ => Err(AssertionFailure::mismatch(
            "Array should not be empty!",
            "at least one element",
            0,
        )),
    }
}

/// Every element of a top-level array carries every listed field, non-null.
pub fn each_has_fields(response: &ApiResponse, fields: &[&str]) -> Check {
    is_array(response)?;
    info!("validating array elements carry fields {fields:?}");
    let items = response.as_array().map(Vec::as_slice).unwrap_or_default();
    for (index, item) in items.iter().enumerate() {
        for field in fields {
            if item.get(*field).is_none_or(Value::is_null) {
                return Err(AssertionFailure::mismatch(
                    format!("Element {index} is missing field '{field}'!"),
                    format!("field '{field}'"),
                    "missing",
                ));
            }
        }
    }
    Ok(())
}

/// Loose heuristic: passes when the body mentions `error` or `message`, or is
/// empty. The remote error shape is not contractually specified.
pub fn error_response(response: &ApiResponse) -> Check {
    info!("validating error response");
    let body = response.body();
    if body.trim().is_empty() || body.contains("error") || body.contains("message") {
        Ok(())
    } else {
        Err(AssertionFailure::mismatch(
            format!("Expected error response but got: {body}"),
            "error body",
            body,
        ))
    }
}

pub fn body_not_contains(response: &ApiResponse, needle: &str) -> Check {
    info!("validating response body does not contain '{needle}'");
    if response.body().contains(needle) {
        Err(AssertionFailure::mismatch(
            format!("Response body should not contain '{needle}'!"),
            format!("no '{needle}'"),
            response.body(),
        ))
    } else {
        Ok(())
    }
}

/// Equality on already decoded values; `what` names the field in the message.
pub fn equals<T: PartialEq + Debug>(what: &str, actual: T, expected: T) -> Check {
    if actual == expected {
        Ok(())
    } else {
        Err(AssertionFailure::mismatch(
            format!("{what} mismatch! Expected: {expected:?}, but got: {actual:?}"),
            format!("{expected:?}"),
            format!("{actual:?}"),
        ))
    }
}

/// Typed view of the body. A body that does not decode is an assertion
/// failure, not a transport problem.
pub fn decoded<T: DeserializeOwned>(response: &ApiResponse) -> Result<T, AssertionFailure> {
    response.decode().map_err(|err| {
        AssertionFailure::mismatch(
            format!("Response body could not be decoded: {err}"),
            std::any::type_name::<T>(),
            response.body(),
        )
    })
}

/// Numbers compare by value, so `7` matches `7.0`.
fn json_eq(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a == b,
            _ => a.as_f64() == b.as_f64(),
        },
        _ => actual == expected,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
