//! TC-AUTH: `POST /auth/login`.
//!
//! Every method here is treated as mutating: login attempts may be counted
//! server-side, and TC-AUTH-009 depends on ordered repeated calls.

use std::time::Duration;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use reqwest::StatusCode;
use tracing::info;

use super::{CaseContext, TestCase, datasets, method};
use crate::http::ApiResponse;
use crate::models::{AuthToken, LoginRequest};
use crate::testing::assertions::{
    body_not_contains, body_not_empty, decoded, ensure, error_response, response_time_below,
    status_code, status_in,
};
use crate::testing::{Access, ScenarioResult};

const GROUP: &str = "auth";

const MAX_LOGIN_MS: u64 = 2000;
const FAILED_ATTEMPTS: usize = 5;
const ATTEMPT_PAUSE: Duration = Duration::from_millis(100);

const REJECTED: &[StatusCode] = &[StatusCode::BAD_REQUEST, StatusCode::UNAUTHORIZED];

pub fn cases() -> Vec<TestCase> {
    use Access::Mutating;
    vec![
        TestCase::new(
            method("TC-AUTH-001", GROUP, "Verify user login with valid credentials", Mutating),
            valid_login,
        ),
        TestCase::new(
            method("TC-AUTH-002", GROUP, "Verify user login with invalid username", Mutating),
            invalid_username,
        ),
        TestCase::new(
            method("TC-AUTH-003", GROUP, "Verify user login with invalid password", Mutating),
            invalid_password,
        ),
        TestCase::new(
            method("TC-AUTH-004", GROUP, "Verify user login with empty credentials", Mutating),
            empty_credentials,
        ),
        TestCase::new(
            method("TC-AUTH-005", GROUP, "Verify user login without request body", Mutating),
            missing_body,
        ),
        TestCase::new(
            method("TC-AUTH-006", GROUP, "Verify user login with malformed JSON", Mutating),
            malformed_json,
        ),
        TestCase::new(
            method(
                "TC-AUTH-007",
                GROUP,
                "Verify user login with SQL injection attempt is properly handled",
                Mutating,
            ),
            sql_injection,
        ),
        TestCase::new(
            method("TC-AUTH-008", GROUP, "Verify user login response time", Mutating),
            response_time,
        ),
        TestCase::new(
            method(
                "TC-AUTH-009",
                GROUP,
                "Verify multiple consecutive failed login attempts are handled properly",
                Mutating,
            ),
            repeated_failures,
        ),
        TestCase::new(
            method(
                "TC-AUTH-010",
                GROUP,
                "Verify every invalid credential variant is rejected",
                Mutating,
            ),
            invalid_variants,
        ),
    ]
}

/// A non-empty token must come back.
fn issued_token(response: &ApiResponse) -> ScenarioResult {
    let auth: AuthToken = decoded(response)?;
    let token = auth.token.unwrap_or_default();
    ensure(!token.is_empty(), "Token should not be empty!")?;
    info!(token_len = token.len(), "token issued");
    Ok(())
}

fn valid_login<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::valid_credentials(cx.fixtures), move |credentials| {
        verify_valid_login(cx, credentials)
    })
    .boxed_local()
}

async fn verify_valid_login(cx: &CaseContext<'_>, credentials: LoginRequest) -> ScenarioResult {
    let response = cx.services.auth.login(&credentials).await?;
    status_code(&response, StatusCode::OK)?;
    body_not_empty(&response)?;
    issued_token(&response)
}

fn invalid_username<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::invalid_username(cx.fixtures), move |credentials| {
        verify_unauthorized(cx, credentials)
    })
    .boxed_local()
}

fn invalid_password<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::invalid_password(cx.fixtures), move |credentials| {
        verify_unauthorized(cx, credentials)
    })
    .boxed_local()
}

async fn verify_unauthorized(cx: &CaseContext<'_>, credentials: LoginRequest) -> ScenarioResult {
    let response = cx.services.auth.login(&credentials).await?;
    status_code(&response, StatusCode::UNAUTHORIZED)?;
    error_response(&response)?;
    Ok(())
}

fn empty_credentials<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::empty_credentials(cx.fixtures), move |credentials| {
        verify_empty_credentials(cx, credentials)
    })
    .boxed_local()
}

async fn verify_empty_credentials(cx: &CaseContext<'_>, credentials: LoginRequest) -> ScenarioResult {
    let response = cx.services.auth.login(&credentials).await?;
    status_in(&response, REJECTED)?;
    error_response(&response)?;
    Ok(())
}

fn missing_body<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::unparameterized("no body", "400"), move |()| {
        verify_missing_body(cx)
    })
    .boxed_local()
}

async fn verify_missing_body(cx: &CaseContext<'_>) -> ScenarioResult {
    let response = cx.services.auth.login_without_body().await?;
    status_code(&response, StatusCode::BAD_REQUEST)?;
    error_response(&response)?;
    Ok(())
}

fn malformed_json<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::malformed_login_json(cx.fixtures), move |json| {
        verify_malformed_json(cx, json)
    })
    .boxed_local()
}

async fn verify_malformed_json(cx: &CaseContext<'_>, json: String) -> ScenarioResult {
    let response = cx.services.auth.login_raw(&json).await?;
    status_code(&response, StatusCode::BAD_REQUEST)?;
    error_response(&response)?;
    Ok(())
}

fn sql_injection<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::sql_injection_credentials(cx.fixtures), move |credentials| {
        verify_sql_injection(cx, credentials)
    })
    .boxed_local()
}

async fn verify_sql_injection(cx: &CaseContext<'_>, credentials: LoginRequest) -> ScenarioResult {
    let response = cx.services.auth.login(&credentials).await?;
    status_code(&response, StatusCode::UNAUTHORIZED)?;
    error_response(&response)?;
    body_not_contains(&response, "token")?;
    info!("SQL injection attempt rejected");
    Ok(())
}

fn response_time<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::valid_credentials(cx.fixtures), move |credentials| {
        verify_response_time(cx, credentials)
    })
    .boxed_local()
}

async fn verify_response_time(cx: &CaseContext<'_>, credentials: LoginRequest) -> ScenarioResult {
    let response = cx.services.auth.login(&credentials).await?;
    status_code(&response, StatusCode::OK)?;
    response_time_below(&response, MAX_LOGIN_MS)?;
    issued_token(&response)
}

fn repeated_failures<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::failed_login_credentials(cx.fixtures), move |credentials| {
        verify_repeated_failures(cx, credentials)
    })
    .boxed_local()
}

/// Each of the attempts must be rejected on its own; the first that is not
/// ends the scenario.
async fn verify_repeated_failures(cx: &CaseContext<'_>, credentials: LoginRequest) -> ScenarioResult {
    for attempt in 1..=FAILED_ATTEMPTS {
        info!(attempt, "failed login attempt");
        let response = cx.services.auth.login(&credentials).await?;
        status_code(&response, StatusCode::UNAUTHORIZED)?;
        if attempt < FAILED_ATTEMPTS {
            tokio::time::sleep(ATTEMPT_PAUSE).await;
        }
    }
    info!("all {FAILED_ATTEMPTS} failed login attempts returned 401");
    Ok(())
}

fn invalid_variants<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::multiple_invalid_credentials(cx.fixtures), move |credentials| {
        verify_rejected_variant(cx, credentials)
    })
    .boxed_local()
}

async fn verify_rejected_variant(cx: &CaseContext<'_>, credentials: LoginRequest) -> ScenarioResult {
    let response = cx.services.auth.login(&credentials).await?;
    status_in(&response, REJECTED)?;
    body_not_contains(&response, "token")?;
    Ok(())
}
