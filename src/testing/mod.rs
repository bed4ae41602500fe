//! # Test orchestration
//!
//! Datasets feed scenarios to a [`Runner`], which drives each one through a
//! service call and a chain of assertions, turns whatever happened into a
//! [`Verdict`] and reports lifecycle events to a [`Reporter`].

pub mod assertions;
pub mod dataset;
pub mod report;
pub mod runner;

use std::process::ExitCode;

use serde::Serialize;
use thiserror::Error;

use crate::error::{FixtureError, TransportError};

pub use assertions::{AssertionFailure, Check};
pub use dataset::{Dataset, FixtureDocument, FixtureStore, Scenario};
pub use report::{ConsoleReporter, Event, JsonReportWriter, RecordingReporter, Reporter, Reporters};
pub use runner::{Access, MethodInfo, Runner, ScenarioState};

/// Terminal outcome of one scenario. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason")]
pub enum Verdict {
    #[serde(rename = "PASS")]
    Pass,
    #[serde(rename = "FAIL")]
    Fail(String),
    #[serde(rename = "SKIP")]
    Skip(String),
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Pass => "PASS",
            Verdict::Fail(_) => "FAIL",
            Verdict::Skip(_) => "SKIP",
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Verdict::Pass => None,
            Verdict::Fail(reason) | Verdict::Skip(reason) => Some(reason),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Verdict::Fail(_))
    }
}

/// Expected/actual pair attached to a failed or skipped test.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FailureDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

/// Everything that can stop a scenario. Converted into a [`Verdict`] at the
/// scenario boundary; none of these escape a single scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Assertion(#[from] AssertionFailure),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Fixture(#[from] FixtureError),
    #[error("{0}")]
    Skip(String),
}

impl ScenarioError {
    /// An unmet precondition: recorded as SKIP, never FAIL.
    pub fn skip(reason: impl Into<String>) -> Self {
        ScenarioError::Skip(reason.into())
    }

    pub(crate) fn into_verdict(self) -> (Verdict, Option<FailureDetail>) {
        match self {
            ScenarioError::Assertion(failure) => {
                let detail = FailureDetail {
                    expected: failure.expected,
                    actual: failure.actual,
                };
                (Verdict::Fail(failure.message), Some(detail))
            }
            ScenarioError::Transport(err) if err.is_timeout() => {
                (Verdict::Fail(format!("timeout: {err}")), None)
            }
            ScenarioError::Transport(err) => {
                (Verdict::Fail(format!("transport error: {err}")), None)
            }
            ScenarioError::Fixture(err) => {
                (Verdict::Skip(format!("fixture unavailable: {err}")), None)
            }
            ScenarioError::Skip(reason) => (Verdict::Skip(reason), None),
        }
    }
}

pub type ScenarioResult = Result<(), ScenarioError>;

/// One finished test as it appears in summaries and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecord {
    pub id: String,
    pub description: String,
    pub verdict: Verdict,
    pub elapsed_ms: u64,
    #[serde(flatten)]
    pub detail: FailureDetail,
}

/// Totals for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub configuration_errors: usize,
    pub duration_ms: u64,
    pub failures: Vec<TestRecord>,
}

impl RunSummary {
    pub fn record(&mut self, record: &TestRecord) {
        self.total += 1;
        match record.verdict {
            Verdict::Pass => self.passed += 1,
            Verdict::Fail(_) => {
                self.failed += 1;
                self.failures.push(record.clone());
            }
            Verdict::Skip(_) => self.skipped += 1,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.configuration_errors == 0
    }

    /// 0 when green, 1 on any failed test, 2 when fixtures could not be loaded.
    pub fn exit_status(&self) -> u8 {
        if self.configuration_errors > 0 {
            2
        } else if self.failed > 0 {
            1
        } else {
            0
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }

    /// Human-readable block printed at the end of a run.
    pub fn render(&self) -> String {
        let mut output = format!(
            "Tests: {} | Passed: {} | Failed: {} | Skipped: {} | Duration: {} ms\n",
            self.total, self.passed, self.failed, self.skipped, self.duration_ms
        );
        if self.configuration_errors > 0 {
            output.push_str(&format!(
                "Configuration errors: {}\n",
                self.configuration_errors
            ));
        }
        for failure in &self.failures {
            output.push_str(&format!(
                "FAILED {} ({} ms): {}\n",
                failure.id,
                failure.elapsed_ms,
                failure.verdict.reason().unwrap_or_default()
            ));
            if let Some(expected) = &failure.detail.expected {
                output.push_str(&format!("    expected: {expected}\n"));
            }
            if let Some(actual) = &failure.detail.actual {
                output.push_str(&format!("    actual:   {actual}\n"));
            }
        }
        output
    }
}
