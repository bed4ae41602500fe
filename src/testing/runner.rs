use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use futures::FutureExt;
use tracing::{error, info};

use super::dataset::Dataset;
use super::report::Reporter;
use super::{FailureDetail, RunSummary, ScenarioError, TestRecord, Verdict};
use crate::error::FixtureError;

/// Whether a test method touches shared server-side state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Pure reads; safe to run alongside other read-only methods.
    ReadOnly,
    /// Creates, updates or deletes, or depends on ordered repeated calls.
    Mutating,
}

/// Identity of one test method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodInfo {
    pub id: &'static str,
    pub group: &'static str,
    pub description: &'static str,
    pub access: Access,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioState {
    Pending,
    Running,
    Finished(Verdict),
}

/// One scenario's walk through `Pending -> Running -> Finished`. Terminal
/// once finished; a second `finish` is ignored, so exactly one end event is
/// ever emitted per identity.
pub(crate) struct ScenarioExecution<'r> {
    id: String,
    description: &'r str,
    reporter: &'r dyn Reporter,
    state: ScenarioState,
    started: Option<Instant>,
}

impl<'r> ScenarioExecution<'r> {
    pub(crate) fn new(id: String, description: &'r str, reporter: &'r dyn Reporter) -> Self {
        Self {
            id,
            description,
            reporter,
            state: ScenarioState::Pending,
            started: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> &ScenarioState {
        &self.state
    }

    pub(crate) fn start(&mut self) -> bool {
        if self.state != ScenarioState::Pending {
            return false;
        }
        self.state = ScenarioState::Running;
        self.started = Some(Instant::now());
        self.reporter.on_test_start(&self.id, self.description);
        true
    }

    pub(crate) fn finish(&mut self, verdict: Verdict, detail: Option<FailureDetail>) -> Option<TestRecord> {
        if self.state != ScenarioState::Running {
            return None;
        }
        let elapsed_ms = self
            .started
            .map(|started| started.elapsed().as_millis() as u64)
            .unwrap_or_default();
        self.reporter
            .on_test_end(&self.id, &verdict, elapsed_ms, detail.as_ref());
        self.state = ScenarioState::Finished(verdict.clone());
        Some(TestRecord {
            id: self.id.clone(),
            description: self.description.to_string(),
            verdict,
            elapsed_ms,
            detail: detail.unwrap_or_default(),
        })
    }
}

/// Drives datasets through scenario bodies and keeps the run summary.
///
/// Safe to share between concurrently running test methods: the summary is
/// behind a mutex and reporters are `Sync`.
pub struct Runner {
    reporter: Arc<dyn Reporter>,
    summary: Mutex<RunSummary>,
    started: Mutex<Option<Instant>>,
}

impl Runner {
    pub fn new(reporter: Arc<dyn Reporter>) -> Self {
        Self {
            reporter,
            summary: Mutex::new(RunSummary::default()),
            started: Mutex::new(None),
        }
    }

    pub fn start_suite(&self) {
        *self.started.lock().unwrap_or_else(|p| p.into_inner()) = Some(Instant::now());
        self.reporter.on_suite_start();
    }

    /// Flushes the reporters and freezes the totals. A reporter that fails
    /// to flush counts as a configuration error.
    pub fn finish_suite(&self) -> RunSummary {
        let started = *self.started.lock().unwrap_or_else(|p| p.into_inner());
        let flushed = self.reporter.on_suite_end();
        let mut summary = self.summary.lock().unwrap_or_else(|p| p.into_inner());
        if let Err(err) = flushed {
            error!("{err}");
            summary.configuration_errors += 1;
        }
        summary.duration_ms = started
            .map(|started| started.elapsed().as_millis() as u64)
            .unwrap_or_default();
        summary.clone()
    }

    pub fn summary(&self) -> RunSummary {
        self.summary.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Runs `check` once per scenario, in dataset order.
    ///
    /// A dataset that failed to load aborts the method before any scenario
    /// runs: one SKIP is recorded under the method id and counted as a
    /// configuration error. Within a scenario every error kind, and a panic,
    /// becomes a verdict; nothing propagates to the next scenario.
    pub async fn run<T, F, Fut>(
        &self,
        method: &MethodInfo,
        dataset: Result<Dataset<T>, FixtureError>,
        mut check: F,
    ) where
        F: FnMut(T) -> Fut,
        Fut: Future<Output = Result<(), ScenarioError>>,
    {
        let dataset = match dataset {
            Ok(dataset) => dataset,
            Err(err) => {
                self.abort_method(method, &err);
                return;
            }
        };

        info!(
            method = method.id,
            dataset = dataset.name(),
            scenarios = dataset.len(),
            "running {}",
            method.description
        );
        for (index, scenario) in dataset.into_iter().enumerate() {
            let id = format!("{}[{}] {}", method.id, index + 1, scenario.label);
            let mut execution = ScenarioExecution::new(id, method.description, self.reporter.as_ref());
            execution.start();
            info!(expected = %scenario.expected, "scenario input: {}", scenario.label);

            let outcome = AssertUnwindSafe(check(scenario.input)).catch_unwind().await;
            let (verdict, detail) = match outcome {
                Ok(Ok(())) => (Verdict::Pass, None),
                Ok(Err(err)) => err.into_verdict(),
                Err(panic) => (Verdict::Fail(format!("scenario panicked: {}", panic_message(panic.as_ref()))), None),
            };
            if let Some(record) = execution.finish(verdict, detail) {
                self.record(&record);
            }
        }
    }

    fn abort_method(&self, method: &MethodInfo, err: &FixtureError) {
        error!(method = method.id, "dataset could not be loaded: {err}");
        let mut execution = ScenarioExecution::new(method.id.to_string(), method.description, self.reporter.as_ref());
        execution.start();
        if let Some(record) = execution.finish(Verdict::Skip(format!("configuration error: {err}")), None) {
            let mut summary = self.summary.lock().unwrap_or_else(|p| p.into_inner());
            summary.configuration_errors += 1;
            summary.record(&record);
        }
    }

    fn record(&self, record: &TestRecord) {
        self.summary
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .record(record);
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::assertions::AssertionFailure;
    use crate::testing::report::{Event, RecordingReporter};

    const METHOD: MethodInfo = MethodInfo {
        id: "TC-X-001",
        group: "x",
        description: "exercise the runner",
        access: Access::ReadOnly,
    };

    #[test]
    fn execution_is_terminal_once_finished() {
        let recorder = RecordingReporter::new();
        let mut execution = ScenarioExecution::new("T[1] a".into(), "d", &recorder);
        assert_eq!(execution.state(), &ScenarioState::Pending);

        assert!(execution.finish(Verdict::Pass, None).is_none());
        assert!(execution.start());
        assert!(!execution.start());
        assert_eq!(execution.state(), &ScenarioState::Running);

        assert!(execution.finish(Verdict::Pass, None).is_some());
        assert!(execution.finish(Verdict::Fail("again".into()), None).is_none());
        assert_eq!(execution.state(), &ScenarioState::Finished(Verdict::Pass));

        let ends = recorder
            .events()
            .into_iter()
            .filter(|event| matches!(event, Event::TestEnd { .. }))
            .count();
        assert_eq!(ends, 1);
    }

    #[tokio::test]
    async fn runs_each_scenario_and_maps_outcomes() {
        let recorder = Arc::new(RecordingReporter::new());
        let runner = Runner::new(recorder.clone());
        let dataset = Dataset::inline("numbers", "mixed", [1, 2, 3, 4]);

        runner.start_suite();
        runner
            .run(&METHOD, dataset, |n: i32| async move {
                match n {
                    1 => Ok(()),
                    2 => Err(ScenarioError::from(AssertionFailure::mismatch("wrong", 1, 2))),
                    3 => Err(ScenarioError::skip("no data")),
                    _ => panic!("boom"),
                }
            })
            .await;
        let summary = runner.finish_suite();

        let verdicts = recorder.verdicts();
        assert_eq!(verdicts[0], ("TC-X-001[1] 1".to_string(), Verdict::Pass));
        assert_eq!(verdicts[1].1, Verdict::Fail("wrong".into()));
        assert_eq!(verdicts[2].1, Verdict::Skip("no data".into()));
        assert_eq!(verdicts[3].1, Verdict::Fail("scenario panicked: boom".into()));
        assert_eq!((summary.passed, summary.failed, summary.skipped), (1, 2, 1));
        assert_eq!(summary.exit_status(), 1);
    }

    #[tokio::test]
    async fn events_come_in_start_end_pairs() {
        let recorder = Arc::new(RecordingReporter::new());
        let runner = Runner::new(recorder.clone());

        runner.start_suite();
        runner
            .run(&METHOD, Dataset::inline("ids", "ok", [7, 8]), |_| async { Ok::<(), ScenarioError>(()) })
            .await;
        runner.finish_suite();

        let kinds: Vec<&str> = recorder
            .events()
            .iter()
            .map(|event| match event {
                Event::SuiteStart => "suite-start",
                Event::TestStart { .. } => "start",
                Event::TestEnd { .. } => "end",
                Event::SuiteEnd => "suite-end",
            })
            .collect();
        assert_eq!(kinds, ["suite-start", "start", "end", "start", "end", "suite-end"]);
    }

    #[tokio::test]
    async fn failed_dataset_skips_method_without_running_body() {
        let recorder = Arc::new(RecordingReporter::new());
        let runner = Runner::new(recorder.clone());
        let mut calls = 0;

        runner
            .run(
                &METHOD,
                Err::<Dataset<i32>, _>(FixtureError::Empty("nothing".into())),
                |_| {
                    calls += 1;
                    async { Ok::<(), ScenarioError>(()) }
                },
            )
            .await;

        assert_eq!(calls, 0);
        let summary = runner.summary();
        assert_eq!(summary.configuration_errors, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.exit_status(), 2);
        let (id, verdict) = &recorder.verdicts()[0];
        assert_eq!(id, "TC-X-001");
        assert!(verdict.reason().unwrap().starts_with("configuration error"));
    }
}
