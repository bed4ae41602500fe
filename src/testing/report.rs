//! Lifecycle event sinks.
//!
//! The runner calls these methods directly with the test identity, so no
//! reporter needs thread-local "current test" state. Implementations must
//! tolerate concurrent appends.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::{error, info, warn};

use super::{FailureDetail, RunSummary, TestRecord, Verdict};
use crate::error::ConfigError;

pub trait Reporter: Send + Sync {
    fn on_suite_start(&self);
    fn on_test_start(&self, id: &str, description: &str);
    fn on_test_end(&self, id: &str, verdict: &Verdict, elapsed_ms: u64, detail: Option<&FailureDetail>);
    /// Flushes whatever the reporter produces. An error here means the run
    /// did not deliver an output it was asked for.
    fn on_suite_end(&self) -> Result<(), ConfigError>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ─── Console ──────────────────────────────────────────────────────────────────

/// Logs every event through `tracing` and prints one line per finished test
/// on stdout.
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Reporter for ConsoleReporter {
    fn on_suite_start(&self) {
        info!("========================================");
        info!("starting API test run");
        info!("========================================");
    }

    fn on_test_start(&self, id: &str, description: &str) {
        info!("-------------------------------------------");
        info!(test = id, "starting test: {description}");
    }

    fn on_test_end(&self, id: &str, verdict: &Verdict, elapsed_ms: u64, detail: Option<&FailureDetail>) {
        match verdict {
            Verdict::Pass => info!(test = id, elapsed_ms, "test PASSED"),
            Verdict::Fail(reason) => error!(
                test = id,
                elapsed_ms,
                expected = detail.and_then(|d| d.expected.as_deref()),
                actual = detail.and_then(|d| d.actual.as_deref()),
                "test FAILED: {reason}"
            ),
            Verdict::Skip(reason) => warn!(test = id, "test SKIPPED: {reason}"),
        }
        let suffix = verdict
            .reason()
            .map(|reason| format!(" - {reason}"))
            .unwrap_or_default();
        println!("{:<4}  {id} ({elapsed_ms} ms){suffix}", verdict.label());
    }

    fn on_suite_end(&self) -> Result<(), ConfigError> {
        info!("========================================");
        info!("API test run finished");
        info!("========================================");
        Ok(())
    }
}

// ─── JSON Report ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportDocument<'a> {
    generated_at_ms: u64,
    system_info: &'a BTreeMap<String, String>,
    summary: RunSummary,
    tests: &'a [TestRecord],
}

#[derive(Debug, Default)]
struct ReportState {
    started_at_ms: u64,
    descriptions: BTreeMap<String, String>,
    records: Vec<TestRecord>,
}

/// Append-only record sink written as pretty JSON when the suite ends.
#[derive(Debug)]
pub struct JsonReportWriter {
    path: PathBuf,
    system_info: BTreeMap<String, String>,
    state: Mutex<ReportState>,
}

impl JsonReportWriter {
    pub fn new(path: impl Into<PathBuf>, system_info: BTreeMap<String, String>) -> Self {
        Self {
            path: path.into(),
            system_info,
            state: Mutex::new(ReportState::default()),
        }
    }

    pub fn records(&self) -> Vec<TestRecord> {
        lock(&self.state).records.clone()
    }

    pub fn write(&self) -> Result<(), ConfigError> {
        let state = lock(&self.state);
        let mut summary = RunSummary::default();
        for record in &state.records {
            summary.record(record);
        }
        let generated_at_ms = now_ms();
        summary.duration_ms = generated_at_ms.saturating_sub(state.started_at_ms);

        let document = ReportDocument {
            generated_at_ms,
            system_info: &self.system_info,
            summary,
            tests: &state.records,
        };
        let report_error = |reason: String| ConfigError::Report {
            path: self.path.clone(),
            reason,
        };
        let raw = serde_json::to_string_pretty(&document).map_err(|e| report_error(e.to_string()))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| report_error(e.to_string()))?;
        }
        fs::write(&self.path, raw).map_err(|e| report_error(e.to_string()))
    }
}

impl Reporter for JsonReportWriter {
    fn on_suite_start(&self) {
        lock(&self.state).started_at_ms = now_ms();
    }

    fn on_test_start(&self, id: &str, description: &str) {
        lock(&self.state)
            .descriptions
            .insert(id.to_string(), description.to_string());
    }

    fn on_test_end(&self, id: &str, verdict: &Verdict, elapsed_ms: u64, detail: Option<&FailureDetail>) {
        let mut state = lock(&self.state);
        let description = state.descriptions.remove(id).unwrap_or_default();
        state.records.push(TestRecord {
            id: id.to_string(),
            description,
            verdict: verdict.clone(),
            elapsed_ms,
            detail: detail.cloned().unwrap_or_default(),
        });
    }

    fn on_suite_end(&self) -> Result<(), ConfigError> {
        self.write()?;
        info!("report generated at: {}", self.path.display());
        Ok(())
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or_default()
}

// ─── Recording ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    SuiteStart,
    TestStart {
        id: String,
        description: String,
    },
    TestEnd {
        id: String,
        verdict: Verdict,
        elapsed_ms: u64,
        detail: Option<FailureDetail>,
    },
    SuiteEnd,
}

/// Keeps every event in memory, in arrival order.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<Event>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        lock(&self.events).clone()
    }

    /// `(id, verdict)` for every finished test.
    pub fn verdicts(&self) -> Vec<(String, Verdict)> {
        lock(&self.events)
            .iter()
            .filter_map(|event| match event {
                Event::TestEnd { id, verdict, .. } => Some((id.clone(), verdict.clone())),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Event) {
        lock(&self.events).push(event);
    }
}

impl Reporter for RecordingReporter {
    fn on_suite_start(&self) {
        self.push(Event::SuiteStart);
    }

    fn on_test_start(&self, id: &str, description: &str) {
        self.push(Event::TestStart {
            id: id.to_string(),
            description: description.to_string(),
        });
    }

    fn on_test_end(&self, id: &str, verdict: &Verdict, elapsed_ms: u64, detail: Option<&FailureDetail>) {
        self.push(Event::TestEnd {
            id: id.to_string(),
            verdict: verdict.clone(),
            elapsed_ms,
            detail: detail.cloned(),
        });
    }

    fn on_suite_end(&self) -> Result<(), ConfigError> {
        self.push(Event::SuiteEnd);
        Ok(())
    }
}

// ─── Fan-out ──────────────────────────────────────────────────────────────────

/// Forwards every event to each reporter in order.
#[derive(Default)]
pub struct Reporters {
    sinks: Vec<Arc<dyn Reporter>>,
}

impl Reporters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.sinks.push(reporter);
        self
    }
}

impl Reporter for Reporters {
    fn on_suite_start(&self) {
        self.sinks.iter().for_each(|sink| sink.on_suite_start());
    }

    fn on_test_start(&self, id: &str, description: &str) {
        self.sinks
            .iter()
            .for_each(|sink| sink.on_test_start(id, description));
    }

    fn on_test_end(&self, id: &str, verdict: &Verdict, elapsed_ms: u64, detail: Option<&FailureDetail>) {
        self.sinks
            .iter()
            .for_each(|sink| sink.on_test_end(id, verdict, elapsed_ms, detail));
    }

    /// Every sink is flushed even when an earlier one fails; the first
    /// error is returned.
    fn on_suite_end(&self) -> Result<(), ConfigError> {
        self.sinks
            .iter()
            .map(|sink| sink.on_suite_end())
            .fold(Ok(()), |first, result| first.and(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fan_out_reaches_every_sink() {
        let first = Arc::new(RecordingReporter::new());
        let second = Arc::new(RecordingReporter::new());
        let reporters = Reporters::new().with(first.clone()).with(second.clone());

        reporters.on_suite_start();
        reporters.on_test_start("TC-1[1] 1", "desc");
        reporters.on_test_end("TC-1[1] 1", &Verdict::Pass, 3, None);
        reporters.on_suite_end().unwrap();

        assert_eq!(first.events(), second.events());
        assert_eq!(first.events().len(), 4);
        assert_eq!(first.verdicts(), vec![("TC-1[1] 1".to_string(), Verdict::Pass)]);
    }

    #[test]
    fn json_report_is_written_on_suite_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("run.json");
        let mut info = BTreeMap::new();
        info.insert("Base URL".to_string(), "http://localhost".to_string());
        let writer = JsonReportWriter::new(&path, info);

        writer.on_suite_start();
        writer.on_test_start("TC-AUTH-001[1] valid", "Verify login");
        writer.on_test_end(
            "TC-AUTH-001[1] valid",
            &Verdict::Fail("Status code mismatch!".into()),
            12,
            Some(&FailureDetail {
                expected: Some("200".into()),
                actual: Some("401".into()),
            }),
        );
        writer.on_suite_end().unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["summary"]["failed"], 1);
        assert_eq!(json["systemInfo"]["Base URL"], "http://localhost");
        assert_eq!(json["tests"][0]["description"], "Verify login");
        assert_eq!(json["tests"][0]["verdict"]["status"], "FAIL");
        assert_eq!(json["tests"][0]["expected"], "200");
        assert_eq!(writer.records().len(), 1);
    }

    #[test]
    fn concurrent_appends_are_all_kept() {
        let recorder = Arc::new(RecordingReporter::new());
        let handles: Vec<_> = (0..8)
            .map(|n| {
                let recorder = recorder.clone();
                std::thread::spawn(move || {
                    let id = format!("T[{n}]");
                    recorder.on_test_start(&id, "");
                    recorder.on_test_end(&id, &Verdict::Pass, 0, None);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(recorder.verdicts().len(), 8);
    }

    #[test]
    fn unwritable_report_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();
        let path = blocker.join("report.json");
        let writer = Arc::new(JsonReportWriter::new(&path, BTreeMap::new()));
        let recorder = Arc::new(RecordingReporter::new());
        let reporters = Reporters::new().with(writer.clone()).with(recorder.clone());

        reporters.on_suite_start();
        let err = reporters.on_suite_end().unwrap_err();

        assert!(matches!(err, ConfigError::Report { path: ref failed, .. } if *failed == path));
        assert!(!path.exists());
        assert_eq!(recorder.events().last(), Some(&Event::SuiteEnd));
    }
}
