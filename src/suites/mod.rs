//! # Built-in catalog
//!
//! End-to-end checks against the FakeStore API, grouped by resource. Each
//! [`TestCase`] is a plain function pointer over a [`CaseContext`], so the
//! catalog is a static list that can be filtered, listed and run in any
//! order without shared mutable state.

pub mod auth;
pub mod carts;
pub mod datasets;
pub mod products;

use std::future::Future;
use std::sync::Arc;

use futures::future::{join_all, LocalBoxFuture};
use tracing::info;

use crate::error::{ConfigError, FixtureError, TransportError};
use crate::http::{Dispatcher, RequestSpec};
use crate::services::{ApiClient, Services};
use crate::testing::{
    Access, Dataset, FixtureStore, MethodInfo, Reporter, RunSummary, Runner, ScenarioError,
};

pub type CaseFn = for<'a> fn(&'a CaseContext<'a>) -> LocalBoxFuture<'a, ()>;

/// One test method: identity plus the function that drives its dataset.
#[derive(Clone, Copy)]
pub struct TestCase {
    pub info: MethodInfo,
    pub run: CaseFn,
}

impl TestCase {
    pub const fn new(info: MethodInfo, run: CaseFn) -> Self {
        Self { info, run }
    }

    pub fn id(&self) -> &'static str {
        self.info.id
    }

    /// Exact id, case-insensitive id prefix, or group name.
    pub fn matches(&self, filter: &str) -> bool {
        let filter = filter.trim();
        self.info.group.eq_ignore_ascii_case(filter)
            || self
                .info
                .id
                .to_ascii_lowercase()
                .starts_with(&filter.to_ascii_lowercase())
    }
}

impl std::fmt::Debug for TestCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestCase").field("info", &self.info).finish()
    }
}

pub(crate) const fn method(
    id: &'static str,
    group: &'static str,
    description: &'static str,
    access: Access,
) -> MethodInfo {
    MethodInfo {
        id,
        group,
        description,
        access,
    }
}

/// What a test method sees while it runs.
pub struct CaseContext<'a> {
    pub case: &'a TestCase,
    pub services: &'a Services,
    pub fixtures: &'a FixtureStore,
    pub runner: &'a Runner,
}

impl CaseContext<'_> {
    /// Runs this method's dataset through `check`.
    pub async fn run<T, F, Fut>(&self, dataset: Result<Dataset<T>, FixtureError>, check: F)
    where
        F: FnMut(T) -> Fut,
        Fut: Future<Output = Result<(), ScenarioError>>,
    {
        self.runner.run(&self.case.info, dataset, check).await
    }
}

/// Every test method, in catalog order.
pub fn catalog() -> Vec<TestCase> {
    let mut cases = products::cases();
    cases.extend(carts::cases());
    cases.extend(auth::cases());
    cases
}

/// Narrows `catalog` to the methods any filter matches, keeping catalog
/// order. No filters selects everything; a filter matching nothing is an
/// error.
pub fn select(catalog: &[TestCase], filters: &[String]) -> Result<Vec<TestCase>, ConfigError> {
    if filters.is_empty() {
        return Ok(catalog.to_vec());
    }
    if let Some(unknown) = filters
        .iter()
        .find(|filter| !catalog.iter().any(|case| case.matches(filter)))
    {
        return Err(ConfigError::UnknownSelection(unknown.clone()));
    }
    Ok(catalog
        .iter()
        .filter(|case| filters.iter().any(|filter| case.matches(filter)))
        .copied()
        .collect())
}

/// Services, fixtures and runner shared by every method of one run.
pub struct Suite {
    services: Services,
    fixtures: FixtureStore,
    runner: Runner,
}

impl Suite {
    pub fn new(services: Services, fixtures: FixtureStore, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            services,
            fixtures,
            runner: Runner::new(reporter),
        }
    }

    /// Builds the anonymous service stack over one dispatcher.
    pub fn connect(
        spec: RequestSpec,
        timeout_ms: u64,
        fixtures: FixtureStore,
        reporter: Arc<dyn Reporter>,
    ) -> Result<Self, TransportError> {
        let dispatcher = Arc::new(Dispatcher::new(timeout_ms)?);
        let client = ApiClient::new(dispatcher, Arc::new(spec));
        Ok(Self::new(Services::new(client), fixtures, reporter))
    }

    fn context<'a>(&'a self, case: &'a TestCase) -> CaseContext<'a> {
        CaseContext {
            case,
            services: &self.services,
            fixtures: &self.fixtures,
            runner: &self.runner,
        }
    }

    /// Runs `cases` and returns the totals.
    ///
    /// Sequential in the given order unless `concurrent_reads` is set, in
    /// which case read-only methods are joined first and mutating methods
    /// follow one at a time.
    pub async fn run(&self, cases: &[TestCase], concurrent_reads: bool) -> RunSummary {
        self.runner.start_suite();
        if concurrent_reads {
            let (reads, writes): (Vec<&TestCase>, Vec<&TestCase>) = cases
                .iter()
                .partition(|case| case.info.access == Access::ReadOnly);
            info!(read_only = reads.len(), mutating = writes.len(), "running read-only methods concurrently");

            let contexts: Vec<CaseContext<'_>> = reads.iter().map(|case| self.context(case)).collect();
            join_all(contexts.iter().map(|cx| (cx.case.run)(cx))).await;
            for case in writes {
                let cx = self.context(case);
                (case.run)(&cx).await;
            }
        } else {
            for case in cases {
                let cx = self.context(case);
                (case.run)(&cx).await;
            }
        }
        self.runner.finish_suite()
    }
}
