//! # storeprobe
//!
//! End-to-end checks for a FakeStore-style HTTP JSON API: a thin dispatcher
//! over `reqwest`, one facade per resource, a library of response
//! assertions, dataset-driven test methods and a runner that turns every
//! scenario into exactly one PASS, FAIL or SKIP.

pub mod cli;
pub mod error;
pub mod http;
pub mod models;
pub mod services;
pub mod suites;
pub mod testing;

pub use error::{ConfigError, FixtureError, TransportError};
pub use http::{ApiResponse, Dispatcher, RequestSpec};
pub use services::{ApiClient, Services};
pub use suites::{Suite, TestCase};
pub use testing::{RunSummary, Runner, Verdict};
