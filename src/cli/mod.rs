//! # Command line
//!
//! Flags with environment fallbacks, validated once into an immutable
//! [`SuiteConfig`] before anything touches the network.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Parser;
use reqwest::Url;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::error::ConfigError;
use crate::http::spec::DEFAULT_USER_AGENT;
use crate::http::RequestSpec;
use crate::services::endpoints::BASE_URI;

#[derive(Debug, Parser)]
#[command(
    name = "storeprobe",
    version,
    about = "End-to-end checks against a FakeStore-style HTTP JSON API"
)]
pub struct Cli {
    /// Base URL of the API under test.
    #[arg(long, env = "STOREPROBE_BASE_URL", default_value = BASE_URI)]
    pub base_url: String,
    /// Per-request timeout in milliseconds; 0 disables it.
    #[arg(long, env = "STOREPROBE_TIMEOUT_MS", default_value_t = 10_000)]
    pub timeout_ms: u64,
    /// Directory holding the fixture documents.
    #[arg(long, env = "STOREPROBE_FIXTURES", default_value = "testdata", value_name = "DIR")]
    pub fixtures: PathBuf,
    /// Also write a JSON report to this path.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,
    /// User-Agent sent with every request.
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,
    /// Run read-only test methods concurrently before the mutating ones.
    #[arg(long)]
    pub concurrent_reads: bool,
    /// Emit logs as JSON lines.
    #[arg(long)]
    pub log_json: bool,
    /// Print the catalog and exit.
    #[arg(long)]
    pub list: bool,
    /// Test method ids, id prefixes or groups (products, carts, auth).
    #[arg(value_name = "FILTER")]
    pub filters: Vec<String>,
}

/// Validated run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteConfig {
    pub base_url: String,
    /// Zero disables the client-side timeout.
    pub timeout_ms: u64,
    pub fixtures: PathBuf,
    pub report: Option<PathBuf>,
    pub user_agent: String,
    pub concurrent_reads: bool,
    pub filters: Vec<String>,
}

impl SuiteConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let base_url = validate_base_url(&cli.base_url)?;
        if !cli.fixtures.is_dir() {
            return Err(ConfigError::FixtureDir(cli.fixtures.clone()));
        }
        Ok(Self {
            base_url,
            timeout_ms: cli.timeout_ms,
            fixtures: cli.fixtures.clone(),
            report: cli.report.clone(),
            user_agent: cli.user_agent.clone(),
            concurrent_reads: cli.concurrent_reads,
            filters: cli.filters.clone(),
        })
    }

    /// Anonymous request spec for this run.
    pub fn request_spec(&self) -> RequestSpec {
        RequestSpec::builder(self.base_url.as_str())
            .user_agent(self.user_agent.as_str())
            .build()
    }

    /// Key/value pairs embedded in the JSON report.
    pub fn system_info(&self) -> BTreeMap<String, String> {
        let timeout = match self.timeout_ms {
            0 => "none".to_string(),
            ms => format!("{ms} ms"),
        };
        BTreeMap::from([
            ("Application".to_string(), "FakeStore API".to_string()),
            ("Base URL".to_string(), self.base_url.clone()),
            ("Timeout".to_string(), timeout),
            (
                "OS".to_string(),
                format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
            ),
            ("Version".to_string(), env!("CARGO_PKG_VERSION").to_string()),
        ])
    }
}

/// Absolute http(s) URL; a trailing slash is dropped.
fn validate_base_url(raw: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::BaseUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

/// Installs the global subscriber. Logs go to stderr; `RUST_LOG` overrides
/// the default `info` filter.
///
/// Returns `false` when a subscriber was already installed; that one stays
/// in charge and is told about the attempt.
pub fn init_tracing(log_json: bool) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = if log_json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    match installed {
        Ok(()) => true,
        Err(err) => {
            debug!("keeping the existing tracing subscriber: {err}");
            false
        }
    }
}
