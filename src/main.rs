use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use storeprobe::cli::{Cli, SuiteConfig, init_tracing};
use storeprobe::suites::{self, Suite};
use storeprobe::testing::{ConsoleReporter, FixtureStore, JsonReportWriter, Reporters};

/// Exit status for configuration problems found before any test runs.
const CONFIG_ERROR: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let catalog = suites::catalog();
    if cli.list {
        for case in &catalog {
            println!("{:<12} {:<9} {}", case.id(), case.info.group, case.info.description);
        }
        return ExitCode::SUCCESS;
    }

    let config = match SuiteConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            eprintln!("error: {err}");
            return ExitCode::from(CONFIG_ERROR);
        }
    };
    let selected = match suites::select(&catalog, &config.filters) {
        Ok(selected) => selected,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(CONFIG_ERROR);
        }
    };

    let mut reporters = Reporters::new().with(Arc::new(ConsoleReporter::new()));
    if let Some(path) = &config.report {
        reporters = reporters.with(Arc::new(JsonReportWriter::new(path, config.system_info())));
    }

    let suite = match Suite::connect(
        config.request_spec(),
        config.timeout_ms,
        FixtureStore::new(&config.fixtures),
        Arc::new(reporters),
    ) {
        Ok(suite) => suite,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(CONFIG_ERROR);
        }
    };

    info!(
        base_url = %config.base_url,
        methods = selected.len(),
        "running API checks"
    );
    let summary = suite.run(&selected, config.concurrent_reads).await;
    print!("{}", summary.render());
    summary.exit_code()
}
