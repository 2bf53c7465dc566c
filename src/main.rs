// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context as _, Result};
use observability_e2e::{
    cli::Cli,
    context::{RunSettings, TestContext},
    options::{self, options_path},
    scenarios,
    suite::run_suite,
};
use std::process::ExitCode;
use tracing::{debug, error, info};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse_normalized();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .thread_name("observability-e2e")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli))
}

fn init_tracing() {
    // Respects RUST_LOG environment variable if set, otherwise defaults to INFO level
    // Respects RUST_LOG_FORMAT environment variable for output format (text or json)
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

async fn async_main(cli: Cli) -> Result<ExitCode> {
    init_tracing();
    info!("Starting observability e2e suite");
    debug!(?cli, "Parsed command line");

    let env_options = std::env::var("OPTIONS").ok();
    let path = options_path(Some(&cli.options), env_options.as_deref());
    let overrides = cli.overrides().with_process_env();
    let options = options::load(&path)
        .await?
        .resolve(&overrides)
        .with_context(|| format!("invalid options file {}", path.display()))?;

    let settings = RunSettings::from_env();
    debug!(?settings, "Run settings");

    let ctx = TestContext::connect(options, settings)
        .await
        .context("failed to connect to the clusters under test")?;

    let cases = scenarios::all();
    let report = run_suite(&ctx, &cases, &cli.filter()).await;

    if let Err(e) = report.write_junit(&cli.report_file).await {
        error!(error = %e, "Failed to write JUnit report");
        return Err(e);
    }

    let (passed, failed, skipped) = report.counts();
    info!(passed, failed, skipped, "Observability e2e suite finished");
    Ok(if report.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
