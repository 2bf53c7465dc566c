// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Ordered scenario runner.
//!
//! The suite runs install, then every selected scenario in registry order,
//! then uninstall. Each case runs inside its own recovery boundary: an error
//! or a panic fails that case only and the suite moves on.
//!
//! # After-each hooks
//!
//! Every scenario names an [`AfterEach`] hook that runs once the case body
//! finishes, whatever its outcome:
//!
//! - [`AfterEach::DumpAlways`] logs not-ready pods on both sides
//! - [`AfterEach::DumpOnFailure`] logs the MCO object and pods when the case failed
//! - [`AfterEach::IntegrityCheck`] dumps on failure and otherwise runs the
//!   component integrity check, which can still fail the case
//!
//! # Reporting
//!
//! Results are collected into a [`SuiteReport`], which renders a JUnit XML
//! document with `quick-junit`.

use crate::constants::SUITE_NAME;
use crate::context::TestContext;
use crate::{debug, lifecycle, workloads};
use anyhow::{anyhow, Context as _};
use chrono::{DateTime, Utc};
use futures::FutureExt as _;
use quick_junit::{NonSuccessKind, Report, TestCase, TestCaseStatus, TestSuite};
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{error, info, info_span, warn, Instrument as _};

/// Title of the install hook in the report.
pub const INSTALL_CASE: &str = "[BeforeSuite] install";

/// Title of the uninstall hook in the report.
pub const UNINSTALL_CASE: &str = "[AfterSuite] uninstall";

/// Log one step of the current case.
pub fn step(description: &str) {
    info!("STEP: {description}");
}

/// Hook run after every case of a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterEach {
    /// Log not-ready MCO and addon pods
    DumpAlways,
    /// Log the MCO object and not-ready pods when the case failed
    DumpOnFailure,
    /// Dump on failure, integrity check on success
    IntegrityCheck,
}

/// One test case.
///
/// The title carries the focus tag, e.g.
/// `"[P1][Sev1][observability] Should not have metrics collector pod (addon/g0)"`.
#[async_trait::async_trait]
pub trait Scenario: Send + Sync {
    /// Case title used for filtering and reporting
    fn title(&self) -> &str;

    /// Hook to run after the case body
    fn after_each(&self) -> AfterEach {
        AfterEach::DumpOnFailure
    }

    /// Reason to skip the case in this environment, if any
    fn skip_reason(&self, _ctx: &TestContext) -> Option<String> {
        None
    }

    /// Case body
    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()>;
}

/// Substring filters over case titles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    /// A case must contain one of these, when any are given
    pub focus: Vec<String>,
    /// A case containing any of these is skipped
    pub skip: Vec<String>,
}

impl Filter {
    /// Whether `title` passes the filters.
    #[must_use]
    pub fn selects(&self, title: &str) -> bool {
        let focused =
            self.focus.is_empty() || self.focus.iter().any(|f| title.contains(f.as_str()));
        let skipped = self.skip.iter().any(|s| title.contains(s.as_str()));
        focused && !skipped
    }
}

/// Outcome of one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Case body and hook succeeded
    Passed,
    /// Case body, panic or hook failure message
    Failed(String),
    /// Skip reason
    Skipped(String),
}

/// Result of one case.
#[derive(Debug, Clone)]
pub struct CaseResult {
    /// Case title
    pub title: String,
    /// What happened
    pub outcome: Outcome,
    /// Wall time spent in the body and hook
    pub duration: Duration,
}

impl CaseResult {
    fn skipped(title: &str, reason: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            outcome: Outcome::Skipped(reason.into()),
            duration: Duration::ZERO,
        }
    }

    /// Whether the case failed.
    #[must_use]
    pub fn failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed(_))
    }
}

/// Results of a whole run.
#[derive(Debug, Clone, Default)]
pub struct SuiteReport {
    /// Results in execution order, including install and uninstall
    pub results: Vec<CaseResult>,
    /// Wall time of the run
    pub duration: Duration,
    /// When the run started
    pub started_at: DateTime<Utc>,
}

impl SuiteReport {
    /// Whether no case failed.
    #[must_use]
    pub fn passed(&self) -> bool {
        !self.results.iter().any(CaseResult::failed)
    }

    /// Count of `(passed, failed, skipped)` cases.
    #[must_use]
    pub fn counts(&self) -> (usize, usize, usize) {
        self.results
            .iter()
            .fold((0, 0, 0), |(p, f, s), r| match r.outcome {
                Outcome::Passed => (p + 1, f, s),
                Outcome::Failed(_) => (p, f + 1, s),
                Outcome::Skipped(_) => (p, f, s + 1),
            })
    }

    /// JUnit document for the run.
    #[must_use]
    pub fn to_junit(&self) -> Report {
        let mut suite = TestSuite::new(SUITE_NAME);
        for result in &self.results {
            let status = match &result.outcome {
                Outcome::Passed => TestCaseStatus::success(),
                Outcome::Failed(message) => {
                    let mut status = TestCaseStatus::non_success(NonSuccessKind::Failure);
                    status.set_message(first_line(message));
                    status.set_description(message.as_str());
                    status
                }
                Outcome::Skipped(reason) => {
                    let mut status = TestCaseStatus::skipped();
                    status.set_message(reason.as_str());
                    status
                }
            };
            let mut case = TestCase::new(result.title.as_str(), status);
            case.set_time(result.duration);
            suite.add_test_case(case);
        }
        suite.set_time(self.duration);
        suite.set_timestamp(self.started_at);

        let mut report = Report::new(SUITE_NAME);
        report.set_time(self.duration);
        report.set_timestamp(self.started_at);
        report.add_test_suite(suite);
        report
    }

    /// Write the JUnit document to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error when the report cannot be serialized or written.
    pub async fn write_junit(&self, path: &Path) -> anyhow::Result<()> {
        let xml = self
            .to_junit()
            .to_string()
            .context("failed to serialize JUnit report")?;
        tokio::fs::write(path, xml)
            .await
            .with_context(|| format!("failed to write report {}", path.display()))?;
        info!(path = %path.display(), "Wrote JUnit report");
        Ok(())
    }
}

fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or(message)
}

/// Message of a caught panic payload.
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Await `fut`, turning a panic into an error.
///
/// # Errors
///
/// Returns the future's own error, or `panicked: <message>`.
pub async fn recover<F>(fut: F) -> anyhow::Result<()>
where
    F: Future<Output = anyhow::Result<()>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(anyhow!("panicked: {}", panic_message(payload.as_ref()))),
    }
}

async fn run_after_each(
    ctx: &TestContext,
    hook: AfterEach,
    result: anyhow::Result<()>,
) -> anyhow::Result<()> {
    match hook {
        AfterEach::DumpAlways => {
            debug::print_pods_status(ctx).await;
            result
        }
        AfterEach::DumpOnFailure => {
            if result.is_err() {
                debug::dump_all(ctx).await;
            }
            result
        }
        AfterEach::IntegrityCheck => {
            if result.is_err() {
                debug::dump_all(ctx).await;
                return result;
            }
            recover(workloads::integrity_check(&ctx.hub, &ctx.managed, &ctx.mco_name))
                .await
                .context("integrity check after case failed")
        }
    }
}

fn failure_message(err: &anyhow::Error) -> String {
    format!("{err:#}")
}

/// Run one case with its after-each hook.
pub async fn run_case(ctx: &TestContext, scenario: &dyn Scenario) -> CaseResult {
    let title = scenario.title();
    if let Some(reason) = scenario.skip_reason(ctx) {
        info!(case = title, reason = %reason, "Skipping case");
        return CaseResult::skipped(title, reason);
    }

    let span = info_span!("case", title = title);
    let start = Instant::now();
    let outcome = async {
        info!("Running case");
        let result = recover(scenario.run(ctx)).await;
        let result = run_after_each(ctx, scenario.after_each(), result).await;
        match result {
            Ok(()) => {
                info!(elapsed = ?start.elapsed(), "Case passed");
                Outcome::Passed
            }
            Err(err) => {
                let message = failure_message(&err);
                error!(elapsed = ?start.elapsed(), error = %message, "Case failed");
                Outcome::Failed(message)
            }
        }
    }
    .instrument(span)
    .await;

    CaseResult {
        title: title.to_string(),
        outcome,
        duration: start.elapsed(),
    }
}

async fn run_hook<F>(title: &str, fut: F) -> CaseResult
where
    F: Future<Output = anyhow::Result<()>>,
{
    let start = Instant::now();
    let outcome = match recover(fut).instrument(info_span!("case", title = title)).await {
        Ok(()) => Outcome::Passed,
        Err(err) => {
            let message = failure_message(&err);
            error!(case = title, error = %message, "Suite hook failed");
            Outcome::Failed(message)
        }
    };
    CaseResult {
        title: title.to_string(),
        outcome,
        duration: start.elapsed(),
    }
}

/// Run `scenarios` in order between install and uninstall.
///
/// Cases rejected by `filter` are reported as skipped. When install fails no
/// case runs, but uninstall still does.
pub async fn run_suite(
    ctx: &TestContext,
    scenarios: &[Box<dyn Scenario>],
    filter: &Filter,
) -> SuiteReport {
    let start = Instant::now();
    let started_at = Utc::now();
    let mut results = Vec::with_capacity(scenarios.len() + 2);

    let install = run_hook(INSTALL_CASE, lifecycle::install(ctx)).await;
    let installed = !install.failed();
    results.push(install);

    for scenario in scenarios {
        let title = scenario.title();
        if !installed {
            results.push(CaseResult::skipped(title, "install failed"));
        } else if !filter.selects(title) {
            results.push(CaseResult::skipped(title, "filtered out"));
        } else {
            results.push(run_case(ctx, scenario.as_ref()).await);
        }
    }

    results.push(run_hook(UNINSTALL_CASE, lifecycle::uninstall(ctx)).await);

    let report = SuiteReport {
        results,
        duration: start.elapsed(),
        started_at,
    };
    let (passed, failed, skipped) = report.counts();
    if failed > 0 {
        warn!(passed, failed, skipped, elapsed = ?report.duration, "Suite finished with failures");
    } else {
        info!(passed, failed, skipped, elapsed = ?report.duration, "Suite finished");
    }
    report
}

#[cfg(test)]
#[path = "suite_tests.rs"]
mod suite_tests;
