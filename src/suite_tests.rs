// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `suite.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::context::RunSettings;
    use crate::options::TestOptions;
    use anyhow::bail;
    use chrono::{TimeZone, Utc};
    use kube::Client;

    struct Fixed {
        title: &'static str,
        fail: bool,
        skip: Option<&'static str>,
    }

    #[async_trait::async_trait]
    impl Scenario for Fixed {
        fn title(&self) -> &str {
            self.title
        }

        fn skip_reason(&self, _ctx: &TestContext) -> Option<String> {
            self.skip.map(str::to_string)
        }

        async fn run(&self, _ctx: &TestContext) -> anyhow::Result<()> {
            if self.fail {
                bail!("metrics collector pod still present");
            }
            Ok(())
        }
    }

    struct Panics;

    #[async_trait::async_trait]
    impl Scenario for Panics {
        fn title(&self) -> &str {
            "panics (addon/g0)"
        }

        fn after_each(&self) -> AfterEach {
            AfterEach::DumpOnFailure
        }

        async fn run(&self, _ctx: &TestContext) -> anyhow::Result<()> {
            panic!("index out of bounds");
        }
    }

    async fn explode() -> anyhow::Result<()> {
        panic!("unexpected shape");
    }

    fn offline_ctx() -> TestContext {
        let client =
            Client::try_from(kube::Config::new("http://127.0.0.1:1".parse().unwrap())).unwrap();
        TestContext::new(
            client,
            None,
            TestOptions::default(),
            RunSettings::default(),
            reqwest::Client::new(),
        )
    }

    #[test]
    fn test_filter_focus_and_skip() {
        let all = Filter::default();
        assert!(all.selects("anything (addon/g0)"));

        let filter = Filter {
            focus: vec!["addon/g0".to_string(), "alert/g0".to_string()],
            skip: vec!["Slack".to_string()],
        };
        assert!(filter.selects("disable metrics (addon/g0)"));
        assert!(filter.selects("custom rules (alert/g0)"));
        assert!(!filter.selects("Slack notification (alert/g0)"));
        assert!(!filter.selects("retention (retention/g0)"));
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned boom"));
        assert_eq!(panic_message(payload.as_ref()), "owned boom");
        let payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }

    #[tokio::test]
    async fn test_recover_turns_panic_into_error() {
        let err = recover(explode()).await.unwrap_err();
        assert_eq!(err.to_string(), "panicked: unexpected shape");
        assert!(recover(async { Ok::<(), anyhow::Error>(()) }).await.is_ok());
    }

    #[tokio::test]
    async fn test_run_case_outcomes() {
        let ctx = offline_ctx();

        let passed = run_case(
            &ctx,
            &Fixed {
                title: "passes (config/g0)",
                fail: false,
                skip: None,
            },
        )
        .await;
        assert_eq!(passed.outcome, Outcome::Passed);

        let skipped = run_case(
            &ctx,
            &Fixed {
                title: "needs cloud keys (cluster/g0)",
                fail: false,
                skip: Some("no cloud connection keys"),
            },
        )
        .await;
        assert_eq!(
            skipped.outcome,
            Outcome::Skipped("no cloud connection keys".to_string())
        );

        let failed = run_case(
            &ctx,
            &Fixed {
                title: "fails (addon/g0)",
                fail: true,
                skip: None,
            },
        )
        .await;
        assert_eq!(
            failed.outcome,
            Outcome::Failed("metrics collector pod still present".to_string())
        );

        // a panic fails only its own case
        let panicked = run_case(&ctx, &Panics).await;
        assert!(panicked.failed());
    }

    #[test]
    fn test_report_counts_and_junit() {
        let report = SuiteReport {
            results: vec![
                CaseResult {
                    title: INSTALL_CASE.to_string(),
                    outcome: Outcome::Passed,
                    duration: Duration::from_secs(3),
                },
                CaseResult {
                    title: "disable metrics (addon/g0)".to_string(),
                    outcome: Outcome::Failed("timed out\nlast error: NotFound".to_string()),
                    duration: Duration::from_secs(1),
                },
                CaseResult {
                    title: "clusterimageset (cluster/g0/hive/clusterimageset)".to_string(),
                    outcome: Outcome::Skipped("no cloud connection keys".to_string()),
                    duration: Duration::ZERO,
                },
            ],
            duration: Duration::from_secs(4),
            started_at: Utc.with_ymd_and_hms(2025, 11, 29, 23, 45, 0).unwrap(),
        };
        assert_eq!(report.counts(), (1, 1, 1));
        assert!(!report.passed());

        let xml = report.to_junit().to_string().unwrap();
        assert!(xml.contains("Observability E2E Suite"));
        assert!(xml.contains("disable metrics (addon/g0)"));
        assert!(xml.contains("<failure"));
        assert!(xml.contains("<skipped"));
        assert!(xml.contains("2025-11-29T23:45:00"));
    }

    #[tokio::test]
    async fn test_write_junit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.xml");
        let report = SuiteReport::default();
        assert!(report.passed());
        report.write_junit(&path).await.unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<?xml"));
    }
}
