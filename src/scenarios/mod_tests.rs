// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the scenario registry

#[cfg(test)]
mod tests {
    use crate::context::{RunSettings, TestContext};
    use crate::options::TestOptions;
    use crate::scenarios::all;
    use crate::suite::{Filter, Scenario};
    use kube::Client;
    use std::collections::{BTreeMap, HashSet};

    fn offline_ctx(options: TestOptions, settings: RunSettings) -> TestContext {
        let client =
            Client::try_from(kube::Config::new("http://127.0.0.1:1".parse().unwrap())).unwrap();
        TestContext::new(client, None, options, settings, reqwest::Client::new())
    }

    fn skipped(ctx: &TestContext) -> Vec<String> {
        all()
            .iter()
            .filter(|s| s.skip_reason(ctx).is_some())
            .map(|s| s.title().to_string())
            .collect()
    }

    #[test]
    fn test_registry_size_and_titles() {
        let cases = all();
        assert_eq!(cases.len(), 39);

        let titles: HashSet<&str> = cases.iter().map(|s| s.title()).collect();
        assert_eq!(titles.len(), cases.len(), "titles must be unique");
        assert!(cases.iter().all(|s| s.title().contains("/g0")));

        assert!(cases[0].title().contains("(ingress/g0)"));
        assert!(cases[38].title().contains("(cluster/g0/hive/clusterimageset)"));
    }

    #[test]
    fn test_focus_selects_group() {
        let filter = Filter {
            focus: vec!["addon/g0".to_string()],
            skip: Vec::new(),
        };
        let selected = all().iter().filter(|s| filter.selects(s.title())).count();
        assert_eq!(selected, 4);

        let filter = Filter {
            focus: Vec::new(),
            skip: vec!["alert/g0".to_string(), "retention/g0".to_string()],
        };
        let selected = all().iter().filter(|s| filter.selects(s.title())).count();
        assert_eq!(selected, 39 - 9 - 5);
    }

    #[tokio::test]
    async fn test_skip_reasons_without_keys_or_canary() {
        let ctx = offline_ctx(TestOptions::default(), RunSettings::default());
        let skipped = skipped(&ctx);

        assert_eq!(skipped.len(), 3);
        assert!(skipped.iter().any(|t| t.contains("metrics allowlist (metricslist/g0)")));
        assert!(skipped.iter().any(|t| t.contains("work in basic mode")));
        assert!(skipped.iter().any(|t| t.contains("hive/clusterimageset")));
    }

    #[tokio::test]
    async fn test_skip_reasons_in_canary_with_keys() {
        let mut options = TestOptions::default();
        options.connection.keys.aws = Some(BTreeMap::from([(
            "awsAccessKeyID".to_string(),
            "AKIATEST".to_string(),
        )]));
        let settings = RunSettings {
            canary: true,
            ..RunSettings::default()
        };
        let ctx = offline_ctx(options, settings);
        let skipped = skipped(&ctx);

        assert_eq!(skipped.len(), 1);
        assert!(skipped[0].contains("metricslist/g0"));
    }
}
