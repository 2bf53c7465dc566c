// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for context.rs

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::metrics::GrafanaEndpoint;
    use crate::options::Cluster;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> RunSettings {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        RunSettings::from_lookup(|key| env.get(key).cloned())
    }

    fn offline_client() -> Client {
        Client::try_from(kube::Config::new("http://127.0.0.1:1".parse().unwrap())).unwrap()
    }

    #[test]
    fn test_settings_defaults() {
        let settings = settings_from(&[]);
        assert!(!settings.skip_install);
        assert!(!settings.skip_uninstall);
        assert!(!settings.skip_integration_cases);
        assert!(!settings.canary);
        assert!(settings.slack.is_none());
        assert_eq!(settings.slack_receiver, SlackReceiver::default());
        assert!(settings.object_storage.bucket.is_none());
    }

    #[test]
    fn test_settings_flags_require_literal_true() {
        let settings = settings_from(&[
            ("SKIP_INSTALL_STEP", "true"),
            ("SKIP_UNINSTALL_STEP", "TRUE"),
            ("IS_CANARY_ENV", "true"),
            ("SKIP_INTEGRATION_CASES", "1"),
        ]);
        assert!(settings.skip_install);
        assert!(!settings.skip_uninstall);
        assert!(settings.canary);
        assert!(!settings.skip_integration_cases);
    }

    #[test]
    fn test_settings_slack_and_storage() {
        let settings = settings_from(&[
            ("SLACK_WEBHOOK_URL", "https://hooks.example.com/hook"),
            ("SLACK_BOT_OUATH_TOKEN", "xoxb-test"),
            ("SLACK_BOT_ID", "B000TEST"),
            ("SLACK_CHANNEL_ID", "C000TEST"),
            ("BUCKET", "bucket"),
            ("REGION", ""),
        ]);
        assert_eq!(settings.slack_receiver.api_url, "https://hooks.example.com/hook");
        assert_eq!(settings.slack_receiver.channel, "team-observability-test");
        assert_eq!(settings.slack.unwrap().channel_id, "C000TEST");
        assert_eq!(settings.object_storage.bucket.as_deref(), Some("bucket"));
        assert!(settings.object_storage.region.is_none());
    }

    #[test]
    fn test_settings_debug_hides_secrets() {
        let settings = settings_from(&[
            ("SLACK_BOT_OUATH_TOKEN", "xoxb-test"),
            ("SLACK_BOT_ID", "B000TEST"),
            ("SLACK_CHANNEL_ID", "C000TEST"),
            ("AWS_SECRET_ACCESS_KEY", "very-secret"),
        ]);
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("xoxb-test"));
        assert!(!rendered.contains("very-secret"));
    }

    #[tokio::test]
    async fn test_context_without_managed_cluster_uses_hub() {
        let options = TestOptions {
            hub_cluster: Cluster {
                base_domain: "hub.example.com".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let ctx = TestContext::new(
            offline_client(),
            None,
            options,
            RunSettings::default(),
            reqwest::Client::new(),
        );
        assert_eq!(ctx.base_domain(), "hub.example.com");
        assert_eq!(ctx.mco_name, "observability");
        assert!(!ctx.has_managed_cluster());
        assert!(ctx.slack().is_none());

        let ctx = ctx.with_mco_name("other");
        assert_eq!(ctx.mco_name, "other");
    }

    #[tokio::test]
    async fn test_prepared_metrics_verifier_is_used() {
        let verifier = MetricsVerifier::with_endpoints(
            reqwest::Client::new(),
            GrafanaEndpoint {
                base_url: "http://grafana.local/".to_string(),
                host: None,
            },
            "http://prometheus.local",
            "token",
        );
        let ctx = TestContext::new(
            offline_client(),
            None,
            TestOptions::default(),
            RunSettings::default(),
            reqwest::Client::new(),
        )
        .with_metrics_verifier(verifier);

        let metrics = ctx.metrics().await.unwrap();
        assert_eq!(metrics.grafana().base_url, "http://grafana.local/");
    }
}
