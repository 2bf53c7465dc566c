// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Alerting: Thanos ruler rules, Alertmanager configuration and delivery to
//! Slack.
//!
//! The cases build on each other: the custom rules configmap created by
//! [`CustomAlertGenerated`] is replaced by [`CustomAlertUpdated`] and removed
//! by [`DeleteCustomRules`].

use crate::constants::{
    ALERTMANAGER_CONFIG_SECRET, MCO_NAMESPACE, POLL_INTERVAL_5S, SLACK_EXPECTED_ALERT_TITLE,
    THANOS_RULER_CUSTOM_RULES, THANOS_RULER_DEFAULT_RULES, TIMEOUT_5M,
};
use crate::context::TestContext;
use crate::lifecycle::apply_bundle;
use crate::manifests::{alertmanager_config_secret, manifest_labels, Bundle};
use crate::notifications::{find_alert, SlackVerifier};
use crate::resources::apply_object;
use crate::suite::{step, AfterEach, Scenario};
use crate::wait::Poll;
use crate::workloads::{
    delete_namespaced, get_namespaced, have_statefulsets_in_namespace, list_pods, pod_name,
    pod_phase, thanos_rule_statefulset,
};
use anyhow::{anyhow, bail, Context as _};
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{ConfigMap, Pod, Secret};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Number of Slack messages inspected per poll.
const SLACK_HISTORY_LIMIT: u32 = 10;

/// Name of the secret or configmap behind the first pod volume of a
/// statefulset.
///
/// # Errors
///
/// Returns an error when the pod template has no volumes or the first one is
/// neither a secret nor a configmap.
pub fn first_volume_source(statefulset: &StatefulSet) -> anyhow::Result<String> {
    let name = statefulset.metadata.name.as_deref().unwrap_or("");
    let volume = statefulset
        .spec
        .as_ref()
        .and_then(|spec| spec.template.spec.as_ref())
        .and_then(|pod| pod.volumes.as_ref())
        .and_then(|volumes| volumes.first())
        .ok_or_else(|| anyhow!("statefulset {name} has no volumes"))?;
    let volume = serde_json::to_value(volume)?;
    volume
        .pointer("/secret/secretName")
        .or_else(|| volume.pointer("/configMap/name"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("first volume of {name} is not a secret or configmap"))
}

/// `ALERTS` query for the rule label of a custom rules manifest, with the
/// substrings a firing alert produces.
///
/// # Errors
///
/// Returns an error when the manifest carries no label.
pub fn alert_query(labels: &BTreeMap<String, String>) -> anyhow::Result<(String, Vec<String>)> {
    let (name, value) = labels
        .iter()
        .next_back()
        .ok_or_else(|| anyhow!("custom rules manifest has no labels"))?;
    let query = format!(r#"ALERTS{{{name}="{value}"}}"#);
    let expected = vec![
        r#""__name__":"ALERTS""#.to_string(),
        format!(r#""{name}":"{value}""#),
    ];
    Ok((query, expected))
}

async fn apply_rules(ctx: &TestContext, bundle: Bundle) -> anyhow::Result<(String, Vec<String>)> {
    let yaml = apply_bundle(ctx, bundle)
        .await?
        .ok_or_else(|| anyhow!("no manifest available for {bundle:?}"))?;
    alert_query(&manifest_labels(&yaml)?)
}

/// Alertmanager mounts its config secret and the ruler its default rules.
pub struct ExpectedStatefulsets;

#[async_trait::async_trait]
impl Scenario for ExpectedStatefulsets {
    fn title(&self) -> &str {
        "[P1,Sev1,observability]should have the expected statefulsets (alert/g0)"
    }

    fn after_each(&self) -> AfterEach {
        AfterEach::DumpAlways
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        step("Checking if STS: Alertmanager and thanos-rule exist");
        let expected = [
            (
                format!("{}-alertmanager", ctx.mco_name),
                ALERTMANAGER_CONFIG_SECRET,
            ),
            (
                thanos_rule_statefulset(&ctx.mco_name),
                THANOS_RULER_DEFAULT_RULES,
            ),
        ];
        for (name, source) in &expected {
            let statefulset: StatefulSet = get_namespaced(&ctx.hub, MCO_NAMESPACE, name).await?;
            step(&format!("The statefulset: {name} should have {source} mounted"));
            let mounted = first_volume_source(&statefulset)?;
            if mounted != *source {
                bail!("statefulset {name} mounts {mounted}, expected {source}");
            }
        }
        Ok(())
    }
}

/// The default rules configmap exists.
pub struct DefaultRulesConfigMap;

#[async_trait::async_trait]
impl Scenario for DefaultRulesConfigMap {
    fn title(&self) -> &str {
        "[P2,Sev2,observability]should have the expected configmap (alert/g0)"
    }

    fn after_each(&self) -> AfterEach {
        AfterEach::DumpAlways
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        step("Checking if CM: thanos-ruler-default-rules is existed");
        let cm: ConfigMap =
            get_namespaced(&ctx.hub, MCO_NAMESPACE, THANOS_RULER_DEFAULT_RULES).await?;
        if cm.metadata.resource_version.as_deref().unwrap_or("").is_empty() {
            bail!("configmap {THANOS_RULER_DEFAULT_RULES} has no resourceVersion");
        }
        debug!(configmap = THANOS_RULER_DEFAULT_RULES, "Configmap exists");
        Ok(())
    }
}

/// No custom rules are installed before the suite adds them.
pub struct NoCustomRulesConfigMap;

#[async_trait::async_trait]
impl Scenario for NoCustomRulesConfigMap {
    fn title(&self) -> &str {
        "[P3,Sev3,observability]should not have the CM: thanos-ruler-custom-rules (alert/g0)"
    }

    fn after_each(&self) -> AfterEach {
        AfterEach::DumpAlways
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        step("Checking if CM: thanos-ruler-custom-rules not existed");
        match get_namespaced::<ConfigMap>(&ctx.hub, MCO_NAMESPACE, THANOS_RULER_CUSTOM_RULES)
            .await
        {
            Ok(_) => bail!("{THANOS_RULER_CUSTOM_RULES} exist within the namespace env"),
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// The Alertmanager config secret exists.
pub struct ConfigSecret;

#[async_trait::async_trait]
impl Scenario for ConfigSecret {
    fn title(&self) -> &str {
        "[P2,Sev2,observability]should have the expected secret (alert/g0)"
    }

    fn after_each(&self) -> AfterEach {
        AfterEach::DumpAlways
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        step("Checking if SECRETS: alertmanager-config is existed");
        let secret: Secret =
            get_namespaced(&ctx.hub, MCO_NAMESPACE, ALERTMANAGER_CONFIG_SECRET).await?;
        debug!(secret = secret.metadata.name.as_deref().unwrap_or(""), "Got secret");
        Ok(())
    }
}

/// A rule that always fires produces an `ALERTS` series.
pub struct CustomAlertGenerated;

#[async_trait::async_trait]
impl Scenario for CustomAlertGenerated {
    fn title(&self) -> &str {
        "[P1,Sev1,observability]should have custom alert generated (alert/g0)"
    }

    fn after_each(&self) -> AfterEach {
        AfterEach::DumpAlways
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        step("Creating custom alert rules");
        let (query, expected) = apply_rules(ctx, Bundle::CustomRulesValid).await?;

        step("Checking alert generated");
        let metrics = ctx.metrics().await?;
        Poll::new(TIMEOUT_5M, POLL_INTERVAL_5S)
            .until("custom alert to fire", || async {
                metrics
                    .contain_managed_cluster_metric(&query, Some("2m"), &expected)
                    .await?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

/// The Alertmanager config is replaced with one delivering to Slack.
pub struct SlackReceiverConfig;

#[async_trait::async_trait]
impl Scenario for SlackReceiverConfig {
    fn title(&self) -> &str {
        "[P1,Sev1,observability]should modify the SECRET: alertmanager-config (alert/g0)"
    }

    fn after_each(&self) -> AfterEach {
        AfterEach::DumpAlways
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        step("Editing the secret, we should be able to add the third partying tools integrations");
        let secret = alertmanager_config_secret(ctx.base_domain(), &ctx.settings.slack_receiver);
        apply_object(&ctx.hub, &secret).await?;
        info!(secret = ALERTMANAGER_CONFIG_SECRET, "Modified alertmanager config");
        Ok(())
    }
}

/// Replacing the rule with one that never fires removes the series.
pub struct CustomAlertUpdated;

#[async_trait::async_trait]
impl Scenario for CustomAlertUpdated {
    fn title(&self) -> &str {
        "[P1,Sev1,observability]should have custom alert updated (alert/g0)"
    }

    fn after_each(&self) -> AfterEach {
        AfterEach::DumpAlways
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        step("Updating custom alert rules");
        let (query, expected) = apply_rules(ctx, Bundle::CustomRulesInvalid).await?;

        step("Checking alert generated");
        let metrics = ctx.metrics().await?;
        Poll::new(TIMEOUT_5M, POLL_INTERVAL_5S)
            .until("custom alert to stop firing", || async {
                match metrics
                    .contain_managed_cluster_metric(&query, Some("1m"), &expected)
                    .await
                {
                    Err(err) if err.is_not_found() => Ok(()),
                    Err(err) => Err(err.into()),
                    Ok(()) => bail!("{query} still returns a series"),
                }
            })
            .await?;
        Ok(())
    }
}

/// Alertmanager and ruler pods run, and the firing alert reaches Slack.
pub struct AlertsDelivered;

impl AlertsDelivered {
    async fn wait_running(ctx: &TestContext) -> anyhow::Result<()> {
        step("Checking that alertmanager and thanos-rule pods are running");
        let pods = list_pods(&ctx.hub, MCO_NAMESPACE, None).await?;
        let names: Vec<String> = pods
            .iter()
            .map(pod_name)
            .filter(|name| name.contains("alertmanager") || name.contains("thanos-rule"))
            .map(str::to_string)
            .collect();
        for name in &names {
            Poll::new(TIMEOUT_5M, POLL_INTERVAL_5S)
                .until("pod Running", || async {
                    let pod: Pod = get_namespaced(&ctx.hub, MCO_NAMESPACE, name).await?;
                    match pod_phase(&pod) {
                        "Running" => Ok(()),
                        phase => bail!("{name} is waiting to run ({phase})"),
                    }
                })
                .await?;
        }

        let alertmanager = format!("{}-alertmanager", ctx.mco_name);
        let ruler = thanos_rule_statefulset(&ctx.mco_name);
        let names = [alertmanager.as_str(), ruler.as_str()];
        have_statefulsets_in_namespace(&ctx.hub, MCO_NAMESPACE, &names).await?;
        Ok(())
    }

    async fn check_slack(ctx: &TestContext, slack: &SlackVerifier) -> anyhow::Result<()> {
        step("Viewing the channel that will hold the alert notifications");
        let bot = slack.bot_info().await?;
        info!(bot = %bot.name, "Found slack bot");
        let channel = slack.channel_info().await?;
        let wanted = ctx.settings.slack_receiver.channel.trim_start_matches('#');
        if channel.name != wanted {
            bail!("slack channel is {}, expected {wanted}", channel.name);
        }
        info!(channel = %channel.name, "Found slack channel for testing");

        let history = slack.history(SLACK_HISTORY_LIMIT).await?;
        if history.is_empty() {
            bail!("slack channel {} has no messages", channel.name);
        }
        for text in history.iter().filter_map(|m| m.attachments.first()).map(|a| &a.text) {
            debug!(text = %text, "Slack message");
        }

        let base_domain = ctx.base_domain();
        Poll::new(TIMEOUT_5M, POLL_INTERVAL_5S)
            .until("alert in slack", || async {
                let history = slack.history(SLACK_HISTORY_LIMIT).await?;
                let alert = find_alert(&history, base_domain)
                    .ok_or_else(|| anyhow!("no new slack alerts has been created"))?;
                info!(title = %alert.title, text = %alert.text, "Viewing alert");
                if alert.title == SLACK_EXPECTED_ALERT_TITLE {
                    Ok(())
                } else {
                    bail!(
                        "alert title is {:?}, expected {SLACK_EXPECTED_ALERT_TITLE:?}",
                        alert.title
                    )
                }
            })
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Scenario for AlertsDelivered {
    fn title(&self) -> &str {
        "[P1,Sev1,observability]should verify that the alerts are created (alert/g0)"
    }

    fn after_each(&self) -> AfterEach {
        AfterEach::DumpAlways
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        Self::wait_running(ctx).await?;
        match ctx.slack() {
            Some(slack) => Self::check_slack(ctx, &slack)
                .await
                .context("slack notification check failed"),
            None => {
                info!("Slack credentials not configured, skipping notification check");
                Ok(())
            }
        }
    }
}

/// The custom rules configmap is removed again.
pub struct DeleteCustomRules;

#[async_trait::async_trait]
impl Scenario for DeleteCustomRules {
    fn title(&self) -> &str {
        "[P2,Sev2,observability]should delete the created configmap (alert/g0)"
    }

    fn after_each(&self) -> AfterEach {
        AfterEach::DumpAlways
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        delete_namespaced::<ConfigMap>(&ctx.hub, MCO_NAMESPACE, THANOS_RULER_CUSTOM_RULES)
            .await?;
        info!(configmap = THANOS_RULER_CUSTOM_RULES, "Deleted custom rules");
        Ok(())
    }
}

/// Cases of this group.
#[must_use]
pub fn cases() -> Vec<Box<dyn Scenario>> {
    vec![
        Box::new(ExpectedStatefulsets),
        Box::new(DefaultRulesConfigMap),
        Box::new(NoCustomRulesConfigMap),
        Box::new(ConfigSecret),
        Box::new(CustomAlertGenerated),
        Box::new(SlackReceiverConfig),
        Box::new(CustomAlertUpdated),
        Box::new(AlertsDelivered),
        Box::new(DeleteCustomRules),
    ]
}
