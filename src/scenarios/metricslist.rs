// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Metrics allowlists decide which series the collector forwards.

use crate::constants::{
    CUSTOM_ALLOWLIST_NAME, DEFAULT_ALLOWLIST_NAME, MCO_NAMESPACE, POLL_INTERVAL_1S,
    POLL_INTERVAL_5S, TIMEOUT_10M, TIMEOUT_1M,
};
use crate::context::TestContext;
use crate::lifecycle::apply_bundle;
use crate::manifests::Bundle;
use crate::suite::{step, Scenario};
use crate::wait::Poll;
use crate::workloads::{delete_namespaced, get_namespaced};
use anyhow::{anyhow, bail, Context as _};
use k8s_openapi::api::core::v1::ConfigMap;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Metric added by the custom allowlist.
const CUSTOM_METRIC: &str = "node_memory_Active_bytes";

/// Key of the metric list in the allowlist configmaps.
const METRICS_LIST_KEY: &str = "metrics_list.yaml";

/// Most default-allowlist metrics queried in one run.
const MAX_DEFAULT_METRICS: usize = 30;

/// Time budget for querying default-allowlist metrics.
const DEFAULT_METRICS_BUDGET: Duration = Duration::from_secs(30);

#[derive(Debug, Default, Deserialize)]
struct MetricsList {
    #[serde(default)]
    names: Vec<String>,
}

/// Metric names listed in a `metrics_list.yaml` document.
///
/// # Errors
///
/// Returns an error when the document is not valid YAML.
pub fn allowlist_names(metrics_list: &str) -> anyhow::Result<Vec<String>> {
    let list: MetricsList =
        serde_yaml::from_str(metrics_list).context("invalid metrics allowlist")?;
    Ok(list.names)
}

/// Allowlisted names that Prometheus also knows about, in allowlist order.
#[must_use]
pub fn known_metrics(allowlist: &[String], prometheus: &[String]) -> Vec<String> {
    let known: HashSet<&str> = prometheus.iter().map(String::as_str).collect();
    allowlist
        .iter()
        .filter(|name| !name.is_empty() && known.contains(name.as_str()))
        .cloned()
        .collect()
}

fn name_marker(metric: &str) -> Vec<String> {
    vec![format!(r#""__name__":"{metric}""#)]
}

/// Metrics from the custom allowlist become queryable.
pub struct CustomAllowlist;

#[async_trait::async_trait]
impl Scenario for CustomAllowlist {
    fn title(&self) -> &str {
        "[P1][Sev1][Observability] Should have metrics which defined in custom metrics allowlist (metricslist/g0)"
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        step("Adding custom metrics allowlist configmap");
        apply_bundle(ctx, Bundle::MetricsAllowlist).await?;

        step("Waiting for new added metrics on grafana console");
        let metrics = ctx.metrics().await?;
        let expected = name_marker(CUSTOM_METRIC);
        Poll::new(TIMEOUT_10M, POLL_INTERVAL_5S)
            .until("custom allowlist metric", || async {
                metrics
                    .contain_managed_cluster_metric(CUSTOM_METRIC, Some("1m"), &expected)
                    .await?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

/// Deleting the custom allowlist stops its metrics.
pub struct CustomAllowlistDeleted;

#[async_trait::async_trait]
impl Scenario for CustomAllowlistDeleted {
    fn title(&self) -> &str {
        "[P1][Sev1][Observability] Should have no metrics after custom metrics allowlist deleted (metricslist/g0)"
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        step("Deleting custom metrics allowlist configmap");
        Poll::new(TIMEOUT_1M, POLL_INTERVAL_1S)
            .until("custom allowlist deletion", || async {
                delete_namespaced::<ConfigMap>(&ctx.hub, MCO_NAMESPACE, CUSTOM_ALLOWLIST_NAME)
                    .await?;
                Ok(())
            })
            .await?;

        step("Waiting for new added metrics disappear on grafana console");
        let metrics = ctx.metrics().await?;
        let expected = name_marker(CUSTOM_METRIC);
        Poll::new(TIMEOUT_10M, POLL_INTERVAL_5S)
            .until("custom allowlist metric to disappear", || async {
                match metrics
                    .contain_managed_cluster_metric(CUSTOM_METRIC, Some("1m"), &expected)
                    .await
                {
                    Err(err) if err.is_not_found() => Ok(()),
                    Err(err) => Err(err.into()),
                    Ok(()) => bail!("{CUSTOM_METRIC} is still reported"),
                }
            })
            .await?;
        Ok(())
    }
}

/// A sample of the default allowlist is queryable. Disabled by default: the
/// default list is long and many entries only exist on `OpenShift`.
pub struct DefaultAllowlist;

#[async_trait::async_trait]
impl Scenario for DefaultAllowlist {
    fn title(&self) -> &str {
        "[P1][Sev1][Observability] Should have metrics which defined in metrics allowlist (metricslist/g0)"
    }

    fn skip_reason(&self, _ctx: &TestContext) -> Option<String> {
        Some("Skip the test for default metrics allowlist".to_string())
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        let metrics = ctx.metrics().await?;

        step("Getting metrics list from prometheus metadata");
        let prometheus = metrics.prometheus_metrics_metadata().await?;

        step("Getting metrics allowlist from obs configmap");
        let cm: ConfigMap = get_namespaced(&ctx.hub, MCO_NAMESPACE, DEFAULT_ALLOWLIST_NAME).await?;
        let list = cm
            .data
            .as_ref()
            .and_then(|data| data.get(METRICS_LIST_KEY))
            .ok_or_else(|| anyhow!("{DEFAULT_ALLOWLIST_NAME} has no {METRICS_LIST_KEY}"))?;

        step("Get the intersection of two metrics list");
        let names = known_metrics(&allowlist_names(list)?, &prometheus);
        info!(count = names.len(), "Allowlisted metrics known to prometheus");

        step("Get metrics data");
        let start = Instant::now();
        for (i, name) in names.iter().take(MAX_DEFAULT_METRICS).enumerate() {
            if start.elapsed() > DEFAULT_METRICS_BUDGET {
                info!(budget = ?DEFAULT_METRICS_BUDGET, "Time budget used up");
                break;
            }
            debug!(index = i, metric = %name, "Getting metrics data");
            let expected = name_marker(name);
            Poll::new(TIMEOUT_10M, POLL_INTERVAL_5S)
                .until("allowlisted metric", || async {
                    metrics
                        .contain_managed_cluster_metric(name, None, &expected)
                        .await?;
                    Ok(())
                })
                .await?;
        }
        Ok(())
    }
}

/// Cases of this group.
#[must_use]
pub fn cases() -> Vec<Box<dyn Scenario>> {
    vec![
        Box::new(CustomAllowlist),
        Box::new(CustomAllowlistDeleted),
        Box::new(DefaultAllowlist),
    ]
}
