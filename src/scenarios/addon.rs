// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Metrics collector enablement on the managed side.
//!
//! The MCO switch (`observabilityAddonSpec.enableMetrics`) and the per-cluster
//! opt-out label both have to remove the collector, and the interval field
//! is bounded by the CRD.

use crate::constants::{
    LOCAL_CLUSTER_NAMESPACE, MCO_ADDON_NAME, MCO_ADDON_NAMESPACE, POLL_INTERVAL_5S, TIMEOUT_10M,
    TIMEOUT_1M, TIMEOUT_5M,
};
use crate::context::TestContext;
use crate::errors::ResourceError;
use crate::gvr::{ResourceRef, MCO_ADDON};
use crate::labels::METRICS_COLLECTOR_LABEL;
use crate::managed_cluster::{managed_cluster_names, update_observability};
use crate::suite::{step, AfterEach, Scenario};
use crate::unstructured::{first_condition_message, get_opt};
use crate::wait::Poll;
use crate::workloads::list_pods;
use crate::{mco, resources};
use anyhow::{bail, Context as _};
use kube::Client;
use serde_json::Value;

/// Status message of an addon with metrics disabled.
pub const METRICS_DISABLED_MESSAGE: &str = "enableMetrics is set to False";

/// Metric used to decide whether data is still arriving.
const PROBE_METRIC: &str = "node_memory_MemAvailable_bytes";

async fn wait_collector_pods(managed: &Client, expected: usize) -> anyhow::Result<()> {
    Poll::new(TIMEOUT_5M, POLL_INTERVAL_5S)
        .until("metrics-collector pod count", || async {
            let pods =
                list_pods(managed, MCO_ADDON_NAMESPACE, Some(METRICS_COLLECTOR_LABEL)).await?;
            if pods.len() == expected {
                Ok(())
            } else {
                bail!(
                    "expected {expected} metrics-collector pods, found {}",
                    pods.len()
                )
            }
        })
        .await?;
    Ok(())
}

/// Require an interval update to be rejected with `expected` in the message.
fn expect_rejected(result: Result<(), ResourceError>, expected: &str) -> anyhow::Result<()> {
    match result {
        Ok(()) => bail!("interval was accepted, expected a rejection with {expected:?}"),
        Err(err) if err.to_string().contains(expected) => Ok(()),
        Err(err) => bail!("interval was rejected without {expected:?}: {err}"),
    }
}

/// Disabling metrics in the MCO removes the collector and is reported by
/// every `ObservabilityAddon`.
pub struct DisableMetrics;

#[async_trait::async_trait]
impl Scenario for DisableMetrics {
    fn title(&self) -> &str {
        "should have not the expected MCO addon pods (addon/g0)"
    }

    fn after_each(&self) -> AfterEach {
        AfterEach::DumpAlways
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        step("Modifying MCO cr to disable observabilityaddon");
        mco::set_addon_metrics_enabled(&ctx.hub, &ctx.mco_name, false).await?;
        if mco::addon_metrics_enabled(&ctx.hub, &ctx.mco_name).await? {
            bail!("enableMetrics is still true on {}", ctx.mco_name);
        }

        step("Waiting for MCO addon components scales to 0");
        wait_collector_pods(&ctx.managed, 0).await?;

        for cluster in managed_cluster_names(&ctx.hub).await? {
            let addon = ResourceRef::namespaced(MCO_ADDON, cluster.as_str(), MCO_ADDON_NAME);
            Poll::new(TIMEOUT_1M, POLL_INTERVAL_5S)
                .until("observability addon status", || async {
                    let obj = resources::get(&ctx.hub, &addon).await?;
                    match get_opt(&obj, &["status"]) {
                        Some(Value::Null) | None => bail!("{addon} has no status yet"),
                        Some(_) => Ok(()),
                    }
                })
                .await?;
            Poll::new(TIMEOUT_1M, POLL_INTERVAL_5S)
                .until("observability addon reports metrics disabled", || async {
                    let obj = resources::get(&ctx.hub, &addon).await?;
                    let message = first_condition_message(&obj)?;
                    if message == METRICS_DISABLED_MESSAGE {
                        Ok(())
                    } else {
                        bail!("{addon} reports {message:?}")
                    }
                })
                .await?;
        }
        Ok(())
    }
}

/// With the collector gone no new samples arrive; metrics are re-enabled
/// afterwards.
pub struct NoMetricData;

#[async_trait::async_trait]
impl Scenario for NoMetricData {
    fn title(&self) -> &str {
        "should have not metric data (addon/g0)"
    }

    fn after_each(&self) -> AfterEach {
        AfterEach::DumpAlways
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        step("Waiting for check no metric data in grafana console");
        let metrics = ctx.metrics().await?;
        let expected = [format!(r#""__name__":"{PROBE_METRIC}""#)];
        Poll::new(TIMEOUT_10M, POLL_INTERVAL_5S)
            .until("metric data to stop", || async {
                match metrics
                    .contain_managed_cluster_metric(PROBE_METRIC, Some("90s"), &expected)
                    .await
                {
                    Err(err) if err.is_not_found() => Ok(()),
                    Err(err) => bail!("Check no metric data in grafana console error: {err}"),
                    Ok(()) => bail!("{PROBE_METRIC} is still reported"),
                }
            })
            .await?;

        step("Modifying MCO cr to enable observabilityaddon");
        mco::set_addon_metrics_enabled(&ctx.hub, &ctx.mco_name, true).await?;
        Ok(())
    }
}

/// `observabilityAddonSpec.interval` outside `[15, 3600]` is rejected.
pub struct IntervalBounds;

#[async_trait::async_trait]
impl Scenario for IntervalBounds {
    fn title(&self) -> &str {
        "should not set interval to values beyond scope (addon/g0)"
    }

    fn after_each(&self) -> AfterEach {
        AfterEach::DumpAlways
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        step("Set interval to 14");
        expect_rejected(
            mco::set_addon_interval(&ctx.hub, &ctx.mco_name, 14).await,
            "Invalid value: 15",
        )?;

        step("Set interval to 3601");
        expect_rejected(
            mco::set_addon_interval(&ctx.hub, &ctx.mco_name, 3601).await,
            "Invalid value: 3600",
        )
    }
}

/// The `observability=disabled` label on a `ManagedCluster` removes its
/// collector, and removing the label brings it back.
pub struct ClusterOptOut;

#[async_trait::async_trait]
impl Scenario for ClusterOptOut {
    fn title(&self) -> &str {
        "[P1][Sev1][Observability] Should not have the expected MCO addon pods when disable observability from managed cluster label (addon/g0)"
    }

    fn after_each(&self) -> AfterEach {
        AfterEach::DumpAlways
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        let cluster = ctx
            .options
            .first_managed_cluster()
            .map_or(LOCAL_CLUSTER_NAMESPACE, |c| c.name.as_str());

        step("Set label observability: disabled to managed cluster");
        update_observability(&ctx.hub, cluster, false)
            .await
            .with_context(|| format!("failed to disable observability on {cluster}"))?;
        step("Waiting for MCO addon components scales to 0");
        let disabled = wait_collector_pods(&ctx.managed, 0).await;

        // re-enable even when the wait failed
        step("Remove label observability: disabled from managed cluster");
        update_observability(&ctx.hub, cluster, true)
            .await
            .with_context(|| format!("failed to enable observability on {cluster}"))?;
        disabled?;

        step("Waiting for MCO addon components ready");
        wait_collector_pods(&ctx.managed, 1).await
    }
}

/// Cases of this group.
#[must_use]
pub fn cases() -> Vec<Box<dyn Scenario>> {
    vec![
        Box::new(DisableMetrics),
        Box::new(NoMetricData),
        Box::new(IntervalBounds),
        Box::new(ClusterOptOut),
    ]
}
