// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Managed cluster metrics in the Grafana console.

use crate::constants::{POLL_INTERVAL_5S, TIMEOUT_3M};
use crate::context::TestContext;
use crate::managed_cluster::list_ocp_managed_cluster_ids;
use crate::suite::{step, AfterEach, Scenario};
use crate::wait::Poll;
use tracing::info;

/// Metric every collector forwards.
const PROBE_METRIC: &str = "node_memory_MemAvailable_bytes";

/// Oldest `OpenShift` release whose metrics carry a `clusterID` label.
const MIN_OCP_VERSION: &str = "4.6";

/// Query and expected substrings for one `OpenShift` cluster ID.
#[must_use]
pub fn cluster_query(cluster_id: &str) -> (String, Vec<String>) {
    (
        format!(r#"{PROBE_METRIC}{{clusterID="{cluster_id}"}}"#),
        vec![
            format!(r#""__name__":"{PROBE_METRIC}""#),
            format!(r#""clusterID":"{cluster_id}""#),
        ],
    )
}

/// Grafana answers and has data from the managed clusters.
pub struct MetricData;

#[async_trait::async_trait]
impl Scenario for MetricData {
    fn title(&self) -> &str {
        "[P1][Sev1][Observability] Should have metric data in grafana console (grafana/g0)"
    }

    fn after_each(&self) -> AfterEach {
        AfterEach::IntegrityCheck
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        let metrics = ctx.metrics().await?;

        step("Checking the grafana console is reachable");
        metrics.check_grafana_console().await?;

        step("Waiting for metric data in grafana console");
        let expected = vec![format!(r#""__name__":"{PROBE_METRIC}""#)];
        Poll::new(TIMEOUT_3M, POLL_INTERVAL_5S)
            .until("managed cluster metric", || async {
                metrics
                    .contain_managed_cluster_metric(PROBE_METRIC, None, &expected)
                    .await?;
                Ok(())
            })
            .await?;

        step("Checking metric data of every OpenShift managed cluster");
        let ids = list_ocp_managed_cluster_ids(&ctx.hub, MIN_OCP_VERSION).await?;
        info!(clusters = ids.len(), "OpenShift clusters sending metrics");
        for id in &ids {
            let (query, expected) = cluster_query(id);
            Poll::new(TIMEOUT_3M, POLL_INTERVAL_5S)
                .until("OpenShift cluster metric", || async {
                    metrics
                        .contain_managed_cluster_metric(&query, None, &expected)
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
    vec![Box::new(MetricData)]
}
