// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The addon `ManifestWork` is recreated after deletion without losing data.

use crate::constants::{
    ENDPOINT_MANIFESTWORK_NAME, POLL_INTERVAL_3S, POLL_INTERVAL_5S, TIMEOUT_1M, TIMEOUT_3M,
};
use crate::context::TestContext;
use crate::gvr::{ResourceRef, MANIFEST_WORK};
use crate::managed_cluster::managed_cluster_names;
use crate::resources;
use crate::suite::{step, AfterEach, Scenario};
use crate::wait::Poll;

/// Metric checked after the `ManifestWork` comes back.
const PROBE_METRIC: &str = "node_memory_MemAvailable_bytes";

/// Deleting `endpoint-observability-work` is undone within a minute.
pub struct ManifestWorkRecreated;

#[async_trait::async_trait]
impl Scenario for ManifestWorkRecreated {
    fn title(&self) -> &str {
        "should be automatically created within 1 minute when delete manifestwork (manifestwork/g0)"
    }

    fn after_each(&self) -> AfterEach {
        AfterEach::DumpAlways
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        let metrics = ctx.metrics().await?;
        let expected = [format!(r#""__name__":"{PROBE_METRIC}""#)];

        for cluster in managed_cluster_names(&ctx.hub).await? {
            let work = ResourceRef::namespaced(
                MANIFEST_WORK,
                cluster.as_str(),
                ENDPOINT_MANIFESTWORK_NAME,
            );

            step("Waiting for manifestwork to be deleted");
            Poll::new(TIMEOUT_3M, POLL_INTERVAL_5S)
                .until("manifestwork deletion", || async {
                    resources::delete(&ctx.hub, &work).await?;
                    Ok(())
                })
                .await?;

            step("Waiting for manifestwork to be created automatically");
            Poll::new(TIMEOUT_1M, POLL_INTERVAL_5S)
                .until("manifestwork recreated", || async {
                    resources::get(&ctx.hub, &work).await?;
                    Ok(())
                })
                .await?;

            step("Checking metric to ensure that no data is lost in 1 minute");
            Poll::new(TIMEOUT_1M, POLL_INTERVAL_3S)
                .until("metric after manifestwork recreation", || async {
                    metrics
                        .contain_managed_cluster_metric(PROBE_METRIC, Some("1m"), &expected)
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
    vec![Box::new(ManifestWorkRecreated)]
}
