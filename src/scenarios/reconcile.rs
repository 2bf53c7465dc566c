// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! MCO spec changes are reconciled into the hub workloads.

use crate::constants::{MCO_NAMESPACE, POLL_INTERVAL_5S, TIMEOUT_10M, TIMEOUT_1M, TIMEOUT_5M};
use crate::context::TestContext;
use crate::labels::K8S_OS;
use crate::mco::{self, AvailabilityConfig};
use crate::suite::{step, AfterEach, Scenario};
use crate::wait::Poll;
use crate::workloads::{
    basic_mode, check_all_pods_affinity, check_all_pods_node_selector, check_components,
    high_mode, require_arg, statefulset_args,
};
use std::collections::BTreeMap;

/// Value written to `retentionResolutionRaw`.
const RESOLUTION_RAW: &str = "3d";

/// `retentionResolutionRaw` shows up on the compact statefulset.
pub struct RetentionResolutionRaw;

#[async_trait::async_trait]
impl Scenario for RetentionResolutionRaw {
    fn title(&self) -> &str {
        "[P2][Sev2][Observability] Should apply retentionResolutionRaw to thanos compact (reconcile/g0)"
    }

    fn after_each(&self) -> AfterEach {
        AfterEach::DumpAlways
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        step("Modifying MCO retentionResolutionRaw filed");
        mco::set_retention_resolution_raw(&ctx.hub, &ctx.mco_name, RESOLUTION_RAW).await?;

        step("Waiting for MCO retentionResolutionRaw filed to take effect");
        let compact = format!("{}-observatorium-thanos-compact", ctx.mco_name);
        let flag = format!("--retention.resolution-raw={RESOLUTION_RAW}");
        Poll::new(TIMEOUT_5M, POLL_INTERVAL_5S)
            .until("retention.resolution-raw on thanos compact", || async {
                let args = statefulset_args(&ctx.hub, MCO_NAMESPACE, &compact).await?;
                require_arg(&args, &flag)
            })
            .await?;
        Ok(())
    }
}

/// Every MCO pod follows `spec.nodeSelector`.
pub struct NodeSelector;

#[async_trait::async_trait]
impl Scenario for NodeSelector {
    fn title(&self) -> &str {
        "[P2][Sev2][Observability] Should schedule all pods by the MCO node selector (reconcile/g0)"
    }

    fn after_each(&self) -> AfterEach {
        AfterEach::DumpAlways
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        step("Adding node selector to MCO cr");
        let selector = BTreeMap::from([(K8S_OS.to_string(), "linux".to_string())]);
        mco::set_node_selector(&ctx.hub, &ctx.mco_name, &selector).await?;

        step("Checking node selector for all pods");
        Poll::new(TIMEOUT_5M, POLL_INTERVAL_5S)
            .until("node selector on all MCO pods", || {
                check_all_pods_node_selector(&ctx.hub, &ctx.mco_name)
            })
            .await?;
        Ok(())
    }
}

/// Pods keep their anti-affinity once the node selector is cleared.
pub struct PodAntiAffinity;

#[async_trait::async_trait]
impl Scenario for PodAntiAffinity {
    fn title(&self) -> &str {
        "[P2][Sev2][Observability] Should keep podAntiAffinity without node selector (reconcile/g0)"
    }

    fn after_each(&self) -> AfterEach {
        AfterEach::DumpAlways
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        step("Deleting node selector from MCO cr");
        mco::set_node_selector(&ctx.hub, &ctx.mco_name, &BTreeMap::new()).await?;

        step("Checking podAntiAffinity for all pods");
        Poll::new(TIMEOUT_5M, POLL_INTERVAL_5S)
            .until("podAntiAffinity on all MCO pods", || {
                check_all_pods_affinity(&ctx.hub)
            })
            .await?;
        Ok(())
    }
}

/// Switching `availabilityConfig` scales the components down and back up.
pub struct AvailabilityModes;

impl AvailabilityModes {
    async fn switch(ctx: &TestContext, mode: AvailabilityConfig) -> anyhow::Result<()> {
        step(&format!("Modifying MCO availabilityConfig to enable {mode} mode"));
        Poll::new(TIMEOUT_1M, POLL_INTERVAL_5S)
            .until("availabilityConfig update", || async {
                mco::set_availability_config(&ctx.hub, &ctx.mco_name, mode).await?;
                Ok(())
            })
            .await?;

        step(&format!("Checking MCO components in {mode} mode"));
        let (components, timeout) = match mode {
            AvailabilityConfig::Basic => (basic_mode(&ctx.mco_name), TIMEOUT_5M),
            AvailabilityConfig::High => (high_mode(&ctx.mco_name), TIMEOUT_10M),
        };
        Poll::new(timeout, POLL_INTERVAL_5S)
            .until("MCO components", || {
                check_components(&ctx.hub, MCO_NAMESPACE, &components)
            })
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Scenario for AvailabilityModes {
    fn title(&self) -> &str {
        "[P2][Sev2][Observability] Should work in basic mode (reconcile/g0)"
    }

    fn after_each(&self) -> AfterEach {
        AfterEach::DumpAlways
    }

    fn skip_reason(&self, ctx: &TestContext) -> Option<String> {
        (!ctx.settings.canary).then(|| "basic mode is only checked in canary".to_string())
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        Self::switch(ctx, AvailabilityConfig::Basic).await?;
        Self::switch(ctx, AvailabilityConfig::High).await
    }
}

/// Cases of this group.
#[must_use]
pub fn cases() -> Vec<Box<dyn Scenario>> {
    vec![
        Box::new(RetentionResolutionRaw),
        Box::new(NodeSelector),
        Box::new(PodAntiAffinity),
        Box::new(AvailabilityModes),
    ]
}
