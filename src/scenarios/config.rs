// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! MCO defaults: addon settings and persistent storage.

use crate::constants::{MCO_NAMESPACE, POLL_INTERVAL_5S, TIMEOUT_3M};
use crate::context::TestContext;
use crate::mco::{self, addon_defaults, StorageDefaults};
use crate::suite::{step, AfterEach, Scenario};
use crate::wait::Poll;
use crate::workloads::check_pvcs;
use anyhow::bail;

/// Collection interval the operator defaults to, in seconds.
pub const DEFAULT_INTERVAL: i64 = 30;

/// Metrics are enabled with a 30s interval unless configured otherwise.
pub struct AddonDefaults;

#[async_trait::async_trait]
impl Scenario for AddonDefaults {
    fn title(&self) -> &str {
        "[P1][Sev1][Observability] Checking metrics default values on managed cluster (config/g0)"
    }

    fn after_each(&self) -> AfterEach {
        AfterEach::DumpAlways
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        step("Checking observabilityAddonSpec defaults");
        let obj = mco::get_v1beta1(&ctx.hub, &ctx.mco_name).await?;
        let (enabled, interval) = addon_defaults(&obj)?;
        if !enabled {
            bail!("enableMetrics is false, expected true");
        }
        if interval != DEFAULT_INTERVAL {
            bail!("interval is {interval}, expected {DEFAULT_INTERVAL}");
        }
        Ok(())
    }
}

/// PVCs use the size and storage class from the MCO, or the default class.
pub struct StorageClassDefaults;

#[async_trait::async_trait]
impl Scenario for StorageClassDefaults {
    fn title(&self) -> &str {
        "[P1][Sev1][Observability] Checking default value of PVC and StorageClass (config/g0)"
    }

    fn after_each(&self) -> AfterEach {
        AfterEach::DumpAlways
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        let obj = mco::get_v1beta1(&ctx.hub, &ctx.mco_name).await?;
        let storage = StorageDefaults::from_v1beta1(&obj)?;

        step("Checking PVC size and storage class");
        Poll::new(TIMEOUT_3M, POLL_INTERVAL_5S)
            .until("PVC defaults", || check_pvcs(&ctx.hub, MCO_NAMESPACE, &storage))
            .await?;
        Ok(())
    }
}

/// Cases of this group.
#[must_use]
pub fn cases() -> Vec<Box<dyn Scenario>> {
    vec![Box::new(AddonDefaults), Box::new(StorageClassDefaults)]
}
