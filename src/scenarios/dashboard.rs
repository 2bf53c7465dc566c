// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Grafana dashboards loaded from labelled configmaps.

use crate::constants::{MCO_NAMESPACE, POLL_INTERVAL_5S, SAMPLE_DASHBOARD_NAME, TIMEOUT_3M};
use crate::context::TestContext;
use crate::lifecycle::apply_bundle;
use crate::manifests::Bundle;
use crate::metrics::MetricsVerifier;
use crate::suite::{step, AfterEach, Scenario};
use crate::wait::Poll;
use crate::workloads::delete_namespaced;
use anyhow::bail;
use k8s_openapi::api::core::v1::ConfigMap;

/// Title of the sample dashboard.
pub const DASHBOARD_TITLE: &str = "Sample Dashboard for E2E";

/// Title after the configmap update.
pub const UPDATED_DASHBOARD_TITLE: &str = "Update Sample Dashboard for E2E";

async fn wait_listed(metrics: &MetricsVerifier, title: &str) -> anyhow::Result<()> {
    Poll::new(TIMEOUT_3M, POLL_INTERVAL_5S)
        .until("dashboard listed", || async {
            metrics.contain_dashboard(title).await?;
            Ok(())
        })
        .await?;
    Ok(())
}

async fn wait_unlisted(metrics: &MetricsVerifier, title: &str) -> anyhow::Result<()> {
    Poll::new(TIMEOUT_3M, POLL_INTERVAL_5S)
        .until("dashboard removed", || async {
            match metrics.contain_dashboard(title).await {
                Err(err) if err.is_not_found() => Ok(()),
                Err(err) => Err(err.into()),
                Ok(()) => bail!("dashboard {title:?} is still listed"),
            }
        })
        .await?;
    Ok(())
}

/// The dashboard from the sample configmap shows up in Grafana.
pub struct DashboardCreated;

#[async_trait::async_trait]
impl Scenario for DashboardCreated {
    fn title(&self) -> &str {
        "should have custom dashboard which defined in configmap (dashboard/g0)"
    }

    fn after_each(&self) -> AfterEach {
        AfterEach::DumpAlways
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        step("Creating custom dashboard configmap");
        apply_bundle(ctx, Bundle::SampleDashboard).await?;
        wait_listed(ctx.metrics().await?, DASHBOARD_TITLE).await
    }
}

/// Updating the configmap renames the dashboard.
pub struct DashboardUpdated;

#[async_trait::async_trait]
impl Scenario for DashboardUpdated {
    fn title(&self) -> &str {
        "should have update custom dashboard after configmap updated (dashboard/g0)"
    }

    fn after_each(&self) -> AfterEach {
        AfterEach::DumpAlways
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        step("Updating custom dashboard configmap");
        apply_bundle(ctx, Bundle::UpdatedSampleDashboard).await?;
        let metrics = ctx.metrics().await?;
        wait_unlisted(metrics, DASHBOARD_TITLE).await?;
        wait_listed(metrics, UPDATED_DASHBOARD_TITLE).await
    }
}

/// Deleting the configmap removes the dashboard.
pub struct DashboardDeleted;

#[async_trait::async_trait]
impl Scenario for DashboardDeleted {
    fn title(&self) -> &str {
        "should have no custom dashboard in grafana after related configmap removed(dashboard/g0)"
    }

    fn after_each(&self) -> AfterEach {
        AfterEach::DumpAlways
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        step("Deleting custom dashboard configmap");
        delete_namespaced::<ConfigMap>(&ctx.hub, MCO_NAMESPACE, SAMPLE_DASHBOARD_NAME).await?;
        wait_unlisted(ctx.metrics().await?, UPDATED_DASHBOARD_TITLE).await
    }
}

/// Cases of this group.
#[must_use]
pub fn cases() -> Vec<Box<dyn Scenario>> {
    vec![
        Box::new(DashboardCreated),
        Box::new(DashboardUpdated),
        Box::new(DashboardDeleted),
    ]
}
