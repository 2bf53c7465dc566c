// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Install and uninstall of the observability stack around the suite.
//!
//! Install applies the namespace, secrets, RBAC and MCO instances, then
//! waits for the operator to bring every component to High mode and for the
//! addon to reach the managed cluster. Uninstall deletes the MCO and waits
//! for everything it owns to disappear. Neither step rolls back on failure.

use crate::constants::{
    CLUSTER_MANAGEMENT_ADDON_NAME, CONDITION_READY, LOCAL_CLUSTER_NAMESPACE, MCO_ADDON_NAME,
    MCO_ADDON_NAMESPACE, MCO_NAMESPACE, MCO_OPERATOR_CONTAINER, MCO_OPERATOR_NAMESPACE,
    MCO_PULL_SECRET_NAME, OBJ_SECRET_NAME, OPERATOR_LOG_TAIL_LINES, PLACEMENT_RULE_NAME,
    POLL_INTERVAL_1S, POLL_INTERVAL_5S, REQUIRED_CRDS, TIMEOUT_10M, TIMEOUT_1M, TIMEOUT_20M,
    TIMEOUT_25M, TIMEOUT_5M,
};
use crate::context::TestContext;
use crate::errors::ResourceError;
use crate::gvr::{ResourceRef, CLUSTER_MANAGEMENT_ADDON, MCO_ADDON, PLACEMENT_RULE};
use crate::labels::{MCO_LABEL, METRICS_COLLECTOR_LABEL};
use crate::manifests::{self, Bundle};
use crate::managed_cluster::managed_cluster_names;
use crate::suite::step;
use crate::unstructured::status_contains_condition_type;
use crate::wait::Poll;
use crate::workloads::{
    check_addon_pods, check_components, delete_namespaced, get_cluster, get_namespaced, have_crds,
    high_mode, list_pods, pod_name, pod_phase,
};
use crate::{debug, mco, resources};
use anyhow::{anyhow, bail, Context as _, Result};
use k8s_openapi::api::core::v1::{Namespace, Pod, Secret};
use kube::api::{DeleteParams, Patch, PatchParams};
use kube::{Api, Client};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, error, info, warn};

/// The single operator pod, which must be `Running`.
///
/// # Errors
///
/// Returns an error when there is not exactly one pod or it is not running.
pub fn single_running_pod(pods: &[Pod]) -> Result<&Pod> {
    let [pod] = pods else {
        bail!("expected exactly 1 MCO operator pod, found {}", pods.len());
    };
    if pod_name(pod).is_empty() {
        bail!("MCO operator pod has no name");
    }
    if pod_phase(pod) != "Running" {
        bail!(
            "MCO operator pod {} is {}, expected Running",
            pod_name(pod),
            pod_phase(pod)
        );
    }
    Ok(pod)
}

/// Name of the running MCO operator pod.
///
/// # Errors
///
/// Returns the list error or a [`single_running_pod`] failure.
pub async fn check_operator_pod(client: &Client) -> Result<String> {
    let pods = list_pods(client, MCO_OPERATOR_NAMESPACE, Some(MCO_LABEL)).await?;
    Ok(pod_name(single_running_pod(&pods)?).to_string())
}

/// Render a bundle and apply it to the hub.
///
/// Returns the rendered YAML, or `None` when the bundle is only available
/// from a manifests directory and none is configured.
///
/// # Errors
///
/// Returns the render or apply error.
pub async fn apply_bundle(ctx: &TestContext, bundle: Bundle) -> Result<Option<String>> {
    let Some(yaml) = manifests::render(bundle, ctx.options.manifests_dir(), &ctx.mco_name).await?
    else {
        debug!(bundle = ?bundle, "No manifests for bundle, skipping");
        return Ok(None);
    };
    resources::apply_yaml(&ctx.hub, &yaml)
        .await
        .with_context(|| format!("failed to apply {bundle:?}"))?;
    Ok(Some(yaml))
}

/// Copy the operator pull secret into the MCO namespace.
///
/// # Errors
///
/// Returns an error when the source secret cannot be read or the copy applied.
pub async fn create_pull_secret(client: &Client) -> Result<()> {
    let source: Secret =
        get_namespaced(client, MCO_OPERATOR_NAMESPACE, MCO_PULL_SECRET_NAME).await?;
    let copy = manifests::copy_secret(&source, MCO_NAMESPACE);
    let value = serde_json::to_value(&copy).context("failed to serialize pull secret")?;
    resources::apply_object(client, &value).await
}

/// Patch the `PlacementRule` status with one decision per cluster.
///
/// # Errors
///
/// Returns a classified [`ResourceError`].
pub async fn patch_placement_rule(client: &Client, clusters: &[String]) -> Result<()> {
    let target = ResourceRef::namespaced(PLACEMENT_RULE, MCO_NAMESPACE, PLACEMENT_RULE_NAME);
    let patch = manifests::placement_decisions(clusters);
    target
        .api(client)
        .patch_status(&target.name, &PatchParams::default(), &Patch::Merge(&patch))
        .await
        .map_err(|e| ResourceError::from_kube(e, target.gvr.plural, &target.name))?;
    info!(clusters = ?clusters, "Patched placement rule decisions");
    Ok(())
}

async fn wait_cluster_management_addon(client: &Client) -> Result<()> {
    step("Check clustermanagementaddon CR is created");
    let target = ResourceRef::cluster(CLUSTER_MANAGEMENT_ADDON, CLUSTER_MANAGEMENT_ADDON_NAME);
    Poll::new(TIMEOUT_1M, POLL_INTERVAL_1S)
        .until("clustermanagementaddon", || async {
            resources::get(client, &target).await?;
            Ok(())
        })
        .await?;
    Ok(())
}

async fn wait_mco_ready(ctx: &TestContext) -> Result<()> {
    step("Waiting for MCO ready status");
    Poll::new(TIMEOUT_20M, POLL_INTERVAL_5S)
        .until("MCO Ready condition", || async {
            let instance = mco::get_v1beta1(&ctx.hub, &ctx.mco_name)
                .await
                .map_err(|_| anyhow!("Wait for reconciling."))?;
            if status_contains_condition_type(&instance, CONDITION_READY) {
                return Ok(());
            }
            let status = instance.get("status").unwrap_or(&Value::Null);
            bail!("MCO components are not ready, check the MCO CR status for the details: {status}")
        })
        .await?;
    Ok(())
}

async fn check_conversion_if_present(ctx: &TestContext) -> Result<()> {
    let Some(dir) = ctx.options.manifests_dir() else {
        return Ok(());
    };
    let golden = manifests::conversion_golden(dir);
    if !tokio::fs::try_exists(&golden).await.unwrap_or(false) {
        debug!(path = %golden.display(), "No conversion golden file");
        return Ok(());
    }
    step("Check the api conversion is working as expected");
    mco::check_conversion(&ctx.hub, &ctx.mco_name, &golden).await
}

async fn wait_high_mode(ctx: &TestContext) -> Result<()> {
    step("Waiting for MCO ready status");
    let components = high_mode(&ctx.mco_name);
    let result = Poll::new(TIMEOUT_25M, POLL_INTERVAL_5S)
        .until("MCO components in High mode", || {
            check_components(&ctx.hub, MCO_NAMESPACE, &components)
        })
        .await;
    if result.is_err() {
        debug::print_mco_pods_status(ctx).await;
    }
    result?;
    Ok(())
}

async fn wait_placement_rule(client: &Client) -> Result<()> {
    step("Checking placementrule CR is created");
    let target = ResourceRef::namespaced(PLACEMENT_RULE, MCO_NAMESPACE, PLACEMENT_RULE_NAME);
    Poll::new(TIMEOUT_10M, POLL_INTERVAL_5S)
        .until("placementrule", || async {
            resources::get(client, &target).await?;
            Ok(())
        })
        .await?;
    Ok(())
}

async fn wait_metrics_collector(managed: &Client) -> Result<()> {
    step("Waiting for MCO addon components ready");
    Poll::new(TIMEOUT_5M, POLL_INTERVAL_5S)
        .until("one metrics-collector pod", || async {
            let pods =
                list_pods(managed, MCO_ADDON_NAMESPACE, Some(METRICS_COLLECTOR_LABEL)).await?;
            if pods.len() == 1 {
                Ok(())
            } else {
                bail!("expected 1 metrics-collector pod, found {}", pods.len())
            }
        })
        .await?;
    Poll::new(TIMEOUT_5M, POLL_INTERVAL_5S)
        .until("addon deployments available", || check_addon_pods(managed))
        .await?;
    Ok(())
}

async fn install_mco(ctx: &TestContext) -> Result<()> {
    let settings = &ctx.settings;

    step("Checking Required CRDs is existed");
    Poll::new(TIMEOUT_1M, POLL_INTERVAL_1S)
        .until("required CRDs", || have_crds(&ctx.hub, &REQUIRED_CRDS))
        .await?;

    resources::apply_object(&ctx.hub, &manifests::namespace(MCO_NAMESPACE)).await?;
    if settings.canary {
        create_pull_secret(&ctx.hub).await?;
        let secret = manifests::object_storage_secret(&settings.object_storage)?;
        resources::apply_object(&ctx.hub, &secret).await?;
    }

    apply_bundle(ctx, Bundle::Policy).await?;

    if !settings.canary {
        step("Creating the MCO testing RBAC resources");
        for obj in manifests::testing_rbac() {
            resources::apply_object(&ctx.hub, &obj).await?;
        }
    }

    if !settings.skip_integration_cases {
        step("Creating MCO instance of v1beta1");
        apply_bundle(ctx, Bundle::McoV1beta1).await?;
        wait_mco_ready(ctx).await?;
        wait_cluster_management_addon(&ctx.hub).await?;
        check_conversion_if_present(ctx).await?;
    }

    step("Apply MCO instance of v1beta2");
    apply_bundle(ctx, Bundle::McoV1beta2).await?;
    wait_high_mode(ctx).await?;
    wait_placement_rule(&ctx.hub).await?;

    if !settings.canary {
        step("Patching the placementrule CR's status");
        let clusters = managed_cluster_names(&ctx.hub).await?;
        Poll::new(TIMEOUT_1M, POLL_INTERVAL_1S)
            .until("placementrule status patch", || {
                patch_placement_rule(&ctx.hub, &clusters)
            })
            .await?;
        wait_metrics_collector(&ctx.managed).await?;
    }

    wait_cluster_management_addon(&ctx.hub).await
}

async fn dump_operator_logs(client: &Client, pod: &str) {
    match debug::pod_logs(
        client,
        MCO_OPERATOR_NAMESPACE,
        pod,
        MCO_OPERATOR_CONTAINER,
        OPERATOR_LOG_TAIL_LINES,
    )
    .await
    {
        Ok(logs) => warn!(pod = pod, "MCO install failed, operator logs:\n{logs}"),
        Err(e) => error!(pod = pod, error = %format!("{e:#}"), "Failed to read operator logs"),
    }
}

/// Install the stack. Skipped with `SKIP_INSTALL_STEP=true`.
///
/// # Errors
///
/// Returns the first failing step; the operator log tail is dumped first.
pub async fn install(ctx: &TestContext) -> Result<()> {
    if ctx.settings.skip_install {
        info!("SKIP_INSTALL_STEP is set, skipping install");
        return Ok(());
    }

    step("Checking MCO operator is existed");
    let operator_pod = check_operator_pod(&ctx.hub).await?;

    match install_mco(ctx).await {
        Ok(()) => {
            info!("MCO is installed successfully");
            Ok(())
        }
        Err(e) => {
            dump_operator_logs(&ctx.hub, &operator_pod).await;
            Err(e)
        }
    }
}

async fn wait_no_pods(client: &Client, namespace: &str) -> Result<()> {
    Poll::new(TIMEOUT_5M, POLL_INTERVAL_5S)
        .until(&format!("no pods in {namespace}"), || async {
            let pods = list_pods(client, namespace, None).await?;
            if pods.is_empty() {
                Ok(())
            } else {
                bail!("{} pods left in {namespace}", pods.len())
            }
        })
        .await?;
    Ok(())
}

/// Namespaces that hold an `ObservabilityAddon`: every managed cluster plus
/// `local-cluster`.
#[must_use]
pub fn addon_namespaces(cluster_names: &[String]) -> Vec<String> {
    let mut namespaces: BTreeSet<String> = cluster_names.iter().cloned().collect();
    namespaces.insert(LOCAL_CLUSTER_NAMESPACE.to_string());
    namespaces.into_iter().collect()
}

async fn wait_addons_deleted(client: &Client) -> Result<()> {
    let names = match managed_cluster_names(client).await {
        Ok(names) => names,
        Err(e) => {
            warn!(error = %e, "Failed to list managed clusters, checking local-cluster only");
            Vec::new()
        }
    };
    for namespace in addon_namespaces(&names) {
        let target = ResourceRef::namespaced(MCO_ADDON, &namespace, MCO_ADDON_NAME);
        Poll::new(TIMEOUT_5M, POLL_INTERVAL_5S)
            .until(&format!("{target} deleted"), || async {
                match resources::get_opt(client, &target).await? {
                    None => Ok(()),
                    Some(_) => bail!("Failed to delete MCO addon instance"),
                }
            })
            .await?;
    }
    Ok(())
}

async fn delete_mco_namespace(client: &Client) -> Result<()> {
    let namespaces: Api<Namespace> = Api::all(client.clone());
    Poll::new(TIMEOUT_5M, POLL_INTERVAL_5S)
        .until("MCO namespace deleted", || async {
            match get_cluster::<Namespace>(client, MCO_NAMESPACE).await {
                Err(e) if e.is_not_found() => return Ok(()),
                Err(e) => return Err(e.into()),
                Ok(_) => {}
            }
            if let Err(e) = namespaces
                .delete(MCO_NAMESPACE, &DeleteParams::default())
                .await
                .map_err(|e| ResourceError::from_kube(e, "namespaces", MCO_NAMESPACE))
            {
                if e.is_not_found() {
                    return Ok(());
                }
                return Err(e.into());
            }
            bail!("namespace {MCO_NAMESPACE} is still terminating")
        })
        .await?;
    Ok(())
}

/// Uninstall the stack. Skipped with `SKIP_UNINSTALL_STEP=true`.
///
/// # Errors
///
/// Returns the first failing delete or wait.
pub async fn uninstall(ctx: &TestContext) -> Result<()> {
    if ctx.settings.skip_uninstall {
        info!("SKIP_UNINSTALL_STEP is set, skipping uninstall");
        return Ok(());
    }

    step("Uninstall MCO instance");
    resources::delete_if_exists(&ctx.hub, &mco::mco_ref(&ctx.mco_name)).await?;
    match delete_namespaced::<Secret>(&ctx.hub, MCO_NAMESPACE, OBJ_SECRET_NAME).await {
        Err(e) if !e.is_not_found() => return Err(e.into()),
        _ => {}
    }

    step("Waiting for delete all MCO components");
    wait_no_pods(&ctx.hub, MCO_NAMESPACE).await?;

    step("Waiting for delete MCO addon instance");
    wait_addons_deleted(&ctx.hub).await?;

    step("Waiting for delete all MCO addon components");
    wait_no_pods(&ctx.managed, MCO_ADDON_NAMESPACE).await?;

    step("Waiting for delete MCO namespaces");
    delete_mco_namespace(&ctx.hub).await?;

    info!("MCO is uninstalled");
    Ok(())
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod lifecycle_tests;
