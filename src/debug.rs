// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Diagnostic dumps written to the log when a case fails.
//!
//! Dump helpers never fail the case themselves: read errors are logged and
//! swallowed.

use crate::constants::{MCO_ADDON_NAMESPACE, MCO_NAMESPACE};
use crate::context::TestContext;
use crate::mco;
use crate::workloads::{list_pods, pod_is_ready, pod_name, pod_phase};
use anyhow::Context as _;
use k8s_openapi::api::core::v1::Pod;
use kube::api::LogParams;
use kube::{Api, Client};
use serde_json::Value;
use tracing::{error, info, warn};

/// Pods without a `Ready=True` condition.
#[must_use]
pub fn not_ready_pods(pods: &[Pod]) -> Vec<&Pod> {
    pods.iter().filter(|p| !pod_is_ready(p)).collect()
}

/// Log every not-ready pod in `namespace`.
pub async fn print_not_ready_pods(client: &Client, namespace: &str) {
    let pods = match list_pods(client, namespace, None).await {
        Ok(pods) => pods,
        Err(e) => {
            error!(namespace = %namespace, error = %e, "Failed to list pods");
            return;
        }
    };
    for pod in not_ready_pods(&pods) {
        let status = pod
            .status
            .as_ref()
            .and_then(|s| serde_json::to_string(s).ok())
            .unwrap_or_default();
        warn!(
            namespace = %namespace,
            pod = %pod_name(pod),
            phase = %pod_phase(pod),
            status = %status,
            "Pod is not Ready"
        );
    }
}

/// Not-ready pods of the hub observability namespace.
pub async fn print_mco_pods_status(ctx: &TestContext) {
    print_not_ready_pods(&ctx.hub, MCO_NAMESPACE).await;
}

/// Not-ready pods of the addon namespace on the managed side.
pub async fn print_oba_pods_status(ctx: &TestContext) {
    print_not_ready_pods(&ctx.managed, MCO_ADDON_NAMESPACE).await;
}

/// Log the MCO spec and status.
pub async fn print_mco_object(ctx: &TestContext) {
    match mco::get(&ctx.hub, &ctx.mco_name).await {
        Ok(obj) => {
            let spec = obj.get("spec").unwrap_or(&Value::Null);
            let status = obj.get("status").unwrap_or(&Value::Null);
            info!(name = %ctx.mco_name, spec = %spec, "MCO spec");
            info!(name = %ctx.mco_name, status = %status, "MCO status");
        }
        Err(e) => warn!(name = %ctx.mco_name, error = %e, "Failed to get mco object"),
    }
}

/// Not-ready pods on both sides.
pub async fn print_pods_status(ctx: &TestContext) {
    print_mco_pods_status(ctx).await;
    print_oba_pods_status(ctx).await;
}

/// MCO object plus not-ready pods on both sides.
pub async fn dump_all(ctx: &TestContext) {
    print_mco_object(ctx).await;
    print_pods_status(ctx).await;
}

/// Last `tail_lines` lines of a container log.
///
/// # Errors
///
/// Returns an error when the log cannot be read.
pub async fn pod_logs(
    client: &Client,
    namespace: &str,
    pod: &str,
    container: &str,
    tail_lines: i64,
) -> anyhow::Result<String> {
    let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);
    let params = LogParams {
        container: Some(container.to_string()),
        tail_lines: Some(tail_lines),
        ..Default::default()
    };
    pods.logs(pod, &params)
        .await
        .with_context(|| format!("failed to read logs of {namespace}/{pod}/{container}"))
}

#[cfg(test)]
#[path = "debug_tests.rs"]
mod debug_tests;
