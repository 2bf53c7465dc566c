// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Certificate renewal restarts the pods that mount the certificates.
//!
//! Renewal is simulated by deleting the server certificate secrets; the
//! operator issues new ones and rolls the observatorium API and the metrics
//! collector.

use crate::constants::{
    MCO_ADDON_NAMESPACE, MCO_NAMESPACE, POLL_INTERVAL_5S, SERVER_CA_SECRET, SERVER_CERT_SECRET,
    TIMEOUT_5M,
};
use crate::context::TestContext;
use crate::labels::{METRICS_COLLECTOR_LABEL, OBSERVATORIUM_API_LABEL};
use crate::suite::{step, AfterEach, Scenario};
use crate::wait::Poll;
use crate::workloads::{delete_namespaced, list_pods, pod_name};
use anyhow::{bail, Context as _};
use k8s_openapi::api::core::v1::Secret;
use kube::Client;
use std::collections::BTreeSet;
use tracing::info;

/// Whether every pod in `old` is gone from a non-empty `current` list.
#[must_use]
pub fn all_replaced(old: &BTreeSet<String>, current: &[String]) -> bool {
    !current.is_empty() && current.iter().all(|name| !old.contains(name))
}

async fn pod_names(
    client: &Client,
    namespace: &str,
    selector: &str,
) -> anyhow::Result<Vec<String>> {
    let pods = list_pods(client, namespace, Some(selector)).await?;
    Ok(pods.iter().map(|p| pod_name(p).to_string()).collect())
}

/// The API and collector pods are replaced after the certificates are
/// regenerated.
pub struct PodsRestartOnRenewal;

#[async_trait::async_trait]
impl Scenario for PodsRestartOnRenewal {
    fn title(&self) -> &str {
        "[P1][Sev1][Observability][Integration] Should have metrics collector pod restart if cert secret re-generated (certrenew/g0)"
    }

    fn after_each(&self) -> AfterEach {
        AfterEach::IntegrityCheck
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        step("Waiting for pods ready: observability-observatorium-api, metrics-collector-deployment");
        let (collector, api_pods) = Poll::new(TIMEOUT_5M, POLL_INTERVAL_5S)
            .until("observatorium-api and metrics-collector pods", || async {
                let collectors =
                    pod_names(&ctx.managed, MCO_ADDON_NAMESPACE, METRICS_COLLECTOR_LABEL).await?;
                let api = pod_names(&ctx.hub, MCO_NAMESPACE, OBSERVATORIUM_API_LABEL).await?;
                match collectors.into_iter().next() {
                    Some(collector) if !api.is_empty() => {
                        Ok((collector, api.into_iter().collect::<BTreeSet<_>>()))
                    }
                    _ => bail!("observatorium-api or metrics-collector pods are missing"),
                }
            })
            .await?;

        step("Deleting certificate secret to simulate certificate renew");
        for secret in [SERVER_CA_SECRET, SERVER_CERT_SECRET] {
            delete_namespaced::<Secret>(&ctx.hub, MCO_NAMESPACE, secret)
                .await
                .with_context(|| format!("failed to delete secret {secret}"))?;
        }

        step(&format!("Waiting for old pods removed: {api_pods:?} and new pods created"));
        Poll::new(TIMEOUT_5M, POLL_INTERVAL_5S)
            .until("observatorium-api pods replaced", || async {
                let current = pod_names(&ctx.hub, MCO_NAMESPACE, OBSERVATORIUM_API_LABEL).await?;
                if all_replaced(&api_pods, &current) {
                    Ok(())
                } else {
                    bail!("observatorium-api pods not replaced yet: {current:?}")
                }
            })
            .await?;

        step(&format!("Waiting for old pod removed: {collector} and new pod created"));
        Poll::new(TIMEOUT_5M, POLL_INTERVAL_5S)
            .until("metrics-collector pod replaced", || async {
                let current =
                    pod_names(&ctx.managed, MCO_ADDON_NAMESPACE, METRICS_COLLECTOR_LABEL).await?;
                if current.iter().any(|name| *name != collector) {
                    Ok(())
                } else {
                    bail!("metrics-collector pod {collector} has not been replaced")
                }
            })
            .await?;
        info!("Pods restarted after certificate renewal");
        Ok(())
    }
}

/// Cases of this group.
#[must_use]
pub fn cases() -> Vec<Box<dyn Scenario>> {
    vec![Box::new(PodsRestartOnRenewal)]
}
