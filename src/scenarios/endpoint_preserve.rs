// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The endpoint operator restores addon resources that were deleted or
//! edited by hand on the managed cluster.

use crate::constants::{
    MCO_ADDON_NAMESPACE, METRICS_COLLECTOR_CA_BUNDLE, METRICS_COLLECTOR_DEPLOYMENT,
    METRICS_COLLECTOR_VIEW_CRB, POLL_INTERVAL_5S, TIMEOUT_1M, TIMEOUT_3M, TIMEOUT_5M,
};
use crate::context::TestContext;
use crate::suite::{step, AfterEach, Scenario};
use crate::wait::Poll;
use crate::workloads::{
    delete_cluster, delete_namespaced, get_cluster, get_namespaced, replace_cluster,
    replace_namespaced,
};
use anyhow::{anyhow, bail};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::api::rbac::v1::ClusterRoleBinding;
use kube::Resource;

/// Service account written over the collector's own.
const UPDATED_SERVICE_ACCOUNT: &str = "test-serviceaccount";

/// Subject name written over the binding's own.
const UPDATED_SUBJECT: &str = "test-subject";

/// `metadata.resourceVersion`, empty when unset.
#[must_use]
pub fn resource_version<K: Resource>(obj: &K) -> &str {
    obj.meta().resource_version.as_deref().unwrap_or("")
}

/// Pod template service account of a deployment, empty when unset.
#[must_use]
pub fn service_account(deployment: &Deployment) -> &str {
    deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.template.spec.as_ref())
        .and_then(|pod| pod.service_account_name.as_deref())
        .unwrap_or("")
}

/// Name of the first subject of a binding, empty when there is none.
#[must_use]
pub fn first_subject(binding: &ClusterRoleBinding) -> &str {
    binding
        .subjects
        .as_ref()
        .and_then(|subjects| subjects.first())
        .map_or("", |subject| subject.name.as_str())
}

/// Whether `current` is a newer object than `previous` whose `value` no
/// longer carries the manual `edit`.
#[must_use]
pub fn reverted(previous_version: &str, current_version: &str, value: &str, edit: &str) -> bool {
    current_version != previous_version && value != edit
}

/// The metrics collector deployment is recreated and its service account
/// restored.
pub struct CollectorDeployment;

#[async_trait::async_trait]
impl Scenario for CollectorDeployment {
    fn title(&self) -> &str {
        "[P1,Sev1,observability] should revert any manual changes on metrics-collector deployment (endpoint_preserve/g0)"
    }

    fn after_each(&self) -> AfterEach {
        AfterEach::DumpAlways
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        let client = &ctx.managed;
        let get = || async {
            let dep: Deployment =
                get_namespaced(client, MCO_ADDON_NAMESPACE, METRICS_COLLECTOR_DEPLOYMENT).await?;
            Ok::<_, anyhow::Error>(dep)
        };

        step("Deleting metrics-collector deployment");
        let original = Poll::new(TIMEOUT_1M, POLL_INTERVAL_5S)
            .until("metrics-collector deployment", get)
            .await?;
        Poll::new(TIMEOUT_1M, POLL_INTERVAL_5S)
            .until("metrics-collector deployment deletion", || async {
                delete_namespaced::<Deployment>(
                    client,
                    MCO_ADDON_NAMESPACE,
                    METRICS_COLLECTOR_DEPLOYMENT,
                )
                .await?;
                Ok(())
            })
            .await?;
        Poll::new(TIMEOUT_1M, POLL_INTERVAL_5S)
            .until("metrics-collector deployment recreated", || async {
                let dep = get().await?;
                if resource_version(&dep) == resource_version(&original) {
                    bail!("metrics-collector deployment has not been recreated");
                }
                Ok(())
            })
            .await?;

        step("Updating metrics-collector deployment");
        let updated = Poll::new(TIMEOUT_1M, POLL_INTERVAL_5S)
            .until("metrics-collector deployment update", || async {
                let mut dep = get().await?;
                let pod = dep
                    .spec
                    .as_mut()
                    .and_then(|spec| spec.template.spec.as_mut())
                    .ok_or_else(|| anyhow!("metrics-collector deployment has no pod spec"))?;
                pod.service_account_name = Some(UPDATED_SERVICE_ACCOUNT.to_string());
                let dep = replace_namespaced(
                    client,
                    MCO_ADDON_NAMESPACE,
                    METRICS_COLLECTOR_DEPLOYMENT,
                    &dep,
                )
                .await?;
                Ok(dep)
            })
            .await?;
        Poll::new(TIMEOUT_1M, POLL_INTERVAL_5S)
            .until("metrics-collector deployment reverted", || async {
                let dep = get().await?;
                if reverted(
                    resource_version(&updated),
                    resource_version(&dep),
                    service_account(&dep),
                    UPDATED_SERVICE_ACCOUNT,
                ) {
                    Ok(())
                } else {
                    bail!("service account is still {:?}", service_account(&dep))
                }
            })
            .await?;
        Ok(())
    }
}

/// The `metrics-collector-view` binding is recreated and its subject
/// restored.
pub struct CollectorViewBinding;

#[async_trait::async_trait]
impl Scenario for CollectorViewBinding {
    fn title(&self) -> &str {
        "[P1,Sev1,observability] should revert any manual changes on metrics-collector-view clusterolebinding (endpoint_preserve/g0)"
    }

    fn after_each(&self) -> AfterEach {
        AfterEach::DumpAlways
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        let client = &ctx.managed;

        step("Deleting metrics-collector-view clusterolebinding");
        let original: ClusterRoleBinding = get_cluster(client, METRICS_COLLECTOR_VIEW_CRB).await?;
        delete_cluster::<ClusterRoleBinding>(client, METRICS_COLLECTOR_VIEW_CRB).await?;
        let mut recreated = Poll::new(TIMEOUT_5M, POLL_INTERVAL_5S)
            .until("metrics-collector-view recreated", || async {
                let crb: ClusterRoleBinding =
                    get_cluster(client, METRICS_COLLECTOR_VIEW_CRB).await?;
                if resource_version(&crb) == resource_version(&original) {
                    bail!("metrics-collector-view has not been recreated");
                }
                Ok(crb)
            })
            .await?;

        step("Updating metrics-collector-view clusterolebinding");
        let subject = recreated
            .subjects
            .as_mut()
            .and_then(|subjects| subjects.first_mut())
            .ok_or_else(|| anyhow!("metrics-collector-view has no subjects"))?;
        subject.name = UPDATED_SUBJECT.to_string();
        let updated = replace_cluster(client, METRICS_COLLECTOR_VIEW_CRB, &recreated).await?;

        Poll::new(TIMEOUT_1M, POLL_INTERVAL_5S)
            .until("metrics-collector-view reverted", || async {
                let crb: ClusterRoleBinding =
                    get_cluster(client, METRICS_COLLECTOR_VIEW_CRB).await?;
                if reverted(
                    resource_version(&updated),
                    resource_version(&crb),
                    first_subject(&crb),
                    UPDATED_SUBJECT,
                ) {
                    Ok(())
                } else {
                    bail!("first subject is still {:?}", first_subject(&crb))
                }
            })
            .await?;
        Ok(())
    }
}

/// The serving certificate CA bundle configmap is recreated.
pub struct CaBundleConfigMap;

#[async_trait::async_trait]
impl Scenario for CaBundleConfigMap {
    fn title(&self) -> &str {
        "[P1,Sev1,observability] should recreate on metrics-collector-serving-certs-ca-bundle configmap if deleted (endpoint_preserve/g0)"
    }

    fn after_each(&self) -> AfterEach {
        AfterEach::DumpAlways
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        let client = &ctx.managed;
        let get = || async {
            let cm: ConfigMap =
                get_namespaced(client, MCO_ADDON_NAMESPACE, METRICS_COLLECTOR_CA_BUNDLE).await?;
            Ok::<_, anyhow::Error>(cm)
        };

        step("Deleting metrics-collector-serving-certs-ca-bundle configmap");
        let original = Poll::new(TIMEOUT_3M, POLL_INTERVAL_5S)
            .until("ca bundle configmap", get)
            .await?;
        Poll::new(TIMEOUT_3M, POLL_INTERVAL_5S)
            .until("ca bundle configmap deletion", || async {
                delete_namespaced::<ConfigMap>(
                    client,
                    MCO_ADDON_NAMESPACE,
                    METRICS_COLLECTOR_CA_BUNDLE,
                )
                .await?;
                Ok(())
            })
            .await?;
        Poll::new(TIMEOUT_1M, POLL_INTERVAL_5S)
            .until("ca bundle configmap recreated", || async {
                let cm = get().await?;
                if resource_version(&cm) == resource_version(&original) {
                    bail!("{METRICS_COLLECTOR_CA_BUNDLE} has not been recreated");
                }
                Ok(())
            })
            .await?;
        Ok(())
    }
}

/// Cases of this group.
#[must_use]
pub fn cases() -> Vec<Box<dyn Scenario>> {
    vec![
        Box::new(CollectorDeployment),
        Box::new(CollectorViewBinding),
        Box::new(CaBundleConfigMap),
    ]
}
