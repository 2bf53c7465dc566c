// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Typed workload accessors and component checks.
//!
//! The checks are split into pure predicates over `k8s-openapi` objects and
//! thin async wrappers that fetch those objects, so the predicates can be unit
//! tested without a cluster.
//!
//! Replica expectations are data ([`ComponentExpectation`]); [`basic_mode`] and
//! [`high_mode`] only differ in the tables they return.

use crate::constants::{
    ENDPOINT_OPERATOR_DEPLOYMENT, MCO_ADDON_NAMESPACE, MCO_NAMESPACE, METRICS_COLLECTOR_DEPLOYMENT,
};
use crate::errors::ResourceError;
use crate::labels::{DEFAULT_STORAGE_CLASS_ANNOTATION, K8S_OS, TOPOLOGY_HOSTNAME, TOPOLOGY_ZONE};
use crate::mco::StorageDefaults;
use anyhow::{anyhow, bail, Context as _};
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Pod};
use k8s_openapi::api::storage::v1::StorageClass;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use k8s_openapi::{ClusterResourceScope, NamespaceResourceScope};
use kube::api::{DeleteParams, ListParams, PostParams};
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{self, Debug};
use tracing::debug;

/// Workload kinds a component can be deployed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadKind {
    /// `apps/v1` Deployment
    Deployment,
    /// `apps/v1` StatefulSet
    StatefulSet,
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deployment => f.write_str("Deployment"),
            Self::StatefulSet => f.write_str("Statefulset"),
        }
    }
}

/// A workload that must report a given number of ready replicas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentExpectation {
    /// Deployment or StatefulSet
    pub kind: WorkloadKind,
    /// Workload name
    pub name: String,
    /// Required `status.readyReplicas`
    pub ready_replicas: i32,
}

impl ComponentExpectation {
    /// Expect a deployment with `ready_replicas` ready.
    #[must_use]
    pub fn deployment(name: impl Into<String>, ready_replicas: i32) -> Self {
        Self {
            kind: WorkloadKind::Deployment,
            name: name.into(),
            ready_replicas,
        }
    }

    /// Expect a statefulset with `ready_replicas` ready.
    #[must_use]
    pub fn statefulset(name: impl Into<String>, ready_replicas: i32) -> Self {
        Self {
            kind: WorkloadKind::StatefulSet,
            name: name.into(),
            ready_replicas,
        }
    }

    /// Same component with a different replica requirement.
    #[must_use]
    pub fn with_ready_replicas(mut self, ready_replicas: i32) -> Self {
        self.ready_replicas = ready_replicas;
        self
    }

    /// Compare an observed ready count against the expectation.
    ///
    /// # Errors
    ///
    /// Returns an error naming the workload and both counts on mismatch.
    pub fn verify(&self, observed: i32) -> anyhow::Result<()> {
        if observed != self.ready_replicas {
            bail!(
                "{} {} should have {} but got {} ready replicas",
                self.kind,
                self.name,
                self.ready_replicas,
                observed
            );
        }
        Ok(())
    }
}

/// Name of the Thanos ruler statefulset for an MCO named `cr`.
#[must_use]
pub fn thanos_rule_statefulset(cr: &str) -> String {
    format!("{cr}-thanos-rule")
}

/// Hub components when `availabilityConfig` is `Basic`.
#[must_use]
pub fn basic_mode(cr: &str) -> Vec<ComponentExpectation> {
    let mut components: Vec<_> = [
        "grafana",
        "observatorium-api",
        "thanos-query",
        "thanos-query-frontend",
        "thanos-receive-controller",
        "observatorium-operator",
        "rbac-query-proxy",
    ]
    .iter()
    .map(|suffix| ComponentExpectation::deployment(format!("{cr}-{suffix}"), 1))
    .collect();

    components.extend(
        [
            "alertmanager",
            "thanos-compact",
            "thanos-receive-default",
            "thanos-rule",
            "thanos-store-memcached",
            "thanos-store-shard-0",
        ]
        .iter()
        .map(|suffix| ComponentExpectation::statefulset(format!("{cr}-{suffix}"), 1)),
    );
    components
}

/// Hub components when `availabilityConfig` is `High`.
#[must_use]
pub fn high_mode(cr: &str) -> Vec<ComponentExpectation> {
    let mut components: Vec<_> = [
        "grafana",
        "observatorium-api",
        "thanos-query",
        "thanos-query-frontend",
        "rbac-query-proxy",
    ]
    .iter()
    .map(|suffix| ComponentExpectation::deployment(format!("{cr}-{suffix}"), 2))
    .collect();

    components.extend(
        [
            "alertmanager",
            "thanos-receive-default",
            "thanos-rule",
            "thanos-store-memcached",
        ]
        .iter()
        .map(|suffix| ComponentExpectation::statefulset(format!("{cr}-{suffix}"), 3)),
    );
    components.extend(
        [
            "thanos-compact",
            "thanos-store-shard-0",
            "thanos-store-shard-1",
            "thanos-store-shard-2",
        ]
        .iter()
        .map(|suffix| ComponentExpectation::statefulset(format!("{cr}-{suffix}"), 1)),
    );
    components
}

/// Addon components on the managed cluster.
#[must_use]
pub fn addon_components() -> Vec<ComponentExpectation> {
    vec![
        ComponentExpectation::deployment(ENDPOINT_OPERATOR_DEPLOYMENT, 1),
        ComponentExpectation::deployment(METRICS_COLLECTOR_DEPLOYMENT, 1),
    ]
}

fn deployment_ready_replicas(deployment: &Deployment) -> i32 {
    deployment
        .status
        .as_ref()
        .and_then(|status| status.ready_replicas)
        .unwrap_or(0)
}

fn statefulset_ready_replicas(statefulset: &StatefulSet) -> i32 {
    statefulset
        .status
        .as_ref()
        .and_then(|status| status.ready_replicas)
        .unwrap_or(0)
}

/// Fetch a namespaced object by name.
///
/// # Errors
///
/// Returns a classified [`ResourceError`].
pub async fn get_namespaced<K>(
    client: &Client,
    namespace: &str,
    name: &str,
) -> Result<K, ResourceError>
where
    K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
    <K as Resource>::DynamicType: Default,
{
    let api: Api<K> = Api::namespaced(client.clone(), namespace);
    api.get(name)
        .await
        .map_err(|e| ResourceError::from_kube(e, &K::plural(&Default::default()), name))
}

/// Fetch a cluster-scoped object by name.
///
/// # Errors
///
/// Returns a classified [`ResourceError`].
pub async fn get_cluster<K>(client: &Client, name: &str) -> Result<K, ResourceError>
where
    K: Resource<Scope = ClusterResourceScope> + Clone + DeserializeOwned + Debug,
    <K as Resource>::DynamicType: Default,
{
    let api: Api<K> = Api::all(client.clone());
    api.get(name)
        .await
        .map_err(|e| ResourceError::from_kube(e, &K::plural(&Default::default()), name))
}

/// Delete a namespaced object by name.
///
/// # Errors
///
/// Returns a classified [`ResourceError`], including `NotFound`.
pub async fn delete_namespaced<K>(
    client: &Client,
    namespace: &str,
    name: &str,
) -> Result<(), ResourceError>
where
    K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
    <K as Resource>::DynamicType: Default,
{
    let api: Api<K> = Api::namespaced(client.clone(), namespace);
    api.delete(name, &DeleteParams::default())
        .await
        .map_err(|e| ResourceError::from_kube(e, &K::plural(&Default::default()), name))?;
    debug!(namespace = namespace, name = name, "Deleted object");
    Ok(())
}

/// Delete a cluster-scoped object by name.
///
/// # Errors
///
/// Returns a classified [`ResourceError`], including `NotFound`.
pub async fn delete_cluster<K>(client: &Client, name: &str) -> Result<(), ResourceError>
where
    K: Resource<Scope = ClusterResourceScope> + Clone + DeserializeOwned + Debug,
    <K as Resource>::DynamicType: Default,
{
    let api: Api<K> = Api::all(client.clone());
    api.delete(name, &DeleteParams::default())
        .await
        .map_err(|e| ResourceError::from_kube(e, &K::plural(&Default::default()), name))?;
    debug!(name = name, "Deleted object");
    Ok(())
}

/// Replace a namespaced object; `obj` must carry the `resourceVersion` it was
/// read at.
///
/// # Errors
///
/// Returns a classified [`ResourceError`], including `Conflict`.
pub async fn replace_namespaced<K>(
    client: &Client,
    namespace: &str,
    name: &str,
    obj: &K,
) -> Result<K, ResourceError>
where
    K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Serialize + Debug,
    <K as Resource>::DynamicType: Default,
{
    let api: Api<K> = Api::namespaced(client.clone(), namespace);
    api.replace(name, &PostParams::default(), obj)
        .await
        .map_err(|e| ResourceError::from_kube(e, &K::plural(&Default::default()), name))
}

/// Replace a cluster-scoped object; `obj` must carry the `resourceVersion` it
/// was read at.
///
/// # Errors
///
/// Returns a classified [`ResourceError`], including `Conflict`.
pub async fn replace_cluster<K>(client: &Client, name: &str, obj: &K) -> Result<K, ResourceError>
where
    K: Resource<Scope = ClusterResourceScope> + Clone + DeserializeOwned + Serialize + Debug,
    <K as Resource>::DynamicType: Default,
{
    let api: Api<K> = Api::all(client.clone());
    api.replace(name, &PostParams::default(), obj)
        .await
        .map_err(|e| ResourceError::from_kube(e, &K::plural(&Default::default()), name))
}

/// Ready replica count of one expected component.
///
/// # Errors
///
/// Returns a classified [`ResourceError`].
pub async fn ready_replicas(
    client: &Client,
    namespace: &str,
    component: &ComponentExpectation,
) -> Result<i32, ResourceError> {
    match component.kind {
        WorkloadKind::Deployment => {
            let deployment: Deployment = get_namespaced(client, namespace, &component.name).await?;
            Ok(deployment_ready_replicas(&deployment))
        }
        WorkloadKind::StatefulSet => {
            let statefulset: StatefulSet =
                get_namespaced(client, namespace, &component.name).await?;
            Ok(statefulset_ready_replicas(&statefulset))
        }
    }
}

/// Check every component against its expected ready replica count.
///
/// # Errors
///
/// Returns the first fetch error or replica mismatch.
pub async fn check_components(
    client: &Client,
    namespace: &str,
    components: &[ComponentExpectation],
) -> anyhow::Result<()> {
    for component in components {
        let observed = ready_replicas(client, namespace, component)
            .await
            .with_context(|| format!("failed to read {} {}", component.kind, component.name))?;
        component.verify(observed)?;
    }
    Ok(())
}

/// List pods in a namespace, optionally by label selector.
///
/// # Errors
///
/// Returns a classified [`ResourceError`].
pub async fn list_pods(
    client: &Client,
    namespace: &str,
    label_selector: Option<&str>,
) -> Result<Vec<Pod>, ResourceError> {
    let api: Api<Pod> = Api::namespaced(client.clone(), namespace);
    let mut params = ListParams::default();
    if let Some(selector) = label_selector {
        params = params.labels(selector);
    }
    let pods = api
        .list(&params)
        .await
        .map_err(|e| ResourceError::from_kube(e, "pods", label_selector.unwrap_or("")))?;
    if pods.items.is_empty() {
        debug!(namespace = namespace, selector = ?label_selector, "No pods found");
    }
    Ok(pods.items)
}

/// Pod name, empty when unset.
#[must_use]
pub fn pod_name(pod: &Pod) -> &str {
    pod.metadata.name.as_deref().unwrap_or("")
}

/// Pod phase, empty when unset.
#[must_use]
pub fn pod_phase(pod: &Pod) -> &str {
    pod.status
        .as_ref()
        .and_then(|status| status.phase.as_deref())
        .unwrap_or("")
}

/// Whether the pod reports `Ready=True`.
#[must_use]
pub fn pod_is_ready(pod: &Pod) -> bool {
    pod.status
        .as_ref()
        .and_then(|status| status.conditions.as_ref())
        .is_some_and(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Ready" && c.status == "True")
        })
}

/// Require, for each prefix, a `Running` pod whose name starts with it.
///
/// # Errors
///
/// Returns `"<prefix> not found"` for the first prefix without a running pod.
pub fn check_running_with_prefixes(pods: &[Pod], prefixes: &[&str]) -> anyhow::Result<()> {
    for prefix in prefixes {
        let found = pods
            .iter()
            .any(|pod| pod_name(pod).starts_with(prefix) && pod_phase(pod) == "Running");
        if !found {
            bail!("{prefix} not found");
        }
    }
    Ok(())
}

/// Require every pod to carry `kubernetes.io/os=linux` in its node selector.
///
/// Store shards 1 and 2 survive a switch from High to Basic and never receive
/// the selector, so `{cr}-thanos-store-shard-1-0` and `-2-0` are skipped.
///
/// # Errors
///
/// Returns an error naming the first pod without the selector.
pub fn check_node_selector(pods: &[Pod], cr: &str) -> anyhow::Result<()> {
    let ignored = [
        format!("{cr}-thanos-store-shard-1-0"),
        format!("{cr}-thanos-store-shard-2-0"),
    ];
    for pod in pods {
        let name = pod_name(pod);
        if ignored.iter().any(|i| i == name) {
            continue;
        }
        let selected = pod
            .spec
            .as_ref()
            .and_then(|spec| spec.node_selector.as_ref())
            .and_then(|selector| selector.get(K8S_OS))
            .is_some_and(|os| os == "linux");
        if !selected {
            bail!("Failed to check node selector for pod: {name}");
        }
    }
    Ok(())
}

/// Require every pod to have an affinity whose preferred anti-affinity terms
/// are `(hostname, 30)` or `(zone, 70)`.
///
/// # Errors
///
/// Returns an error naming the first offending pod.
pub fn check_affinity(pods: &[Pod]) -> anyhow::Result<()> {
    for pod in pods {
        let name = pod_name(pod);
        let affinity = pod
            .spec
            .as_ref()
            .and_then(|spec| spec.affinity.as_ref())
            .ok_or_else(|| anyhow!("Failed to check affinity for pod: {name}"))?;

        let terms = affinity
            .pod_anti_affinity
            .as_ref()
            .and_then(|anti| anti.preferred_during_scheduling_ignored_during_execution.as_ref());
        for term in terms.into_iter().flatten() {
            let key = term.pod_affinity_term.topology_key.as_str();
            let allowed = (key == TOPOLOGY_HOSTNAME && term.weight == 30)
                || (key == TOPOLOGY_ZONE && term.weight == 70);
            if !allowed {
                bail!(
                    "Failed to check affinity for pod: {name} (topologyKey {key}, weight {})",
                    term.weight
                );
            }
        }
    }
    Ok(())
}

/// Node selector check over every pod in the MCO namespace.
///
/// # Errors
///
/// Returns the list error or the first pod without the selector.
pub async fn check_all_pods_node_selector(client: &Client, cr: &str) -> anyhow::Result<()> {
    let pods = list_pods(client, MCO_NAMESPACE, None).await?;
    check_node_selector(&pods, cr)
}

/// Affinity check over every pod in the MCO namespace.
///
/// # Errors
///
/// Returns the list error or the first pod with an unexpected affinity.
pub async fn check_all_pods_affinity(client: &Client) -> anyhow::Result<()> {
    let pods = list_pods(client, MCO_NAMESPACE, None).await?;
    check_affinity(&pods)
}

/// Endpoint operator and metrics collector deployments are available and
/// their pods running on the managed cluster.
///
/// # Errors
///
/// Returns the first unavailable deployment or missing pod prefix.
pub async fn check_addon_pods(managed: &Client) -> anyhow::Result<()> {
    let names = [ENDPOINT_OPERATOR_DEPLOYMENT, METRICS_COLLECTOR_DEPLOYMENT];
    have_deployments_in_namespace(managed, MCO_ADDON_NAMESPACE, &names).await?;
    let pods = list_pods(managed, MCO_ADDON_NAMESPACE, None).await?;
    check_running_with_prefixes(&pods, &names)
}

/// High-mode hub components plus addon components.
///
/// # Errors
///
/// Returns the first failing component check.
pub async fn integrity_check(hub: &Client, managed: &Client, cr: &str) -> anyhow::Result<()> {
    check_components(hub, MCO_NAMESPACE, &high_mode(cr)).await?;
    check_components(managed, MCO_ADDON_NAMESPACE, &addon_components()).await
}

/// Require every named CRD to exist.
///
/// # Errors
///
/// Returns the first lookup error.
pub async fn have_crds(client: &Client, names: &[&str]) -> anyhow::Result<()> {
    for name in names {
        get_cluster::<CustomResourceDefinition>(client, name)
            .await
            .with_context(|| format!("CRD {name} is not installed"))?;
    }
    Ok(())
}

/// Whether a deployment has all desired replicas ready and reports
/// `MinimumReplicasAvailable`.
///
/// # Errors
///
/// Returns a description of what is not ready.
pub fn verify_deployment_available(deployment: &Deployment) -> anyhow::Result<()> {
    let name = deployment.metadata.name.as_deref().unwrap_or("");
    let desired = deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.replicas)
        .unwrap_or(1);
    let ready = deployment_ready_replicas(deployment);
    if desired != ready {
        bail!("Deployment {name} has {ready}/{desired} ready replicas");
    }
    let available = deployment
        .status
        .as_ref()
        .and_then(|status| status.conditions.as_ref())
        .is_some_and(|conditions| {
            conditions
                .iter()
                .any(|c| {
                    c.reason.as_deref() == Some("MinimumReplicasAvailable") && c.status == "True"
                })
        });
    if !available {
        bail!("Deployment {name} does not report MinimumReplicasAvailable");
    }
    Ok(())
}

/// Whether a statefulset has all desired replicas ready.
///
/// # Errors
///
/// Returns a description of what is not ready.
pub fn verify_statefulset_ready(statefulset: &StatefulSet) -> anyhow::Result<()> {
    let name = statefulset.metadata.name.as_deref().unwrap_or("");
    let desired = statefulset
        .spec
        .as_ref()
        .and_then(|spec| spec.replicas)
        .unwrap_or(1);
    let ready = statefulset_ready_replicas(statefulset);
    if desired != ready {
        bail!("Statefulset {name} has {ready}/{desired} ready replicas");
    }
    Ok(())
}

/// Require every named deployment in `namespace` to be available.
///
/// # Errors
///
/// Returns the first fetch error or unavailable deployment.
pub async fn have_deployments_in_namespace(
    client: &Client,
    namespace: &str,
    names: &[&str],
) -> anyhow::Result<()> {
    for name in names {
        let deployment: Deployment = get_namespaced(client, namespace, name).await?;
        verify_deployment_available(&deployment)?;
    }
    Ok(())
}

/// Require every named statefulset in `namespace` to be ready.
///
/// # Errors
///
/// Returns the first fetch error or unready statefulset.
pub async fn have_statefulsets_in_namespace(
    client: &Client,
    namespace: &str,
    names: &[&str],
) -> anyhow::Result<()> {
    for name in names {
        let statefulset: StatefulSet = get_namespaced(client, namespace, name).await?;
        verify_statefulset_ready(&statefulset)?;
    }
    Ok(())
}

/// Arguments of the first container of a statefulset.
#[must_use]
pub fn first_container_args(statefulset: &StatefulSet) -> &[String] {
    statefulset
        .spec
        .as_ref()
        .and_then(|spec| spec.template.spec.as_ref())
        .and_then(|pod| pod.containers.first())
        .and_then(|container| container.args.as_deref())
        .unwrap_or(&[])
}

/// First-container arguments of the first statefulset matching a selector.
///
/// # Errors
///
/// Returns the list error, or an error when nothing matches.
pub async fn statefulset_args_by_label(
    client: &Client,
    namespace: &str,
    label_selector: &str,
) -> anyhow::Result<Vec<String>> {
    let api: Api<StatefulSet> = Api::namespaced(client.clone(), namespace);
    let list = api
        .list(&ListParams::default().labels(label_selector))
        .await
        .map_err(|e| ResourceError::from_kube(e, "statefulsets", label_selector))?;
    let first = list
        .items
        .first()
        .ok_or_else(|| anyhow!("no statefulset matches {label_selector} in {namespace}"))?;
    Ok(first_container_args(first).to_vec())
}

/// First-container arguments of a named statefulset.
///
/// # Errors
///
/// Returns a classified [`ResourceError`].
pub async fn statefulset_args(
    client: &Client,
    namespace: &str,
    name: &str,
) -> Result<Vec<String>, ResourceError> {
    let statefulset: StatefulSet = get_namespaced(client, namespace, name).await?;
    Ok(first_container_args(&statefulset).to_vec())
}

/// Require `flag` (e.g. `--delete-delay=48h`) among `args`.
///
/// # Errors
///
/// Returns an error listing the flags that were present.
pub fn require_arg(args: &[String], flag: &str) -> anyhow::Result<()> {
    if args.iter().any(|arg| arg == flag) {
        Ok(())
    } else {
        bail!("{flag} not found in container args {args:?}")
    }
}

/// Storage class PVCs should use: the requested one when it exists, else the
/// cluster default.
#[must_use]
pub fn expected_storage_class(classes: &[StorageClass], requested: &str) -> String {
    if classes
        .iter()
        .any(|sc| sc.metadata.name.as_deref() == Some(requested))
    {
        return requested.to_string();
    }
    classes
        .iter()
        .find(|sc| {
            sc.metadata
                .annotations
                .as_ref()
                .and_then(|a| a.get(DEFAULT_STORAGE_CLASS_ANNOTATION))
                .is_some_and(|v| v == "true")
        })
        .and_then(|sc| sc.metadata.name.clone())
        .unwrap_or_default()
}

/// Check one PVC for size, storage class and `Bound` phase.
///
/// # Errors
///
/// Returns an error listing every observed and expected value on mismatch.
pub fn verify_pvc(
    pvc: &PersistentVolumeClaim,
    size: &str,
    storage_class: &str,
) -> anyhow::Result<()> {
    let spec = pvc.spec.as_ref();
    let pvc_size = spec
        .and_then(|s| s.resources.as_ref())
        .and_then(|r| r.requests.as_ref())
        .and_then(|r| r.get("storage"))
        .map(|q| q.0.as_str())
        .unwrap_or("");
    let sc_name = spec
        .and_then(|s| s.storage_class_name.as_deref())
        .unwrap_or("");
    let phase = pvc
        .status
        .as_ref()
        .and_then(|s| s.phase.as_deref())
        .unwrap_or("");

    if pvc_size != size || sc_name != storage_class || phase != "Bound" {
        bail!(
            "PVC check failed, pvcSize = {pvc_size}, sizeInCR = {size}, scName = {sc_name}, expectedSC = {storage_class}, statusPhase = {phase}"
        );
    }
    Ok(())
}

/// Check every PVC in `namespace` (except the in-cluster `minio` volume)
/// against the MCO storage settings.
///
/// # Errors
///
/// Returns the list error or the first mismatching PVC.
pub async fn check_pvcs(
    client: &Client,
    namespace: &str,
    storage: &StorageDefaults,
) -> anyhow::Result<()> {
    let classes = Api::<StorageClass>::all(client.clone())
        .list(&ListParams::default())
        .await
        .map_err(|e| ResourceError::from_kube(e, "storageclasses", ""))?;
    let expected_sc = expected_storage_class(&classes.items, &storage.storage_class);

    let pvcs = Api::<PersistentVolumeClaim>::namespaced(client.clone(), namespace)
        .list(&ListParams::default())
        .await
        .map_err(|e| ResourceError::from_kube(e, "persistentvolumeclaims", ""))?;
    for pvc in pvcs
        .items
        .iter()
        .filter(|pvc| pvc.metadata.name.as_deref() != Some("minio"))
    {
        verify_pvc(pvc, &storage.size, &expected_sc)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "workloads_tests.rs"]
mod workloads_tests;
