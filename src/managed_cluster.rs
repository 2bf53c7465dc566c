// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `ManagedCluster` helpers: the observability opt-out label and the list of
//! `OpenShift` clusters that are actively sending metrics.

use crate::constants::MCO_ADDON_NAME;
use crate::errors::{ResourceError, ShapeError};
use crate::gvr::{ResourceRef, MANAGED_CLUSTER, MCO_ADDON};
use crate::labels::{
    CLUSTER_ID_LABEL, CLUSTER_NAME_LABEL, CLUSTER_OPENSHIFT_VERSION_LABEL, CLUSTER_VENDOR_LABEL,
    OBSERVABILITY_OPT_OUT_LABEL,
};
use crate::resources;
use crate::unstructured::{get_opt, json_type_name};
use anyhow::{anyhow, Context as _};
use kube::Client;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use tracing::{debug, info};

/// Label value that opts a cluster out of observability.
pub const OBSERVABILITY_DISABLED: &str = "disabled";

/// Vendor label value of `OpenShift` clusters.
pub const OPENSHIFT_VENDOR: &str = "OpenShift";

/// Addon status text reported once the collector has pushed metrics.
pub const METRICS_SENT_MARKER: &str = "Cluster metrics sent successfully";

/// Names of every `ManagedCluster` registered with the hub.
///
/// # Errors
///
/// Returns a classified [`ResourceError`].
pub async fn managed_cluster_names(client: &Client) -> Result<Vec<String>, ResourceError> {
    let clusters = resources::list(client, MANAGED_CLUSTER, None, None).await?;
    Ok(clusters
        .iter()
        .filter_map(|c| c.pointer("/metadata/name").and_then(Value::as_str))
        .map(str::to_string)
        .collect())
}

/// Add or remove the `observability=disabled` label on one object.
///
/// # Errors
///
/// Returns [`ShapeError`] when `metadata` or `metadata.labels` is not an object.
pub fn set_observability_label(obj: &mut Value, enabled: bool) -> Result<(), ShapeError> {
    let metadata = obj
        .get_mut("metadata")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| ShapeError::Missing {
            path: "metadata".to_string(),
        })?;
    let labels = metadata
        .entry("labels")
        .or_insert_with(|| Value::Object(Map::new()));
    if labels.is_null() {
        *labels = Value::Object(Map::new());
    }
    let found = json_type_name(labels);
    let labels = labels.as_object_mut().ok_or(ShapeError::WrongType {
        path: "metadata.labels".to_string(),
        expected: "object",
        found,
    })?;

    if enabled {
        labels.remove(OBSERVABILITY_OPT_OUT_LABEL);
    } else {
        labels.insert(
            OBSERVABILITY_OPT_OUT_LABEL.to_string(),
            Value::String(OBSERVABILITY_DISABLED.to_string()),
        );
    }
    Ok(())
}

/// Enable or disable observability for one managed cluster through its label.
///
/// # Errors
///
/// Returns a classified [`ResourceError`].
pub async fn update_observability(
    client: &Client,
    cluster_name: &str,
    enabled: bool,
) -> Result<(), ResourceError> {
    let target = ResourceRef::cluster(MANAGED_CLUSTER, cluster_name);
    resources::mutate(client, &target, |obj| set_observability_label(obj, enabled)).await?;
    info!(cluster = cluster_name, enabled = enabled, "Updated observability label");
    Ok(())
}

/// Parse a dotted numeric version, ignoring a leading `v` and any
/// pre-release or build suffix.
///
/// Returns `None` when a component is not a number.
#[must_use]
pub fn parse_version(version: &str) -> Option<Vec<u64>> {
    let version = version.trim().trim_start_matches('v');
    let core = version
        .split(['-', '+'])
        .next()
        .filter(|c| !c.is_empty())?;
    core.split('.').map(|part| part.parse().ok()).collect()
}

/// Compare two parsed versions, treating missing components as zero.
#[must_use]
pub fn compare_versions(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            x.cmp(&y)
        })
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Whether `version` is at least `min`.
///
/// # Errors
///
/// Returns an error when either value is not a version.
pub fn is_version_at_least(version: &str, min: &str) -> anyhow::Result<bool> {
    let v = parse_version(version).ok_or_else(|| anyhow!("malformed version: {version:?}"))?;
    let m = parse_version(min).ok_or_else(|| anyhow!("malformed version: {min:?}"))?;
    Ok(compare_versions(&v, &m) != Ordering::Less)
}

fn label<'a>(labels: &'a Map<String, Value>, key: &str) -> &'a str {
    labels.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Cluster ID of one managed cluster if it is an `OpenShift` cluster at or
/// above `min_version` whose addon reports metrics being sent.
///
/// # Errors
///
/// Returns an error when the cluster's `openshiftVersion` label is not a
/// version and the cluster would otherwise qualify.
pub fn qualifying_cluster_id(
    labels: &Map<String, Value>,
    addon_status: &Value,
    min_version: &str,
) -> anyhow::Result<Option<String>> {
    let sending = addon_status.to_string().contains(METRICS_SENT_MARKER);
    if label(labels, CLUSTER_VENDOR_LABEL) != OPENSHIFT_VENDOR || !sending {
        return Ok(None);
    }
    let version = label(labels, CLUSTER_OPENSHIFT_VERSION_LABEL);
    if !is_version_at_least(version, min_version)? {
        return Ok(None);
    }
    let id = label(labels, CLUSTER_ID_LABEL);
    Ok((!id.is_empty()).then(|| id.to_string()))
}

/// Cluster IDs of `OpenShift` managed clusters at or above `min_version` that
/// are sending metrics.
///
/// # Errors
///
/// Returns the first list or addon lookup error, or a malformed version.
pub async fn list_ocp_managed_cluster_ids(
    client: &Client,
    min_version: &str,
) -> anyhow::Result<Vec<String>> {
    parse_version(min_version).ok_or_else(|| anyhow!("malformed version: {min_version:?}"))?;

    let clusters = resources::list(client, MANAGED_CLUSTER, None, None).await?;
    let mut ids = Vec::new();
    for cluster in &clusters {
        let Some(labels) = get_opt(cluster, &["metadata", "labels"]).and_then(Value::as_object)
        else {
            continue;
        };
        let name = label(labels, CLUSTER_NAME_LABEL);
        let addon_ref = ResourceRef::namespaced(MCO_ADDON, name, MCO_ADDON_NAME);
        let addon = resources::get(client, &addon_ref)
            .await
            .with_context(|| format!("failed to get observability addon of cluster {name}"))?;
        let status = addon.get("status").cloned().unwrap_or(Value::Null);

        if let Some(id) = qualifying_cluster_id(labels, &status, min_version)? {
            debug!(cluster = name, cluster_id = %id, "Cluster qualifies");
            ids.push(id);
        }
    }
    Ok(ids)
}

#[cfg(test)]
#[path = "managed_cluster_tests.rs"]
mod managed_cluster_tests;
