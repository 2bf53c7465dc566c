// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Untyped resource access and mutation.
//!
//! Objects are exchanged as `serde_json::Value` trees so callers can use the
//! path helpers in [`crate::unstructured`].
//!
//! # Read-modify-write
//!
//! [`mutate`] reads an object, applies a closure to it and writes it back with
//! the `resourceVersion` it read. When another writer got there first the
//! server answers 409 and the whole cycle is repeated on the newer revision,
//! so neither writer's change is lost. [`mutate_once`] performs a single cycle
//! and surfaces the conflict.
//!
//! # Apply
//!
//! [`apply_yaml`] takes a multi-document YAML string and server-side applies
//! each document with field manager [`FIELD_MANAGER`].

use crate::constants::{CONFLICT_RETRY_ATTEMPTS, FIELD_MANAGER};
use crate::errors::{ResourceError, ShapeError};
use crate::gvr::{Gvr, ResourceRef};
use anyhow::{anyhow, Context as _};
use kube::api::{
    ApiResource, DeleteParams, DynamicObject, GroupVersionKind, ListParams, Patch, PatchParams,
    PostParams,
};
use kube::{Api, Client};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Kinds whose plural is not the lowercased kind plus the regular suffix.
const IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("Observatorium", "observatoria"),
    ("Endpoints", "endpoints"),
];

/// Kinds that are not namespaced.
const CLUSTER_SCOPED_KINDS: &[&str] = &[
    "Namespace",
    "Node",
    "PersistentVolume",
    "StorageClass",
    "ClusterRole",
    "ClusterRoleBinding",
    "CustomResourceDefinition",
    "MultiClusterObservability",
    "ManagedCluster",
    "ClusterManagementAddOn",
    "ClusterImageSet",
];

fn to_value(obj: DynamicObject, target: &str, name: &str) -> Result<Value, ResourceError> {
    serde_json::to_value(obj).map_err(|e| ResourceError::Transport {
        resource: target.to_string(),
        name: name.to_string(),
        reason: e.to_string(),
    })
}

fn from_value(obj: &Value, target: &str, name: &str) -> Result<DynamicObject, ResourceError> {
    serde_json::from_value(obj.clone()).map_err(|e| ResourceError::Transport {
        resource: target.to_string(),
        name: name.to_string(),
        reason: format!("object does not decode: {e}"),
    })
}

/// Fetch an object.
///
/// # Errors
///
/// Returns a classified [`ResourceError`].
pub async fn get(client: &Client, target: &ResourceRef) -> Result<Value, ResourceError> {
    let obj = target
        .api(client)
        .get(&target.name)
        .await
        .map_err(|e| ResourceError::from_kube(e, target.gvr.plural, &target.name))?;
    to_value(obj, target.gvr.plural, &target.name)
}

/// Fetch an object, `None` when it does not exist.
///
/// # Errors
///
/// Returns a classified [`ResourceError`] for anything but 404.
pub async fn get_opt(
    client: &Client,
    target: &ResourceRef,
) -> Result<Option<Value>, ResourceError> {
    match get(client, target).await {
        Ok(obj) => Ok(Some(obj)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// List objects of a type, optionally filtered by namespace and label selector.
///
/// # Errors
///
/// Returns a classified [`ResourceError`].
pub async fn list(
    client: &Client,
    gvr: Gvr,
    namespace: Option<&str>,
    label_selector: Option<&str>,
) -> Result<Vec<Value>, ResourceError> {
    let mut params = ListParams::default();
    if let Some(selector) = label_selector {
        params = params.labels(selector);
    }
    let objects = gvr
        .api(client, namespace)
        .list(&params)
        .await
        .map_err(|e| ResourceError::from_kube(e, gvr.plural, ""))?;
    objects
        .items
        .into_iter()
        .map(|obj| to_value(obj, gvr.plural, ""))
        .collect()
}

/// Replace an object with `obj`.
///
/// `obj` should carry the `metadata.resourceVersion` it was read at; the server
/// rejects stale versions with 409.
///
/// # Errors
///
/// Returns a classified [`ResourceError`].
pub async fn replace(
    client: &Client,
    target: &ResourceRef,
    obj: &Value,
) -> Result<Value, ResourceError> {
    let data = from_value(obj, target.gvr.plural, &target.name)?;
    let updated = target
        .api(client)
        .replace(&target.name, &PostParams::default(), &data)
        .await
        .map_err(|e| ResourceError::from_kube(e, target.gvr.plural, &target.name))?;
    to_value(updated, target.gvr.plural, &target.name)
}

/// Create an object in the target's namespace.
///
/// # Errors
///
/// Returns a classified [`ResourceError`].
pub async fn create(
    client: &Client,
    target: &ResourceRef,
    obj: &Value,
) -> Result<Value, ResourceError> {
    let data = from_value(obj, target.gvr.plural, &target.name)?;
    let created = target
        .api(client)
        .create(&PostParams::default(), &data)
        .await
        .map_err(|e| ResourceError::from_kube(e, target.gvr.plural, &target.name))?;
    to_value(created, target.gvr.plural, &target.name)
}

/// Delete an object.
///
/// # Errors
///
/// Returns a classified [`ResourceError`].
pub async fn delete(client: &Client, target: &ResourceRef) -> Result<(), ResourceError> {
    target
        .api(client)
        .delete(&target.name, &DeleteParams::default())
        .await
        .map_err(|e| ResourceError::from_kube(e, target.gvr.plural, &target.name))?;
    debug!(target = %target, "Deleted object");
    Ok(())
}

/// Delete an object, treating 404 as success.
///
/// # Errors
///
/// Returns a classified [`ResourceError`] for anything but 404.
pub async fn delete_if_exists(client: &Client, target: &ResourceRef) -> Result<(), ResourceError> {
    match delete(client, target).await {
        Err(e) if e.is_not_found() => {
            debug!(target = %target, "Object already absent");
            Ok(())
        }
        other => other,
    }
}

/// One read-modify-write cycle.
///
/// # Errors
///
/// Returns [`ResourceError::Conflict`] when the object changed between the
/// read and the write, [`ResourceError::Shape`] when `edit` fails, or any
/// other classified [`ResourceError`].
pub async fn mutate_once<F>(
    client: &Client,
    target: &ResourceRef,
    edit: F,
) -> Result<Value, ResourceError>
where
    F: FnOnce(&mut Value) -> Result<(), ShapeError>,
{
    let mut obj = get(client, target).await?;
    edit(&mut obj)?;
    replace(client, target, &obj).await
}

/// Read-modify-write with conflict retry.
///
/// `edit` is re-applied to a fresh read after every 409, up to
/// [`CONFLICT_RETRY_ATTEMPTS`] cycles.
///
/// # Errors
///
/// Returns the last [`ResourceError::Conflict`] when every cycle conflicted,
/// or the first non-conflict error.
pub async fn mutate<F>(
    client: &Client,
    target: &ResourceRef,
    mut edit: F,
) -> Result<Value, ResourceError>
where
    F: FnMut(&mut Value) -> Result<(), ShapeError>,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match mutate_once(client, target, &mut edit).await {
            Err(err) if err.is_conflict() && attempt < CONFLICT_RETRY_ATTEMPTS => {
                warn!(
                    target = %target,
                    attempt = attempt,
                    max_attempts = CONFLICT_RETRY_ATTEMPTS,
                    "Conflict on update, re-reading and retrying"
                );
            }
            result => return result,
        }
    }
}

fn plural_for(kind: &str) -> Option<&'static str> {
    IRREGULAR_PLURALS
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, plural)| *plural)
}

/// Identity of one manifest document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestId {
    /// `apiVersion`
    pub api_version: String,
    /// `kind`
    pub kind: String,
    /// `metadata.name`
    pub name: String,
    /// `metadata.namespace`
    pub namespace: Option<String>,
}

impl ManifestId {
    /// Extract the identity of a manifest.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing identity field.
    pub fn of(obj: &Value) -> anyhow::Result<Self> {
        let kind = obj
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("kind attribute not found in manifest"))?;
        let api_version = obj
            .get("apiVersion")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("apiVersion attribute not found in {kind} manifest"))?;
        let name = obj
            .pointer("/metadata/name")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("metadata.name not found in {kind} manifest"))?;
        let namespace = obj
            .pointer("/metadata/namespace")
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(Self {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            name: name.to_string(),
            namespace,
        })
    }

    /// `ApiResource` for this manifest.
    #[must_use]
    pub fn api_resource(&self) -> ApiResource {
        let (group, version) = match self.api_version.split_once('/') {
            Some((group, version)) => (group, version),
            None => ("", self.api_version.as_str()),
        };
        let gvk = GroupVersionKind::gvk(group, version, &self.kind);
        match plural_for(&self.kind) {
            Some(plural) => ApiResource::from_gvk_with_plural(&gvk, plural),
            None => ApiResource::from_gvk(&gvk),
        }
    }

    /// Whether this kind lives outside namespaces.
    #[must_use]
    pub fn cluster_scoped(&self) -> bool {
        CLUSTER_SCOPED_KINDS.contains(&self.kind.as_str())
    }
}

/// Split a multi-document YAML string into JSON trees, skipping empty documents.
///
/// # Errors
///
/// Returns an error when a document is not valid YAML.
pub fn parse_documents(yaml: &str) -> anyhow::Result<Vec<Value>> {
    let mut docs = Vec::new();
    for document in serde_yaml::Deserializer::from_str(yaml) {
        let value = Value::deserialize(document).context("invalid YAML document")?;
        if !value.is_null() {
            docs.push(value);
        }
    }
    Ok(docs)
}

/// Server-side apply one manifest.
///
/// # Errors
///
/// Returns an error when the manifest lacks identity fields or the server
/// rejects it.
pub async fn apply_object(client: &Client, obj: &Value) -> anyhow::Result<()> {
    let id = ManifestId::of(obj)?;
    let ar = id.api_resource();
    let api: Api<DynamicObject> = if id.cluster_scoped() {
        Api::all_with(client.clone(), &ar)
    } else if let Some(ns) = &id.namespace {
        Api::namespaced_with(client.clone(), ns, &ar)
    } else {
        Api::default_namespaced_with(client.clone(), &ar)
    };

    api.patch(
        &id.name,
        &PatchParams::apply(FIELD_MANAGER).force(),
        &Patch::Apply(obj),
    )
    .await
    .map_err(|e| ResourceError::from_kube(e, &ar.plural, &id.name))?;

    info!(
        kind = %id.kind,
        name = %id.name,
        namespace = id.namespace.as_deref().unwrap_or(""),
        "Applied manifest"
    );
    Ok(())
}

/// Server-side apply every document of a multi-document YAML string.
///
/// # Errors
///
/// Returns the first parse or apply error.
pub async fn apply_yaml(client: &Client, yaml: &str) -> anyhow::Result<()> {
    for doc in parse_documents(yaml)? {
        apply_object(client, &doc).await?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "resources_tests.rs"]
mod resources_tests;
