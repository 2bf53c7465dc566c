// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Group/version/resource identities for the custom resources the harness touches.
//!
//! None of these CRDs have generated Rust types here, so they are addressed as
//! `DynamicObject`s through an [`ApiResource`] built from a [`Gvr`].

use crate::constants::{
    HIVE_GROUP, MCO_GROUP, OBSERVATORIUM_GROUP, OCM_ADDON_GROUP, OCM_APPS_GROUP,
    OCM_CLUSTER_GROUP, OCM_WORK_GROUP,
};
use kube::api::{ApiResource, DynamicObject, GroupVersionKind};
use kube::{Api, Client};
use std::fmt;

/// Static identity of a resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gvr {
    /// API group, empty for the core group
    pub group: &'static str,
    /// API version
    pub version: &'static str,
    /// Kind
    pub kind: &'static str,
    /// Plural resource name
    pub plural: &'static str,
    /// Whether objects of this type live outside namespaces
    pub cluster_scoped: bool,
}

impl Gvr {
    /// `group/version`, or just `version` for the core group.
    #[must_use]
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.to_string()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// `ApiResource` for dynamic API calls.
    #[must_use]
    pub fn api_resource(&self) -> ApiResource {
        ApiResource::from_gvk_with_plural(
            &GroupVersionKind::gvk(self.group, self.version, self.kind),
            self.plural,
        )
    }

    /// Dynamic API handle, namespaced unless the type is cluster scoped.
    #[must_use]
    pub fn api(&self, client: &Client, namespace: Option<&str>) -> Api<DynamicObject> {
        let ar = self.api_resource();
        match namespace {
            Some(ns) if !self.cluster_scoped => Api::namespaced_with(client.clone(), ns, &ar),
            _ => Api::all_with(client.clone(), &ar),
        }
    }
}

impl fmt::Display for Gvr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}.{}", self.plural, self.version)
        } else {
            write!(f, "{}.{}.{}", self.plural, self.version, self.group)
        }
    }
}

/// `MultiClusterObservability`, v1beta1 (storage and addon defaults)
pub const MCO_V1BETA1: Gvr = Gvr {
    group: MCO_GROUP,
    version: "v1beta1",
    kind: "MultiClusterObservability",
    plural: "multiclusterobservabilities",
    cluster_scoped: true,
};

/// `MultiClusterObservability`, v1beta2
pub const MCO_V1BETA2: Gvr = Gvr {
    group: MCO_GROUP,
    version: "v1beta2",
    kind: "MultiClusterObservability",
    plural: "multiclusterobservabilities",
    cluster_scoped: true,
};

/// `ObservabilityAddon`, one per managed cluster namespace
pub const MCO_ADDON: Gvr = Gvr {
    group: MCO_GROUP,
    version: "v1beta1",
    kind: "ObservabilityAddon",
    plural: "observabilityaddons",
    cluster_scoped: false,
};

/// OCM `ManifestWork`
pub const MANIFEST_WORK: Gvr = Gvr {
    group: OCM_WORK_GROUP,
    version: "v1",
    kind: "ManifestWork",
    plural: "manifestworks",
    cluster_scoped: false,
};

/// OCM `ManagedCluster`
pub const MANAGED_CLUSTER: Gvr = Gvr {
    group: OCM_CLUSTER_GROUP,
    version: "v1",
    kind: "ManagedCluster",
    plural: "managedclusters",
    cluster_scoped: true,
};

/// OCM `ClusterManagementAddOn`
pub const CLUSTER_MANAGEMENT_ADDON: Gvr = Gvr {
    group: OCM_ADDON_GROUP,
    version: "v1alpha1",
    kind: "ClusterManagementAddOn",
    plural: "clustermanagementaddons",
    cluster_scoped: true,
};

/// Observatorium instance backing the hub components
pub const OBSERVATORIUM: Gvr = Gvr {
    group: OBSERVATORIUM_GROUP,
    version: "v1alpha1",
    kind: "Observatorium",
    plural: "observatoria",
    cluster_scoped: false,
};

/// OCM `PlacementRule`
pub const PLACEMENT_RULE: Gvr = Gvr {
    group: OCM_APPS_GROUP,
    version: "v1",
    kind: "PlacementRule",
    plural: "placementrules",
    cluster_scoped: false,
};

/// Hive `ClusterImageSet`
pub const CLUSTER_IMAGE_SET: Gvr = Gvr {
    group: HIVE_GROUP,
    version: "v1",
    kind: "ClusterImageSet",
    plural: "clusterimagesets",
    cluster_scoped: true,
};

/// A single object: type, optional namespace and name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    /// Resource type
    pub gvr: Gvr,
    /// Namespace, `None` for cluster-scoped objects
    pub namespace: Option<String>,
    /// Object name
    pub name: String,
}

impl ResourceRef {
    /// Reference a cluster-scoped object.
    #[must_use]
    pub fn cluster(gvr: Gvr, name: impl Into<String>) -> Self {
        Self {
            gvr,
            namespace: None,
            name: name.into(),
        }
    }

    /// Reference a namespaced object.
    #[must_use]
    pub fn namespaced(gvr: Gvr, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            gvr,
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }

    /// Dynamic API handle scoped to this object's namespace.
    #[must_use]
    pub fn api(&self, client: &Client) -> Api<DynamicObject> {
        self.gvr.api(client, self.namespace.as_deref())
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{} {}/{}", self.gvr.plural, ns, self.name),
            None => write!(f, "{} {}", self.gvr.plural, self.name),
        }
    }
}

#[cfg(test)]
#[path = "gvr_tests.rs"]
mod gvr_tests;
