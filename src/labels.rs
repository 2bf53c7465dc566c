// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Label selectors and well-known label keys used to find observability workloads.

// ============================================================================
// Kubernetes Standard Labels
// ============================================================================

/// Node selector key targeted by the reconcile scenario
pub const K8S_OS: &str = "kubernetes.io/os";

/// Topology key for per-host anti-affinity
pub const TOPOLOGY_HOSTNAME: &str = "kubernetes.io/hostname";

/// Topology key for per-zone anti-affinity
pub const TOPOLOGY_ZONE: &str = "topology.kubernetes.io/zone";

/// Annotation marking the default storage class
pub const DEFAULT_STORAGE_CLASS_ANNOTATION: &str = "storageclass.kubernetes.io/is-default-class";

// ============================================================================
// Selectors
// ============================================================================

/// Selects the multicluster-observability operator pod
pub const MCO_LABEL: &str = "name=multicluster-observability-operator";

/// Selects the metrics collector pods on managed clusters
pub const METRICS_COLLECTOR_LABEL: &str = "component=metrics-collector";

/// Selects the observatorium API pods
pub const OBSERVATORIUM_API_LABEL: &str = "app.kubernetes.io/name=observatorium-api";

/// Selects Thanos compact statefulsets
pub const THANOS_COMPACT_LABEL: &str = "app.kubernetes.io/name=thanos-compact";

/// Selects Thanos store statefulsets
pub const THANOS_STORE_LABEL: &str = "app.kubernetes.io/name=thanos-store";

/// Selects Thanos receive statefulsets
pub const THANOS_RECEIVE_LABEL: &str = "app.kubernetes.io/name=thanos-receive";

/// Selects Thanos rule statefulsets
pub const THANOS_RULE_LABEL: &str = "app.kubernetes.io/name=thanos-rule";

/// Managed cluster label that opts a cluster out of observability
pub const OBSERVABILITY_OPT_OUT_LABEL: &str = "observability";

/// Managed cluster vendor label
pub const CLUSTER_VENDOR_LABEL: &str = "vendor";

/// Managed cluster name label
pub const CLUSTER_NAME_LABEL: &str = "name";

/// Managed cluster `OpenShift` version label
pub const CLUSTER_OPENSHIFT_VERSION_LABEL: &str = "openshiftVersion";

/// Managed cluster ID label
pub const CLUSTER_ID_LABEL: &str = "clusterID";
