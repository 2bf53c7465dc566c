// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the observability e2e harness.
//!
//! Names, namespaces, API groups and the timeout/interval pairs used by every
//! convergence wait. Constants are organized by category for easy maintenance.

use std::time::Duration;

// ============================================================================
// Namespaces
// ============================================================================

/// Namespace where the multicluster-observability operator runs
pub const MCO_OPERATOR_NAMESPACE: &str = "open-cluster-management";

/// Namespace holding the hub-side observability components
pub const MCO_NAMESPACE: &str = "open-cluster-management-observability";

/// Namespace holding the addon components on each managed cluster
pub const MCO_ADDON_NAMESPACE: &str = "open-cluster-management-addon-observability";

/// Namespace of the hub's own managed cluster registration
pub const LOCAL_CLUSTER_NAMESPACE: &str = "local-cluster";

// ============================================================================
// Resource Names
// ============================================================================

/// Name of the `MultiClusterObservability` singleton
pub const MCO_CR_NAME: &str = "observability";

/// Name of the `ObservabilityAddon` created in each managed cluster namespace
pub const MCO_ADDON_NAME: &str = "observability-addon";

/// Pull secret copied from the operator namespace in canary runs
pub const MCO_PULL_SECRET_NAME: &str = "multiclusterhub-operator-pull-secret";

/// Secret holding the Thanos object storage configuration
pub const OBJ_SECRET_NAME: &str = "thanos-object-storage";

/// Key inside [`OBJ_SECRET_NAME`] holding the Thanos bucket config
pub const OBJ_SECRET_KEY: &str = "thanos.yaml";

/// `ClusterManagementAddOn` registered by the operator
pub const CLUSTER_MANAGEMENT_ADDON_NAME: &str = "observability-controller";

/// `ManifestWork` carrying the endpoint operator to each managed cluster
pub const ENDPOINT_MANIFESTWORK_NAME: &str = "endpoint-observability-work";

/// `PlacementRule` selecting managed clusters for observability
pub const PLACEMENT_RULE_NAME: &str = "observability";

/// Alertmanager configuration secret
pub const ALERTMANAGER_CONFIG_SECRET: &str = "alertmanager-config";

/// Default Thanos ruler rules configmap
pub const THANOS_RULER_DEFAULT_RULES: &str = "thanos-ruler-default-rules";

/// Custom Thanos ruler rules configmap
pub const THANOS_RULER_CUSTOM_RULES: &str = "thanos-ruler-custom-rules";

/// Custom metrics allowlist configmap
pub const CUSTOM_ALLOWLIST_NAME: &str = "observability-metrics-custom-allowlist";

/// Default metrics allowlist configmap
pub const DEFAULT_ALLOWLIST_NAME: &str = "observability-metrics-allowlist";

/// Custom dashboard configmap created by the dashboard scenario
pub const SAMPLE_DASHBOARD_NAME: &str = "sample-dashboard";

/// Metrics collector deployment on managed clusters
pub const METRICS_COLLECTOR_DEPLOYMENT: &str = "metrics-collector-deployment";

/// Endpoint operator deployment on managed clusters
pub const ENDPOINT_OPERATOR_DEPLOYMENT: &str = "endpoint-observability-operator";

/// Cluster role binding owned by the metrics collector
pub const METRICS_COLLECTOR_VIEW_CRB: &str = "metrics-collector-view";

/// CA bundle configmap used by the metrics collector
pub const METRICS_COLLECTOR_CA_BUNDLE: &str = "metrics-collector-serving-certs-ca-bundle";

/// Server certificate secret of the observability API
pub const SERVER_CERT_SECRET: &str = "observability-server-certs";

/// Server CA secret of the observability API
pub const SERVER_CA_SECRET: &str = "observability-server-ca-certs";

/// Operator container name, used to fetch logs when install fails
pub const MCO_OPERATOR_CONTAINER: &str = "multicluster-observability-operator";

/// Service account used to obtain a bearer token for Grafana
pub const TESTING_SERVICE_ACCOUNT: &str = "mco-e2e-testing";

/// Long-lived token secret bound to [`TESTING_SERVICE_ACCOUNT`]
pub const TESTING_TOKEN_SECRET: &str = "mco-e2e-testing-token";

/// Binding granting `cluster-admin` to [`TESTING_SERVICE_ACCOUNT`]
pub const TESTING_CLUSTER_ROLE_BINDING: &str = "mco-e2e-testing-cluster-admin";

/// Default Slack channel for the Alertmanager receiver
pub const DEFAULT_SLACK_CHANNEL: &str = "team-observability-test";

/// Webhook written into the Alertmanager receiver when `SLACK_WEBHOOK_URL` is unset
pub const DEFAULT_SLACK_WEBHOOK_URL: &str = "https://hooks.slack.com/services/placeholder";

/// Required CRDs the operator installs
pub const REQUIRED_CRDS: [&str; 3] = [
    "multiclusterobservabilities.observability.open-cluster-management.io",
    "observatoria.core.observatorium.io",
    "observabilityaddons.observability.open-cluster-management.io",
];

/// Condition type reported by a ready MCO instance
pub const CONDITION_READY: &str = "Ready";

// ============================================================================
// API Groups
// ============================================================================

/// Observability API group
pub const MCO_GROUP: &str = "observability.open-cluster-management.io";

/// OCM work API group
pub const OCM_WORK_GROUP: &str = "work.open-cluster-management.io";

/// OCM cluster API group
pub const OCM_CLUSTER_GROUP: &str = "cluster.open-cluster-management.io";

/// OCM addon API group
pub const OCM_ADDON_GROUP: &str = "addon.open-cluster-management.io";

/// OCM apps API group (placement rules)
pub const OCM_APPS_GROUP: &str = "apps.open-cluster-management.io";

/// Observatorium API group
pub const OBSERVATORIUM_GROUP: &str = "core.observatorium.io";

/// Hive API group
pub const HIVE_GROUP: &str = "hive.openshift.io";

// ============================================================================
// Defaults
// ============================================================================

/// Default options file when neither flag nor `OPTIONS` is given
pub const DEFAULT_OPTIONS_FILE: &str = "resources/options.yaml";

/// Default `OpenShift` release used by the `ClusterImageSet` check
pub const OCP_RELEASE_DEFAULT: &str = "4.4.4";

/// Default JUnit report path
pub const DEFAULT_REPORT_FILE: &str = "results.xml";

/// Default kubeadmin user
pub const DEFAULT_KUBEADMIN_USER: &str = "kubeadmin";

/// Owner prefix used when neither options nor `$USER` provide one
pub const DEFAULT_OWNER_PREFIX: &str = "ginkgo";

/// Field manager used for server-side apply
pub const FIELD_MANAGER: &str = "observability-e2e";

/// Name of the JUnit test suite
pub const SUITE_NAME: &str = "Observability E2E Suite";

/// Lines of operator log to dump when install fails
pub const OPERATOR_LOG_TAIL_LINES: i64 = 1000;

/// Attempts made by the read-modify-write mutator before giving up on conflicts
pub const CONFLICT_RETRY_ATTEMPTS: u32 = 5;

// ============================================================================
// Poll Timeouts and Intervals
// ============================================================================

/// One-second poll interval
pub const POLL_INTERVAL_1S: Duration = Duration::from_secs(1);

/// Three-second poll interval
pub const POLL_INTERVAL_3S: Duration = Duration::from_secs(3);

/// Five-second poll interval (most call sites)
pub const POLL_INTERVAL_5S: Duration = Duration::from_secs(5);

/// One-minute timeout
pub const TIMEOUT_1M: Duration = Duration::from_secs(60);

/// Three-minute timeout
pub const TIMEOUT_3M: Duration = Duration::from_secs(3 * 60);

/// Five-minute timeout
pub const TIMEOUT_5M: Duration = Duration::from_secs(5 * 60);

/// Ten-minute timeout
pub const TIMEOUT_10M: Duration = Duration::from_secs(10 * 60);

/// Twenty-minute timeout (MCO ready after install)
pub const TIMEOUT_20M: Duration = Duration::from_secs(20 * 60);

/// Twenty-five-minute timeout (High mode components after install)
pub const TIMEOUT_25M: Duration = Duration::from_secs(25 * 60);

// ============================================================================
// HTTP
// ============================================================================

/// Timeout applied to each request against Grafana, Prometheus and Slack
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Marker a successful Prometheus API response carries
pub const PROMETHEUS_SUCCESS_MARKER: &str = r#""status":"success""#;

/// Default Slack Web API base URL
pub const SLACK_API_BASE: &str = "https://slack.com/api";

/// Alert title expected in the Slack channel
pub const SLACK_EXPECTED_ALERT_TITLE: &str = "[FIRING] NodeOutOfMemory (warning)";
