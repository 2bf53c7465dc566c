// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Manifest builders for every object the harness creates.
//!
//! Two sources are supported for the larger bundles (MCO instances, alert
//! rules, dashboards, allowlist):
//!
//! - a kustomize tree under `manifestsDir`, rendered with `kubectl kustomize`;
//! - the built-in copies under `templates/`, embedded at compile time.
//!
//! Small objects (namespace, secrets, RBAC, placement decisions) are built as
//! JSON trees and applied with [`crate::resources::apply_object`].

use crate::constants::{
    ALERTMANAGER_CONFIG_SECRET, DEFAULT_SLACK_CHANNEL, DEFAULT_SLACK_WEBHOOK_URL, MCO_NAMESPACE,
    OBJ_SECRET_KEY, OBJ_SECRET_NAME, TESTING_CLUSTER_ROLE_BINDING, TESTING_SERVICE_ACCOUNT,
    TESTING_TOKEN_SECRET,
};
use crate::resources::parse_documents;
use anyhow::{anyhow, bail, Context as _};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

// Embed manifests at compile time
const ALERTMANAGER_TEMPLATE: &str = include_str!("../templates/alertmanager.yaml.tmpl");
const MCO_V1BETA1_TEMPLATE: &str = include_str!("../templates/mco-v1beta1.yaml.tmpl");
const MCO_V1BETA2_TEMPLATE: &str = include_str!("../templates/mco-v1beta2.yaml.tmpl");
const CUSTOM_RULES_VALID: &str = include_str!("../templates/custom-rules-valid.yaml");
const CUSTOM_RULES_INVALID: &str = include_str!("../templates/custom-rules-invalid.yaml");
const METRICS_ALLOWLIST: &str = include_str!("../templates/metrics-allowlist.yaml");
const SAMPLE_DASHBOARD: &str = include_str!("../templates/sample-dashboard.yaml");
const SAMPLE_DASHBOARD_UPDATED: &str = include_str!("../templates/sample-dashboard-updated.yaml");

/// Golden file of the v1beta1 to v1beta2 conversion, relative to `manifestsDir`
const CONVERSION_GOLDEN: &str = "mco/e2e/v1beta1/observability-v1beta1-to-v1beta2-golden.yaml";

/// A manifest bundle the scenarios apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bundle {
    /// Resource quota and limit range policy; only available from `manifestsDir`
    Policy,
    /// MCO instance in the v1beta1 schema
    McoV1beta1,
    /// MCO instance in the v1beta2 schema
    McoV1beta2,
    /// Thanos ruler custom rules that fire
    CustomRulesValid,
    /// Thanos ruler custom rules that never fire
    CustomRulesInvalid,
    /// Custom metrics allowlist
    MetricsAllowlist,
    /// Custom Grafana dashboard
    SampleDashboard,
    /// The same dashboard with a new title
    UpdatedSampleDashboard,
}

impl Bundle {
    /// Kustomization directory relative to `manifestsDir`.
    #[must_use]
    pub const fn kustomization_dir(self) -> &'static str {
        match self {
            Self::Policy => "policy",
            Self::McoV1beta1 => "mco/e2e/v1beta1",
            Self::McoV1beta2 => "mco/e2e/v1beta2",
            Self::CustomRulesValid => "alerts/custom_rules_valid",
            Self::CustomRulesInvalid => "alerts/custom_rules_invalid",
            Self::MetricsAllowlist => "metrics/allowlist",
            Self::SampleDashboard => "dashboards/sample_custom_dashboard",
            Self::UpdatedSampleDashboard => "dashboards/update_sample_custom_dashboard",
        }
    }

    /// Built-in copy, with the MCO name filled in.
    #[must_use]
    pub fn builtin(self, mco_name: &str) -> Option<String> {
        let yaml = match self {
            Self::Policy => return None,
            Self::McoV1beta1 => MCO_V1BETA1_TEMPLATE.replace("{{NAME}}", mco_name),
            Self::McoV1beta2 => MCO_V1BETA2_TEMPLATE.replace("{{NAME}}", mco_name),
            Self::CustomRulesValid => CUSTOM_RULES_VALID.to_string(),
            Self::CustomRulesInvalid => CUSTOM_RULES_INVALID.to_string(),
            Self::MetricsAllowlist => METRICS_ALLOWLIST.to_string(),
            Self::SampleDashboard => SAMPLE_DASHBOARD.to_string(),
            Self::UpdatedSampleDashboard => SAMPLE_DASHBOARD_UPDATED.to_string(),
        };
        Some(yaml)
    }
}

/// Render a kustomization directory with `kubectl kustomize`.
///
/// # Errors
///
/// Returns an error when kubectl cannot be started or exits non-zero.
pub async fn kustomize(dir: &Path) -> anyhow::Result<String> {
    debug!(dir = %dir.display(), "Rendering kustomization");
    let output = Command::new("kubectl")
        .arg("kustomize")
        .arg(dir)
        .output()
        .await
        .context("failed to run kubectl kustomize")?;
    if !output.status.success() {
        bail!(
            "kubectl kustomize {} failed: {}",
            dir.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    String::from_utf8(output.stdout).context("kustomize output is not UTF-8")
}

/// YAML for a bundle.
///
/// With a manifests directory the kustomization is rendered; otherwise the
/// built-in copy is used. `Ok(None)` means the bundle has no built-in copy and
/// no directory was given.
///
/// # Errors
///
/// Returns an error when rendering fails.
pub async fn render(
    bundle: Bundle,
    manifests_dir: Option<&Path>,
    mco_name: &str,
) -> anyhow::Result<Option<String>> {
    match manifests_dir {
        Some(dir) => kustomize(&dir.join(bundle.kustomization_dir()))
            .await
            .map(Some),
        None => Ok(bundle.builtin(mco_name)),
    }
}

/// Path of the conversion golden file under a manifests directory.
#[must_use]
pub fn conversion_golden(manifests_dir: &Path) -> PathBuf {
    manifests_dir.join(CONVERSION_GOLDEN)
}

/// `metadata.labels` of the first document.
///
/// # Errors
///
/// Returns an error when the YAML is invalid or empty.
pub fn manifest_labels(yaml: &str) -> anyhow::Result<BTreeMap<String, String>> {
    let docs = parse_documents(yaml)?;
    let first = docs.first().ok_or_else(|| anyhow!("manifest has no documents"))?;
    let labels = first
        .pointer("/metadata/labels")
        .and_then(Value::as_object)
        .map(|labels| {
            labels
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect()
        })
        .unwrap_or_default();
    Ok(labels)
}

/// Namespace manifest.
#[must_use]
pub fn namespace(name: &str) -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": {"name": name}
    })
}

/// Object storage credentials, as read from the environment.
#[derive(Clone, Default)]
pub struct ObjectStorageEnv {
    /// `BUCKET`
    pub bucket: Option<String>,
    /// `REGION`
    pub region: Option<String>,
    /// `AWS_ACCESS_KEY_ID`
    pub access_key_id: Option<String>,
    /// `AWS_SECRET_ACCESS_KEY`
    pub secret_access_key: Option<String>,
}

fn required<'a>(value: Option<&'a String>, what: &str) -> anyhow::Result<&'a str> {
    value
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow!("failed to get {what} env"))
}

/// Thanos object storage secret for an S3 bucket.
///
/// # Errors
///
/// Returns an error naming the first missing variable, e.g.
/// `failed to get s3 BUCKET env`.
pub fn object_storage_secret(env: &ObjectStorageEnv) -> anyhow::Result<Value> {
    let bucket = required(env.bucket.as_ref(), "s3 BUCKET")?;
    let region = required(env.region.as_ref(), "s3 REGION")?;
    let access_key = required(env.access_key_id.as_ref(), "aws AWS_ACCESS_KEY_ID")?;
    let secret_key = required(env.secret_access_key.as_ref(), "aws AWS_SECRET_ACCESS_KEY")?;

    let thanos = format!(
        "type: s3\nconfig:\n  bucket: {bucket}\n  endpoint: s3.{region}.amazonaws.com\n  \
         insecure: false\n  access_key: {access_key}\n  secret_key: {secret_key}\n"
    );
    Ok(json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "type": "Opaque",
        "metadata": {"name": OBJ_SECRET_NAME, "namespace": MCO_NAMESPACE},
        "data": {OBJ_SECRET_KEY: BASE64.encode(thanos)}
    }))
}

/// Copy of a secret under the same name in another namespace.
///
/// Server-populated metadata is dropped.
#[must_use]
pub fn copy_secret(source: &Secret, namespace: &str) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: source.metadata.name.clone(),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        data: source.data.clone(),
        string_data: source.string_data.clone(),
        type_: source.type_.clone(),
        immutable: source.immutable,
    }
}

/// Where Alertmanager delivers notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackReceiver {
    /// Incoming webhook URL
    pub api_url: String,
    /// Channel name
    pub channel: String,
}

impl Default for SlackReceiver {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_SLACK_WEBHOOK_URL.to_string(),
            channel: DEFAULT_SLACK_CHANNEL.to_string(),
        }
    }
}

/// Alertmanager configuration with a Slack receiver.
#[must_use]
pub fn alertmanager_config(base_domain: &str, receiver: &SlackReceiver) -> String {
    ALERTMANAGER_TEMPLATE
        .replace("{{SLACK_API_URL}}", &receiver.api_url)
        .replace("{{SLACK_CHANNEL}}", &receiver.channel)
        .replace("{{BASE_DOMAIN}}", base_domain)
}

/// `alertmanager-config` secret carrying [`alertmanager_config`].
#[must_use]
pub fn alertmanager_config_secret(base_domain: &str, receiver: &SlackReceiver) -> Value {
    let config = alertmanager_config(base_domain, receiver);
    json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "metadata": {"name": ALERTMANAGER_CONFIG_SECRET, "namespace": MCO_NAMESPACE},
        "data": {"alertmanager.yaml": BASE64.encode(config)}
    })
}

/// Service account, token secret and cluster-admin binding used to obtain a
/// bearer token for Grafana.
#[must_use]
pub fn testing_rbac() -> Vec<Value> {
    vec![
        json!({
            "apiVersion": "v1",
            "kind": "ServiceAccount",
            "metadata": {"name": TESTING_SERVICE_ACCOUNT, "namespace": MCO_NAMESPACE}
        }),
        json!({
            "apiVersion": "v1",
            "kind": "Secret",
            "type": "kubernetes.io/service-account-token",
            "metadata": {
                "name": TESTING_TOKEN_SECRET,
                "namespace": MCO_NAMESPACE,
                "annotations": {"kubernetes.io/service-account.name": TESTING_SERVICE_ACCOUNT}
            }
        }),
        json!({
            "apiVersion": "rbac.authorization.k8s.io/v1",
            "kind": "ClusterRoleBinding",
            "metadata": {"name": TESTING_CLUSTER_ROLE_BINDING},
            "roleRef": {
                "apiGroup": "rbac.authorization.k8s.io",
                "kind": "ClusterRole",
                "name": "cluster-admin"
            },
            "subjects": [{
                "kind": "ServiceAccount",
                "name": TESTING_SERVICE_ACCOUNT,
                "namespace": MCO_NAMESPACE
            }]
        }),
    ]
}

/// Status patch placing observability on every named managed cluster.
#[must_use]
pub fn placement_decisions(clusters: &[String]) -> Value {
    let decisions: Vec<Value> = clusters
        .iter()
        .map(|c| json!({"clusterName": c, "clusterNamespace": c}))
        .collect();
    debug!(count = decisions.len(), "Built placement decisions");
    json!({"status": {"decisions": decisions}})
}

/// `ClusterImageSet` name hive uses for an `OpenShift` release.
#[must_use]
pub fn cluster_image_set_name(release: &str) -> String {
    format!("img{release}-x86-64")
}

#[cfg(test)]
#[path = "manifests_tests.rs"]
mod manifests_tests;
