// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Options file loading.
//!
//! The options file is YAML with a single `options:` root. It names the hub
//! cluster, the managed clusters and the credentials the suite uses. It is
//! loaded once, resolved against CLI flags and environment variables, and then
//! treated as immutable.
//!
//! # Example
//!
//! ```yaml
//! options:
//!   hub:
//!     name: hub
//!     baseDomain: demo.example.com
//!     kubeconfig: /tmp/hub.kubeconfig
//!   clusters:
//!     - name: spoke-1
//!       baseDomain: spoke.example.com
//!       kubeconfig: /tmp/spoke.kubeconfig
//! ```

use crate::constants::{
    DEFAULT_KUBEADMIN_USER, DEFAULT_OPTIONS_FILE, DEFAULT_OWNER_PREFIX, OCP_RELEASE_DEFAULT,
};
use crate::errors::OptionsError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Top-level document of the options file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestOptionsContainer {
    /// Everything lives under `options:`
    #[serde(default)]
    pub options: TestOptions,
}

/// Configuration for one test run.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestOptions {
    /// Hub cluster under test
    #[serde(rename = "hub", default)]
    pub hub_cluster: Cluster,

    /// Managed clusters registered with the hub
    #[serde(default, alias = "managedClusters")]
    pub clusters: Vec<Cluster>,

    /// Kubeconfig for the hub
    #[serde(default, rename = "kubeconfig")]
    pub kube_config: String,

    /// Cloud provider connection details
    #[serde(default)]
    pub connection: CloudConnection,

    /// Image registry credentials
    #[serde(default)]
    pub image_registry: Registry,

    /// Prefix identifying who owns resources created by the run
    #[serde(default)]
    pub owner_prefix: String,

    /// Browser mode for UI tests (parsed, unused)
    #[serde(default)]
    pub headless: String,

    /// Directory holding kustomize bases (`policy/`) and golden files
    #[serde(default)]
    pub manifests_dir: String,
}

/// Connection details for one cluster.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    /// Cluster name
    #[serde(default)]
    pub name: String,

    /// API server URL, defaults to `https://api.<baseDomain>:6443`
    #[serde(default, rename = "masterURL")]
    pub master_url: String,

    /// Kubeconfig path for this cluster
    #[serde(default, rename = "kubeconfig")]
    pub kube_config: String,

    /// Context inside the kubeconfig
    #[serde(default)]
    pub kube_context: String,

    /// Base DNS domain of the cluster
    #[serde(default)]
    pub base_domain: String,

    /// Console user
    #[serde(default)]
    pub user: String,

    /// Console password
    #[serde(default)]
    pub password: String,

    /// Explicit Grafana URL, overriding the console route
    #[serde(default, rename = "grafanaURL")]
    pub grafana_url: String,

    /// Host header sent with Grafana requests when `grafanaURL` is set
    #[serde(default)]
    pub grafana_host: String,
}

/// Cloud connection used by cluster lifecycle cases.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudConnection {
    /// Per-provider credentials
    #[serde(default)]
    pub keys: CloudKeys,

    /// `OpenShift` release for `ClusterImageSet`s
    #[serde(default, rename = "ocpRelease")]
    pub ocp_release: String,
}

/// Credentials per cloud provider.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CloudKeys {
    /// AWS credentials
    #[serde(default)]
    pub aws: Option<BTreeMap<String, String>>,
    /// GCP credentials
    #[serde(default)]
    pub gcp: Option<BTreeMap<String, String>>,
    /// Azure credentials
    #[serde(default)]
    pub azure: Option<BTreeMap<String, String>>,
}

impl CloudKeys {
    /// Returns true when at least one provider has credentials.
    #[must_use]
    pub fn any(&self) -> bool {
        [&self.aws, &self.gcp, &self.azure]
            .iter()
            .any(|keys| keys.as_ref().is_some_and(|k| !k.is_empty()))
    }
}

/// Image registry credentials.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Registry {
    /// Registry host
    #[serde(default)]
    pub server: String,
    /// Registry user
    #[serde(default)]
    pub user: String,
    /// Registry password
    #[serde(default)]
    pub password: String,
}

/// Values from the command line and environment that feed option resolution.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// `--kubeconfig`
    pub kubeconfig_flag: Option<String>,
    /// `--kubeadmin-user`
    pub kubeadmin_user: Option<String>,
    /// `--kubeadmin-credential`
    pub kubeadmin_credential: Option<String>,
    /// `--base-domain`
    pub base_domain: Option<String>,
    /// `$KUBECONFIG`
    pub env_kubeconfig: Option<String>,
    /// `$USER`
    pub env_user: Option<String>,
}

impl Overrides {
    /// Pick up `KUBECONFIG` and `USER` from the process environment.
    #[must_use]
    pub fn with_process_env(mut self) -> Self {
        self.env_kubeconfig = std::env::var("KUBECONFIG").ok();
        self.env_user = std::env::var("USER").ok();
        self
    }
}

/// Options file path from the flag, then `OPTIONS`, then the default.
#[must_use]
pub fn options_path(flag: Option<&str>, env: Option<&str>) -> PathBuf {
    flag.filter(|s| !s.is_empty())
        .or_else(|| env.filter(|s| !s.is_empty()))
        .map_or_else(|| PathBuf::from(DEFAULT_OPTIONS_FILE), PathBuf::from)
}

/// Parse an options document.
///
/// # Errors
///
/// Returns [`OptionsError::Parse`] when the YAML does not match the schema.
pub fn parse(content: &str, origin: &str) -> Result<TestOptions, OptionsError> {
    let container: TestOptionsContainer =
        serde_yaml::from_str(content).map_err(|source| OptionsError::Parse {
            path: origin.to_string(),
            source,
        })?;
    Ok(container.options)
}

/// Read and parse the options file at `path`.
///
/// # Errors
///
/// Returns [`OptionsError::Read`] or [`OptionsError::Parse`].
pub async fn load(path: &Path) -> Result<TestOptions, OptionsError> {
    let shown = path.display().to_string();
    debug!(path = %shown, "Loading options file");
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| OptionsError::Read {
            path: shown.clone(),
            source,
        })?;
    parse(&content, &shown)
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|s| !s.is_empty()).cloned()
}

impl TestOptions {
    /// Apply flag and environment overrides and fill in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError::Missing`] when no hub base domain is available.
    pub fn resolve(mut self, overrides: &Overrides) -> Result<Self, OptionsError> {
        if self.owner_prefix.is_empty() {
            self.owner_prefix = non_empty(overrides.env_user.as_ref())
                .unwrap_or_else(|| DEFAULT_OWNER_PREFIX.to_string());
        }

        if self.connection.ocp_release.is_empty() {
            self.connection.ocp_release = OCP_RELEASE_DEFAULT.to_string();
        }

        if self.kube_config.is_empty() {
            self.kube_config = non_empty(overrides.kubeconfig_flag.as_ref())
                .or_else(|| non_empty(overrides.env_kubeconfig.as_ref()))
                .unwrap_or_default();
        }

        if self.hub_cluster.base_domain.is_empty() {
            if let Some(domain) = non_empty(overrides.base_domain.as_ref()) {
                self.hub_cluster.base_domain = domain;
            }
        }
        if self.hub_cluster.base_domain.is_empty() {
            warn!("No `hub.baseDomain` was included in the options file, tests cannot run");
            return Err(OptionsError::Missing {
                field: "hub.baseDomain",
            });
        }
        if self.hub_cluster.master_url.is_empty() {
            self.hub_cluster.master_url =
                format!("https://api.{}:6443", self.hub_cluster.base_domain);
        }

        if self.hub_cluster.user.is_empty() {
            self.hub_cluster.user = non_empty(overrides.kubeadmin_user.as_ref())
                .unwrap_or_else(|| DEFAULT_KUBEADMIN_USER.to_string());
        }
        if self.hub_cluster.password.is_empty() {
            self.hub_cluster.password =
                non_empty(overrides.kubeadmin_credential.as_ref()).unwrap_or_default();
        }

        debug!(
            owner_prefix = %self.owner_prefix,
            ocp_release = %self.connection.ocp_release,
            master_url = %self.hub_cluster.master_url,
            managed_clusters = self.clusters.len(),
            "Resolved test options"
        );
        Ok(self)
    }

    /// Whether UI tests would run headless. Defaults to true.
    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless != "false"
    }

    /// First managed cluster, used for addon-side checks.
    #[must_use]
    pub fn first_managed_cluster(&self) -> Option<&Cluster> {
        self.clusters.first()
    }

    /// `ManifestsDir` as a path, when set.
    #[must_use]
    pub fn manifests_dir(&self) -> Option<&Path> {
        if self.manifests_dir.is_empty() {
            None
        } else {
            Some(Path::new(&self.manifests_dir))
        }
    }
}

#[cfg(test)]
#[path = "options_tests.rs"]
mod options_tests;
