// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubernetes client construction for the hub and managed clusters.
//!
//! Config resolution for one cluster:
//!
//! 1. An empty kubeconfig path falls back to `$KUBECONFIG`.
//! 2. With a kubeconfig and a context, that context is used as-is.
//! 3. With a kubeconfig and no context, the current context is used and its
//!    server is replaced by the cluster's master URL.
//! 4. Without a kubeconfig, the in-cluster config is tried, then
//!    `~/.kube/config` with the master URL override.
//!
//! Managed-side checks use the first managed cluster with its default context.
//! When no managed cluster is configured the hub doubles as the managed
//! cluster (`local-cluster`).

use crate::constants::{MCO_NAMESPACE, TESTING_TOKEN_SECRET};
use crate::options::TestOptions;
use anyhow::{anyhow, Context as _, Result};
use k8s_openapi::api::core::v1::Secret;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config};
use secrecy::ExposeSecret;
use tracing::{debug, info};

fn override_cluster_url(config: &mut Config, master_url: &str) -> Result<()> {
    if master_url.is_empty() {
        return Ok(());
    }
    config.cluster_url = master_url
        .parse()
        .with_context(|| format!("invalid master URL {master_url}"))?;
    Ok(())
}

fn resolve_kubeconfig_path(kubeconfig: &str) -> String {
    if kubeconfig.is_empty() {
        std::env::var("KUBECONFIG").unwrap_or_default()
    } else {
        kubeconfig.to_string()
    }
}

/// Load a client config for a cluster.
///
/// # Errors
///
/// Returns an error when no kubeconfig or in-cluster config can be loaded.
pub async fn load_config(master_url: &str, kubeconfig: &str, context: &str) -> Result<Config> {
    let kubeconfig = resolve_kubeconfig_path(kubeconfig);
    debug!(master_url = %master_url, kubeconfig = %kubeconfig, context = %context, "Loading kube config");

    if !kubeconfig.is_empty() {
        let kc = Kubeconfig::read_from(&kubeconfig)
            .with_context(|| format!("failed to read kubeconfig {kubeconfig}"))?;

        if context.is_empty() {
            let mut config = Config::from_custom_kubeconfig(kc, &KubeConfigOptions::default())
                .await
                .with_context(|| format!("failed to load kubeconfig {kubeconfig}"))?;
            override_cluster_url(&mut config, master_url)?;
            return Ok(config);
        }

        let options = KubeConfigOptions {
            context: Some(context.to_string()),
            ..Default::default()
        };
        return Config::from_custom_kubeconfig(kc, &options)
            .await
            .with_context(|| format!("failed to load context {context} from {kubeconfig}"));
    }

    if let Ok(config) = Config::incluster() {
        debug!("Using in-cluster config");
        return Ok(config);
    }

    let kc = Kubeconfig::read().context("could not create a valid kubeconfig")?;
    let mut config = Config::from_custom_kubeconfig(kc, &KubeConfigOptions::default())
        .await
        .context("could not create a valid kubeconfig")?;
    override_cluster_url(&mut config, master_url)?;
    Ok(config)
}

/// Build a client for a cluster.
///
/// # Errors
///
/// Returns an error when the config cannot be loaded or the client built.
pub async fn new_client(master_url: &str, kubeconfig: &str, context: &str) -> Result<Client> {
    let config = load_config(master_url, kubeconfig, context).await?;
    Client::try_from(config).context("failed to create kubernetes client")
}

/// Client for the hub cluster.
///
/// # Errors
///
/// Returns an error when the hub config cannot be loaded.
pub async fn hub_client(opts: &TestOptions) -> Result<Client> {
    let hub = &opts.hub_cluster;
    info!(master_url = %hub.master_url, "Connecting to hub cluster");
    new_client(&hub.master_url, &opts.kube_config, &hub.kube_context).await
}

/// Client for the first managed cluster, or `None` when none is configured.
///
/// # Errors
///
/// Returns an error when a managed cluster is configured but unreachable.
pub async fn managed_client(opts: &TestOptions) -> Result<Option<Client>> {
    let Some(cluster) = opts.first_managed_cluster() else {
        return Ok(None);
    };
    info!(
        cluster = %cluster.name,
        master_url = %cluster.master_url,
        "Connecting to managed cluster"
    );
    // the managed cluster's default context is used
    new_client(&cluster.master_url, &cluster.kube_config, "")
        .await
        .map(Some)
}

/// Static bearer token of the user bound to `context` (or the current context).
///
/// Returns `None` when the kubeconfig does not parse, the context is unknown,
/// or its user authenticates without a static token.
#[must_use]
pub fn token_from_kubeconfig(content: &str, context: Option<&str>) -> Option<String> {
    let kc = Kubeconfig::from_yaml(content).ok()?;
    let context_name = context
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .or(kc.current_context)?;
    let user_name = kc
        .contexts
        .iter()
        .find(|c| c.name == context_name)?
        .context
        .as_ref()?
        .user
        .clone()?;
    kc.auth_infos
        .into_iter()
        .find(|u| u.name == user_name)?
        .auth_info?
        .token
        .map(|t| t.expose_secret().to_string())
        .filter(|t| !t.is_empty())
}

/// Bearer token used for Grafana and Prometheus requests.
///
/// The hub kubeconfig's static token is preferred. Otherwise the token of the
/// testing service account is read from its token secret.
///
/// # Errors
///
/// Returns an error when neither source yields a token.
pub async fn fetch_bearer_token(opts: &TestOptions, hub: &Client) -> Result<String> {
    let path = resolve_kubeconfig_path(&opts.kube_config);
    if !path.is_empty() {
        if let Ok(content) = tokio::fs::read_to_string(&path).await {
            let context = Some(opts.hub_cluster.kube_context.as_str());
            if let Some(token) = token_from_kubeconfig(&content, context) {
                debug!("Using bearer token from kubeconfig");
                return Ok(token);
            }
        }
    }

    let secrets: Api<Secret> = Api::namespaced(hub.clone(), MCO_NAMESPACE);
    let secret = secrets
        .get(TESTING_TOKEN_SECRET)
        .await
        .with_context(|| {
            format!("failed to read token secret {MCO_NAMESPACE}/{TESTING_TOKEN_SECRET}")
        })?;
    let token = secret
        .data
        .as_ref()
        .and_then(|data| data.get("token"))
        .ok_or_else(|| anyhow!("secret {TESTING_TOKEN_SECRET} has no token"))?;
    let token = String::from_utf8(token.0.clone()).context("service account token is not UTF-8")?;
    debug!("Using bearer token from testing service account");
    Ok(token)
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod client_tests;
