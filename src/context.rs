// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for all scenarios.
//!
//! Every scenario receives a `&TestContext` that contains:
//! - Kubernetes clients for the hub and the first managed cluster
//! - The resolved test options
//! - Environment switches ([`RunSettings`])
//! - HTTP verifiers for Grafana and Slack
//!
//! The metrics verifier needs a bearer token that may only exist after
//! install has created the testing service account, so it is built on first
//! use and then cached.

use crate::client::{fetch_bearer_token, hub_client, managed_client};
use crate::constants::{DEFAULT_SLACK_CHANNEL, DEFAULT_SLACK_WEBHOOK_URL, MCO_CR_NAME};
use crate::manifests::{ObjectStorageEnv, SlackReceiver};
use crate::metrics::{http_client, MetricsVerifier};
use crate::notifications::{SlackCredentials, SlackVerifier};
use crate::options::TestOptions;
use anyhow::{Context as _, Result};
use kube::Client;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Environment switches for one run.
///
/// Read once in `main`; scenario code never looks at the process environment.
#[derive(Clone, Default)]
pub struct RunSettings {
    /// `SKIP_INSTALL_STEP=true`
    pub skip_install: bool,
    /// `SKIP_UNINSTALL_STEP=true`
    pub skip_uninstall: bool,
    /// `SKIP_INTEGRATION_CASES=true`
    pub skip_integration_cases: bool,
    /// `IS_CANARY_ENV=true`
    pub canary: bool,
    /// Object storage credentials for canary installs
    pub object_storage: ObjectStorageEnv,
    /// Alertmanager Slack receiver
    pub slack_receiver: SlackReceiver,
    /// Slack bot credentials, when all are set
    pub slack: Option<SlackCredentials>,
}

impl std::fmt::Debug for RunSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunSettings")
            .field("skip_install", &self.skip_install)
            .field("skip_uninstall", &self.skip_uninstall)
            .field("skip_integration_cases", &self.skip_integration_cases)
            .field("canary", &self.canary)
            .field("slack_channel", &self.slack_receiver.channel)
            .field("slack_api", &self.slack.is_some())
            .finish_non_exhaustive()
    }
}

impl RunSettings {
    /// Build settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |key: &str| lookup(key).is_some_and(|v| v == "true");
        let value = |key: &str| lookup(key).filter(|v| !v.is_empty());

        Self {
            skip_install: flag("SKIP_INSTALL_STEP"),
            skip_uninstall: flag("SKIP_UNINSTALL_STEP"),
            skip_integration_cases: flag("SKIP_INTEGRATION_CASES"),
            canary: flag("IS_CANARY_ENV"),
            object_storage: ObjectStorageEnv {
                bucket: value("BUCKET"),
                region: value("REGION"),
                access_key_id: value("AWS_ACCESS_KEY_ID"),
                secret_access_key: value("AWS_SECRET_ACCESS_KEY"),
            },
            slack_receiver: SlackReceiver {
                api_url: value("SLACK_WEBHOOK_URL")
                    .unwrap_or_else(|| DEFAULT_SLACK_WEBHOOK_URL.to_string()),
                channel: value("SLACK_CHANNEL")
                    .unwrap_or_else(|| DEFAULT_SLACK_CHANNEL.to_string()),
            },
            slack: SlackCredentials::from_lookup(&lookup),
        }
    }

    /// Build settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

/// Clients, options and verifiers handed to every scenario.
#[derive(Clone)]
pub struct TestContext {
    /// Hub cluster client
    pub hub: Client,

    /// First managed cluster client; the hub client when none is configured
    pub managed: Client,

    /// Resolved options
    pub options: Arc<TestOptions>,

    /// Name of the MCO instance under test
    pub mco_name: String,

    /// Environment switches
    pub settings: Arc<RunSettings>,

    /// HTTP client for Grafana, Prometheus and Slack
    pub http: reqwest::Client,

    metrics: Arc<OnceCell<MetricsVerifier>>,
}

impl TestContext {
    /// Assemble a context from existing clients.
    #[must_use]
    pub fn new(
        hub: Client,
        managed: Option<Client>,
        options: TestOptions,
        settings: RunSettings,
        http: reqwest::Client,
    ) -> Self {
        Self {
            managed: managed.unwrap_or_else(|| hub.clone()),
            hub,
            options: Arc::new(options),
            mco_name: MCO_CR_NAME.to_string(),
            settings: Arc::new(settings),
            http,
            metrics: Arc::new(OnceCell::new()),
        }
    }

    /// Connect to the clusters named in `options`.
    ///
    /// # Errors
    ///
    /// Returns an error when a cluster config cannot be loaded or the HTTP
    /// client cannot be built.
    pub async fn connect(options: TestOptions, settings: RunSettings) -> Result<Self> {
        let hub = hub_client(&options).await?;
        let managed = managed_client(&options).await?;
        if managed.is_none() {
            info!("No managed cluster configured, using the hub for managed-side checks");
        }
        let http = http_client().context("failed to build HTTP client")?;
        Ok(Self::new(hub, managed, options, settings, http))
    }

    /// Target another MCO instance.
    #[must_use]
    pub fn with_mco_name(mut self, name: impl Into<String>) -> Self {
        self.mco_name = name.into();
        self
    }

    /// Use a prepared metrics verifier instead of building one on first use.
    #[must_use]
    pub fn with_metrics_verifier(mut self, verifier: MetricsVerifier) -> Self {
        self.metrics = Arc::new(OnceCell::new_with(Some(verifier)));
        self
    }

    /// Base domain of the hub.
    #[must_use]
    pub fn base_domain(&self) -> &str {
        &self.options.hub_cluster.base_domain
    }

    /// Whether a managed cluster other than the hub is configured.
    #[must_use]
    pub fn has_managed_cluster(&self) -> bool {
        self.options.first_managed_cluster().is_some()
    }

    /// Metrics verifier for the hub, fetching the bearer token on first use.
    ///
    /// # Errors
    ///
    /// Returns an error when no bearer token can be found.
    pub async fn metrics(&self) -> Result<&MetricsVerifier> {
        self.metrics
            .get_or_try_init(|| async {
                let token = fetch_bearer_token(&self.options, &self.hub).await?;
                debug!("Metrics verifier initialised");
                Ok::<_, anyhow::Error>(MetricsVerifier::new(
                    self.http.clone(),
                    &self.options.hub_cluster,
                    token,
                ))
            })
            .await
    }

    /// Slack verifier, when Slack credentials are configured.
    #[must_use]
    pub fn slack(&self) -> Option<SlackVerifier> {
        self.settings
            .slack
            .clone()
            .map(|creds| SlackVerifier::new(self.http.clone(), creds))
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod context_tests;
