// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common utilities for live-cluster tests.

use kube::client::Client;
use observability_e2e::context::{RunSettings, TestContext};
use observability_e2e::options::{Cluster, TestOptions};

/// Get a Kubernetes client or skip the test if no cluster is reachable
pub async fn get_kube_client_or_skip() -> Option<Client> {
    match Client::try_default().await {
        Ok(client) => {
            println!("✓ Successfully connected to Kubernetes cluster");
            Some(client)
        }
        Err(e) => {
            eprintln!("⊘ Skipping integration test: no Kubernetes cluster available: {e}");
            None
        }
    }
}

/// Context over the default kubeconfig, with the hub acting as managed cluster.
///
/// `BASE_DOMAIN` sets the hub base domain; it only matters for Grafana checks.
pub fn hub_only_context(client: Client) -> TestContext {
    let options = TestOptions {
        hub_cluster: Cluster {
            base_domain: std::env::var("BASE_DOMAIN").unwrap_or_default(),
            ..Cluster::default()
        },
        ..TestOptions::default()
    };
    TestContext::new(
        client,
        None,
        options,
        RunSettings::from_env(),
        reqwest::Client::new(),
    )
}
