// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # Observability E2E - end-to-end tests for the multicluster observability add-on
//!
//! This crate drives a live hub cluster (and optionally a managed cluster)
//! running the multicluster observability operator (MCO) and verifies that the
//! add-on installs, reconciles, collects metrics, fires alerts and uninstalls
//! cleanly.
//!
//! ## Overview
//!
//! A run installs the MCO, executes every selected [`scenarios`] case in
//! order, uninstalls, and writes a JUnit report:
//!
//! - Install and uninstall of the MCO and its prerequisites
//! - Convergence waits against the Kubernetes API and the metrics façade
//! - Slack delivery checks for alerts
//! - Diagnostic dumps when a case fails
//!
//! ## Modules
//!
//! - [`options`] - options file loading and overrides
//! - [`client`] - Kubernetes clients for hub and managed clusters
//! - [`context`] - the fixture handed to every case
//! - [`wait`] - the polling waiter
//! - [`resources`] - dynamic resource access for CRDs without Rust types
//! - [`workloads`] - typed pods, deployments and statefulsets
//! - [`mco`] - the `MultiClusterObservability` resource
//! - [`metrics`] - metric queries through the Grafana datasource proxy
//! - [`notifications`] - Slack alert delivery
//! - [`lifecycle`] - install, uninstall and integrity checks
//! - [`suite`] - the ordered runner and JUnit report
//! - [`scenarios`] - the test cases
//!
//! ## Example
//!
//! ```rust,no_run
//! use observability_e2e::suite::Filter;
//!
//! let filter = Filter {
//!     focus: vec!["addon/g0".to_string()],
//!     skip: Vec::new(),
//! };
//! assert!(filter.selects("should have not metric data (addon/g0)"));
//! ```

pub mod cli;
pub mod client;
pub mod constants;
pub mod context;
pub mod debug;
pub mod errors;
pub mod gvr;
pub mod labels;
pub mod lifecycle;
pub mod managed_cluster;
pub mod manifests;
pub mod mco;
pub mod metrics;
pub mod notifications;
pub mod options;
pub mod resources;
pub mod scenarios;
pub mod suite;
pub mod unstructured;
pub mod wait;
pub mod workloads;

#[cfg(test)]
mod unstructured_tests;
