// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Test cases run between install and uninstall.
//!
//! Every case is a unit struct implementing [`Scenario`]. The title carries a
//! focus tag such as `(addon/g0)` so that `--focus` and `--skip` can select
//! whole groups.
//!
//! # Groups
//!
//! Groups run in the order of [`all`]. Several of them change the shared MCO
//! instance and rely on the previous group having put it back.
//!
//! - [`operator`] - operator pod health
//! - [`reconcile`] - MCO spec changes reach the workloads
//! - [`addon`] - enabling and disabling the metrics collector
//! - [`alert`] - custom rules, alertmanager config and Slack delivery
//! - [`metricslist`] - custom metrics allowlist
//! - [`dashboard`] - custom Grafana dashboards
//! - [`grafana`] - managed cluster metrics in Grafana
//! - [`retention`] - Thanos retention flags
//! - [`endpoint_preserve`] - addon resources are restored after manual edits
//! - [`observatorium_preserve`] - the Observatorium CR is restored after manual edits
//! - [`manifestwork`] - the addon `ManifestWork` is recreated
//! - [`config`] - MCO defaults and storage
//! - [`certrenew`] - pods restart after certificate renewal
//! - [`hub`] - hive `ClusterImageSet` for the configured release

pub mod addon;
pub mod alert;
pub mod certrenew;
pub mod config;
pub mod dashboard;
pub mod endpoint_preserve;
pub mod grafana;
pub mod hub;
pub mod manifestwork;
pub mod metricslist;
pub mod observatorium_preserve;
pub mod operator;
pub mod reconcile;
pub mod retention;

#[cfg(test)]
mod mod_tests;

use crate::suite::Scenario;

/// Every case in execution order.
#[must_use]
pub fn all() -> Vec<Box<dyn Scenario>> {
    let groups: [Vec<Box<dyn Scenario>>; 14] = [
        operator::cases(),
        reconcile::cases(),
        addon::cases(),
        alert::cases(),
        metricslist::cases(),
        dashboard::cases(),
        grafana::cases(),
        retention::cases(),
        endpoint_preserve::cases(),
        observatorium_preserve::cases(),
        manifestwork::cases(),
        config::cases(),
        certrenew::cases(),
        hub::cases(),
    ];
    groups.into_iter().flatten().collect()
}
