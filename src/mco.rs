// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `MultiClusterObservability` mutators and readers.
//!
//! Every mutator goes through [`resources::mutate`], so a concurrent change by
//! the operator (status writes bump `resourceVersion`) is re-read rather than
//! overwritten.

use crate::errors::{ResourceError, ShapeError};
use crate::gvr::{ResourceRef, MCO_V1BETA1, MCO_V1BETA2};
use crate::resources;
use crate::unstructured::{get_bool, get_i64, get_object, get_opt, get_str, set_path};
use anyhow::{anyhow, bail, Context as _};
use kube::Client;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::info;

/// `spec.availabilityConfig` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityConfig {
    /// One replica per component
    Basic,
    /// Replicated components
    High,
}

impl AvailabilityConfig {
    /// Value as written in the CR.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::High => "High",
        }
    }
}

impl fmt::Display for AvailabilityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// v1beta2 reference to the MCO named `name`.
#[must_use]
pub fn mco_ref(name: &str) -> ResourceRef {
    ResourceRef::cluster(MCO_V1BETA2, name)
}

/// Fetch the v1beta2 MCO.
///
/// # Errors
///
/// Returns a classified [`ResourceError`].
pub async fn get(client: &Client, name: &str) -> Result<Value, ResourceError> {
    resources::get(client, &mco_ref(name)).await
}

/// Fetch the MCO through the v1beta1 API.
///
/// # Errors
///
/// Returns a classified [`ResourceError`].
pub async fn get_v1beta1(client: &Client, name: &str) -> Result<Value, ResourceError> {
    resources::get(client, &ResourceRef::cluster(MCO_V1BETA1, name)).await
}

/// Set `spec.availabilityConfig`.
///
/// # Errors
///
/// Returns a classified [`ResourceError`].
pub async fn set_availability_config(
    client: &Client,
    name: &str,
    mode: AvailabilityConfig,
) -> Result<(), ResourceError> {
    resources::mutate(client, &mco_ref(name), |obj| {
        set_path(obj, &["spec", "availabilityConfig"], json!(mode.as_str()))
    })
    .await?;
    info!(mco = name, availability = %mode, "Updated availabilityConfig");
    Ok(())
}

/// Set `spec.advanced.retentionConfig.retentionResolutionRaw`.
///
/// # Errors
///
/// Returns a classified [`ResourceError`].
pub async fn set_retention_resolution_raw(
    client: &Client,
    name: &str,
    value: &str,
) -> Result<(), ResourceError> {
    resources::mutate(client, &mco_ref(name), |obj| {
        set_path(
            obj,
            &["spec", "advanced", "retentionConfig", "retentionResolutionRaw"],
            json!(value),
        )
    })
    .await?;
    info!(mco = name, value = value, "Updated retentionResolutionRaw");
    Ok(())
}

/// Replace `spec.nodeSelector`. An empty map clears it.
///
/// # Errors
///
/// Returns a classified [`ResourceError`].
pub async fn set_node_selector(
    client: &Client,
    name: &str,
    selector: &BTreeMap<String, String>,
) -> Result<(), ResourceError> {
    let value = json!(selector);
    resources::mutate(client, &mco_ref(name), |obj| {
        set_path(obj, &["spec", "nodeSelector"], value.clone())
    })
    .await?;
    info!(mco = name, selector = ?selector, "Updated nodeSelector");
    Ok(())
}

/// Read `spec.observabilityAddonSpec.enableMetrics`.
///
/// # Errors
///
/// Returns a classified [`ResourceError`], or [`ResourceError::Shape`] when
/// the field is missing.
pub async fn addon_metrics_enabled(client: &Client, name: &str) -> Result<bool, ResourceError> {
    let obj = get(client, name).await?;
    Ok(get_bool(&obj, &["spec", "observabilityAddonSpec", "enableMetrics"])?)
}

/// Set `spec.observabilityAddonSpec.enableMetrics`.
///
/// # Errors
///
/// Returns a classified [`ResourceError`].
pub async fn set_addon_metrics_enabled(
    client: &Client,
    name: &str,
    enable: bool,
) -> Result<(), ResourceError> {
    resources::mutate(client, &mco_ref(name), |obj| {
        set_path(obj, &["spec", "observabilityAddonSpec", "enableMetrics"], json!(enable))
    })
    .await?;
    info!(mco = name, enable = enable, "Updated enableMetrics");
    Ok(())
}

/// Set `spec.observabilityAddonSpec.interval` (seconds).
///
/// The CRD bounds the value to `[15, 3600]`; out-of-range values come back as
/// [`ResourceError::Invalid`] with the server's message.
///
/// # Errors
///
/// Returns a classified [`ResourceError`].
pub async fn set_addon_interval(
    client: &Client,
    name: &str,
    interval: i64,
) -> Result<(), ResourceError> {
    resources::mutate(client, &mco_ref(name), |obj| {
        set_path(obj, &["spec", "observabilityAddonSpec", "interval"], json!(interval))
    })
    .await?;
    info!(mco = name, interval = interval, "Updated addon interval");
    Ok(())
}

/// Compare a live spec against an expected one.
///
/// Every key of `expected` must be present in `actual` with an equal value.
/// Keys only present in `actual` (operator defaults) are ignored.
///
/// # Errors
///
/// Returns an error naming the first missing or differing key.
pub fn compare_spec(
    actual: &Map<String, Value>,
    expected: &Map<String, Value>,
) -> anyhow::Result<()> {
    for (key, want) in expected {
        let got = actual
            .get(key)
            .ok_or_else(|| anyhow!("{key} not found in converted spec"))?;
        if got != want {
            bail!("spec.{key} differs: got {got}, expected {want}");
        }
    }
    Ok(())
}

/// Check that the v1beta2 view of the MCO matches a golden manifest.
///
/// # Errors
///
/// Returns an error when the golden file cannot be read, either object lacks
/// a `spec`, or the specs differ.
pub async fn check_conversion(client: &Client, name: &str, golden: &Path) -> anyhow::Result<()> {
    let live = get(client, name).await?;
    let content = tokio::fs::read_to_string(golden)
        .await
        .with_context(|| format!("failed to read golden file {}", golden.display()))?;
    let expected: Value = serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse golden file {}", golden.display()))?;

    compare_spec(get_object(&live, &["spec"])?, get_object(&expected, &["spec"])?)
}

/// Storage settings from the v1beta1 view of the MCO.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageDefaults {
    /// `spec.storageConfigObject.statefulSetSize`
    pub size: String,
    /// `spec.storageConfigObject.statefulSetStorageClass`
    pub storage_class: String,
}

impl StorageDefaults {
    /// Extract the storage settings.
    ///
    /// # Errors
    ///
    /// Returns a [`ShapeError`] when either field is missing.
    pub fn from_v1beta1(obj: &Value) -> Result<Self, ShapeError> {
        Ok(Self {
            size: get_str(obj, &["spec", "storageConfigObject", "statefulSetSize"])?.to_string(),
            storage_class: get_str(
                obj,
                &["spec", "storageConfigObject", "statefulSetStorageClass"],
            )?
            .to_string(),
        })
    }
}

/// Addon defaults from the MCO: `(enableMetrics, interval)`.
///
/// # Errors
///
/// Returns a [`ShapeError`] when `spec.observabilityAddonSpec` is incomplete.
pub fn addon_defaults(obj: &Value) -> Result<(bool, i64), ShapeError> {
    let enabled = get_bool(obj, &["spec", "observabilityAddonSpec", "enableMetrics"])?;
    let interval = get_i64(obj, &["spec", "observabilityAddonSpec", "interval"])?;
    Ok((enabled, interval))
}

/// Retention flags the operator derives from `spec.advanced.retentionConfig`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionArgs {
    /// compact `--delete-delay`
    pub delete_delay: String,
    /// receive/rule `--tsdb.retention`
    pub retention_in_local: String,
    /// rule `--tsdb.block-duration`
    pub block_duration: String,
    /// store `--ignore-deletion-marks-delay`
    pub ignore_deletion_marks_delay: String,
}

impl Default for RetentionArgs {
    fn default() -> Self {
        Self {
            delete_delay: "48h".to_string(),
            retention_in_local: "24h".to_string(),
            block_duration: "2h".to_string(),
            ignore_deletion_marks_delay: "24h".to_string(),
        }
    }
}

impl RetentionArgs {
    /// Derive the expected flags from an MCO, falling back to operator defaults
    /// for unset fields.
    #[must_use]
    pub fn from_mco(obj: &Value) -> Self {
        let mut args = Self::default();
        let Some(config) = get_opt(obj, &["spec", "advanced", "retentionConfig"]) else {
            return args;
        };
        let field = |key: &str| config.get(key).and_then(Value::as_str).map(str::to_string);

        if let Some(delete_delay) = field("deleteDelay") {
            if let Some(half) = half_duration(&delete_delay) {
                args.ignore_deletion_marks_delay = half;
            }
            args.delete_delay = delete_delay;
        }
        if let Some(retention) = field("retentionInLocal") {
            args.retention_in_local = retention;
        }
        if let Some(block) = field("blockDuration") {
            args.block_duration = block;
        }
        args
    }
}

/// Half of a `<n><unit>` duration, rounded up, same unit: `5d` gives `3d`.
///
/// Returns `None` when the value does not start with digits.
#[must_use]
pub fn half_duration(value: &str) -> Option<String> {
    let split = value.find(|c: char| !c.is_ascii_digit()).unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);
    let n: u64 = digits.parse().ok()?;
    Some(format!("{}{unit}", n.div_ceil(2)))
}

#[cfg(test)]
#[path = "mco_tests.rs"]
mod mco_tests;
