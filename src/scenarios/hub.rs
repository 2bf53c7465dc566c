// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Hive release images on the hub.

use crate::context::TestContext;
use crate::gvr::CLUSTER_IMAGE_SET;
use crate::manifests::cluster_image_set_name;
use crate::resources;
use crate::suite::{step, Scenario};
use crate::unstructured::get_opt;
use anyhow::bail;
use serde_json::Value;
use tracing::{debug, info};

/// The `ClusterImageSet` named `wanted`, logging every set seen.
#[must_use]
pub fn find_image_set<'a>(image_sets: &'a [Value], wanted: &str) -> Option<&'a Value> {
    let mut found = None;
    for image_set in image_sets {
        let name = get_opt(image_set, &["metadata", "name"])
            .and_then(Value::as_str)
            .unwrap_or("");
        let release = get_opt(image_set, &["spec", "releaseImage"])
            .and_then(Value::as_str)
            .unwrap_or("");
        debug!(name = name, release_image = release, "ClusterImageSet");
        if found.is_none() && name == wanted {
            found = Some(image_set);
        }
    }
    found
}

/// A `ClusterImageSet` exists for the configured `ocpRelease`.
pub struct ClusterImageSetAvailable;

#[async_trait::async_trait]
impl Scenario for ClusterImageSetAvailable {
    fn title(&self) -> &str {
        "should be able to validate the OpenShift version (ClusterImageSet) used by hive (cluster/g0/hive/clusterimageset)"
    }

    fn skip_reason(&self, ctx: &TestContext) -> Option<String> {
        (!ctx.options.connection.keys.any())
            .then(|| "no cloud connection keys configured".to_string())
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        step("validating the release specified for the ClusterImageSet");
        let release = &ctx.options.connection.ocp_release;
        let wanted = cluster_image_set_name(release);
        let image_sets = resources::list(&ctx.hub, CLUSTER_IMAGE_SET, None, None).await?;
        if find_image_set(&image_sets, &wanted).is_none() {
            bail!(
                "No matching OpenShift ClusterImageSet found for release: {release}, \
                 you may need to update options.yaml key ocpRelease to set a valid version"
            );
        }
        info!(name = %wanted, "Found matching ClusterImageSet");
        Ok(())
    }
}

/// Cases of this group.
#[must_use]
pub fn cases() -> Vec<Box<dyn Scenario>> {
    vec![Box::new(ClusterImageSetAvailable)]
}
