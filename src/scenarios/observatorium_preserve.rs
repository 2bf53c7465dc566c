// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The MCO operator owns the Observatorium CR and reverts manual edits.

use crate::constants::{MCO_NAMESPACE, POLL_INTERVAL_1S, TIMEOUT_1M, TIMEOUT_3M};
use crate::context::TestContext;
use crate::gvr::{ResourceRef, OBSERVATORIUM};
use crate::resources;
use crate::suite::{step, Scenario};
use crate::unstructured::{get_i64, get_str, set_path};
use crate::wait::Poll;
use anyhow::bail;
use serde_json::json;

/// Ruler replica count written by hand.
const UPDATED_REPLICAS: i64 = 2;

/// Path of the ruler replica count.
const RULE_REPLICAS: [&str; 4] = ["spec", "thanos", "rule", "replicas"];

/// A change to `spec.thanos.rule.replicas` is reverted.
pub struct RuleReplicasReverted;

#[async_trait::async_trait]
impl Scenario for RuleReplicasReverted {
    fn title(&self) -> &str {
        "[P1][Sev1][Observability] Should revert any manual changes on observatorium cr (observatorium_preserve/g0) - Updating observatorium cr (spec.rule.replicas) should be automatically reverted"
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        let target = ResourceRef::namespaced(OBSERVATORIUM, MCO_NAMESPACE, ctx.mco_name.as_str());

        step("Updating observatorium cr spec.thanos.rule.replicas");
        let previous_version = Poll::new(TIMEOUT_1M, POLL_INTERVAL_1S)
            .until("observatorium update", || async {
                let mut cr = resources::get(&ctx.hub, &target).await?;
                let version = get_str(&cr, &["metadata", "resourceVersion"])?.to_string();
                set_path(&mut cr, &RULE_REPLICAS, json!(UPDATED_REPLICAS))?;
                resources::replace(&ctx.hub, &target, &cr).await?;
                Ok(version)
            })
            .await?;

        step("Waiting for the operator to revert the change");
        Poll::new(TIMEOUT_3M, POLL_INTERVAL_1S)
            .until("observatorium reverted", || async {
                let cr = resources::get(&ctx.hub, &target).await?;
                let version = get_str(&cr, &["metadata", "resourceVersion"])?;
                let replicas = get_i64(&cr, &RULE_REPLICAS)?;
                if version != previous_version && replicas != UPDATED_REPLICAS {
                    Ok(())
                } else {
                    bail!("spec.thanos.rule.replicas is still {replicas}")
                }
            })
            .await?;
        Ok(())
    }
}

/// Cases of this group.
#[must_use]
pub fn cases() -> Vec<Box<dyn Scenario>> {
    vec![Box::new(RuleReplicasReverted)]
}
