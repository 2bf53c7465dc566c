// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! MCO operator health.

use crate::context::TestContext;
use crate::lifecycle::check_operator_pod;
use crate::suite::{step, Scenario};
use tracing::info;

/// The operator pod is the only one in its namespace and is `Running`.
pub struct OperatorPodRunning;

#[async_trait::async_trait]
impl Scenario for OperatorPodRunning {
    fn title(&self) -> &str {
        "[P1][Sev1][Observability] Should have the MCO operator pod running (ingress/g0)"
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        step("Checking the MCO operator pod");
        let pod = check_operator_pod(&ctx.hub).await?;
        info!(pod = %pod, "MCO operator pod is running");
        Ok(())
    }
}

/// Cases of this group.
#[must_use]
pub fn cases() -> Vec<Box<dyn Scenario>> {
    vec![Box::new(OperatorPodRunning)]
}
