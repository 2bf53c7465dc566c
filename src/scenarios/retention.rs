// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Retention settings from `spec.advanced.retentionConfig` reach the Thanos
//! container arguments.
//!
//! Expected values are read from the live MCO at the start of every case and
//! fall back to the operator defaults (see [`RetentionArgs`]).

use crate::constants::{MCO_NAMESPACE, POLL_INTERVAL_5S, TIMEOUT_1M};
use crate::context::TestContext;
use crate::labels::{
    THANOS_COMPACT_LABEL, THANOS_RECEIVE_LABEL, THANOS_RULE_LABEL, THANOS_STORE_LABEL,
};
use crate::mco::{self, RetentionArgs};
use crate::suite::{step, AfterEach, Scenario};
use crate::wait::Poll;
use crate::workloads::{require_arg, statefulset_args_by_label};
use anyhow::Context as _;

/// One Thanos component flag checked against the MCO.
pub struct RetentionFlag {
    title: &'static str,
    label: &'static str,
    flag: fn(&RetentionArgs) -> String,
}

impl RetentionFlag {
    /// Rendered flag the component must carry.
    #[must_use]
    pub fn expected(&self, args: &RetentionArgs) -> String {
        (self.flag)(args)
    }
}

#[async_trait::async_trait]
impl Scenario for RetentionFlag {
    fn title(&self) -> &str {
        self.title
    }

    fn after_each(&self) -> AfterEach {
        AfterEach::IntegrityCheck
    }

    async fn run(&self, ctx: &TestContext) -> anyhow::Result<()> {
        let obj = mco::get(&ctx.hub, &ctx.mco_name)
            .await
            .context("failed to read retention settings")?;
        let flag = self.expected(&RetentionArgs::from_mco(&obj));

        step(&flag);
        Poll::new(TIMEOUT_1M, POLL_INTERVAL_5S)
            .until("retention flag", || async {
                let args = statefulset_args_by_label(&ctx.hub, MCO_NAMESPACE, self.label).await?;
                require_arg(&args, &flag)
            })
            .await?;
        Ok(())
    }
}

/// Cases of this group.
#[must_use]
pub fn cases() -> Vec<Box<dyn Scenario>> {
    vec![
        Box::new(RetentionFlag {
            title: "[P2][Sev2][Observability][Stable] Check and tune backup retention settings in MCO CR - Check compact args (retention/g0):",
            label: THANOS_COMPACT_LABEL,
            flag: |args| format!("--delete-delay={}", args.delete_delay),
        }),
        Box::new(RetentionFlag {
            title: "[P2][Sev2][Observability][Stable] Check and tune backup retention settings in MCO CR - Check store args (retention/g0):",
            label: THANOS_STORE_LABEL,
            flag: |args| {
                format!(
                    "--ignore-deletion-marks-delay={}",
                    args.ignore_deletion_marks_delay
                )
            },
        }),
        Box::new(RetentionFlag {
            title: "[P2][Sev2][Observability][Stable] Check and tune backup retention settings in MCO CR - Check receive args (retention/g0):",
            label: THANOS_RECEIVE_LABEL,
            flag: |args| format!("--tsdb.retention={}", args.retention_in_local),
        }),
        Box::new(RetentionFlag {
            title: "[P2][Sev2][Observability][Stable] Check and tune backup retention settings in MCO CR - Check rule args (retention/g0):",
            label: THANOS_RULE_LABEL,
            flag: |args| format!("--tsdb.retention={}", args.retention_in_local),
        }),
        Box::new(RetentionFlag {
            title: "[P2][Sev2][Observability][Stable] Check and tune backup retention settings in MCO CR - Check rule args (retention/g0): block duration",
            label: THANOS_RULE_LABEL,
            flag: |args| format!("--tsdb.block-duration={}", args.block_duration),
        }),
    ]
}
