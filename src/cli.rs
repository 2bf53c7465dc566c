// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Command line flags of the `observability-e2e` binary.
//!
//! Long flags are accepted with one dash as well as two, so existing CI jobs
//! that pass `-report-file=results.xml` keep working.

use crate::constants::{DEFAULT_KUBEADMIN_USER, DEFAULT_REPORT_FILE};
use crate::options::Overrides;
use crate::suite::Filter;
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

/// End-to-end tests for the multicluster observability add-on.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "observability-e2e", rename_all = "kebab-case", version)]
pub struct Cli {
    /// Kubeadmin user for the cluster under test (e.g. -kubeadmin-user="xxxxx").
    #[arg(long, default_value = DEFAULT_KUBEADMIN_USER)]
    pub kubeadmin_user: String,

    /// Kubeadmin credential for the cluster under test.
    #[arg(long, default_value = "")]
    pub kubeadmin_credential: String,

    /// Base domain of the cluster under test (e.g. -base-domain="demo.example.com").
    #[arg(long, default_value = "")]
    pub base_domain: String,

    /// Path the JUnit results are written to.
    #[arg(long, default_value = DEFAULT_REPORT_FILE)]
    pub report_file: PathBuf,

    /// Location of the kubeconfig to use; defaults to KUBECONFIG if not set.
    #[arg(long, default_value = "")]
    pub kubeconfig: String,

    /// Location of an "options.yaml" file to provide input for various tests.
    #[arg(long, default_value = "")]
    pub options: String,

    /// Only run cases whose title contains one of these substrings.
    #[arg(long, value_delimiter = '|')]
    pub focus: Vec<String>,

    /// Skip cases whose title contains one of these substrings.
    #[arg(long, value_delimiter = '|')]
    pub skip: Vec<String>,
}

impl Cli {
    /// Parse the process arguments, accepting single-dash long flags.
    #[must_use]
    pub fn parse_normalized() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }

    /// Option overrides taken from the flags.
    ///
    /// Environment values are not filled in here; see
    /// [`Overrides::with_process_env`].
    #[must_use]
    pub fn overrides(&self) -> Overrides {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Overrides {
            kubeconfig_flag: non_empty(&self.kubeconfig),
            kubeadmin_user: non_empty(&self.kubeadmin_user),
            kubeadmin_credential: non_empty(&self.kubeadmin_credential),
            base_domain: non_empty(&self.base_domain),
            env_kubeconfig: None,
            env_user: None,
        }
    }

    /// Title filter built from `--focus` and `--skip`.
    #[must_use]
    pub fn filter(&self) -> Filter {
        let keep = |values: &[String]| -> Vec<String> {
            values.iter().filter(|v| !v.is_empty()).cloned().collect()
        };
        Filter {
            focus: keep(&self.focus),
            skip: keep(&self.skip),
        }
    }
}

/// Rewrite `-flag` and `-flag=value` into `--flag` and `--flag=value`.
///
/// Short flags (`-h`, `-V`), bare values and `--` separated arguments are
/// left alone. The program name is never touched.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut out = Vec::new();
    let mut passthrough = false;
    for (index, arg) in args.into_iter().enumerate() {
        let arg: OsString = arg.into();
        if index == 0 || passthrough {
            out.push(arg);
            continue;
        }
        let rewritten = match arg.to_str() {
            Some("--") => {
                passthrough = true;
                None
            }
            Some(s) if is_single_dash_long(s) => Some(OsString::from(format!("-{s}"))),
            _ => None,
        };
        out.push(rewritten.unwrap_or(arg));
    }
    out
}

fn is_single_dash_long(arg: &str) -> bool {
    let Some(rest) = arg.strip_prefix('-') else {
        return false;
    };
    let name = rest.split('=').next().unwrap_or("");
    !rest.starts_with('-')
        && name.len() > 1
        && name.starts_with(|c: char| c.is_ascii_alphabetic())
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod cli_tests;
