// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for the observability e2e harness.
//!
//! This module provides specialized error types for:
//! - Kubernetes API calls, split by server-provided category
//! - Unstructured object trees that do not have the expected shape
//! - Metric queries through the Grafana datasource proxy
//! - Slack notification lookups
//! - Options file loading
//!
//! Scenario and lifecycle code wraps these in `anyhow::Error` with context.

use thiserror::Error;

/// Errors returned by Kubernetes API calls.
///
/// The server categories the harness reacts to (not found, conflict, validation)
/// get their own variants so callers can match on them instead of parsing text.
#[derive(Error, Debug, Clone)]
pub enum ResourceError {
    /// Object does not exist (HTTP 404)
    #[error("{resource} '{name}' not found")]
    NotFound {
        /// Resource kind or plural
        resource: String,
        /// Object name
        name: String,
    },

    /// Stale `resourceVersion` on update (HTTP 409)
    ///
    /// Returned when another writer updated the object between our read and our write.
    #[error("conflict updating {resource} '{name}': {message}")]
    Conflict {
        /// Resource kind or plural
        resource: String,
        /// Object name
        name: String,
        /// Server message
        message: String,
    },

    /// Credentials rejected or insufficient (HTTP 401/403)
    #[error("access to {resource} '{name}' denied: {message}")]
    Forbidden {
        /// Resource kind or plural
        resource: String,
        /// Object name
        name: String,
        /// Server message
        message: String,
    },

    /// Object rejected by validation (HTTP 400/422)
    ///
    /// The server message is kept verbatim, e.g. `Invalid value: 15`.
    #[error("{resource} '{name}' is invalid: {message}")]
    Invalid {
        /// Resource kind or plural
        resource: String,
        /// Object name
        name: String,
        /// Server message
        message: String,
    },

    /// Any other API status
    #[error("{resource} '{name}' request failed with HTTP {code}: {message}")]
    Api {
        /// Resource kind or plural
        resource: String,
        /// Object name
        name: String,
        /// HTTP status code
        code: u16,
        /// Server message
        message: String,
    },

    /// No HTTP status was received (connection, TLS, serialization)
    #[error("request for {resource} '{name}' failed: {reason}")]
    Transport {
        /// Resource kind or plural
        resource: String,
        /// Object name
        name: String,
        /// Underlying error
        reason: String,
    },

    /// Object tree did not have the expected shape
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

impl ResourceError {
    /// Classify a `kube::Error` for the given resource and object name.
    #[must_use]
    pub fn from_kube(err: kube::Error, resource: &str, name: &str) -> Self {
        let resource = resource.to_string();
        let name = name.to_string();
        match err {
            kube::Error::Api(api_err) => {
                let message = api_err.message.clone();
                match api_err.code {
                    404 => Self::NotFound { resource, name },
                    409 => Self::Conflict {
                        resource,
                        name,
                        message,
                    },
                    401 | 403 => Self::Forbidden {
                        resource,
                        name,
                        message,
                    },
                    400 | 422 => Self::Invalid {
                        resource,
                        name,
                        message,
                    },
                    code => Self::Api {
                        resource,
                        name,
                        code,
                        message,
                    },
                }
            }
            other => Self::Transport {
                resource,
                name,
                reason: other.to_string(),
            },
        }
    }

    /// Returns true for HTTP 404.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true for HTTP 409.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// An unstructured object did not have the expected shape at a path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// Nothing at the path
    #[error("missing field '{path}'")]
    Missing {
        /// Dotted path
        path: String,
    },

    /// Something at the path, but not of the expected type
    #[error("field '{path}' is {found}, expected {expected}")]
    WrongType {
        /// Dotted path
        path: String,
        /// Expected JSON type
        expected: &'static str,
        /// JSON type found
        found: &'static str,
    },
}

/// Errors from metric queries through the Grafana datasource proxy.
///
/// A transport failure, a bad HTTP status, a response without the success
/// marker and a response without the expected series are all distinguishable.
#[derive(Error, Debug, Clone)]
pub enum MetricError {
    /// The HTTP request could not be sent or its body not read
    #[error("metrics request to {url} failed: {reason}")]
    Transport {
        /// Request URL
        url: String,
        /// Underlying error
        reason: String,
    },

    /// Server answered with a non-200 status
    #[error("Failed to access managed cluster metrics via grafana console (HTTP {status})")]
    HttpStatus {
        /// HTTP status code
        status: u16,
    },

    /// Body lacks `"status":"success"`
    #[error("Failed to find valid status from response")]
    MissingSuccessMarker,

    /// Body is a successful response but lacks an expected substring
    #[error("Failed to find metric name from response")]
    NotFound {
        /// First expected substring that was absent
        missing: String,
    },

    /// Body could not be decoded
    #[error("invalid metrics response: {reason}")]
    Decode {
        /// Decoder error
        reason: String,
    },
}

impl MetricError {
    /// Returns true when the query succeeded but the series is absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors from the Slack Web API.
#[derive(Error, Debug, Clone)]
pub enum NotificationError {
    /// The HTTP request failed
    #[error("slack request {method} failed: {reason}")]
    Transport {
        /// Slack API method
        method: String,
        /// Underlying error
        reason: String,
    },

    /// Slack answered `"ok": false`
    #[error("slack method {method} returned error: {error}")]
    Api {
        /// Slack API method
        method: String,
        /// Slack error code
        error: String,
    },
}

/// Errors while loading the options file.
#[derive(Error, Debug)]
pub enum OptionsError {
    /// File could not be read
    #[error("failed to read options file {path}: {source}")]
    Read {
        /// Options file path
        path: String,
        /// I/O error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid YAML for the options schema
    #[error("failed to parse options file {path}: {source}")]
    Parse {
        /// Options file path
        path: String,
        /// YAML error
        #[source]
        source: serde_yaml::Error,
    },

    /// A required option is missing
    #[error("The `{field}` option in options.yaml is required")]
    Missing {
        /// Dotted option name
        field: &'static str,
    },
}
