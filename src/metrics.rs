// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Metric queries through the Grafana datasource proxy.
//!
//! Managed-cluster metrics are confirmed by querying
//! `<grafana>/api/datasources/proxy/1/api/v1/query` and looking for literal
//! substrings in the raw JSON body. The success marker `"status":"success"`
//! must always be present; callers add the labels they expect.
//!
//! All requests carry the hub bearer token and skip TLS verification, since
//! the console routes use cluster-issued certificates.

use crate::constants::{HTTP_REQUEST_TIMEOUT, PROMETHEUS_SUCCESS_MARKER};
use crate::errors::MetricError;
use crate::options::Cluster;
use reqwest::header::HOST;
use reqwest::{Client as HttpClient, StatusCode};
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Grafana base URL and the Host header to send with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrafanaEndpoint {
    /// Base URL, e.g. `https://multicloud-console.apps.example.com/grafana/`
    pub base_url: String,
    /// Host header override
    pub host: Option<String>,
}

impl GrafanaEndpoint {
    /// Resolve the endpoint for a hub.
    ///
    /// `grafanaURL` wins when set (with `grafanaHost` as Host header, if any);
    /// otherwise the console route under the hub base domain is used.
    #[must_use]
    pub fn for_hub(hub: &Cluster) -> Self {
        if hub.grafana_url.is_empty() {
            let host = format!("multicloud-console.apps.{}", hub.base_domain);
            Self {
                base_url: format!("https://{host}/grafana/"),
                host: Some(host),
            }
        } else {
            Self {
                base_url: hub.grafana_url.clone(),
                host: (!hub.grafana_host.is_empty()).then(|| hub.grafana_host.clone()),
            }
        }
    }

    fn join(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Prometheus route of the hub's in-cluster monitoring stack.
#[must_use]
pub fn prometheus_url(base_domain: &str) -> String {
    format!("https://prometheus-k8s-openshift-monitoring.apps.{base_domain}")
}

/// Build the HTTP client used for every console request.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialised.
pub fn http_client() -> reqwest::Result<HttpClient> {
    HttpClient::builder()
        .danger_accept_invalid_certs(true)
        .timeout(HTTP_REQUEST_TIMEOUT)
        .build()
}

/// Decide a query response.
///
/// # Errors
///
/// - [`MetricError::MissingSuccessMarker`] when `"status":"success"` is absent
/// - [`MetricError::NotFound`] naming the first missing expected substring
pub fn evaluate_response(body: &str, expected: &[String]) -> Result<(), MetricError> {
    if !body.contains(PROMETHEUS_SUCCESS_MARKER) {
        return Err(MetricError::MissingSuccessMarker);
    }
    if let Some(missing) = expected.iter().find(|label| !body.contains(label.as_str())) {
        return Err(MetricError::NotFound {
            missing: missing.clone(),
        });
    }
    Ok(())
}

/// Append ` offset <d>` to a query when an offset is given.
#[must_use]
pub fn with_offset(query: &str, offset: Option<&str>) -> String {
    match offset {
        Some(d) if !d.is_empty() => format!("{query} offset {d}"),
        _ => query.to_string(),
    }
}

/// Queries Grafana and Prometheus on the hub.
#[derive(Clone)]
pub struct MetricsVerifier {
    http: HttpClient,
    grafana: GrafanaEndpoint,
    prometheus_url: String,
    token: String,
}

impl MetricsVerifier {
    /// Verifier for a hub with the given bearer token.
    #[must_use]
    pub fn new(http: HttpClient, hub: &Cluster, token: impl Into<String>) -> Self {
        Self::with_endpoints(
            http,
            GrafanaEndpoint::for_hub(hub),
            prometheus_url(&hub.base_domain),
            token,
        )
    }

    /// Verifier with explicit endpoints.
    #[must_use]
    pub fn with_endpoints(
        http: HttpClient,
        grafana: GrafanaEndpoint,
        prometheus_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            grafana,
            prometheus_url: prometheus_url.into(),
            token: token.into(),
        }
    }

    /// Grafana endpoint in use.
    #[must_use]
    pub fn grafana(&self) -> &GrafanaEndpoint {
        &self.grafana
    }

    async fn fetch(&self, url: Url) -> Result<String, MetricError> {
        let transport = |e: reqwest::Error| MetricError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        };

        debug!(url = %url, "Requesting");
        let mut request = self.http.get(url.clone());
        if !self.token.is_empty() {
            request = request.bearer_auth(&self.token);
        }
        if let Some(host) = &self.grafana.host {
            request = request.header(HOST, host);
        }

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        if status != StatusCode::OK {
            debug!(url = %url, status = %status, "Unexpected status");
            return Err(MetricError::HttpStatus {
                status: status.as_u16(),
            });
        }
        let body = response.text().await.map_err(transport)?;
        debug!(url = %url, bytes = body.len(), "Response received");
        Ok(body)
    }

    fn parse_url(raw: &str, params: &[(&str, &str)]) -> Result<Url, MetricError> {
        Url::parse_with_params(raw, params).map_err(|e| MetricError::Transport {
            url: raw.to_string(),
            reason: e.to_string(),
        })
    }

    /// Require a query result containing every `expected` substring.
    ///
    /// # Errors
    ///
    /// See [`MetricError`]; `NotFound` means the query succeeded but the
    /// series is absent.
    pub async fn contain_managed_cluster_metric(
        &self,
        query: &str,
        offset: Option<&str>,
        expected: &[String],
    ) -> Result<(), MetricError> {
        let query = with_offset(query, offset);
        let url = Self::parse_url(
            &self.grafana.join("api/datasources/proxy/1/api/v1/query"),
            &[("query", query.as_str())],
        )?;
        let body = self.fetch(url).await?;
        evaluate_response(&body, expected)
    }

    /// Metric names known to the hub Prometheus.
    ///
    /// # Errors
    ///
    /// Returns a [`MetricError`] when the request fails or the body has no
    /// `data` object.
    pub async fn prometheus_metrics_metadata(&self) -> Result<Vec<String>, MetricError> {
        let raw = format!("{}/api/v1/metadata", self.prometheus_url.trim_end_matches('/'));
        let body = self.fetch(Self::parse_url(&raw, &[])?).await?;
        evaluate_response(&body, &[])?;

        let parsed: Value = serde_json::from_str(&body).map_err(|e| MetricError::Decode {
            reason: e.to_string(),
        })?;
        let data = parsed
            .get("data")
            .and_then(Value::as_object)
            .ok_or_else(|| MetricError::Decode {
                reason: "response has no data object".to_string(),
            })?;
        Ok(data.keys().cloned().collect())
    }

    /// Require the Grafana console to answer 200.
    ///
    /// # Errors
    ///
    /// Returns [`MetricError::Transport`] or [`MetricError::HttpStatus`].
    pub async fn check_grafana_console(&self) -> Result<(), MetricError> {
        let url = Self::parse_url(&self.grafana.base_url, &[])?;
        self.fetch(url).await.map(|_| ())
    }

    /// Require a dashboard with this exact title in Grafana search.
    ///
    /// # Errors
    ///
    /// Returns [`MetricError::NotFound`] when the search does not list it.
    pub async fn contain_dashboard(&self, title: &str) -> Result<(), MetricError> {
        let url = Self::parse_url(&self.grafana.join("api/search"), &[("query", title)])?;
        let body = self.fetch(url).await?;
        let marker = format!(r#""title":"{title}""#);
        if body.contains(&marker) {
            Ok(())
        } else {
            Err(MetricError::NotFound { missing: marker })
        }
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod metrics_tests;
