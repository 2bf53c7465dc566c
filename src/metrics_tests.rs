// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `metrics.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const QUERY_PATH: &str = "/grafana/api/datasources/proxy/1/api/v1/query";

    const ACTIVE_BYTES_RESULT: &str = r#"{"status":"success","data":{"resultType":"vector","result":[{"metric":{"__name__":"node_memory_Active_bytes","cluster":"local-cluster"},"value":[1700000000,"1234"]}]}}"#;

    const EMPTY_RESULT: &str =
        r#"{"status":"success","data":{"resultType":"vector","result":[]}}"#;

    fn verifier(server: &MockServer, host: Option<&str>) -> MetricsVerifier {
        MetricsVerifier::with_endpoints(
            http_client().unwrap(),
            GrafanaEndpoint {
                base_url: format!("{}/grafana/", server.uri()),
                host: host.map(str::to_string),
            },
            format!("{}/prometheus", server.uri()),
            "sha256~token",
        )
    }

    fn expected(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_endpoint_defaults_to_console_route() {
        let hub = Cluster {
            base_domain: "hub.example.com".to_string(),
            ..Default::default()
        };
        let endpoint = GrafanaEndpoint::for_hub(&hub);
        assert_eq!(
            endpoint.base_url,
            "https://multicloud-console.apps.hub.example.com/grafana/"
        );
        assert_eq!(
            endpoint.host.as_deref(),
            Some("multicloud-console.apps.hub.example.com")
        );
    }

    #[test]
    fn test_endpoint_explicit_url() {
        let hub = Cluster {
            base_domain: "hub.example.com".to_string(),
            grafana_url: "http://127.0.0.1:3001".to_string(),
            grafana_host: "grafana.local".to_string(),
            ..Default::default()
        };
        let endpoint = GrafanaEndpoint::for_hub(&hub);
        assert_eq!(endpoint.base_url, "http://127.0.0.1:3001");
        assert_eq!(endpoint.host.as_deref(), Some("grafana.local"));

        let hub = Cluster {
            grafana_host: String::new(),
            ..hub
        };
        assert!(GrafanaEndpoint::for_hub(&hub).host.is_none());
    }

    #[test]
    fn test_evaluate_response() {
        evaluate_response(ACTIVE_BYTES_RESULT, &expected(&["node_memory_Active_bytes"])).unwrap();

        let err = evaluate_response(EMPTY_RESULT, &expected(&["node_memory_Active_bytes"]))
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Failed to find metric name from response");

        let err = evaluate_response(r#"{"status":"error"}"#, &[]).unwrap_err();
        assert!(matches!(err, MetricError::MissingSuccessMarker));
    }

    #[test]
    fn test_with_offset() {
        assert_eq!(
            with_offset("node_memory_Active_bytes", Some("1m")),
            "node_memory_Active_bytes offset 1m"
        );
        assert_eq!(with_offset("up", None), "up");
        assert_eq!(with_offset("up", Some("")), "up");
    }

    #[tokio::test]
    async fn test_metric_found_with_offset_and_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(QUERY_PATH))
            .and(query_param("query", "node_memory_Active_bytes offset 1m"))
            .and(header("authorization", "Bearer sha256~token"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ACTIVE_BYTES_RESULT))
            .expect(1)
            .mount(&server)
            .await;

        verifier(&server, None)
            .contain_managed_cluster_metric(
                "node_memory_Active_bytes",
                Some("1m"),
                &expected(&[r#""__name__":"node_memory_Active_bytes""#]),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_metric_absent_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(QUERY_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(EMPTY_RESULT))
            .mount(&server)
            .await;

        let err = verifier(&server, None)
            .contain_managed_cluster_metric(
                "node_memory_MemAvailable_bytes",
                Some("90s"),
                &expected(&[r#""__name__":"node_memory_MemAvailable_bytes""#]),
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_http_status_and_transport_are_distinct() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(QUERY_PATH))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = verifier(&server, None)
            .contain_managed_cluster_metric("up", None, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, MetricError::HttpStatus { status: 403 }));
        assert!(!err.is_not_found());

        let unreachable = MetricsVerifier::with_endpoints(
            http_client().unwrap(),
            GrafanaEndpoint {
                base_url: "http://127.0.0.1:1/grafana/".to_string(),
                host: None,
            },
            "http://127.0.0.1:1",
            "",
        );
        let err = unreachable
            .contain_managed_cluster_metric("up", None, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, MetricError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_host_header_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/grafana/"))
            .and(header("host", "multicloud-console.apps.hub.example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .expect(1)
            .mount(&server)
            .await;

        verifier(&server, Some("multicloud-console.apps.hub.example.com"))
            .check_grafana_console()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_prometheus_metadata_names() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/prometheus/api/v1/metadata"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"status":"success","data":{"up":[{"type":"gauge"}],"node_memory_Active_bytes":[{"type":"gauge"}]}}"#,
            ))
            .mount(&server)
            .await;

        let mut names = verifier(&server, None)
            .prometheus_metrics_metadata()
            .await
            .unwrap();
        names.sort();
        assert_eq!(names, vec!["node_memory_Active_bytes", "up"]);
    }

    #[tokio::test]
    async fn test_contain_dashboard() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/grafana/api/search"))
            .and(query_param("query", "Sample Dashboard for E2E"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"[{"id":7,"uid":"abc","title":"Sample Dashboard for E2E","type":"dash-db"}]"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/grafana/api/search"))
            .and(query_param("query", "Update Sample Dashboard for E2E"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&server)
            .await;

        let verifier = verifier(&server, None);
        verifier
            .contain_dashboard("Sample Dashboard for E2E")
            .await
            .unwrap();
        assert!(verifier
            .contain_dashboard("Update Sample Dashboard for E2E")
            .await
            .unwrap_err()
            .is_not_found());
    }
}
