// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `debug.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use k8s_openapi::api::core::v1::{PodCondition, PodStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pod(name: &str, ready: Option<&str>) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            spec: None,
            status: Some(PodStatus {
                phase: Some("Running".to_string()),
                conditions: ready.map(|status| {
                    vec![PodCondition {
                        type_: "Ready".to_string(),
                        status: status.to_string(),
                        ..Default::default()
                    }]
                }),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_not_ready_pods() {
        let pods = vec![
            pod("observability-grafana-0", Some("True")),
            pod("observability-thanos-rule-0", Some("False")),
            pod("observability-thanos-store-shard-0-0", None),
        ];
        let names: Vec<&str> = not_ready_pods(&pods).into_iter().map(pod_name).collect();
        assert_eq!(
            names,
            vec!["observability-thanos-rule-0", "observability-thanos-store-shard-0-0"]
        );
    }

    #[tokio::test]
    async fn test_pod_logs_requests_tail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(
                "/api/v1/namespaces/open-cluster-management/pods/mco-operator-0/log",
            ))
            .and(query_param("container", "multicluster-observability-operator"))
            .and(query_param("tailLines", "1000"))
            .respond_with(ResponseTemplate::new(200).set_body_string("reconciled\n"))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            Client::try_from(kube::Config::new(server.uri().parse().unwrap())).unwrap();
        let logs = pod_logs(
            &client,
            "open-cluster-management",
            "mco-operator-0",
            "multicluster-observability-operator",
            1000,
        )
        .await
        .unwrap();
        assert_eq!(logs, "reconciled\n");
    }
}
