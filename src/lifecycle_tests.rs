// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `lifecycle.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::context::RunSettings;
    use crate::options::TestOptions;
    use k8s_openapi::api::core::v1::PodStatus;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pod(name: &str, phase: &str) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            spec: None,
            status: Some(PodStatus {
                phase: Some(phase.to_string()),
                ..Default::default()
            }),
        }
    }

    fn fake_client(server: &MockServer) -> Client {
        Client::try_from(kube::Config::new(server.uri().parse().unwrap())).unwrap()
    }

    #[test]
    fn test_single_running_pod() {
        let pods = vec![pod("multicluster-observability-operator-6c9d", "Running")];
        assert_eq!(
            pod_name(single_running_pod(&pods).unwrap()),
            "multicluster-observability-operator-6c9d"
        );

        let err = single_running_pod(&[]).unwrap_err();
        assert_eq!(err.to_string(), "expected exactly 1 MCO operator pod, found 0");

        let two = vec![pod("a", "Running"), pod("b", "Running")];
        assert!(single_running_pod(&two).is_err());

        let pending = vec![pod("a", "Pending")];
        let err = single_running_pod(&pending).unwrap_err();
        assert!(err.to_string().contains("is Pending"));
    }

    #[test]
    fn test_addon_namespaces_include_local_cluster_once() {
        let names = vec!["cluster1".to_string(), "local-cluster".to_string()];
        assert_eq!(addon_namespaces(&names), vec!["cluster1", "local-cluster"]);
        assert_eq!(addon_namespaces(&[]), vec!["local-cluster"]);
    }

    #[tokio::test]
    async fn test_patch_placement_rule_status() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path(
                "/apis/apps.open-cluster-management.io/v1/namespaces/open-cluster-management-observability/placementrules/observability/status",
            ))
            .and(body_partial_json(json!({
                "status": {"decisions": [{"clusterName": "cluster1", "clusterNamespace": "cluster1"}]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "apiVersion": "apps.open-cluster-management.io/v1",
                "kind": "PlacementRule",
                "metadata": {"name": "observability", "namespace": "open-cluster-management-observability"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        patch_placement_rule(&fake_client(&server), &["cluster1".to_string()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_addon_wait_falls_back_to_local_cluster_when_listing_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/apis/cluster.open-cluster-management.io/v1/managedclusters"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "kind": "Status",
                "apiVersion": "v1",
                "status": "Failure",
                "message": "etcdserver: request timed out",
                "reason": "InternalError",
                "code": 500
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(
                "/apis/observability.open-cluster-management.io/v1beta1/namespaces/local-cluster/observabilityaddons/observability-addon",
            ))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "kind": "Status",
                "apiVersion": "v1",
                "status": "Failure",
                "message": "observabilityaddons \"observability-addon\" not found",
                "reason": "NotFound",
                "code": 404
            })))
            .expect(1)
            .mount(&server)
            .await;

        wait_addons_deleted(&fake_client(&server)).await.unwrap();
    }

    #[tokio::test]
    async fn test_install_and_uninstall_honour_skip_switches() {
        let server = MockServer::start().await;
        let settings = RunSettings {
            skip_install: true,
            skip_uninstall: true,
            ..Default::default()
        };
        let ctx = TestContext::new(
            fake_client(&server),
            None,
            TestOptions::default(),
            settings,
            reqwest::Client::new(),
        );
        install(&ctx).await.unwrap();
        uninstall(&ctx).await.unwrap();
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_apply_bundle_uses_builtin_manifest() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path(
                "/api/v1/namespaces/open-cluster-management-observability/configmaps/observability-metrics-custom-allowlist",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "apiVersion": "v1",
                "kind": "ConfigMap",
                "metadata": {
                    "name": "observability-metrics-custom-allowlist",
                    "namespace": "open-cluster-management-observability"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = TestContext::new(
            fake_client(&server),
            None,
            TestOptions::default(),
            RunSettings::default(),
            reqwest::Client::new(),
        );
        let yaml = apply_bundle(&ctx, Bundle::MetricsAllowlist).await.unwrap();
        assert!(yaml.unwrap().contains("node_memory_Active_bytes"));

        // policy has no built-in copy
        assert!(apply_bundle(&ctx, Bundle::Policy).await.unwrap().is_none());
    }
}
