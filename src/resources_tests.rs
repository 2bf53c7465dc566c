// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `resources.rs`
//!
//! The API server is faked with wiremock so the conflict and validation paths
//! can be driven deterministically.

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::gvr::MCO_V1BETA2;
    use crate::unstructured::{get_str, set_path};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MCO_PATH: &str =
        "/apis/observability.open-cluster-management.io/v1beta2/multiclusterobservabilities/observability";

    async fn fake_client(server: &MockServer) -> Client {
        let config = kube::Config::new(server.uri().parse().unwrap());
        Client::try_from(config).unwrap()
    }

    fn mco(resource_version: &str, spec: Value) -> Value {
        json!({
            "apiVersion": "observability.open-cluster-management.io/v1beta2",
            "kind": "MultiClusterObservability",
            "metadata": {"name": "observability", "resourceVersion": resource_version},
            "spec": spec
        })
    }

    fn status(code: u16, reason: &str, message: &str) -> ResponseTemplate {
        ResponseTemplate::new(code).set_body_json(json!({
            "kind": "Status",
            "apiVersion": "v1",
            "metadata": {},
            "status": "Failure",
            "message": message,
            "reason": reason,
            "code": code
        }))
    }

    fn target() -> ResourceRef {
        ResourceRef::cluster(MCO_V1BETA2, "observability")
    }

    fn set_retention(obj: &mut Value) -> Result<(), ShapeError> {
        set_path(
            obj,
            &["spec", "advanced", "retentionConfig", "retentionResolutionRaw"],
            json!("3d"),
        )
    }

    async fn put_bodies(server: &MockServer) -> Vec<Value> {
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.method.as_str() == "PUT")
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect()
    }

    /// A stale write is retried on the newer revision and keeps both changes.
    #[tokio::test]
    async fn test_mutate_retries_conflict_and_preserves_concurrent_change() {
        let server = MockServer::start().await;

        // first read sees revision 1
        Mock::given(method("GET"))
            .and(path(MCO_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(mco("1", json!({}))))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        // another writer set the node selector, producing revision 2
        Mock::given(method("GET"))
            .and(path(MCO_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(mco(
                "2",
                json!({"nodeSelector": {"kubernetes.io/os": "linux"}}),
            )))
            .with_priority(2)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(MCO_PATH))
            .and(body_partial_json(json!({"metadata": {"resourceVersion": "1"}})))
            .respond_with(status(
                409,
                "Conflict",
                "the object has been modified; please apply your changes to the latest version and try again",
            ))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(MCO_PATH))
            .and(body_partial_json(json!({"metadata": {"resourceVersion": "2"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(mco(
                "3",
                json!({
                    "nodeSelector": {"kubernetes.io/os": "linux"},
                    "advanced": {"retentionConfig": {"retentionResolutionRaw": "3d"}}
                }),
            )))
            .expect(1)
            .mount(&server)
            .await;

        let client = fake_client(&server).await;
        let updated = mutate(&client, &target(), set_retention).await.unwrap();
        assert_eq!(get_str(&updated, &["metadata", "resourceVersion"]).unwrap(), "3");

        let puts = put_bodies(&server).await;
        assert_eq!(puts.len(), 2);
        let last = puts.last().unwrap();
        assert_eq!(
            get_str(last, &["spec", "nodeSelector", "kubernetes.io/os"]).unwrap(),
            "linux",
            "concurrent writer's change must survive"
        );
        assert_eq!(
            get_str(last, &["spec", "advanced", "retentionConfig", "retentionResolutionRaw"])
                .unwrap(),
            "3d"
        );
    }

    /// A single cycle surfaces the conflict instead of overwriting.
    #[tokio::test]
    async fn test_mutate_once_surfaces_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(MCO_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(mco("1", json!({}))))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(MCO_PATH))
            .respond_with(status(409, "Conflict", "the object has been modified"))
            .expect(1)
            .mount(&server)
            .await;

        let client = fake_client(&server).await;
        let err = mutate_once(&client, &target(), set_retention)
            .await
            .unwrap_err();
        assert!(err.is_conflict(), "expected conflict, got {err:?}");
    }

    #[tokio::test]
    async fn test_mutate_gives_up_after_retry_budget() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(MCO_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(mco("1", json!({}))))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(MCO_PATH))
            .respond_with(status(409, "Conflict", "the object has been modified"))
            .expect(u64::from(CONFLICT_RETRY_ATTEMPTS))
            .mount(&server)
            .await;

        let client = fake_client(&server).await;
        let err = mutate(&client, &target(), set_retention).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_mutate_stops_on_shape_error_without_writing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(MCO_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(mco("1", json!("not-an-object"))))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(MCO_PATH))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = fake_client(&server).await;
        let err = mutate(&client, &target(), set_retention).await.unwrap_err();
        assert!(matches!(err, ResourceError::Shape(_)));
    }

    #[tokio::test]
    async fn test_validation_error_keeps_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(MCO_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(mco("1", json!({}))))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(MCO_PATH))
            .respond_with(status(
                422,
                "Invalid",
                "MultiClusterObservability.observability.open-cluster-management.io \"observability\" is invalid: spec.observabilityAddonSpec.interval: Invalid value: 14: spec.observabilityAddonSpec.interval in body should be greater than or equal to 15",
            ))
            .mount(&server)
            .await;

        let client = fake_client(&server).await;
        let err = mutate(&client, &target(), |obj| {
            set_path(obj, &["spec", "observabilityAddonSpec", "interval"], json!(14))
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ResourceError::Invalid { .. }));
        assert!(err.to_string().contains("Invalid value: 14"));
    }

    #[tokio::test]
    async fn test_not_found_handling() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(MCO_PATH))
            .respond_with(status(404, "NotFound", "not found"))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(MCO_PATH))
            .respond_with(status(404, "NotFound", "not found"))
            .mount(&server)
            .await;

        let client = fake_client(&server).await;
        assert!(get_opt(&client, &target()).await.unwrap().is_none());
        assert!(get(&client, &target()).await.unwrap_err().is_not_found());
        delete_if_exists(&client, &target()).await.unwrap();
        assert!(delete(&client, &target()).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_apply_yaml_server_side_applies_each_document() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/api/v1/namespaces/open-cluster-management-observability"))
            .and(query_param("fieldManager", "observability-e2e"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "apiVersion": "v1",
                "kind": "Namespace",
                "metadata": {"name": "open-cluster-management-observability"}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path(
                "/api/v1/namespaces/open-cluster-management-observability/configmaps/observability-metrics-custom-allowlist",
            ))
            .and(query_param("fieldManager", "observability-e2e"))
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

        let yaml = r"
apiVersion: v1
kind: Namespace
metadata:
  name: open-cluster-management-observability
---
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: observability-metrics-custom-allowlist
  namespace: open-cluster-management-observability
data:
  metrics_list.yaml: |
    names:
      - node_memory_Active_bytes
";
        let client = fake_client(&server).await;
        apply_yaml(&client, yaml).await.unwrap();
    }

    #[test]
    fn test_parse_documents_skips_empty() {
        let docs = parse_documents("---\nkind: A\n---\n\n---\nkind: B\n").unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1]["kind"], "B");
    }

    #[test]
    fn test_manifest_id_requires_identity() {
        let err = ManifestId::of(&json!({"apiVersion": "v1", "metadata": {"name": "x"}})).unwrap_err();
        assert!(err.to_string().contains("kind attribute not found"));

        let err = ManifestId::of(&json!({"apiVersion": "v1", "kind": "Secret"})).unwrap_err();
        assert!(err.to_string().contains("metadata.name"));
    }

    #[test]
    fn test_manifest_api_resource_and_scope() {
        let observatorium = ManifestId::of(&json!({
            "apiVersion": "core.observatorium.io/v1alpha1",
            "kind": "Observatorium",
            "metadata": {"name": "observability", "namespace": "open-cluster-management-observability"}
        }))
        .unwrap();
        assert_eq!(observatorium.api_resource().plural, "observatoria");
        assert!(!observatorium.cluster_scoped());

        let mco = ManifestId::of(&mco("1", json!({}))).unwrap();
        assert_eq!(mco.api_resource().plural, "multiclusterobservabilities");
        assert_eq!(mco.api_resource().group, "observability.open-cluster-management.io");
        assert!(mco.cluster_scoped());

        let secret = ManifestId::of(&json!({
            "apiVersion": "v1",
            "kind": "Secret",
            "metadata": {"name": "thanos-object-storage"}
        }))
        .unwrap();
        assert_eq!(secret.api_resource().plural, "secrets");
        assert_eq!(secret.api_resource().group, "");
    }

    #[test]
    fn test_policy_bundle_kinds_are_namespaced() {
        for (api_version, kind, plural) in [
            ("policy.open-cluster-management.io/v1", "Policy", "policies"),
            ("policy.open-cluster-management.io/v1", "PlacementBinding", "placementbindings"),
            ("apps.open-cluster-management.io/v1", "PlacementRule", "placementrules"),
        ] {
            let id = ManifestId::of(&json!({
                "apiVersion": api_version,
                "kind": kind,
                "metadata": {"name": "policy-observability", "namespace": "open-cluster-management"}
            }))
            .unwrap();
            assert!(!id.cluster_scoped(), "{kind} should be namespaced");
            assert_eq!(id.api_resource().plural, plural);
        }
    }
}
