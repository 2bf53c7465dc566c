// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `manifests.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::resources::ManifestId;
    use base64::Engine as _;
    use k8s_openapi::ByteString;
    use serde_json::json;

    const ALL_BUNDLES: [Bundle; 8] = [
        Bundle::Policy,
        Bundle::McoV1beta1,
        Bundle::McoV1beta2,
        Bundle::CustomRulesValid,
        Bundle::CustomRulesInvalid,
        Bundle::MetricsAllowlist,
        Bundle::SampleDashboard,
        Bundle::UpdatedSampleDashboard,
    ];

    fn receiver() -> SlackReceiver {
        SlackReceiver {
            api_url: "https://hooks.slack.com/services/placeholder".to_string(),
            channel: "team-observability-test".to_string(),
        }
    }

    #[test]
    fn test_builtin_bundles_are_valid_manifests() {
        for bundle in ALL_BUNDLES {
            let Some(yaml) = bundle.builtin("observability") else {
                assert_eq!(bundle, Bundle::Policy);
                continue;
            };
            let docs = parse_documents(&yaml).unwrap();
            assert!(!docs.is_empty(), "{bundle:?} has no documents");
            for doc in &docs {
                ManifestId::of(doc).unwrap();
            }
        }
    }

    #[test]
    fn test_mco_templates_use_given_name() {
        let yaml = Bundle::McoV1beta2.builtin("obs-under-test").unwrap();
        let docs = parse_documents(&yaml).unwrap();
        let id = ManifestId::of(&docs[0]).unwrap();
        assert_eq!(id.kind, "MultiClusterObservability");
        assert_eq!(id.name, "obs-under-test");
        assert_eq!(
            id.api_version,
            "observability.open-cluster-management.io/v1beta2"
        );

        let v1beta1 = parse_documents(&Bundle::McoV1beta1.builtin("x").unwrap()).unwrap();
        assert_eq!(
            v1beta1[0].pointer("/spec/storageConfigObject/statefulSetSize"),
            Some(&json!("10Gi"))
        );
    }

    #[tokio::test]
    async fn test_render_without_directory_uses_builtin() {
        let yaml = render(Bundle::MetricsAllowlist, None, "observability")
            .await
            .unwrap()
            .unwrap();
        assert!(yaml.contains("node_memory_Active_bytes"));

        assert!(render(Bundle::Policy, None, "observability")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_render_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        assert!(render(Bundle::Policy, Some(&missing), "observability")
            .await
            .is_err());
    }

    #[test]
    fn test_conversion_golden_path() {
        let path = conversion_golden(Path::new("/manifests"));
        assert_eq!(
            path,
            PathBuf::from(
                "/manifests/mco/e2e/v1beta1/observability-v1beta1-to-v1beta2-golden.yaml"
            )
        );
    }

    #[test]
    fn test_manifest_labels() {
        let valid = Bundle::CustomRulesValid.builtin("observability").unwrap();
        let labels = manifest_labels(&valid).unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels.get("alert_source").map(String::as_str), Some("e2e"));

        let none = manifest_labels("apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: a\n")
            .unwrap();
        assert!(none.is_empty());

        assert!(manifest_labels("").is_err());
    }

    #[test]
    fn test_object_storage_secret_requires_every_variable() {
        let mut env = ObjectStorageEnv {
            bucket: Some("observability-e2e".to_string()),
            region: None,
            access_key_id: Some("AKIAEXAMPLE".to_string()),
            secret_access_key: Some("secret".to_string()),
        };
        let err = object_storage_secret(&env).unwrap_err();
        assert_eq!(err.to_string(), "failed to get s3 REGION env");

        env.region = Some("us-east-1".to_string());
        env.secret_access_key = Some(String::new());
        let err = object_storage_secret(&env).unwrap_err();
        assert_eq!(err.to_string(), "failed to get aws AWS_SECRET_ACCESS_KEY env");

        env.secret_access_key = Some("secret".to_string());
        let secret = object_storage_secret(&env).unwrap();
        assert_eq!(secret["metadata"]["name"], "thanos-object-storage");
        let encoded = secret["data"]["thanos.yaml"].as_str().unwrap();
        let decoded = String::from_utf8(BASE64.decode(encoded).unwrap()).unwrap();
        assert!(decoded.contains("bucket: observability-e2e"));
        assert!(decoded.contains("endpoint: s3.us-east-1.amazonaws.com"));
    }

    #[test]
    fn test_copy_secret_drops_server_metadata() {
        let source = Secret {
            metadata: ObjectMeta {
                name: Some("multiclusterhub-operator-pull-secret".to_string()),
                namespace: Some("open-cluster-management".to_string()),
                resource_version: Some("42".to_string()),
                uid: Some("abc".to_string()),
                ..Default::default()
            },
            data: Some(BTreeMap::from([(
                ".dockerconfigjson".to_string(),
                ByteString(b"{}".to_vec()),
            )])),
            type_: Some("kubernetes.io/dockerconfigjson".to_string()),
            ..Default::default()
        };
        let copy = copy_secret(&source, MCO_NAMESPACE);
        assert_eq!(copy.metadata.namespace.as_deref(), Some(MCO_NAMESPACE));
        assert_eq!(copy.metadata.name, source.metadata.name);
        assert!(copy.metadata.resource_version.is_none());
        assert!(copy.metadata.uid.is_none());
        assert_eq!(copy.data, source.data);
        assert_eq!(copy.type_, source.type_);
    }

    #[test]
    fn test_alertmanager_config() {
        let config = alertmanager_config("hub.example.com", &receiver());
        assert!(config.contains("api_url: https://hooks.slack.com/services/placeholder"));
        assert!(config.contains("channel: team-observability-test"));
        assert!(config.contains("https://multicloud-console.apps.hub.example.com/grafana/explore"));
        assert!(config.contains("{{ .CommonLabels.alertname }}"));
        assert!(!config.contains("{{BASE_DOMAIN}}"));

        let parsed: serde_yaml::Value = serde_yaml::from_str(&config).unwrap();
        assert_eq!(parsed["route"]["receiver"].as_str(), Some("default-receiver"));
        assert_eq!(parsed["route"]["repeat_interval"].as_str(), Some("2m"));
        assert_eq!(
            parsed["receivers"][0]["slack_configs"][0]["title"].as_str(),
            Some("[{{ .Status | toUpper }}] {{ .CommonLabels.alertname }} ({{ .CommonLabels.severity }})")
        );
    }

    #[test]
    fn test_alertmanager_config_secret_encodes_config() {
        let secret = alertmanager_config_secret("hub.example.com", &receiver());
        assert_eq!(secret["metadata"]["name"], "alertmanager-config");
        let encoded = secret["data"]["alertmanager.yaml"].as_str().unwrap();
        let decoded = String::from_utf8(BASE64.decode(encoded).unwrap()).unwrap();
        assert_eq!(decoded, alertmanager_config("hub.example.com", &receiver()));
    }

    #[test]
    fn test_testing_rbac() {
        let objects = testing_rbac();
        let kinds: Vec<String> = objects
            .iter()
            .map(|o| ManifestId::of(o).unwrap().kind)
            .collect();
        assert_eq!(kinds, vec!["ServiceAccount", "Secret", "ClusterRoleBinding"]);
        assert_eq!(
            objects[1]["metadata"]["annotations"]["kubernetes.io/service-account.name"],
            "mco-e2e-testing"
        );
        assert!(ManifestId::of(&objects[2]).unwrap().cluster_scoped());
    }

    #[test]
    fn test_placement_decisions() {
        let patch = placement_decisions(&["cluster1".to_string(), "cluster2".to_string()]);
        assert_eq!(
            patch,
            json!({"status": {"decisions": [
                {"clusterName": "cluster1", "clusterNamespace": "cluster1"},
                {"clusterName": "cluster2", "clusterNamespace": "cluster2"}
            ]}})
        );
        assert_eq!(placement_decisions(&[]), json!({"status": {"decisions": []}}));
    }

    #[test]
    fn test_cluster_image_set_name() {
        assert_eq!(cluster_image_set_name("4.4.4"), "img4.4.4-x86-64");
    }
}
