// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `unstructured.rs`

#[cfg(test)]
mod tests {
    use crate::errors::ShapeError;
    use crate::unstructured::*;
    use serde_json::json;

    fn mco() -> serde_json::Value {
        json!({
            "apiVersion": "observability.open-cluster-management.io/v1beta2",
            "kind": "MultiClusterObservability",
            "metadata": {"name": "observability", "resourceVersion": "42"},
            "spec": {
                "observabilityAddonSpec": {"enableMetrics": true, "interval": 30},
                "advanced": {"retentionConfig": {"deleteDelay": "48h"}},
                "nodeSelector": null
            },
            "status": {
                "conditions": [
                    {"type": "Installing", "message": "Installation is in progress"},
                    {"type": "Ready", "message": "Observability components are deployed and running"}
                ]
            }
        })
    }

    #[test]
    fn test_typed_getters() {
        let obj = mco();
        assert!(get_bool(&obj, &["spec", "observabilityAddonSpec", "enableMetrics"]).unwrap());
        assert_eq!(
            get_i64(&obj, &["spec", "observabilityAddonSpec", "interval"]).unwrap(),
            30
        );
        assert_eq!(
            get_str(&obj, &["spec", "advanced", "retentionConfig", "deleteDelay"]).unwrap(),
            "48h"
        );
        assert_eq!(get_object(&obj, &["metadata"]).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_path_reports_first_absent_segment() {
        let obj = mco();
        let err = get_str(&obj, &["spec", "storageConfig", "storageClass"]).unwrap_err();
        assert_eq!(
            err,
            ShapeError::Missing {
                path: "spec.storageConfig".to_string()
            }
        );
    }

    #[test]
    fn test_null_counts_as_missing() {
        let obj = mco();
        assert!(get_opt(&obj, &["spec", "nodeSelector"]).is_none());
        assert!(matches!(
            get_object(&obj, &["spec", "nodeSelector"]),
            Err(ShapeError::Missing { .. })
        ));
    }

    #[test]
    fn test_wrong_type_is_an_error_not_a_panic() {
        let obj = mco();
        let err = get_bool(&obj, &["spec", "observabilityAddonSpec", "interval"]).unwrap_err();
        assert_eq!(
            err,
            ShapeError::WrongType {
                path: "spec.observabilityAddonSpec.interval".to_string(),
                expected: "bool",
                found: "number",
            }
        );

        let err = get_str(&obj, &["metadata", "name", "first"]).unwrap_err();
        assert!(matches!(err, ShapeError::WrongType { expected: "object", .. }));
    }

    #[test]
    fn test_set_path_creates_intermediates() {
        let mut obj = mco();
        set_path(
            &mut obj,
            &["spec", "advanced", "retentionConfig", "retentionResolutionRaw"],
            json!("3d"),
        )
        .unwrap();
        set_path(&mut obj, &["spec", "nodeSelector", "kubernetes.io/os"], json!("linux")).unwrap();
        set_path(&mut obj, &["spec", "storageConfig", "alertmanagerStorageSize"], json!("1Gi"))
            .unwrap();

        assert_eq!(
            get_str(&obj, &["spec", "advanced", "retentionConfig", "retentionResolutionRaw"])
                .unwrap(),
            "3d"
        );
        assert_eq!(
            get_str(&obj, &["spec", "advanced", "retentionConfig", "deleteDelay"]).unwrap(),
            "48h"
        );
        assert_eq!(
            get_str(&obj, &["spec", "nodeSelector", "kubernetes.io/os"]).unwrap(),
            "linux"
        );
        assert_eq!(
            get_str(&obj, &["spec", "storageConfig", "alertmanagerStorageSize"]).unwrap(),
            "1Gi"
        );
    }

    #[test]
    fn test_set_path_refuses_to_overwrite_scalars() {
        let mut obj = mco();
        let err = set_path(&mut obj, &["metadata", "name", "suffix"], json!("x")).unwrap_err();
        assert!(matches!(err, ShapeError::WrongType { found: "string", .. }));
        assert_eq!(get_str(&obj, &["metadata", "name"]).unwrap(), "observability");
    }

    #[test]
    fn test_status_contains_condition_type() {
        let obj = mco();
        assert!(status_contains_condition_type(&obj, "Ready"));
        assert!(status_contains_condition_type(&obj, "Installing"));
        assert!(!status_contains_condition_type(&obj, "Degraded"));
        assert!(!status_contains_condition_type(&json!({"status": {}}), "Ready"));
        assert!(!status_contains_condition_type(&json!({}), "Ready"));
    }

    #[test]
    fn test_first_condition_message() {
        let obj = mco();
        assert_eq!(
            first_condition_message(&obj).unwrap(),
            "Installation is in progress"
        );

        let empty = json!({"status": {"conditions": []}});
        assert!(first_condition_message(&empty).is_err());
    }
}
