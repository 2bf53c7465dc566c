// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `client.rs`

#[cfg(test)]
mod tests {
    use super::super::*;

    const KUBECONFIG: &str = r"
apiVersion: v1
kind: Config
current-context: admin
clusters:
  - name: hub
    cluster:
      server: https://api.hub.example.com:6443
contexts:
  - name: admin
    context:
      cluster: hub
      user: kube:admin
  - name: reader
    context:
      cluster: hub
      user: reader
  - name: certs
    context:
      cluster: hub
      user: cert-user
users:
  - name: kube:admin
    user:
      token: sha256~admin
  - name: reader
    user:
      token: sha256~reader
  - name: cert-user
    user:
      client-certificate-data: Zm9v
";

    #[test]
    fn test_token_for_current_context() {
        assert_eq!(
            token_from_kubeconfig(KUBECONFIG, None).as_deref(),
            Some("sha256~admin")
        );
        assert_eq!(
            token_from_kubeconfig(KUBECONFIG, Some("")).as_deref(),
            Some("sha256~admin")
        );
    }

    #[test]
    fn test_token_for_named_context() {
        assert_eq!(
            token_from_kubeconfig(KUBECONFIG, Some("reader")).as_deref(),
            Some("sha256~reader")
        );
    }

    #[test]
    fn test_no_token_for_certificate_user() {
        assert!(token_from_kubeconfig(KUBECONFIG, Some("certs")).is_none());
    }

    #[test]
    fn test_unknown_context_or_garbage() {
        assert!(token_from_kubeconfig(KUBECONFIG, Some("missing")).is_none());
        assert!(token_from_kubeconfig("::not yaml::", None).is_none());
        assert!(token_from_kubeconfig("apiVersion: v1\nkind: Config\n", None).is_none());
    }

    #[test]
    fn test_token_from_full_kubeconfig() {
        let content = r"
apiVersion: v1
kind: Config
preferences: {}
current-context: admin
clusters:
  - name: hub
    cluster:
      server: https://api.hub.example.com:6443
      insecure-skip-tls-verify: true
contexts:
  - name: admin
    context:
      cluster: hub
      namespace: open-cluster-management-observability
      user: kube:admin
users:
  - name: kube:admin
    user:
      token: sha256~admin
  - name: empty
    user:
      token: ''
";
        assert_eq!(
            token_from_kubeconfig(content, None).as_deref(),
            Some("sha256~admin")
        );
    }

    #[tokio::test]
    async fn test_client_builds_for_https_cluster() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kubeconfig");
        std::fs::write(&path, KUBECONFIG).unwrap();

        let client = new_client("", path.to_str().unwrap(), "").await;

        assert!(client.is_ok(), "{:?}", client.err());
    }

    #[tokio::test]
    async fn test_load_config_overrides_server_without_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kubeconfig");
        std::fs::write(&path, KUBECONFIG).unwrap();

        let config = load_config(
            "https://override.example.com:6443",
            path.to_str().unwrap(),
            "",
        )
        .await
        .unwrap();

        assert!(config
            .cluster_url
            .to_string()
            .starts_with("https://override.example.com:6443"));
    }

    #[tokio::test]
    async fn test_load_config_keeps_server_with_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kubeconfig");
        std::fs::write(&path, KUBECONFIG).unwrap();

        let config = load_config(
            "https://override.example.com:6443",
            path.to_str().unwrap(),
            "reader",
        )
        .await
        .unwrap();

        assert!(config.cluster_url.to_string().contains("api.hub.example.com"));
    }

    #[tokio::test]
    async fn test_load_config_missing_file() {
        let err = load_config("", "/nonexistent/kubeconfig", "")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/kubeconfig"));
    }
}
