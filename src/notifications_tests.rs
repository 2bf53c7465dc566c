// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `notifications.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> SlackCredentials {
        SlackCredentials {
            token: "xoxb-test".to_string(),
            bot_id: "B000TEST".to_string(),
            channel_id: "C000TEST".to_string(),
        }
    }

    fn verifier(server: &MockServer) -> SlackVerifier {
        SlackVerifier::with_base_url(HttpClient::new(), server.uri(), credentials())
    }

    #[test]
    fn test_credentials_require_all_variables() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SLACK_BOT_OUATH_TOKEN", "xoxb-test"),
            ("SLACK_BOT_ID", "B000TEST"),
            ("SLACK_CHANNEL_ID", "C000TEST"),
        ]);
        let creds =
            SlackCredentials::from_lookup(|k| env.get(k).map(|v| (*v).to_string())).unwrap();
        assert_eq!(creds, credentials());

        let partial: HashMap<&str, &str> =
            HashMap::from([("SLACK_BOT_OUATH_TOKEN", "xoxb-test"), ("SLACK_BOT_ID", "")]);
        let lookup = |k: &str| partial.get(k).map(|v| (*v).to_string());
        assert!(SlackCredentials::from_lookup(lookup).is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let rendered = format!("{:?}", credentials());
        assert!(!rendered.contains("xoxb-test"));
        assert!(rendered.contains("C000TEST"));
    }

    #[test]
    fn test_find_alert_matches_title_link() {
        let messages = vec![
            Message {
                ts: "1".to_string(),
                attachments: vec![Attachment {
                    title: "[FIRING] Watchdog (none)".to_string(),
                    title_link: "https://multicloud-console.apps.other.example.com/grafana".to_string(),
                    text: String::new(),
                }],
            },
            Message {
                ts: "2".to_string(),
                attachments: vec![],
            },
            Message {
                ts: "3".to_string(),
                attachments: vec![Attachment {
                    title: "[FIRING] NodeOutOfMemory (warning)".to_string(),
                    title_link: "https://multicloud-console.apps.hub.example.com/grafana/explore"
                        .to_string(),
                    text: "node memory is low".to_string(),
                }],
            },
        ];
        let found = find_alert(&messages, "hub.example.com").unwrap();
        assert_eq!(found.title, "[FIRING] NodeOutOfMemory (warning)");
        assert!(find_alert(&messages, "missing.example.com").is_none());
    }

    #[tokio::test]
    async fn test_bot_and_channel_info() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bots.info"))
            .and(query_param("bot", "B000TEST"))
            .and(header("authorization", "Bearer xoxb-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "bot": {"id": "B000TEST", "name": "TestingObserv"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/conversations.info"))
            .and(query_param("channel", "C000TEST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "channel": {"id": "C000TEST", "name": "team-observability-test"}
            })))
            .mount(&server)
            .await;

        let slack = verifier(&server);
        assert_eq!(slack.bot_info().await.unwrap().name, "TestingObserv");
        assert_eq!(
            slack.channel_info().await.unwrap().name,
            "team-observability-test"
        );
    }

    #[tokio::test]
    async fn test_history_and_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/conversations.history"))
            .and(query_param("limit", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "messages": [{
                    "ts": "1700000000.000100",
                    "attachments": [{
                        "title": "[FIRING] NodeOutOfMemory (warning)",
                        "title_link": "https://multicloud-console.apps.hub.example.com/grafana/explore",
                        "text": "memory"
                    }]
                }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/bots.info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": false,
                "error": "bot_not_found"
            })))
            .mount(&server)
            .await;

        let slack = verifier(&server);
        let messages = slack.history(10).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert!(find_alert(&messages, "hub.example.com").is_some());

        let err = slack.bot_info().await.unwrap_err();
        assert!(matches!(err, NotificationError::Api { ref error, .. } if error == "bot_not_found"));
    }
}
