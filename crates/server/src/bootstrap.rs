use std::sync::Arc;

use axum::Router;
use tracing::info;
use tunelink_core::config::AppConfig;
use tunelink_core::RequestHistory;
use tunelink_slack::{
    client::{ChatApi, SlackWebClient},
    events::default_dispatcher,
    signature::RequestVerifier,
};

use crate::{health, webhook};

pub struct Application {
    pub config: AppConfig,
    pub history: RequestHistory,
    pub router: Router,
}

pub fn bootstrap_with_config(config: AppConfig) -> Application {
    let chat: Arc<dyn ChatApi> = Arc::new(SlackWebClient::new(&config.slack));
    build_application(config, chat)
}

pub fn build_application(config: AppConfig, chat: Arc<dyn ChatApi>) -> Application {
    let history = RequestHistory::new();
    let dispatcher = default_dispatcher(chat, history.clone());
    let verifier = RequestVerifier::new(config.slack.signing_secret.clone());
    let state = webhook::WebhookState::new(verifier, dispatcher);

    let router = webhook::router(&config.server.events_path, state)
        .merge(health::router(history.clone()));

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        events_path = %config.server.events_path,
        "webhook routes registered"
    );

    Application { config, history, router }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;
    use tunelink_core::config::{AppConfig, ConfigOverrides, LoadOptions};

    use crate::bootstrap::{bootstrap_with_config, build_application};
    use crate::testing::{body_json, signed_request, with_clean_env, RecordingChat, SIGNING_SECRET};

    fn valid_overrides() -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                spotify_client_id: Some("spotify-id".to_string()),
                spotify_client_secret: Some("spotify-secret".to_string()),
                slack_signing_secret: Some(SIGNING_SECRET.to_string()),
                slack_bot_token: Some("xoxb-test".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[test]
    fn startup_config_fails_fast_without_required_secrets() {
        let result = with_clean_env(|| {
            AppConfig::load(LoadOptions {
                overrides: ConfigOverrides {
                    spotify_client_id: Some("spotify-id".to_string()),
                    spotify_client_secret: Some("spotify-secret".to_string()),
                    slack_bot_token: Some("xoxb-test".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
        });

        let message = result.expect_err("missing signing secret should fail").to_string();
        assert!(message.contains("slack.signing_secret"));
    }

    #[test]
    fn bootstrap_succeeds_with_all_secrets() {
        let config =
            with_clean_env(|| AppConfig::load(valid_overrides())).expect("config should load");
        let app = bootstrap_with_config(config);

        assert_eq!(app.config.server.port, 3000);
        assert!(app.history.is_empty());
    }

    #[tokio::test]
    async fn webhook_and_health_share_request_history() {
        let config = with_clean_env(|| AppConfig::load(valid_overrides())).expect("config");
        let chat = Arc::new(RecordingChat::default());
        let app = build_application(config, chat.clone());

        let response = app
            .router
            .clone()
            .oneshot(signed_request(
                r#"{"type":"event_callback","event":{"type":"message","text":"hey yo!","channel":"C1"}}"#,
            ))
            .await
            .expect("event response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(chat.sent().await.len(), 1);

        let response = app
            .router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("health response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["handled_requests"], 1);
        assert_eq!(app.history.snapshot(), vec!["hey yo!".to_string()]);
    }
}
