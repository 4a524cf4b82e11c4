use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use tunelink_core::{ApplicationError, InterfaceError};
use tunelink_slack::{
    events::{parse_payload, EventContext, EventDispatcher, InboundPayload, SlackEnvelope},
    signature::{RequestVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER},
};
use uuid::Uuid;

#[derive(Clone)]
pub struct WebhookState {
    verifier: RequestVerifier,
    dispatcher: Arc<EventDispatcher>,
    // Held for the whole dispatch so events are handled one at a time.
    processing: Arc<Mutex<()>>,
}

impl WebhookState {
    pub fn new(verifier: RequestVerifier, dispatcher: EventDispatcher) -> Self {
        Self {
            verifier,
            dispatcher: Arc::new(dispatcher),
            processing: Arc::new(Mutex::new(())),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChallengeResponse {
    challenge: String,
}

#[derive(Debug, Serialize)]
struct WebhookError {
    error: &'static str,
    correlation_id: String,
}

pub fn router(events_path: &str, state: WebhookState) -> Router {
    Router::new().route(events_path, post(receive_event)).with_state(state)
}

pub async fn receive_event(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let correlation_id = format!("req-{}", Uuid::new_v4().simple());

    let verified = state.verifier.verify(
        header_value(&headers, TIMESTAMP_HEADER),
        header_value(&headers, SIGNATURE_HEADER),
        &body,
        Utc::now().timestamp(),
    );
    if let Err(error) = verified {
        report_delivery_error(&state, &correlation_id, format!("invalid request signature: {error}"))
            .await;
        return (
            StatusCode::FORBIDDEN,
            Json(WebhookError { error: "invalid request signature", correlation_id }),
        )
            .into_response();
    }

    let payload = match parse_payload(&body) {
        Ok(payload) => payload,
        Err(error) => {
            report_delivery_error(&state, &correlation_id, error.to_string()).await;
            return interface_response(ApplicationError::from(error).into_interface(correlation_id));
        }
    };

    match payload {
        InboundPayload::UrlVerification { challenge } => {
            info!(
                event_name = "ingress.slack.url_verification",
                correlation_id = %correlation_id,
                "answering slack url verification handshake"
            );
            Json(ChallengeResponse { challenge }).into_response()
        }
        InboundPayload::Other => {
            debug!(correlation_id = %correlation_id, "ignoring non-event payload");
            StatusCode::OK.into_response()
        }
        InboundPayload::EventCallback { event_id, event } => {
            let event_id = event_id.unwrap_or(correlation_id);
            let envelope = event.into_envelope(event_id.clone());
            let context = EventContext { correlation_id: event_id.clone() };

            info!(
                event_name = "ingress.slack.envelope_received",
                correlation_id = %event_id,
                event_type = ?envelope.event.event_type(),
                "received slack envelope"
            );

            let _guard = state.processing.lock().await;
            match state.dispatcher.dispatch(&envelope, &context).await {
                Ok(result) => {
                    debug!(correlation_id = %event_id, result = ?result, "event dispatched");
                    StatusCode::OK.into_response()
                }
                Err(error) => {
                    warn!(
                        event_name = "ingress.slack.dispatch_failed",
                        correlation_id = %event_id,
                        error = %error,
                        "event dispatch failed; dropping event"
                    );
                    interface_response(ApplicationError::from(error).into_interface(event_id))
                }
            }
        }
    }
}

async fn report_delivery_error(state: &WebhookState, correlation_id: &str, message: String) {
    let envelope = SlackEnvelope::delivery_error(correlation_id, message);
    let context = EventContext { correlation_id: correlation_id.to_owned() };
    if let Err(error) = state.dispatcher.dispatch(&envelope, &context).await {
        warn!(correlation_id, error = %error, "delivery error handler failed");
    }
}

fn interface_response(error: InterfaceError) -> Response {
    let status = match error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = WebhookError {
        error: error.user_message(),
        correlation_id: error.correlation_id().to_owned(),
    };
    (status, Json(body)).into_response()
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{body::Body, http::StatusCode};
    use tower::ServiceExt;
    use tunelink_core::RequestHistory;
    use tunelink_slack::{events::default_dispatcher, signature::RequestVerifier};

    use super::{router, WebhookState};
    use crate::testing::{body_json, signed_request, unsigned_request, RecordingChat, SIGNING_SECRET};

    fn app(chat: Arc<RecordingChat>, history: RequestHistory) -> axum::Router {
        let state = WebhookState::new(
            RequestVerifier::new(SIGNING_SECRET.to_string().into()),
            default_dispatcher(chat, history),
        );
        router("/slack/events", state)
    }

    #[tokio::test]
    async fn trigger_event_replies_with_menu_once() {
        let chat = Arc::new(RecordingChat::default());
        let history = RequestHistory::new();

        let response = app(chat.clone(), history.clone())
            .oneshot(signed_request(
                r#"{"type":"event_callback","event_id":"Ev1","event":{"type":"message","text":"hey yo!","channel":"C1"}}"#,
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let sent = chat.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "C1");
        assert!(sent[0].1.starts_with("Please choose one of the below options:"));
        assert_eq!(history.snapshot(), vec!["hey yo!".to_string()]);
    }

    #[tokio::test]
    async fn event_without_trigger_sends_nothing() {
        let chat = Arc::new(RecordingChat::default());
        let history = RequestHistory::new();

        let response = app(chat.clone(), history.clone())
            .oneshot(signed_request(
                r#"{"type":"event_callback","event":{"type":"message","text":"hello","channel":"C1"}}"#,
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(chat.sent().await.is_empty());
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn event_with_subtype_sends_nothing() {
        let chat = Arc::new(RecordingChat::default());
        let history = RequestHistory::new();

        let response = app(chat.clone(), history.clone())
            .oneshot(signed_request(
                r#"{"type":"event_callback","event":{"type":"message","subtype":"message_changed","text":"yo!","channel":"C1"}}"#,
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(chat.sent().await.is_empty());
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn url_verification_echoes_challenge() {
        let chat = Arc::new(RecordingChat::default());

        let response = app(chat, RequestHistory::new())
            .oneshot(signed_request(r#"{"type":"url_verification","challenge":"3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P"}"#))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["challenge"], "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P");
    }

    #[tokio::test]
    async fn unsigned_request_is_rejected_before_dispatch() {
        let chat = Arc::new(RecordingChat::default());
        let history = RequestHistory::new();

        let response = app(chat.clone(), history.clone())
            .oneshot(unsigned_request(
                r#"{"type":"event_callback","event":{"type":"message","text":"yo!","channel":"C1"}}"#,
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(chat.sent().await.is_empty());
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let chat = Arc::new(RecordingChat::default());

        let response = app(chat, RequestHistory::new())
            .oneshot(signed_request("{not json"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn chat_failure_drops_event_without_reply() {
        let chat = Arc::new(RecordingChat::failing("not_in_channel"));
        let history = RequestHistory::new();

        let response = app(chat.clone(), history.clone())
            .oneshot(signed_request(
                r#"{"type":"event_callback","event_id":"Ev7","event":{"type":"message","text":"yo!","channel":"C9"}}"#,
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert_eq!(body["correlation_id"], "Ev7");
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn rejected_bot_token_is_an_internal_error() {
        let chat = Arc::new(RecordingChat::failing("invalid_auth"));
        let history = RequestHistory::new();

        let response = app(chat, history.clone())
            .oneshot(signed_request(
                r#"{"type":"event_callback","event_id":"Ev8","event":{"type":"message","text":"yo!","channel":"C9"}}"#,
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["correlation_id"], "Ev8");
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn get_on_events_path_is_not_allowed() {
        let chat = Arc::new(RecordingChat::default());

        let response = app(chat, RequestHistory::new())
            .oneshot(
                axum::http::Request::builder()
                    .method("GET")
                    .uri("/slack/events")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
