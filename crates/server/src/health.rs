use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use tunelink_core::RequestHistory;

#[derive(Clone)]
pub struct HealthState {
    history: RequestHistory,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub handled_requests: usize,
    pub checked_at: String,
}

pub fn router(history: RequestHistory) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { history })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let payload = HealthResponse {
        status: "ready",
        service: "tunelink-server",
        handled_requests: state.history.len(),
        checked_at: Utc::now().to_rfc3339(),
    };
    (StatusCode::OK, Json(payload))
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode, Json};
    use tunelink_core::RequestHistory;

    use crate::health::{health, HealthState};

    #[tokio::test]
    async fn health_reports_handled_request_count() {
        let history = RequestHistory::new();
        history.append("yo!");

        let (status, Json(payload)) = health(State(HealthState { history })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.handled_requests, 1);
    }
}
