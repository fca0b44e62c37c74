use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub request_log: HealthCheck,
    pub checked_at: String,
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let request_log = match &state.request_log {
        Some(log) => HealthCheck {
            status: "ready",
            detail: format!("appending to {}", log.path().display()),
        },
        None => HealthCheck { status: "disabled", detail: "request log disabled".to_string() },
    };

    let payload = HealthResponse {
        status: "ready",
        service: HealthCheck {
            status: "ready",
            detail: "shipquote-server lookup tools initialized".to_string(),
        },
        request_log,
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, Json};

    use crate::health::health;
    use crate::request_log::RequestLog;
    use crate::AppState;

    #[tokio::test]
    async fn health_reports_ready_without_request_log() {
        let (status, Json(payload)) = health(State(AppState::default())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.request_log.status, "disabled");
    }

    #[tokio::test]
    async fn health_names_request_log_path() {
        let state = AppState { request_log: Some(Arc::new(RequestLog::new("tool_calls.jsonl"))) };

        let (_, Json(payload)) = health(State(state)).await;

        assert_eq!(payload.request_log.status, "ready");
        assert!(payload.request_log.detail.contains("tool_calls.jsonl"));
    }
}
