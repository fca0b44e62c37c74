use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::AppState;

pub const TRACE_HEADER: &str = "x-trace-id";

const MAX_BODY_BYTES: usize = 1024 * 1024;
const RAW_BODY_PREVIEW: usize = 2000;

/// One line of the request log.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RequestLogEntry {
    pub trace_id: String,
    pub ts: f64,
    pub method: String,
    pub path: String,
    pub status: u16,
    pub latency_s: f64,
    pub request_body: Value,
}

#[derive(Debug, Error)]
pub enum RequestLogError {
    #[error("could not write request log `{path}`: {source}")]
    Write { path: PathBuf, source: std::io::Error },
    #[error("could not encode request log entry: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Append-only JSONL file with one entry per handled request.
pub struct RequestLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl RequestLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: &RequestLogEntry) -> Result<(), RequestLogError> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let _guard = match self.lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let write_error =
            |source: std::io::Error| RequestLogError::Write { path: self.path.clone(), source };

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        let mut file =
            OpenOptions::new().create(true).append(true).open(&self.path).map_err(write_error)?;
        file.write_all(line.as_bytes()).map_err(write_error)
    }
}

/// Echoes or assigns `x-trace-id`, and logs every request with its body.
pub async fn trace_requests(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let ts = Utc::now().timestamp_millis() as f64 / 1000.0;

    let (mut parts, body) = request.into_parts();
    let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(error) => {
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                axum::Json(json!({"detail": [format!("body: {error}")]})),
            )
                .into_response()
        }
    };

    let trace_id = parts
        .headers
        .get(TRACE_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let header = HeaderValue::from_str(&trace_id).ok();
    if let Some(header) = &header {
        parts.headers.insert(TRACE_HEADER, header.clone());
    }

    let method = parts.method.to_string();
    let path = parts.uri.path().to_string();
    let request_body = body_snapshot(&bytes);

    let mut response = next.run(Request::from_parts(parts, Body::from(bytes))).await;
    if let Some(header) = header {
        response.headers_mut().insert(TRACE_HEADER, header);
    }

    let status = response.status().as_u16();
    let latency_s = (started.elapsed().as_secs_f64() * 10_000.0).round() / 10_000.0;

    info!(
        event_name = "server.request.completed",
        correlation_id = %trace_id,
        method = %method,
        path = %path,
        status,
        latency_s,
        "request handled"
    );

    if let Some(log) = &state.request_log {
        let entry = RequestLogEntry { trace_id, ts, method, path, status, latency_s, request_body };
        if let Err(error) = log.append(&entry) {
            warn!(
                event_name = "server.request_log.failed",
                correlation_id = %entry.trace_id,
                error = %error,
                "failed to append request log entry"
            );
        }
    }

    response
}

fn body_snapshot(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(_) => {
            let raw = String::from_utf8_lossy(bytes);
            json!({"_raw": raw.chars().take(RAW_BODY_PREVIEW).collect::<String>()})
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{body_snapshot, RequestLog, RequestLogEntry};

    #[test]
    fn body_snapshot_keeps_json_and_wraps_garbage() {
        assert_eq!(body_snapshot(b""), serde_json::Value::Null);
        assert_eq!(body_snapshot(br#"{"name":"France"}"#), json!({"name": "France"}));
        assert_eq!(body_snapshot(b"not json"), json!({"_raw": "not json"}));
    }

    #[test]
    fn append_writes_one_line_per_entry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = RequestLog::new(dir.path().join("logs/tool_calls.jsonl"));
        let entry = RequestLogEntry {
            trace_id: "t-1".to_string(),
            ts: 1.5,
            method: "POST".to_string(),
            path: "/v1/resolve/country".to_string(),
            status: 200,
            latency_s: 0.001,
            request_body: json!({"name": "France"}),
        };

        log.append(&entry).expect("first append");
        log.append(&entry).expect("second append");

        let content = std::fs::read_to_string(log.path()).expect("read log");
        let lines = content.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).expect("json line");
        assert_eq!(first["trace_id"], "t-1");
        assert_eq!(first["request_body"]["name"], "France");
    }
}
