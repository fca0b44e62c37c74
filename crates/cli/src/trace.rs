//! Compact, human-readable rendering of a run.

use serde_json::Value;
use shipquote_core::{RunResult, ToolEvent, ToolResult};

const SEPARATOR_WIDTH: usize = 60;

pub fn render_compact(request: &str, result: &RunResult) -> String {
    let mut lines = vec![format!("Request: {request}")];

    for event in &result.tool_history {
        lines.push(format!("  LLM calls {}", describe_call(event)));
        lines.push(format!("  API Result: {}", describe_result(&event.result)));
    }

    let status = match &result.error {
        None if result.ok => "OK".to_string(),
        Some(error) => format!("FAILED: {error}"),
        None => "FAILED: unknown".to_string(),
    };
    lines.push(format!(
        "  => {status}, {} quote(s), {} round(s)",
        result.quotes.len(),
        result.rounds_used
    ));
    lines.push("-".repeat(SEPARATOR_WIDTH));

    lines.join("\n")
}

fn describe_call(event: &ToolEvent) -> String {
    let tool = event.call.tool_name.as_deref().unwrap_or("<unnamed>");
    let args = match event.call.args.as_ref() {
        Some(Value::Object(args)) => args
            .iter()
            .map(|(key, value)| format!("{key}={}", literal(value)))
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => literal(other),
        None => String::new(),
    };
    format!("{tool}({args})")
}

fn describe_result(result: &ToolResult) -> String {
    match result {
        ToolResult::Success { http_status, payload }
        | ToolResult::RemoteError { http_status, payload } => {
            format!("HTTP {http_status} -> {}", describe_payload(payload))
        }
        ToolResult::TransportFailure { http_status, error } => {
            let status = http_status.map(|status| status.to_string()).unwrap_or_else(|| "?".into());
            format!("HTTP {status} -> transport error: {error}")
        }
        ToolResult::SchemaViolation { violation } if violation.errors.is_empty() => {
            format!("not sent -> {}", violation.reason)
        }
        ToolResult::SchemaViolation { violation } => {
            format!("not sent -> {}: {}", violation.reason, violation.errors.join("; "))
        }
    }
}

fn describe_payload(payload: &Value) -> String {
    if let Some(error) = payload.get("error").filter(|error| !error.is_null()) {
        return format!("error={}", plain(error));
    }
    if let Some(detail) = payload.get("detail") {
        return format!("error={}", plain(detail));
    }
    if let Some(price) = payload.get("price") {
        let currency = payload.get("currency").and_then(Value::as_str).unwrap_or("EUR");
        return format!("{} {currency}", plain(price));
    }
    if let Some(iso2) = payload.get("iso2") {
        return plain(iso2);
    }
    if let Some(postal_code) = payload.get("postal_code") {
        let city = payload.get("city").and_then(Value::as_str).unwrap_or_default();
        return format!("{} ({city})", plain(postal_code));
    }
    payload.to_string()
}

/// Strings quoted the way a reader would type them in a call.
fn literal(value: &Value) -> String {
    match value {
        Value::String(text) => format!("'{text}'"),
        other => other.to_string(),
    }
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;
    use shipquote_core::{
        CorrelationId, RunResult, ToolCall, ToolEvent, ToolResult, ValidationFailure,
    };

    use super::render_compact;

    fn event(raw: serde_json::Value, result: ToolResult) -> ToolEvent {
        ToolEvent { round: 1, call: ToolCall::from_value(raw), result }
    }

    #[test]
    fn successful_run_lists_calls_and_results() {
        let history = vec![
            event(
                json!({"tool_name": "resolve_postal_code", "args": {"country": "DE", "city": "Berlin"}}),
                ToolResult::Success {
                    http_status: 200,
                    payload: json!({"postal_code": "10115", "city": "Berlin", "error": null}),
                },
            ),
            event(
                json!({"tool_name": "get_shipping_quote", "args": {"country": "DE", "postal_code": "10115", "weight_kg": 1}}),
                ToolResult::Success {
                    http_status: 200,
                    payload: json!({"price": 7.06, "currency": "EUR"}),
                },
            ),
        ];
        let result =
            RunResult::succeeded(CorrelationId::generate(), vec![], 2, history, Utc::now());

        let rendered = render_compact("Berlin 1 kg", &result);
        let lines = rendered.lines().collect::<Vec<_>>();

        assert_eq!(lines[0], "Request: Berlin 1 kg");
        assert!(lines[1].starts_with("  LLM calls resolve_postal_code("));
        assert!(lines[1].contains("city='Berlin'") && lines[1].contains("country='DE'"));
        assert_eq!(lines[2], "  API Result: HTTP 200 -> 10115 (Berlin)");
        assert_eq!(lines[4], "  API Result: HTTP 200 -> 7.06 EUR");
        assert_eq!(lines[5], "  => OK, 0 quote(s), 2 round(s)");
    }

    #[test]
    fn exhausted_run_shows_failures_and_reason() {
        let history = vec![
            event(
                json!({"tool_name": "resolve_country", "args": {"name": "Atlantis"}}),
                ToolResult::Success {
                    http_status: 200,
                    payload: json!({"iso2": null, "error": "not_found"}),
                },
            ),
            event(
                json!({"tool_name": "teleport", "args": {}}),
                ToolResult::SchemaViolation {
                    violation: ValidationFailure {
                        tool_name: Some("teleport".to_string()),
                        reason: "unrecognized tool".to_string(),
                        object: json!({"tool_name": "teleport", "args": {}}),
                        errors: vec![],
                    },
                },
            ),
            event(
                json!({"tool_name": "resolve_country", "args": {"name": "France"}}),
                ToolResult::TransportFailure { http_status: None, error: "refused".to_string() },
            ),
        ];
        let result =
            RunResult::exhausted(CorrelationId::generate(), vec![], 3, history, Utc::now());

        let rendered = render_compact("Atlantis", &result);

        assert!(rendered.contains("  API Result: HTTP 200 -> error=not_found"));
        assert!(rendered.contains("  LLM calls teleport()"));
        assert!(rendered.contains("  API Result: not sent -> unrecognized tool"));
        assert!(rendered.contains("  API Result: HTTP ? -> transport error: refused"));
        assert!(
            rendered.contains("  => FAILED: no_quote_within_max_rounds, 0 quote(s), 3 round(s)")
        );
    }
}
