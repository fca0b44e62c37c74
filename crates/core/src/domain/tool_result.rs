use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::tool_call::{ToolCall, ToolName};

/// Why an extracted object was not invoked.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub tool_name: Option<String>,
    pub reason: String,
    pub object: Value,
    pub errors: Vec<String>,
}

/// Uniform outcome of one tool call, whether or not it reached the remote side.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolResult {
    Success {
        http_status: u16,
        payload: Value,
    },
    RemoteError {
        http_status: u16,
        payload: Value,
    },
    TransportFailure {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        http_status: Option<u16>,
        error: String,
    },
    SchemaViolation {
        violation: ValidationFailure,
    },
}

impl ToolResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Success { http_status, .. } | Self::RemoteError { http_status, .. } => {
                Some(*http_status)
            }
            Self::TransportFailure { http_status, .. } => *http_status,
            Self::SchemaViolation { .. } => None,
        }
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Success { payload, .. } | Self::RemoteError { payload, .. } => Some(payload),
            Self::TransportFailure { .. } | Self::SchemaViolation { .. } => None,
        }
    }

    /// Short label used in logs and compact traces.
    pub fn status_label(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::RemoteError { .. } => "remote_error",
            Self::TransportFailure { .. } => "transport_failure",
            Self::SchemaViolation { .. } => "schema_violation",
        }
    }
}

/// One entry of a run's history: the call as extracted and what came of it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolEvent {
    pub round: u32,
    #[serde(flatten)]
    pub call: ToolCall,
    pub result: ToolResult,
}

impl ToolEvent {
    pub fn tool(&self) -> Option<ToolName> {
        self.call.tool()
    }

    pub fn is_quote_call(&self) -> bool {
        self.tool() == Some(ToolName::GetShippingQuote)
    }
}
