use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use shipquote_core::config::ToolsConfig;
use shipquote_core::{CorrelationId, ToolResult, ValidatedCall};
use tracing::info;

pub const TRACE_HEADER: &str = "x-trace-id";

/// Executes validated calls against the remote lookup operations.
///
/// Implementations never fail: every outcome, including an unreachable
/// service, is folded into a [`ToolResult`].
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn invoke(&self, call: &ValidatedCall, correlation_id: &CorrelationId) -> ToolResult;
}

pub struct HttpToolInvoker {
    client: Client,
    base_url: String,
}

impl HttpToolInvoker {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build tools http client")?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn from_config(config: &ToolsConfig) -> Result<Self> {
        Self::new(config.base_url.clone(), Duration::from_secs(config.timeout_secs))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    async fn post(&self, call: &ValidatedCall, correlation_id: &CorrelationId) -> ToolResult {
        let url = format!("{}{}", self.base_url, call.tool_name().endpoint_path());
        let response = match self
            .client
            .post(&url)
            .header(TRACE_HEADER, correlation_id.as_str())
            .json(&call.request_body())
            .send()
            .await
        {
            Ok(response) => response,
            Err(error) => {
                return ToolResult::TransportFailure {
                    http_status: error.status().map(|status| status.as_u16()),
                    error: error.to_string(),
                }
            }
        };

        let status = response.status();
        match response.json::<Value>().await {
            Ok(payload) if status.is_success() => {
                ToolResult::Success { http_status: status.as_u16(), payload }
            }
            Ok(payload) => ToolResult::RemoteError { http_status: status.as_u16(), payload },
            Err(error) => ToolResult::TransportFailure {
                http_status: Some(status.as_u16()),
                error: format!("undecodable response body: {error}"),
            },
        }
    }
}

#[async_trait]
impl ToolInvoker for HttpToolInvoker {
    async fn invoke(&self, call: &ValidatedCall, correlation_id: &CorrelationId) -> ToolResult {
        let result = self.post(call, correlation_id).await;

        info!(
            event_name = "agent.tool.invoked",
            correlation_id = %correlation_id,
            tool_name = call.tool_name().as_str(),
            status = result.status_label(),
            http_status = result.http_status(),
            "remote tool call completed"
        );

        result
    }
}
