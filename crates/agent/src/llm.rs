use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shipquote_core::config::{LlmConfig, LlmProvider};
use tracing::warn;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

pub const SYSTEM_PROMPT: &str = "\
You are a shipping quote agent. Decide the NEXT tool calls based on what you already know.

WORKFLOW:
1. Need an ISO2 country code? -> resolve_country(name=\"Deutschland\") returns \"DE\".
2. Have ISO2 but no postal code? -> resolve_postal_code(mode=\"lookup_city\", country=\"DE\", city=\"Berlin\") returns \"10115\".
3. Have ISO2 AND postal code? -> get_shipping_quote(country=\"DE\", postal_code=\"10115\", weight_kg=1, service=\"express\").

RULES:
- Do NOT guess postal codes or country codes. Use the resolver tools first.
- Check tool_results and reuse the VALUES you received: {\"iso2\":\"DE\"} means country=\"DE\", {\"postal_code\":\"10115\"} means postal_code=\"10115\".
- For several shipments, emit one call per shipment.
- Output only JSON objects of the form {\"tool_name\": \"...\", \"args\": {...}}, one per call.";

/// Structured input for one model query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModelInput {
    pub user_request: String,
    pub available_tools: String,
    pub tool_results: String,
}

impl ModelInput {
    pub fn render(&self) -> String {
        format!(
            "user_request:\n{}\n\navailable_tools:\n{}\n\ntool_results:\n{}\n\nRespond with the JSON tool-call objects for the next step.",
            self.user_request, self.available_tools, self.tool_results
        )
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, input: &ModelInput) -> Result<String>;
}

/// Chat-completions client for OpenAI and OpenAI-compatible servers
/// (Ollama, vLLM, llama.cpp).
pub struct OpenAiCompatibleClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
    temperature: f32,
    max_retries: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiCompatibleClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build llm http client")?;
        let base_url = match (&config.base_url, config.provider) {
            (Some(base_url), _) => base_url.trim_end_matches('/').to_string(),
            (None, LlmProvider::OpenAi) => OPENAI_BASE_URL.to_string(),
            (None, LlmProvider::Ollama) => bail!("llm.base_url is required for ollama provider"),
        };

        Ok(Self {
            client,
            base_url,
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
            max_retries: config.max_retries,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send_once(&self, input: &ModelInput) -> Result<String, Attempt> {
        let body = json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": input.render()},
            ],
        });

        let mut request =
            self.client.post(format!("{}/chat/completions", self.base_url)).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response =
            request.send().await.map_err(|error| Attempt::Retryable(anyhow!(error)))?;
        let status = response.status();
        if !status.is_success() {
            let failure = anyhow!("chat completion endpoint returned {status}");
            return Err(if is_retryable(status) {
                Attempt::Retryable(failure)
            } else {
                Attempt::Fatal(failure)
            });
        }

        let payload: ChatResponse = response
            .json()
            .await
            .map_err(|error| Attempt::Fatal(anyhow!("failed to decode chat completion: {error}")))?;

        Ok(payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

enum Attempt {
    Retryable(anyhow::Error),
    Fatal(anyhow::Error),
}

fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    async fn complete(&self, input: &ModelInput) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.send_once(input).await {
                Ok(reply) => return Ok(reply),
                Err(Attempt::Fatal(error)) => return Err(error),
                Err(Attempt::Retryable(error)) if attempt >= self.max_retries => return Err(error),
                Err(Attempt::Retryable(error)) => {
                    attempt += 1;
                    warn!(
                        event_name = "agent.llm.retry",
                        attempt,
                        max_retries = self.max_retries,
                        error = %error,
                        "chat completion failed, retrying"
                    );
                }
            }
        }
    }
}

/// Plays back a fixed sequence of replies and remembers every input it saw.
/// Replaying the same replies reproduces a run.
#[derive(Default)]
pub struct ReplayLlmClient {
    replies: Mutex<VecDeque<String>>,
    inputs: Mutex<Vec<ModelInput>>,
}

impl ReplayLlmClient {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn inputs(&self) -> Vec<ModelInput> {
        match self.inputs.lock() {
            Ok(inputs) => inputs.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl LlmClient for ReplayLlmClient {
    async fn complete(&self, input: &ModelInput) -> Result<String> {
        match self.inputs.lock() {
            Ok(mut inputs) => inputs.push(input.clone()),
            Err(poisoned) => poisoned.into_inner().push(input.clone()),
        }

        let next = match self.replies.lock() {
            Ok(mut replies) => replies.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        };
        next.ok_or_else(|| anyhow!("no replayed reply left"))
    }
}

#[cfg(test)]
mod tests {
    use shipquote_core::config::AppConfig;

    use super::{LlmClient, ModelInput, OpenAiCompatibleClient, ReplayLlmClient};

    fn input(results: &str) -> ModelInput {
        ModelInput {
            user_request: "Versand nach FR Paris 2 kg standard.".to_string(),
            available_tools: "- get_shipping_quote".to_string(),
            tool_results: results.to_string(),
        }
    }

    #[test]
    fn rendered_input_carries_every_field() {
        let rendered = input("(no prior calls)").render();
        assert!(rendered.contains("user_request:\nVersand nach FR Paris"));
        assert!(rendered.contains("available_tools:\n- get_shipping_quote"));
        assert!(rendered.contains("tool_results:\n(no prior calls)"));
    }

    #[test]
    fn client_uses_configured_base_url_without_trailing_slash() {
        let mut config = AppConfig::default().llm;
        config.base_url = Some("http://localhost:8000/v1/".to_string());

        let client = OpenAiCompatibleClient::from_config(&config).expect("client");
        assert_eq!(client.base_url, "http://localhost:8000/v1");
        assert_eq!(client.model(), "llama3.1");
    }

    #[tokio::test]
    async fn replay_client_returns_replies_in_order_then_errors() {
        let client = ReplayLlmClient::new(["first", "second"]);

        assert_eq!(client.complete(&input("a")).await.expect("first"), "first");
        assert_eq!(client.complete(&input("b")).await.expect("second"), "second");
        assert!(client.complete(&input("c")).await.is_err());

        let seen = client.inputs();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[1].tool_results, "b");
    }
}
