use std::sync::Arc;

use chrono::Utc;
use shipquote_core::config::{AgentConfig, DEFAULT_MAX_ROUNDS};
use shipquote_core::{
    validate_call, AuditSink, CorrelationId, ObjectScanner, Quote, RoundRecord, RunAuditRecord,
    RunResult, ToolCall, ToolEvent, ToolResult, ValidatedCall,
};
use tracing::{debug, info, warn};

use crate::catalog::ToolCatalog;
use crate::llm::{LlmClient, ModelInput};
use crate::tools::ToolInvoker;

/// Context sent to the model before any call was made.
pub const NO_PRIOR_CALLS: &str = "(no prior calls)";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub max_rounds: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self { max_rounds: DEFAULT_MAX_ROUNDS }
    }
}

impl From<&AgentConfig> for OrchestratorConfig {
    fn from(config: &AgentConfig) -> Self {
        Self { max_rounds: config.max_rounds }
    }
}

/// Drives model → extract → validate → invoke rounds until one round's quote
/// calls all succeed or the budget runs out.
pub struct RoundOrchestrator<L, T> {
    llm: L,
    invoker: T,
    catalog: ToolCatalog,
    config: OrchestratorConfig,
    audit: Option<Arc<dyn AuditSink>>,
}

/// Per-round tally used by the completion rule. Only invoked quote calls
/// count; rejected objects never reach the remote side.
#[derive(Default)]
struct RoundOutcome {
    quote_calls: usize,
    priced: usize,
}

impl RoundOutcome {
    fn concludes_run(&self) -> bool {
        self.quote_calls > 0 && self.priced == self.quote_calls
    }
}

impl<L, T> RoundOrchestrator<L, T>
where
    L: LlmClient,
    T: ToolInvoker,
{
    pub fn new(llm: L, invoker: T, catalog: ToolCatalog, config: OrchestratorConfig) -> Self {
        Self { llm, invoker, catalog, config, audit: None }
    }

    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    pub fn max_rounds(&self) -> u32 {
        self.config.max_rounds
    }

    pub fn llm(&self) -> &L {
        &self.llm
    }

    pub async fn run(&self, user_request: &str) -> RunResult {
        self.run_with_budget(user_request, self.config.max_rounds).await
    }

    pub async fn run_with_budget(&self, user_request: &str, max_rounds: u32) -> RunResult {
        self.run_with_correlation(user_request, max_rounds, CorrelationId::generate()).await
    }

    pub async fn run_with_correlation(
        &self,
        user_request: &str,
        max_rounds: u32,
        correlation_id: CorrelationId,
    ) -> RunResult {
        let max_rounds = max_rounds.max(1);
        let started_at = Utc::now();
        let available_tools = self.catalog.render();

        info!(
            event_name = "agent.run.started",
            correlation_id = %correlation_id,
            max_rounds,
            "shipping quote run started"
        );

        let mut context = String::new();
        let mut history: Vec<ToolEvent> = Vec::new();
        let mut quotes: Vec<Quote> = Vec::new();

        for round in 1..=max_rounds {
            let input = ModelInput {
                user_request: user_request.to_string(),
                available_tools: available_tools.clone(),
                tool_results: if context.is_empty() {
                    NO_PRIOR_CALLS.to_string()
                } else {
                    context.clone()
                },
            };

            let reply = match self.llm.complete(&input).await {
                Ok(reply) => reply,
                Err(error) => {
                    warn!(
                        event_name = "agent.llm.failed",
                        correlation_id = %correlation_id,
                        round,
                        error = %error,
                        "model query failed, treating reply as empty"
                    );
                    String::new()
                }
            };

            let (record, outcome) =
                self.play_round(round, &reply, &correlation_id, &mut quotes).await;

            info!(
                event_name = "agent.round.completed",
                correlation_id = %correlation_id,
                round,
                calls = record.events.len(),
                quote_calls = outcome.quote_calls,
                priced = outcome.priced,
                "round completed"
            );

            context.push_str(&record.summary());
            history.extend(record.events);

            if outcome.concludes_run() {
                info!(
                    event_name = "agent.run.succeeded",
                    correlation_id = %correlation_id,
                    rounds_used = round,
                    quotes = quotes.len(),
                    "shipping quote run succeeded"
                );
                let result =
                    RunResult::succeeded(correlation_id, quotes, round, history, started_at);
                self.record_audit(user_request, &result);
                return result;
            }
        }

        warn!(
            event_name = "agent.run.exhausted",
            correlation_id = %correlation_id,
            max_rounds,
            calls = history.len(),
            "no round produced a complete set of quotes"
        );
        let result = RunResult::exhausted(correlation_id, quotes, max_rounds, history, started_at);
        self.record_audit(user_request, &result);
        result
    }

    async fn play_round(
        &self,
        round: u32,
        reply: &str,
        correlation_id: &CorrelationId,
        quotes: &mut Vec<Quote>,
    ) -> (RoundRecord, RoundOutcome) {
        let mut record = RoundRecord::new(round);
        let mut outcome = RoundOutcome::default();

        for object in ObjectScanner::new(reply) {
            let call = ToolCall::from_value(object);
            let result = match validate_call(&call) {
                Ok(validated) => {
                    let result = self.invoke(&validated, correlation_id).await;
                    if let ValidatedCall::ShippingQuote(args) = &validated {
                        outcome.quote_calls += 1;
                        let quote = match &result {
                            ToolResult::Success { payload, .. } => {
                                Quote::from_response(args, payload)
                            }
                            _ => None,
                        };
                        if let Some(quote) = quote {
                            quotes.push(quote);
                            outcome.priced += 1;
                        }
                    }
                    result
                }
                Err(violation) => {
                    debug!(
                        event_name = "agent.call.rejected",
                        correlation_id = %correlation_id,
                        round,
                        reason = %violation.reason,
                        errors = ?violation.errors,
                        "extracted object failed validation"
                    );
                    ToolResult::SchemaViolation { violation }
                }
            };

            record.push(ToolEvent { round, call, result });
        }

        (record, outcome)
    }

    async fn invoke(&self, call: &ValidatedCall, correlation_id: &CorrelationId) -> ToolResult {
        if let ValidatedCall::ResolvePostal(args) = call {
            let missing = args.missing_fields();
            if !missing.is_empty() {
                debug!(
                    event_name = "agent.call.incomplete",
                    correlation_id = %correlation_id,
                    mode = args.mode.as_str(),
                    missing = ?missing,
                    "postal lookup forwarded with missing fields"
                );
            }
        }

        self.invoker.invoke(call, correlation_id).await
    }

    fn record_audit(&self, user_request: &str, result: &RunResult) {
        let Some(sink) = &self.audit else {
            return;
        };

        let record = RunAuditRecord::new(user_request, result.clone());
        if let Err(error) = sink.emit(&record) {
            warn!(
                event_name = "agent.audit.failed",
                correlation_id = %result.correlation_id,
                error = %error,
                "failed to write run audit record"
            );
        }
    }
}
