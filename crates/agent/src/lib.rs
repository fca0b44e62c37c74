//! Agent Runtime - round-based tool orchestration for shipping quotes
//!
//! This crate provides the loop that turns a free-text shipping request into
//! priced quotes:
//! - Queries the language model with the request and all prior tool results
//! - Recovers tool calls from the reply and validates them (`shipquote-core`)
//! - Invokes the remote lookup operations over HTTP (`tools`)
//! - Stops at the first round whose quote calls all succeed
//!
//! # Architecture
//!
//! 1. **Model query** (`llm`) - `LlmClient` over an OpenAI-compatible endpoint
//! 2. **Tool catalog** (`catalog`) - what the model is told it may call
//! 3. **Tool execution** (`tools`) - `ToolInvoker`, never fails a round
//! 4. **Orchestration** (`runtime`) - `RoundOrchestrator`
//!
//! # Safety Principle
//!
//! The model only proposes calls. Prices come from the remote quote
//! operation, and every proposed call passes the field contracts first.

pub mod catalog;
pub mod llm;
pub mod runtime;
pub mod tools;

pub use catalog::{fetch_catalog, ToolCatalog, ToolDescriptor};
pub use llm::{LlmClient, ModelInput, OpenAiCompatibleClient, ReplayLlmClient};
pub use runtime::{OrchestratorConfig, RoundOrchestrator, NO_PRIOR_CALLS};
pub use tools::{HttpToolInvoker, ToolInvoker};
