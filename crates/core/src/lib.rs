pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod extract;
pub mod validate;

pub use audit::{AuditError, AuditSink, InMemoryAuditSink, JsonlAuditSink, RunAuditRecord};
pub use domain::run::{CorrelationId, Quote, RoundRecord, RunFailure, RunResult};
pub use domain::tool_call::{
    PostalMode, ResolveCountryArgs, ResolvePostalArgs, ShippingQuoteArgs, ShippingService,
    ToolCall, ToolName, ValidatedCall,
};
pub use domain::tool_result::{ToolEvent, ToolResult, ValidationFailure};
pub use errors::ApplicationError;
pub use extract::{extract_json_objects, ObjectScanner};
pub use validate::{validate_arguments, validate_call};
