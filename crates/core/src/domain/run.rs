use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::tool_call::{ShippingQuoteArgs, ShippingService};
use crate::domain::tool_result::ToolEvent;

pub const DEFAULT_CURRENCY: &str = "EUR";

/// Opaque token attached to every remote call of one run.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(pub String);

impl CorrelationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub country: String,
    pub postal_code: String,
    pub weight_kg: f64,
    pub service: ShippingService,
    pub price: Decimal,
    pub currency: String,
}

impl Quote {
    /// Builds a quote from a successful pricing response. `None` when the
    /// payload carries no readable price.
    pub fn from_response(args: &ShippingQuoteArgs, payload: &Value) -> Option<Self> {
        let price = match payload.get("price")? {
            Value::Number(number) => Decimal::from_str(&number.to_string()).ok()?,
            Value::String(raw) => Decimal::from_str(raw.trim()).ok()?,
            _ => return None,
        };
        let currency = payload
            .get("currency")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_CURRENCY)
            .to_string();
        let service = payload
            .get("service")
            .and_then(Value::as_str)
            .and_then(ShippingService::parse)
            .unwrap_or(args.service);

        Some(Self {
            country: args.country.clone(),
            postal_code: args.postal_code.clone(),
            weight_kg: args.weight_kg,
            service,
            price,
            currency,
        })
    }
}

/// The events of one round, in extraction order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: u32,
    pub events: Vec<ToolEvent>,
}

impl RoundRecord {
    pub fn new(round: u32) -> Self {
        Self { round, events: Vec::new() }
    }

    pub fn push(&mut self, event: ToolEvent) {
        self.events.push(event);
    }

    pub fn quote_events(&self) -> impl Iterator<Item = &ToolEvent> {
        self.events.iter().filter(|event| event.is_quote_call())
    }

    /// Text block appended to the model context after this round.
    pub fn summary(&self) -> String {
        let events = serde_json::to_string(&self.events).unwrap_or_else(|_| "[]".to_string());
        format!("\nRound {}:\n{}", self.round, events)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunFailure {
    NoQuoteWithinMaxRounds,
}

impl RunFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoQuoteWithinMaxRounds => "no_quote_within_max_rounds",
        }
    }
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub correlation_id: CorrelationId,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RunFailure>,
    pub quotes: Vec<Quote>,
    pub rounds_used: u32,
    pub tool_history: Vec<ToolEvent>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunResult {
    pub fn succeeded(
        correlation_id: CorrelationId,
        quotes: Vec<Quote>,
        rounds_used: u32,
        tool_history: Vec<ToolEvent>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            correlation_id,
            ok: true,
            error: None,
            quotes,
            rounds_used,
            tool_history,
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn exhausted(
        correlation_id: CorrelationId,
        quotes: Vec<Quote>,
        max_rounds: u32,
        tool_history: Vec<ToolEvent>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            correlation_id,
            ok: false,
            error: Some(RunFailure::NoQuoteWithinMaxRounds),
            quotes,
            rounds_used: max_rounds,
            tool_history,
            started_at,
            finished_at: Utc::now(),
        }
    }
}
