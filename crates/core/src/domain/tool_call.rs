use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The closed set of remote operations a model may ask for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    ResolveCountry,
    ResolvePostalCode,
    GetShippingQuote,
}

impl ToolName {
    pub const ALL: [ToolName; 3] =
        [ToolName::ResolveCountry, ToolName::ResolvePostalCode, ToolName::GetShippingQuote];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResolveCountry => "resolve_country",
            Self::ResolvePostalCode => "resolve_postal_code",
            Self::GetShippingQuote => "get_shipping_quote",
        }
    }

    pub fn endpoint_path(&self) -> &'static str {
        match self {
            Self::ResolveCountry => "/v1/resolve/country",
            Self::ResolvePostalCode => "/v1/resolve/postal",
            Self::GetShippingQuote => "/v1/shipping/quote",
        }
    }

    /// Exact wire names only; no trimming or case folding.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "resolve_country" => Some(Self::ResolveCountry),
            "resolve_postal_code" => Some(Self::ResolvePostalCode),
            "get_shipping_quote" => Some(Self::GetShippingQuote),
            _ => None,
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An object recovered from model output, before any schema check.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool_name: Option<String>,
    pub args: Option<Value>,
    #[serde(skip)]
    pub raw: Value,
}

impl ToolCall {
    /// Reads `tool_name` (or `tool`) and `args` (or `arguments`) from an
    /// extracted object. Anything else in the object is kept only in `raw`.
    pub fn from_value(raw: Value) -> Self {
        let (tool_name, args) = match raw.as_object() {
            Some(object) => (
                first_present(object, &["tool_name", "tool"])
                    .and_then(Value::as_str)
                    .map(str::to_string),
                first_present(object, &["args", "arguments"]).cloned(),
            ),
            None => (None, None),
        };

        Self { tool_name, args, raw }
    }

    pub fn tool(&self) -> Option<ToolName> {
        self.tool_name.as_deref().and_then(ToolName::parse)
    }
}

fn first_present<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| object.get(*key).filter(|value| !value.is_null()))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostalMode {
    #[default]
    LookupCity,
    ValidatePostal,
}

impl PostalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LookupCity => "lookup_city",
            Self::ValidatePostal => "validate_postal",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "lookup_city" => Some(Self::LookupCity),
            "validate_postal" => Some(Self::ValidatePostal),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingService {
    #[default]
    Standard,
    Express,
}

impl ShippingService {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Express => "express",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "standard" => Some(Self::Standard),
            "express" => Some(Self::Express),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveCountryArgs {
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvePostalArgs {
    #[serde(default)]
    pub mode: PostalMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ResolvePostalArgs {
    /// Fields the selected mode needs but the call leaves out. The remote
    /// operation answers these with its own error payload.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        match self.mode {
            PostalMode::LookupCity => {
                let mut missing = Vec::new();
                if self.country.is_none() {
                    missing.push("country");
                }
                if self.city.is_none() {
                    missing.push("city");
                }
                missing
            }
            PostalMode::ValidatePostal if self.value.is_none() => vec!["value"],
            PostalMode::ValidatePostal => Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShippingQuoteArgs {
    pub country: String,
    pub postal_code: String,
    pub weight_kg: f64,
    #[serde(default)]
    pub service: ShippingService,
}

/// A call whose arguments passed the per-operation field contract.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool_name", content = "args")]
pub enum ValidatedCall {
    #[serde(rename = "resolve_country")]
    ResolveCountry(ResolveCountryArgs),
    #[serde(rename = "resolve_postal_code")]
    ResolvePostal(ResolvePostalArgs),
    #[serde(rename = "get_shipping_quote")]
    ShippingQuote(ShippingQuoteArgs),
}

impl ValidatedCall {
    pub fn tool_name(&self) -> ToolName {
        match self {
            Self::ResolveCountry(_) => ToolName::ResolveCountry,
            Self::ResolvePostal(_) => ToolName::ResolvePostalCode,
            Self::ShippingQuote(_) => ToolName::GetShippingQuote,
        }
    }

    /// JSON body sent to the remote operation; absent optionals are omitted.
    pub fn request_body(&self) -> Value {
        let body = match self {
            Self::ResolveCountry(args) => serde_json::to_value(args),
            Self::ResolvePostal(args) => serde_json::to_value(args),
            Self::ShippingQuote(args) => serde_json::to_value(args),
        };
        body.unwrap_or_else(|_| Value::Object(Map::new()))
    }
}
