use std::str::FromStr;

use axum::{
    body::Bytes,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::Serialize;
use serde_json::{json, Value};
use shipquote_core::{validate_arguments, PostalMode, ShippingService, ToolName, ValidatedCall};
use uuid::Uuid;

use crate::dataset;
use crate::request_log::TRACE_HEADER;

pub const QUOTE_CURRENCY: &str = "EUR";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolveCountryResponse {
    pub iso2: Option<String>,
    pub confidence: f64,
    pub error: Option<String>,
    pub trace_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvePostalResponse {
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub error: Option<String>,
    pub trace_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ShippingQuoteResponse {
    pub currency: String,
    pub price: f64,
    pub service: ShippingService,
    pub trace_id: String,
}

/// Rejected request body, answered with 422.
#[derive(Debug)]
pub struct InvalidBody(pub Vec<String>);

impl IntoResponse for InvalidBody {
    fn into_response(self) -> Response {
        (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "detail": self.0 }))).into_response()
    }
}

pub async fn resolve_country(
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ResolveCountryResponse>, InvalidBody> {
    let trace_id = trace_id(&headers);
    let ValidatedCall::ResolveCountry(args) = parse_body(ToolName::ResolveCountry, &body)? else {
        return Err(InvalidBody(vec!["body: unexpected operation".to_string()]));
    };

    let response = match dataset::country_iso2(&args.name) {
        Some(iso2) => ResolveCountryResponse {
            iso2: Some(iso2.to_string()),
            confidence: 1.0,
            error: None,
            trace_id,
        },
        None => ResolveCountryResponse {
            iso2: None,
            confidence: 0.0,
            error: Some("not_found".to_string()),
            trace_id,
        },
    };
    Ok(Json(response))
}

pub async fn resolve_postal(
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ResolvePostalResponse>, InvalidBody> {
    let trace_id = trace_id(&headers);
    let ValidatedCall::ResolvePostal(args) = parse_body(ToolName::ResolvePostalCode, &body)? else {
        return Err(InvalidBody(vec!["body: unexpected operation".to_string()]));
    };

    let mut response =
        ResolvePostalResponse { postal_code: None, city: None, error: None, trace_id };

    match args.mode {
        PostalMode::ValidatePostal => {
            let raw = args.value.as_deref().unwrap_or_default().trim();
            if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
                response.postal_code = Some(raw.to_string());
            } else {
                response.error = Some("not_a_postal_code".to_string());
            }
        }
        PostalMode::LookupCity => match (args.country.as_deref(), args.city.as_deref()) {
            (Some(country), Some(city)) if !country.is_empty() && !city.is_empty() => {
                match dataset::postal_code(country, city) {
                    Some(postal) => {
                        response.postal_code = Some(postal.to_string());
                        response.city = Some(city.to_string());
                    }
                    None => response.error = Some("not_found".to_string()),
                }
            }
            _ => response.error = Some("missing_country_or_city".to_string()),
        },
    }

    Ok(Json(response))
}

pub async fn shipping_quote(
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ShippingQuoteResponse>, InvalidBody> {
    let trace_id = trace_id(&headers);
    let ValidatedCall::ShippingQuote(args) = parse_body(ToolName::GetShippingQuote, &body)? else {
        return Err(InvalidBody(vec!["body: unexpected operation".to_string()]));
    };

    let price = quote_price(args.weight_kg, args.service);
    Ok(Json(ShippingQuoteResponse {
        currency: QUOTE_CURRENCY.to_string(),
        price: price.to_f64().unwrap_or_default(),
        service: args.service,
        trace_id,
    }))
}

pub async fn openapi() -> Json<Value> {
    Json(crate::openapi::document())
}

/// 4.90 base plus 1.20 per kg (at least 0.1 kg), express at 1.8x the
/// weight component, rounded to cents.
pub fn quote_price(weight_kg: f64, service: ShippingService) -> Decimal {
    let base = Decimal::new(490, 2);
    let per_kg = Decimal::new(12, 1);
    let multiplier = match service {
        ShippingService::Standard => Decimal::ONE,
        ShippingService::Express => Decimal::new(18, 1),
    };
    let weight = Decimal::from_str(&weight_kg.to_string()).unwrap_or_default();
    let weight = weight.max(Decimal::new(1, 1));

    (base + weight * per_kg * multiplier).round_dp(2)
}

fn trace_id(headers: &HeaderMap) -> String {
    headers
        .get(TRACE_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn parse_body(tool: ToolName, body: &[u8]) -> Result<ValidatedCall, InvalidBody> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|error| InvalidBody(vec![format!("body: invalid JSON: {error}")]))?;
    let Some(args) = value.as_object() else {
        return Err(InvalidBody(vec!["body: expected JSON object".to_string()]));
    };

    validate_arguments(tool, args).map_err(InvalidBody)
}
