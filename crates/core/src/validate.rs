//! Per-operation field contracts for extracted tool calls.
//!
//! Validation never fails a round: a rejected object becomes a
//! [`ValidationFailure`] that is recorded in place of a remote result.

use serde_json::{Map, Value};

use crate::domain::tool_call::{
    PostalMode, ResolveCountryArgs, ResolvePostalArgs, ShippingQuoteArgs, ShippingService,
    ToolCall, ToolName, ValidatedCall,
};
use crate::domain::tool_result::ValidationFailure;

pub const UNRECOGNIZED_TOOL: &str = "unrecognized tool";
pub const INVALID_ARGUMENTS: &str = "invalid arguments";
pub const MAX_FIELD_ERRORS: usize = 5;

pub const MAX_WEIGHT_KG: f64 = 50.0;

pub fn validate_call(call: &ToolCall) -> Result<ValidatedCall, ValidationFailure> {
    let tool = call.tool();
    let args = call.args.as_ref().and_then(Value::as_object);

    let (tool, args) = match (tool, args) {
        (Some(tool), Some(args)) => (tool, args),
        _ => return Err(failure(call, UNRECOGNIZED_TOOL, Vec::new())),
    };

    validate_arguments(tool, args).map_err(|errors| failure(call, INVALID_ARGUMENTS, errors))
}

/// Field checks for one operation. Errors are returned in field order and
/// capped at [`MAX_FIELD_ERRORS`].
pub fn validate_arguments(
    tool: ToolName,
    args: &Map<String, Value>,
) -> Result<ValidatedCall, Vec<String>> {
    let mut fields = FieldReader::new(args);

    let call = match tool {
        ToolName::ResolveCountry => {
            let name = fields.required_string("name");
            if let Some(name) = &name {
                fields.check(name.chars().count() >= 2, "name", "must be at least 2 characters");
            }
            name.map(|name| ValidatedCall::ResolveCountry(ResolveCountryArgs { name }))
        }
        ToolName::ResolvePostalCode => {
            let mode = fields
                .optional_enum("mode", PostalMode::parse, "lookup_city, validate_postal")
                .unwrap_or_default();
            let country = fields.optional_string("country");
            let city = fields.optional_string("city");
            let value = fields.optional_string("value");
            Some(ValidatedCall::ResolvePostal(ResolvePostalArgs { mode, country, city, value }))
        }
        ToolName::GetShippingQuote => {
            let country = fields.required_string("country");
            if let Some(country) = &country {
                fields.check(
                    country.chars().count() == 2,
                    "country",
                    "must be exactly 2 characters",
                );
            }
            let postal_code = fields.required_string("postal_code");
            if let Some(postal_code) = &postal_code {
                fields.check(
                    (3..=12).contains(&postal_code.chars().count()),
                    "postal_code",
                    "must be between 3 and 12 characters",
                );
            }
            let weight_kg = fields.required_number("weight_kg");
            if let Some(weight_kg) = weight_kg {
                fields.check(
                    weight_kg > 0.0 && weight_kg < MAX_WEIGHT_KG,
                    "weight_kg",
                    "must be greater than 0 and less than 50",
                );
            }
            let service = fields
                .optional_enum("service", ShippingService::parse, "standard, express")
                .unwrap_or_default();

            match (country, postal_code, weight_kg) {
                (Some(country), Some(postal_code), Some(weight_kg)) => {
                    Some(ValidatedCall::ShippingQuote(ShippingQuoteArgs {
                        country,
                        postal_code,
                        weight_kg,
                        service,
                    }))
                }
                _ => None,
            }
        }
    };

    match call {
        Some(call) if fields.errors.is_empty() => Ok(call),
        _ => Err(fields.into_errors()),
    }
}

fn failure(call: &ToolCall, reason: &str, mut errors: Vec<String>) -> ValidationFailure {
    errors.truncate(MAX_FIELD_ERRORS);
    ValidationFailure {
        tool_name: call.tool_name.clone(),
        reason: reason.to_string(),
        object: call.raw.clone(),
        errors,
    }
}

struct FieldReader<'a> {
    args: &'a Map<String, Value>,
    errors: Vec<String>,
}

impl<'a> FieldReader<'a> {
    fn new(args: &'a Map<String, Value>) -> Self {
        Self { args, errors: Vec::new() }
    }

    fn present(&self, field: &str) -> Option<&'a Value> {
        self.args.get(field).filter(|value| !value.is_null())
    }

    fn check(&mut self, condition: bool, field: &str, message: &str) {
        if !condition {
            self.errors.push(format!("{field}: {message}"));
        }
    }

    fn required_string(&mut self, field: &str) -> Option<String> {
        if self.present(field).is_none() {
            self.errors.push(format!("{field}: field required"));
            return None;
        }
        self.optional_string(field)
    }

    fn optional_string(&mut self, field: &str) -> Option<String> {
        match self.present(field)? {
            Value::String(value) => Some(value.clone()),
            other => {
                self.errors.push(format!("{field}: expected string, got {}", type_name(other)));
                None
            }
        }
    }

    /// Accepts JSON numbers and numeric strings, as the remote side does.
    fn required_number(&mut self, field: &str) -> Option<f64> {
        let parsed = match self.present(field) {
            None => {
                self.errors.push(format!("{field}: field required"));
                return None;
            }
            Some(Value::Number(number)) => number.as_f64(),
            Some(Value::String(raw)) => raw.trim().parse::<f64>().ok(),
            Some(_) => None,
        };

        match parsed.filter(|value| value.is_finite()) {
            Some(value) => Some(value),
            None => {
                self.errors.push(format!("{field}: expected a number"));
                None
            }
        }
    }

    fn optional_enum<T>(
        &mut self,
        field: &str,
        parse: fn(&str) -> Option<T>,
        allowed: &str,
    ) -> Option<T> {
        let raw = self.optional_string(field)?;
        let parsed = parse(&raw);
        if parsed.is_none() {
            self.errors.push(format!("{field}: must be one of {allowed}"));
        }
        parsed
    }

    fn into_errors(mut self) -> Vec<String> {
        self.errors.truncate(MAX_FIELD_ERRORS);
        self.errors
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::{validate_call, INVALID_ARGUMENTS, MAX_FIELD_ERRORS, UNRECOGNIZED_TOOL};
    use crate::domain::tool_call::{PostalMode, ShippingService, ToolCall, ValidatedCall};

    fn call(value: Value) -> ToolCall {
        ToolCall::from_value(value)
    }

    fn quote_with_weight(weight: Value) -> ToolCall {
        call(json!({
            "tool_name": "get_shipping_quote",
            "args": {"country": "DE", "postal_code": "10115", "weight_kg": weight}
        }))
    }

    #[test]
    fn unknown_tool_is_unrecognized() {
        let failure = validate_call(&call(json!({"tool_name": "send_parcel", "args": {}})))
            .expect_err("unknown tool must fail");
        assert_eq!(failure.reason, UNRECOGNIZED_TOOL);
        assert_eq!(failure.tool_name.as_deref(), Some("send_parcel"));
    }

    #[test]
    fn padded_tool_name_is_unrecognized() {
        let failure = validate_call(&call(json!({
            "tool_name": " get_shipping_quote",
            "args": {"country": "DE", "postal_code": "10115", "weight_kg": 1}
        })))
        .expect_err("padded name must not match");
        assert_eq!(failure.reason, UNRECOGNIZED_TOOL);
        assert_eq!(failure.tool_name.as_deref(), Some(" get_shipping_quote"));
    }

    #[test]
    fn missing_args_mapping_is_unrecognized() {
        let object = json!({"tool_name": "resolve_country"});
        let failure = validate_call(&call(object.clone())).expect_err("missing args");
        assert_eq!(failure.reason, UNRECOGNIZED_TOOL);
        assert_eq!(failure.object, object);

        let failure = validate_call(&call(json!({"tool_name": "resolve_country", "args": "DE"})))
            .expect_err("non-object args");
        assert_eq!(failure.reason, UNRECOGNIZED_TOOL);
    }

    #[test]
    fn weight_bounds_are_exclusive() {
        let zero = validate_call(&quote_with_weight(json!(0))).expect_err("zero weight");
        assert_eq!(zero.reason, INVALID_ARGUMENTS);
        assert!(zero.errors.iter().any(|error| error.starts_with("weight_kg")));

        let fifty = validate_call(&quote_with_weight(json!(50))).expect_err("fifty kg");
        assert!(fifty.errors.iter().any(|error| error.starts_with("weight_kg")));

        let valid = validate_call(&quote_with_weight(json!(49.9))).expect("49.9 kg is valid");
        match valid {
            ValidatedCall::ShippingQuote(args) => {
                assert_eq!(args.weight_kg, 49.9);
                assert_eq!(args.service, ShippingService::Standard);
            }
            other => panic!("unexpected call: {other:?}"),
        }
    }

    #[test]
    fn numeric_string_weight_is_accepted() {
        let valid = validate_call(&quote_with_weight(json!("2.5"))).expect("numeric string");
        assert!(matches!(valid, ValidatedCall::ShippingQuote(args) if args.weight_kg == 2.5));

        let failure = validate_call(&quote_with_weight(json!("heavy"))).expect_err("not a number");
        assert_eq!(failure.errors, vec!["weight_kg: expected a number".to_string()]);
    }

    #[test]
    fn quote_field_contracts() {
        let failure = validate_call(&call(json!({
            "tool_name": "get_shipping_quote",
            "args": {"country": "Germany", "postal_code": "10", "weight_kg": 1, "service": "overnight"}
        })))
        .expect_err("several violations");

        assert_eq!(
            failure.errors,
            vec![
                "country: must be exactly 2 characters".to_string(),
                "postal_code: must be between 3 and 12 characters".to_string(),
                "service: must be one of standard, express".to_string(),
            ]
        );
    }

    #[test]
    fn express_service_is_parsed() {
        let valid = validate_call(&call(json!({
            "tool_name": "get_shipping_quote",
            "args": {"country": "AT", "postal_code": "1010", "weight_kg": 1, "service": "express"}
        })))
        .expect("valid express quote");
        assert!(matches!(
            valid,
            ValidatedCall::ShippingQuote(args) if args.service == ShippingService::Express
        ));
    }

    #[test]
    fn country_name_needs_two_characters() {
        let failure =
            validate_call(&call(json!({"tool_name": "resolve_country", "args": {"name": "D"}})))
                .expect_err("too short");
        assert_eq!(failure.errors, vec!["name: must be at least 2 characters".to_string()]);

        let failure = validate_call(&call(json!({"tool_name": "resolve_country", "args": {}})))
            .expect_err("missing name");
        assert_eq!(failure.errors, vec!["name: field required".to_string()]);
    }

    #[test]
    fn postal_lookup_passes_incomplete_fields_through() {
        let valid = validate_call(&call(json!({
            "tool_name": "resolve_postal_code",
            "args": {"country": "DE", "city": null}
        })))
        .expect("shape is valid even without city");

        match valid {
            ValidatedCall::ResolvePostal(args) => {
                assert_eq!(args.mode, PostalMode::LookupCity);
                assert_eq!(args.missing_fields(), vec!["city"]);
            }
            other => panic!("unexpected call: {other:?}"),
        }
    }

    #[test]
    fn postal_mode_and_types_are_checked() {
        let failure = validate_call(&call(json!({
            "tool_name": "resolve_postal_code",
            "args": {"mode": "guess", "country": 49}
        })))
        .expect_err("bad mode and country type");
        assert_eq!(
            failure.errors,
            vec![
                "mode: must be one of lookup_city, validate_postal".to_string(),
                "country: expected string, got number".to_string(),
            ]
        );
    }

    #[test]
    fn field_errors_are_truncated() {
        let failure = validate_call(&call(json!({
            "tool_name": "get_shipping_quote",
            "args": {"country": 1, "postal_code": [], "weight_kg": {}, "service": false, "x": 1}
        })))
        .expect_err("all fields wrong");
        assert!(failure.errors.len() <= MAX_FIELD_ERRORS);
        assert!(!failure.errors.is_empty());
    }
}
