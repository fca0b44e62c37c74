//! Tool descriptions shown to the model.
//!
//! The catalog is built either from the lookup service's OpenAPI document or
//! from the builtin descriptions below. It only feeds the prompt; endpoints
//! used for invocation are fixed by [`ToolName::endpoint_path`].

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde_json::Value;
use shipquote_core::ToolName;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub name: ToolName,
    pub path: String,
    pub summary: String,
    pub description: String,
    pub args: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolCatalog {
    tools: Vec<ToolDescriptor>,
}

impl ToolCatalog {
    pub fn builtin() -> Self {
        let tools = vec![
            ToolDescriptor {
                name: ToolName::ResolveCountry,
                path: ToolName::ResolveCountry.endpoint_path().to_string(),
                summary: "Convert country name to ISO2 code".to_string(),
                description: "Resolves a country name or alias (e.g. 'Deutschland', 'Germany', 'Österreich') to ISO-3166-1 alpha-2 code. Do NOT call if you already have a 2-letter code like DE, FR, AT.".to_string(),
                args: vec![
                    "name (string): (required) Country name, e.g. Deutschland, Austria, Schweiz"
                        .to_string(),
                ],
            },
            ToolDescriptor {
                name: ToolName::ResolvePostalCode,
                path: ToolName::ResolvePostalCode.endpoint_path().to_string(),
                summary: "Lookup postal code for a city or validate existing postal code"
                    .to_string(),
                description: "Use mode='lookup_city' with ISO2 country and city name to get postal code. Use mode='validate_postal' to check if a value is a valid postal code format.".to_string(),
                args: vec![
                    "country (string): ISO2 if known".to_string(),
                    "city (string): City name if given".to_string(),
                    "value (string): Raw user value (city or postal), for validation".to_string(),
                    "mode (string): [one of: lookup_city, validate_postal] [default: lookup_city]"
                        .to_string(),
                ],
            },
            ToolDescriptor {
                name: ToolName::GetShippingQuote,
                path: ToolName::GetShippingQuote.endpoint_path().to_string(),
                summary: "Calculate shipping quote".to_string(),
                description: "Calculate shipping price. Requires ISO2 country code and valid postal code. Call resolve_country and resolve_postal_code first if needed.".to_string(),
                args: vec![
                    "country (string): (required) ISO-3166-1 alpha-2 country code (e.g. 'DE', 'AT', 'FR')".to_string(),
                    "postal_code (string): (required) Valid postal code for the destination"
                        .to_string(),
                    "weight_kg (number): (required) Package weight in kilograms".to_string(),
                    "service (string): Shipping service: 'standard' or 'express' [one of: standard, express] [default: standard]".to_string(),
                ],
            },
        ];

        Self { tools }
    }

    /// Collects the POST operations whose `operationId` names a known tool.
    pub fn from_openapi(document: &Value) -> Result<Self> {
        let paths = document
            .get("paths")
            .and_then(Value::as_object)
            .context("openapi document has no paths")?;
        let mut tools = Vec::new();

        for (path, methods) in paths {
            let Some(operation) = methods.get("post") else {
                continue;
            };
            let Some(name) =
                operation.get("operationId").and_then(Value::as_str).and_then(ToolName::parse)
            else {
                continue;
            };

            let schema = operation
                .pointer("/requestBody/content/application~1json/schema")
                .map(|schema| resolve_ref(document, schema))
                .unwrap_or(&Value::Null);

            tools.push(ToolDescriptor {
                name,
                path: path.clone(),
                summary: text_field(operation, "summary"),
                description: text_field(operation, "description"),
                args: describe_properties(document, schema),
            });
        }

        if tools.is_empty() {
            bail!("openapi document describes none of the known tools");
        }
        tools.sort_by_key(|tool| ToolName::ALL.iter().position(|name| *name == tool.name));
        tools.dedup_by_key(|tool| tool.name);

        Ok(Self { tools })
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        for tool in &self.tools {
            lines.push(format!("- {}: {}", tool.name, tool.summary));
            if !tool.description.is_empty() {
                lines.push(format!("    {}", tool.description));
            }
            if !tool.args.is_empty() {
                lines.push("    Args:".to_string());
                lines.extend(tool.args.iter().map(|arg| format!("      {arg}")));
            }
        }
        lines.join("\n")
    }
}

/// Loads `{base_url}/openapi.json` and builds a catalog from it.
pub async fn fetch_catalog(client: &Client, base_url: &str) -> Result<ToolCatalog> {
    let url = format!("{}/openapi.json", base_url.trim_end_matches('/'));
    let response = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("failed to fetch {url}"))?
        .error_for_status()
        .with_context(|| format!("openapi endpoint {url} returned an error"))?;
    let document: Value = response.json().await.context("failed to decode openapi document")?;

    ToolCatalog::from_openapi(&document)
}

fn resolve_ref<'a>(document: &'a Value, schema: &'a Value) -> &'a Value {
    match schema.get("$ref").and_then(Value::as_str) {
        Some(reference) => {
            document.pointer(reference.trim_start_matches('#')).unwrap_or(&Value::Null)
        }
        None => schema,
    }
}

fn text_field(operation: &Value, key: &str) -> String {
    operation.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

fn describe_properties(document: &Value, schema: &Value) -> Vec<String> {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Vec::new();
    };
    let required = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect::<Vec<_>>())
        .unwrap_or_default();

    properties
        .iter()
        .map(|(name, property)| {
            let property = resolve_ref(document, property);
            let mut line = format!("{name} ({})", property_type(property));
            line.push(':');

            if required.contains(&name.as_str()) {
                line.push_str(" (required)");
            }
            if let Some(description) = property.get("description").and_then(Value::as_str) {
                line.push(' ');
                line.push_str(description);
            }
            if let Some(options) = property.get("enum").and_then(Value::as_array) {
                let options = options.iter().filter_map(Value::as_str).collect::<Vec<_>>();
                line.push_str(&format!(" [one of: {}]", options.join(", ")));
            }
            if let Some(default) = property.get("default").filter(|value| !value.is_null()) {
                let default =
                    default.as_str().map(str::to_string).unwrap_or_else(|| default.to_string());
                line.push_str(&format!(" [default: {default}]"));
            }
            line
        })
        .collect()
}

/// `type`, or the first non-null member of an `anyOf` (how optional fields
/// are usually published). Falls back to `string`.
fn property_type(property: &Value) -> String {
    if let Some(kind) = property.get("type").and_then(Value::as_str) {
        return kind.to_string();
    }

    property
        .get("anyOf")
        .and_then(Value::as_array)
        .and_then(|variants| {
            variants
                .iter()
                .filter_map(|variant| variant.get("type").and_then(Value::as_str))
                .find(|kind| *kind != "null")
        })
        .unwrap_or("string")
        .to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use shipquote_core::ToolName;

    use super::ToolCatalog;

    fn openapi_fixture() -> serde_json::Value {
        json!({
            "openapi": "3.1.0",
            "paths": {
                "/v1/shipping/quote": {
                    "post": {
                        "operationId": "get_shipping_quote",
                        "summary": "Calculate shipping quote",
                        "description": "Calculate shipping price.",
                        "requestBody": {"content": {"application/json": {
                            "schema": {"$ref": "#/components/schemas/ShippingQuoteRequest"}
                        }}}
                    }
                },
                "/v1/resolve/country": {
                    "post": {
                        "operationId": "resolve_country",
                        "summary": "Convert country name to ISO2 code",
                        "requestBody": {"content": {"application/json": {
                            "schema": {"$ref": "#/components/schemas/ResolveCountryRequest"}
                        }}}
                    }
                },
                "/v1/admin/reset": {
                    "post": {"operationId": "reset_dataset", "summary": "not a tool"}
                },
                "/openapi.json": {"get": {"operationId": "openapi"}}
            },
            "components": {"schemas": {
                "ShippingQuoteRequest": {
                    "properties": {
                        "country": {"type": "string", "description": "ISO2 code"},
                        "weight_kg": {"type": "number"},
                        "service": {"type": "string", "enum": ["standard", "express"], "default": "standard"}
                    },
                    "required": ["country", "weight_kg"]
                },
                "ResolveCountryRequest": {
                    "properties": {
                        "name": {"anyOf": [{"type": "null"}, {"type": "string"}], "description": "Country name"}
                    }
                }
            }}
        })
    }

    #[test]
    fn openapi_catalog_keeps_known_post_operations_in_tool_order() {
        let catalog = ToolCatalog::from_openapi(&openapi_fixture()).expect("catalog");

        let names = catalog.tools().iter().map(|tool| tool.name).collect::<Vec<_>>();
        assert_eq!(names, vec![ToolName::ResolveCountry, ToolName::GetShippingQuote]);
        assert_eq!(catalog.tools()[1].path, "/v1/shipping/quote");
    }

    #[test]
    fn openapi_properties_render_required_enum_and_default() {
        let catalog = ToolCatalog::from_openapi(&openapi_fixture()).expect("catalog");
        let quote = &catalog.tools()[1];

        assert_eq!(
            quote.args,
            vec![
                "country (string): (required) ISO2 code".to_string(),
                "service (string): [one of: standard, express] [default: standard]".to_string(),
                "weight_kg (number): (required)".to_string(),
            ]
        );
        assert_eq!(catalog.tools()[0].args, vec!["name (string): Country name".to_string()]);
    }

    #[test]
    fn openapi_without_known_tools_is_rejected() {
        let error = ToolCatalog::from_openapi(&json!({"paths": {}})).expect_err("no tools");
        assert!(error.to_string().contains("none of the known tools"));
    }

    #[test]
    fn builtin_catalog_renders_all_three_tools() {
        let catalog = ToolCatalog::builtin();
        assert_eq!(catalog.len(), 3);

        let rendered = catalog.render();
        assert!(rendered.starts_with("- resolve_country: Convert country name to ISO2 code"));
        assert!(rendered.contains("- resolve_postal_code:"));
        assert!(rendered.contains("weight_kg (number): (required)"));
    }
}
