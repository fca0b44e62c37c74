use serde_json::{json, Value};

pub const SERVICE_TITLE: &str = "Resolver + Shipping Tools";

/// OpenAPI description of the lookup operations. The `operationId`s are the
/// tool names the agent accepts.
pub fn document() -> Value {
    json!({
        "openapi": "3.1.0",
        "info": {
            "title": SERVICE_TITLE,
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Hardcoded resolver tools + shipping quote tool for agentic demos."
        },
        "paths": {
            "/v1/resolve/country": {
                "post": {
                    "operationId": "resolve_country",
                    "summary": "Convert country name to ISO2 code",
                    "description": "Resolves a country name or alias (e.g. 'Deutschland', 'Germany', 'Österreich') to ISO-3166-1 alpha-2 code. Do NOT call if you already have a 2-letter code like DE, FR, AT.",
                    "requestBody": request_body("ResolveCountryRequest"),
                    "responses": responses("ResolveCountryResponse")
                }
            },
            "/v1/resolve/postal": {
                "post": {
                    "operationId": "resolve_postal_code",
                    "summary": "Lookup postal code for a city or validate existing postal code",
                    "description": "Use mode='lookup_city' with ISO2 country and city name to get postal code. Use mode='validate_postal' to check if a value is a valid postal code format.",
                    "requestBody": request_body("ResolvePostalRequest"),
                    "responses": responses("ResolvePostalResponse")
                }
            },
            "/v1/shipping/quote": {
                "post": {
                    "operationId": "get_shipping_quote",
                    "summary": "Calculate shipping quote",
                    "description": "Calculate shipping price. Requires ISO2 country code and valid postal code. Call resolve_country and resolve_postal_code first if needed.",
                    "requestBody": request_body("ShippingQuoteRequest"),
                    "responses": responses("ShippingQuoteResponse")
                }
            },
            "/health": {
                "get": {
                    "operationId": "health",
                    "summary": "Readiness probe",
                    "responses": {"200": {"description": "Service is ready"}}
                }
            }
        },
        "components": {
            "schemas": {
                "ResolveCountryRequest": {
                    "type": "object",
                    "properties": {
                        "name": {
                            "type": "string",
                            "minLength": 2,
                            "description": "Country name, e.g. Deutschland, Austria, Schweiz"
                        }
                    },
                    "required": ["name"]
                },
                "ResolveCountryResponse": {
                    "type": "object",
                    "properties": {
                        "iso2": {"anyOf": [{"type": "string"}, {"type": "null"}]},
                        "confidence": {"type": "number", "default": 0.0},
                        "error": {"anyOf": [{"type": "string"}, {"type": "null"}]},
                        "trace_id": {"type": "string"}
                    },
                    "required": ["trace_id"]
                },
                "ResolvePostalRequest": {
                    "type": "object",
                    "properties": {
                        "country": {
                            "anyOf": [{"type": "string"}, {"type": "null"}],
                            "description": "ISO2 if known"
                        },
                        "city": {
                            "anyOf": [{"type": "string"}, {"type": "null"}],
                            "description": "City name if given"
                        },
                        "value": {
                            "anyOf": [{"type": "string"}, {"type": "null"}],
                            "description": "Raw user value (city or postal), for validation"
                        },
                        "mode": {
                            "type": "string",
                            "enum": ["lookup_city", "validate_postal"],
                            "default": "lookup_city"
                        }
                    }
                },
                "ResolvePostalResponse": {
                    "type": "object",
                    "properties": {
                        "postal_code": {"anyOf": [{"type": "string"}, {"type": "null"}]},
                        "city": {"anyOf": [{"type": "string"}, {"type": "null"}]},
                        "error": {"anyOf": [{"type": "string"}, {"type": "null"}]},
                        "trace_id": {"type": "string"}
                    },
                    "required": ["trace_id"]
                },
                "ShippingQuoteRequest": {
                    "type": "object",
                    "properties": {
                        "country": {
                            "type": "string",
                            "minLength": 2,
                            "maxLength": 2,
                            "description": "ISO-3166-1 alpha-2 country code (e.g. 'DE', 'AT', 'FR')"
                        },
                        "postal_code": {
                            "type": "string",
                            "minLength": 3,
                            "maxLength": 12,
                            "description": "Valid postal code for the destination"
                        },
                        "weight_kg": {
                            "type": "number",
                            "exclusiveMinimum": 0.0,
                            "exclusiveMaximum": 50.0,
                            "description": "Package weight in kilograms"
                        },
                        "service": {
                            "type": "string",
                            "enum": ["standard", "express"],
                            "default": "standard",
                            "description": "Shipping service: 'standard' or 'express'"
                        }
                    },
                    "required": ["country", "postal_code", "weight_kg"]
                },
                "ShippingQuoteResponse": {
                    "type": "object",
                    "properties": {
                        "currency": {"type": "string", "default": "EUR"},
                        "price": {"type": "number"},
                        "service": {"type": "string", "enum": ["standard", "express"]},
                        "trace_id": {"type": "string"}
                    },
                    "required": ["price", "service", "trace_id"]
                },
                "ValidationError": {
                    "type": "object",
                    "properties": {
                        "detail": {"type": "array", "items": {"type": "string"}}
                    }
                }
            }
        }
    })
}

fn request_body(schema: &str) -> Value {
    json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": {"$ref": format!("#/components/schemas/{schema}")}
            }
        }
    })
}

fn responses(schema: &str) -> Value {
    json!({
        "200": {
            "description": "Successful Response",
            "content": {
                "application/json": {
                    "schema": {"$ref": format!("#/components/schemas/{schema}")}
                }
            }
        },
        "422": {
            "description": "Validation Error",
            "content": {
                "application/json": {
                    "schema": {"$ref": "#/components/schemas/ValidationError"}
                }
            }
        }
    })
}
