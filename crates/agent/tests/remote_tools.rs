use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use serde_json::Value;
use shipquote_agent::{
    fetch_catalog, HttpToolInvoker, OrchestratorConfig, ReplayLlmClient, RoundOrchestrator,
    ToolCatalog, ToolInvoker,
};
use shipquote_core::{
    CorrelationId, PostalMode, ResolveCountryArgs, ResolvePostalArgs, ShippingQuoteArgs,
    ShippingService, ToolResult, ValidatedCall,
};
use shipquote_server::{request_log::RequestLog, AppState};

async fn spawn_lookup_service(request_log: Option<&Path>) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind ephemeral port");
    let address = listener.local_addr().expect("local addr");
    let state =
        AppState { request_log: request_log.map(|path| Arc::new(RequestLog::new(path))) };

    tokio::spawn(async move {
        let _ = shipquote_server::serve(listener, state).await;
    });

    address
}

fn invoker(address: SocketAddr) -> HttpToolInvoker {
    HttpToolInvoker::new(format!("http://{address}"), Duration::from_secs(5)).expect("invoker")
}

fn cid(raw: &str) -> CorrelationId {
    CorrelationId(raw.to_string())
}

#[tokio::test]
async fn resolves_country_and_postal_code() {
    let tools = invoker(spawn_lookup_service(None).await);

    let country = tools
        .invoke(
            &ValidatedCall::ResolveCountry(ResolveCountryArgs { name: "Österreich".to_string() }),
            &cid("it-country"),
        )
        .await;
    let ToolResult::Success { http_status, payload } = country else {
        panic!("expected success, got {country:?}");
    };
    assert_eq!(http_status, 200);
    assert_eq!(payload["iso2"], "AT");
    assert_eq!(payload["trace_id"], "it-country");

    let postal = tools
        .invoke(
            &ValidatedCall::ResolvePostal(ResolvePostalArgs {
                mode: PostalMode::LookupCity,
                country: Some("AT".to_string()),
                city: Some("Wien".to_string()),
                value: None,
            }),
            &cid("it-postal"),
        )
        .await;
    assert_eq!(
        postal.payload().and_then(|payload| payload.get("postal_code")),
        Some(&Value::from("1010"))
    );
}

#[tokio::test]
async fn quote_is_priced_by_the_rate_card() {
    let tools = invoker(spawn_lookup_service(None).await);

    let result = tools
        .invoke(
            &ValidatedCall::ShippingQuote(ShippingQuoteArgs {
                country: "DE".to_string(),
                postal_code: "10115".to_string(),
                weight_kg: 1.0,
                service: ShippingService::Express,
            }),
            &cid("it-quote"),
        )
        .await;

    assert!(result.is_success());
    assert_eq!(result.payload().map(|payload| payload["price"].clone()), Some(Value::from(7.06)));
}

#[tokio::test]
async fn remote_validation_error_is_kept_as_remote_error() {
    let tools = invoker(spawn_lookup_service(None).await);

    // Built directly, so the local weight bound is not applied.
    let result = tools
        .invoke(
            &ValidatedCall::ShippingQuote(ShippingQuoteArgs {
                country: "DE".to_string(),
                postal_code: "10115".to_string(),
                weight_kg: 75.0,
                service: ShippingService::Standard,
            }),
            &cid("it-422"),
        )
        .await;

    let ToolResult::RemoteError { http_status, payload } = result else {
        panic!("expected remote error, got {result:?}");
    };
    assert_eq!(http_status, 422);
    assert!(payload["detail"][0].as_str().is_some_and(|detail| detail.starts_with("weight_kg")));
}

#[tokio::test]
async fn unreachable_service_is_a_transport_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let address = listener.local_addr().expect("addr");
    drop(listener);

    let result = invoker(address)
        .invoke(
            &ValidatedCall::ResolveCountry(ResolveCountryArgs { name: "France".to_string() }),
            &cid("it-down"),
        )
        .await;

    assert!(matches!(result, ToolResult::TransportFailure { http_status: None, .. }));
}

#[tokio::test]
async fn catalog_is_built_from_published_openapi() {
    let address = spawn_lookup_service(None).await;
    let tools = invoker(address);

    let catalog = fetch_catalog(tools.client(), tools.base_url()).await.expect("catalog");

    assert_eq!(catalog.len(), 3);
    let rendered = catalog.render();
    assert!(rendered.contains("weight_kg (number): (required) Package weight in kilograms"));
    assert!(rendered.contains("[one of: lookup_city, validate_postal] [default: lookup_city]"));
}

#[tokio::test]
async fn three_round_run_resolves_then_quotes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log_path = dir.path().join("tool_calls.jsonl");
    let address = spawn_lookup_service(Some(&log_path)).await;

    let agent = RoundOrchestrator::new(
        ReplayLlmClient::new([
            r#"{"tool_name":"resolve_country","args":{"name":"Deutschland"}}"#,
            r#"Now the postal code: {"tool_name":"resolve_postal_code","args":{"mode":"lookup_city","country":"DE","city":"Berlin"}}"#,
            r#"{"tool_name":"get_shipping_quote","args":{"country":"DE","postal_code":"10115","weight_kg":1,"service":"express"}}"#,
        ]),
        invoker(address),
        ToolCatalog::builtin(),
        OrchestratorConfig::default(),
    );

    let result = agent
        .run_with_correlation(
            "Schick das nach Deutschland, Berlin, 1 kg, express.",
            3,
            cid("it-run"),
        )
        .await;

    assert!(result.ok, "run failed: {result:?}");
    assert_eq!(result.rounds_used, 3);
    assert_eq!(result.quotes.len(), 1);
    assert_eq!(result.quotes[0].price, Decimal::new(706, 2));
    assert_eq!(result.tool_history.len(), 3);

    let inputs = agent.llm().inputs();
    assert!(inputs[2].tool_results.contains("\"postal_code\":\"10115\""));

    let log = std::fs::read_to_string(&log_path).expect("request log");
    let trace_ids = log
        .lines()
        .map(|line| serde_json::from_str::<Value>(line).expect("json line")["trace_id"].clone())
        .collect::<Vec<_>>();
    assert_eq!(trace_ids.len(), 3);
    assert!(trace_ids.iter().all(|trace_id| *trace_id == "it-run"));
}
