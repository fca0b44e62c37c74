use std::sync::Arc;

use shipquote_agent::{
    fetch_catalog, HttpToolInvoker, OpenAiCompatibleClient, OrchestratorConfig,
    RoundOrchestrator, ToolCatalog,
};
use shipquote_core::config::AppConfig;
use shipquote_core::{ApplicationError, JsonlAuditSink};
use tracing::{info, warn};

pub type ShippingAgent = RoundOrchestrator<OpenAiCompatibleClient, HttpToolInvoker>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CatalogSource {
    OpenApi,
    Builtin,
}

impl CatalogSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenApi => "openapi",
            Self::Builtin => "builtin",
        }
    }
}

pub fn tool_invoker(config: &AppConfig) -> Result<HttpToolInvoker, ApplicationError> {
    HttpToolInvoker::from_config(&config.tools)
        .map_err(|error| ApplicationError::Integration(format!("{error:#}")))
}

/// The remote OpenAPI catalog when enabled and reachable, else the builtin one.
pub async fn load_catalog(
    config: &AppConfig,
    invoker: &HttpToolInvoker,
) -> (ToolCatalog, CatalogSource) {
    if !config.tools.openapi_catalog {
        return (ToolCatalog::builtin(), CatalogSource::Builtin);
    }

    match fetch_catalog(invoker.client(), invoker.base_url()).await {
        Ok(catalog) => {
            info!(
                event_name = "cli.catalog.loaded",
                correlation_id = "bootstrap",
                tools = catalog.len(),
                base_url = invoker.base_url(),
                "tool catalog loaded from openapi"
            );
            (catalog, CatalogSource::OpenApi)
        }
        Err(error) => {
            warn!(
                event_name = "cli.catalog.fallback",
                correlation_id = "bootstrap",
                base_url = invoker.base_url(),
                error = %format!("{error:#}"),
                "openapi catalog unavailable, using builtin tool descriptions"
            );
            (ToolCatalog::builtin(), CatalogSource::Builtin)
        }
    }
}

pub async fn build_agent(config: &AppConfig) -> Result<ShippingAgent, ApplicationError> {
    let llm = OpenAiCompatibleClient::from_config(&config.llm)
        .map_err(|error| ApplicationError::Integration(format!("{error:#}")))?;
    let invoker = tool_invoker(config)?;
    let (catalog, _) = load_catalog(config, &invoker).await;

    let agent =
        RoundOrchestrator::new(llm, invoker, catalog, OrchestratorConfig::from(&config.agent));
    if config.audit.enabled {
        return Ok(agent.with_audit_sink(Arc::new(JsonlAuditSink::new(config.audit.path.clone()))));
    }
    Ok(agent)
}
