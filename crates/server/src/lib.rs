//! Mock lookup service for the shipping quote agent: country and postal code
//! resolution over a hardcoded dataset, plus a deterministic rate card.

pub mod dataset;
pub mod health;
pub mod openapi;
pub mod request_log;
pub mod routes;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use shipquote_core::config::ServerConfig;
use tokio::net::TcpListener;

use crate::request_log::{trace_requests, RequestLog};

#[derive(Clone, Default)]
pub struct AppState {
    pub request_log: Option<Arc<RequestLog>>,
}

impl AppState {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { request_log: Some(Arc::new(RequestLog::new(config.request_log_path.clone()))) }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/resolve/country", post(routes::resolve_country))
        .route("/v1/resolve/postal", post(routes::resolve_postal))
        .route("/v1/shipping/quote", post(routes::shipping_quote))
        .route("/openapi.json", get(routes::openapi))
        .route("/health", get(health::health))
        .layer(middleware::from_fn_with_state(state.clone(), trace_requests))
        .with_state(state)
}

pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}
