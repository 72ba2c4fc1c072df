//! Structured request logging middleware
//!
//! One event per request with method, path, query, status, latency and
//! client details. The level follows the status class.

use axum::{
    extract::{ConnectInfo, Request},
    http::header,
    middleware::Next,
    response::Response,
};
use std::{net::SocketAddr, time::Instant};
use tracing::{error, info, warn};

/// Maximum length for logged header values before truncation
const MAX_FIELD_LENGTH: usize = 120;

/// Truncation suffix for long values
const TRUNCATION_SUFFIX: &str = "...";

pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let started = Instant::now();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let query = request.uri().query().unwrap_or_default().to_string();
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(truncate)
        .unwrap_or_default();
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let latency_ms = started.elapsed().as_millis() as u64;

    if response.status().is_server_error() {
        error!(
            status,
            %method,
            path = %path,
            query = %query,
            ip = %ip,
            latency_ms,
            user_agent = %user_agent,
            "Request failed"
        );
    } else if response.status().is_client_error() {
        warn!(
            status,
            %method,
            path = %path,
            query = %query,
            ip = %ip,
            latency_ms,
            user_agent = %user_agent,
            "Request rejected"
        );
    } else {
        info!(
            status,
            %method,
            path = %path,
            query = %query,
            ip = %ip,
            latency_ms,
            user_agent = %user_agent,
            "Request handled"
        );
    }

    response
}

fn truncate(value: &str) -> String {
    if value.chars().count() <= MAX_FIELD_LENGTH {
        return value.to_string();
    }
    let kept: String = value
        .chars()
        .take(MAX_FIELD_LENGTH - TRUNCATION_SUFFIX.len())
        .collect();
    format!("{kept}{TRUNCATION_SUFFIX}")
}
