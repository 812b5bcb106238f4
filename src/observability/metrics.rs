//! Metrics collection and Prometheus export module.
//!
//! This module provides:
//! - Prometheus recorder setup
//! - The HTTP server for `/metrics`, `/health/live` and `/health/ready`
//! - Metric recording helpers used across the scanner

use anyhow::Result;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use crate::observability_config::ObservabilityConfig;
use crate::ocr_config::OcrConfig;

/// Shared state of the metrics server
#[derive(Clone)]
struct ServerState {
    metrics_handle: PrometheusHandle,
    ocr_config: Arc<OcrConfig>,
    auth_token: Option<Arc<str>>,
}

/// True when no token is configured or the header carries `Bearer <token>`
pub fn is_authorized(authorization: Option<&str>, expected_token: Option<&str>) -> bool {
    match expected_token {
        None => true,
        Some(expected) => authorization
            .and_then(|value| value.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected),
    }
}

/// Initialize metrics collection with the Prometheus exporter
pub fn init_metrics_with_config(config: &ObservabilityConfig) -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    tracing::info!(
        metrics_enabled = %config.enable_metrics_export,
        "Metrics collection initialized"
    );
    Ok(handle)
}

/// Start the metrics and health server in the background.
///
/// Binds to localhost unless `bind_all_interfaces` is set. Returns the bound
/// address.
pub async fn start_metrics_server(
    metrics_handle: PrometheusHandle,
    config: &ObservabilityConfig,
    ocr_config: OcrConfig,
) -> Result<SocketAddr> {
    let addr = if config.bind_all_interfaces {
        SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), config.metrics_port)
    } else {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), config.metrics_port)
    };

    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(
        "Metrics server listening on {} (bind_all: {})",
        local_addr,
        config.bind_all_interfaces
    );

    let state = ServerState {
        metrics_handle,
        ocr_config: Arc::new(ocr_config),
        auth_token: config.metrics_auth_token.as_deref().map(Arc::from),
    };

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, peer_addr)) => {
                    let state = state.clone();

                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = hyper::service::service_fn(
                            move |req: hyper::Request<hyper::body::Incoming>| {
                                let state = state.clone();
                                async move {
                                    Ok::<_, std::convert::Infallible>(handle_request(req, &state).await)
                                }
                            },
                        );

                        if let Err(err) = http1::Builder::new().serve_connection(io, service).await
                        {
                            crate::errors::error_logging::log_network_error(
                                &err,
                                "serve_http_connection",
                                Some(&peer_addr.to_string()),
                                None,
                            );
                        }
                    });
                }
                Err(e) => {
                    crate::errors::error_logging::log_network_error(
                        &e,
                        "accept_tcp_connection",
                        Some(&local_addr.to_string()),
                        None,
                    );
                }
            }
        }
    });

    Ok(local_addr)
}

async fn handle_request(
    req: hyper::Request<hyper::body::Incoming>,
    state: &ServerState,
) -> hyper::Response<String> {
    let authorization = req
        .headers()
        .get(hyper::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    if !is_authorized(authorization, state.auth_token.as_deref()) {
        let mut response = hyper::Response::new("Unauthorized".to_string());
        *response.status_mut() = hyper::StatusCode::UNAUTHORIZED;
        response.headers_mut().insert(
            hyper::header::WWW_AUTHENTICATE,
            hyper::header::HeaderValue::from_static("Bearer"),
        );
        return response;
    }

    match (req.method(), req.uri().path()) {
        (&hyper::Method::GET, "/metrics") => {
            let mut response = hyper::Response::new(state.metrics_handle.render());
            response.headers_mut().insert(
                hyper::header::CONTENT_TYPE,
                hyper::header::HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
            );
            response
        }
        (&hyper::Method::GET, "/health/live") => hyper::Response::new("OK".to_string()),
        (&hyper::Method::GET, "/health/ready") => {
            match super::health_checks::perform_readiness_checks(&state.ocr_config).await {
                Ok(()) => hyper::Response::new("OK".to_string()),
                Err(e) => {
                    let mut response = hyper::Response::new(format!("NOT READY: {}", e));
                    *response.status_mut() = hyper::StatusCode::SERVICE_UNAVAILABLE;
                    response
                }
            }
        }
        _ => {
            let mut response = hyper::Response::new("Not Found".to_string());
            *response.status_mut() = hyper::StatusCode::NOT_FOUND;
            response
        }
    }
}

/// Record OCR operation metrics
pub fn record_ocr_metrics(success: bool, duration: Duration, image_size: u64) {
    metrics::counter!("ocr_operations_total", "result" => if success { "success" } else { "failure" }).increment(1);
    metrics::histogram!("ocr_duration_seconds").record(duration.as_secs_f64());
    metrics::histogram!("ocr_image_size_bytes").record(image_size as f64);
}

/// Record how many of the five fields the extractor filled
pub fn record_extraction_metrics(fields_found: usize) {
    metrics::counter!("documents_scanned_total").increment(1);
    metrics::histogram!("extracted_fields_count").record(fields_found as f64);
    if fields_found == 0 {
        metrics::counter!("documents_without_fields_total").increment(1);
    }
}

/// Record an API submission or probe outcome
pub fn record_api_metrics(operation: &'static str, outcome: &'static str, duration: Duration) {
    metrics::counter!("api_requests_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
    metrics::histogram!("api_request_duration_seconds", "operation" => operation)
        .record(duration.as_secs_f64());
}

/// Record health check metrics
pub fn record_health_check_metrics(check_type: &str, success: bool, duration: Duration) {
    let check_type = check_type.to_string();
    metrics::counter!("health_checks_total", "type" => check_type.clone(), "result" => if success { "success" } else { "failure" }).increment(1);
    metrics::histogram!("health_check_duration_seconds", "type" => check_type.clone())
        .record(duration.as_secs_f64());
    metrics::gauge!("health_check_status", "type" => check_type).set(if success {
        1.0
    } else {
        0.0
    });
}

/// Record Telegram message processing metrics
pub fn record_telegram_message(message_type: &str) {
    let message_type = message_type.to_string();
    metrics::counter!("telegram_messages_total", "type" => message_type).increment(1);
}

/// Record application startup metrics
pub fn record_startup_metrics(duration: Duration) {
    metrics::histogram!("application_startup_duration_seconds").record(duration.as_secs_f64());
    metrics::counter!("application_starts_total").increment(1);
}
