//! Tracing and logging setup module.
//!
//! This module provides:
//! - Structured logging configuration
//! - OpenTelemetry trace export over OTLP
//! - Tracing span creation utilities

use anyhow::Result;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{Sampler, SdkTracerProvider, Tracer as SdkTracer};
use opentelemetry_sdk::Resource;
use tracing::Subscriber;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

use crate::observability_config::ObservabilityConfig;

/// Initialize structured logging, plus OTLP span export when an endpoint is
/// configured.
///
/// The exporter is built first so the OpenTelemetry layer can sit in the same
/// subscriber as the log output; every `tracing` span then reaches both.
pub fn init_tracing_with_config(config: &ObservabilityConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("id_scanner={}", config.log_level).parse()?)
        .add_directive("teloxide=warn".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    let tracer_provider = build_tracer_provider(config)?;
    let otel = tracer_provider.as_ref().map(otel_layer);

    if config.use_pretty_logs() {
        tracing_subscriber::registry()
            .with(filter)
            .with(otel)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(otel)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .try_init()?;
    }

    tracing::info!(
        environment = %config.environment,
        log_level = %config.log_level,
        pretty = config.use_pretty_logs(),
        "Tracing initialized with structured logging"
    );

    match tracer_provider {
        Some(provider) => {
            global::set_tracer_provider(provider);
            tracing::info!(
                otlp_endpoint = ?config.otlp_endpoint,
                trace_sampling_enabled = %config.enable_trace_sampling,
                trace_sampling_ratio = %config.trace_sampling_ratio,
                "OpenTelemetry tracing initialized with OTLP export"
            );
        }
        None => tracing::info!("OpenTelemetry tracing disabled (no OTLP endpoint configured)"),
    }
    Ok(())
}

/// Layer forwarding `tracing` spans to an OpenTelemetry tracer
pub fn otel_layer<S>(provider: &SdkTracerProvider) -> OpenTelemetryLayer<S, SdkTracer>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    tracing_opentelemetry::layer().with_tracer(provider.tracer(env!("CARGO_PKG_NAME")))
}

/// OTLP tracer provider, or `None` when no endpoint is configured
pub fn build_tracer_provider(config: &ObservabilityConfig) -> Result<Option<SdkTracerProvider>> {
    let Some(endpoint) = &config.otlp_endpoint else {
        return Ok(None);
    };

    let otlp_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint.clone())
        .build()?;

    let mut attributes = vec![KeyValue::new(
        "deployment.environment",
        config.environment.clone(),
    )];
    attributes.extend(
        config
            .tags
            .iter()
            .map(|(key, value)| KeyValue::new(key.clone(), value.clone())),
    );
    let resource = Resource::builder()
        .with_service_name(env!("CARGO_PKG_NAME"))
        .with_attributes(attributes)
        .build();

    let sampler = if config.enable_trace_sampling {
        Sampler::TraceIdRatioBased(config.trace_sampling_ratio)
    } else {
        Sampler::AlwaysOn
    };

    Ok(Some(
        SdkTracerProvider::builder()
            .with_batch_exporter(otlp_exporter)
            .with_sampler(sampler)
            .with_resource(resource)
            .build(),
    ))
}

/// Create a span for OCR operations
pub fn ocr_span(operation: &str) -> tracing::Span {
    tracing::info_span!("ocr_operation", operation = operation, component = "ocr")
}

/// Create a span for outbound API calls
pub fn api_span(operation: &str, endpoint: &str) -> tracing::Span {
    tracing::info_span!(
        "api_operation",
        operation = operation,
        endpoint = endpoint,
        component = "submission"
    )
}

/// Create a span for Telegram bot operations
pub fn telegram_span(operation: &str, chat_id: Option<i64>) -> tracing::Span {
    tracing::info_span!(
        "telegram_operation",
        operation = operation,
        chat_id = chat_id,
        component = "telegram"
    )
}
