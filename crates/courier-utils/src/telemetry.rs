/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # Courier Telemetry Module
//!
//! Installs the process-wide `tracing` subscriber for long-running courier
//! processes: an `EnvFilter`, a text or JSON fmt layer and, when enabled, an
//! OpenTelemetry layer exporting spans over OTLP/gRPC.
//!
//! ```rust,ignore
//! let settings = Settings::new(None)?;
//! telemetry::init(&settings.telemetry.for_collector(), &settings.log.level, &settings.log.format)?;
//! tracing::info!("collector started");
//! ```

use crate::config::ResolvedTelemetry;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{Sampler, Tracer, TracerProvider};
use opentelemetry_sdk::{runtime, Resource};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Error type for telemetry initialization
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("OTLP exporter error: {0}")]
    Exporter(String),
    #[error("Subscriber error: {0}")]
    Subscriber(String),
}

/// Initialize tracing with the given configuration.
///
/// `RUST_LOG`, when set, takes precedence over `log_level`.
pub fn init(
    config: &ResolvedTelemetry,
    log_level: &str,
    log_format: &str,
) -> Result<(), TelemetryError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let json = log_format.eq_ignore_ascii_case("json");
    let text_layer = (!json).then(tracing_subscriber::fmt::layer);
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json());

    let tracer = if config.enabled {
        Some(otlp_tracer(config)?)
    } else {
        None
    };
    let otel_layer = tracer.map(|t| tracing_opentelemetry::layer().with_tracer(t));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(otel_layer)
        .with(text_layer)
        .with(json_layer)
        .try_init()
        .map_err(|e| TelemetryError::Subscriber(e.to_string()))
}

fn otlp_tracer(config: &ResolvedTelemetry) -> Result<Tracer, TelemetryError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&config.otlp_endpoint)
        .build()
        .map_err(|e| TelemetryError::Exporter(e.to_string()))?;

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_sampler(sampler_for(config.sampling_rate))
        .with_resource(Resource::new(vec![
            KeyValue::new(
                opentelemetry_semantic_conventions::resource::SERVICE_NAME,
                config.service_name.clone(),
            ),
            KeyValue::new(
                opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
                env!("CARGO_PKG_VERSION"),
            ),
        ]))
        .build();

    let tracer = provider.tracer(config.service_name.clone());
    opentelemetry::global::set_tracer_provider(provider);
    Ok(tracer)
}

fn sampler_for(rate: f64) -> Sampler {
    if rate >= 1.0 {
        Sampler::AlwaysOn
    } else if rate <= 0.0 {
        Sampler::AlwaysOff
    } else {
        Sampler::TraceIdRatioBased(rate)
    }
}

/// Flushes pending spans. Call during graceful shutdown.
pub fn shutdown() {
    opentelemetry::global::shutdown_tracer_provider();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampler_bounds() {
        assert!(matches!(sampler_for(1.5), Sampler::AlwaysOn));
        assert!(matches!(sampler_for(1.0), Sampler::AlwaysOn));
        assert!(matches!(sampler_for(0.0), Sampler::AlwaysOff));
        assert!(matches!(sampler_for(-0.5), Sampler::AlwaysOff));
        assert!(matches!(sampler_for(0.25), Sampler::TraceIdRatioBased(r) if (r - 0.25).abs() < f64::EPSILON));
    }

    #[test]
    fn test_error_display() {
        let err = TelemetryError::Subscriber("already set".to_string());
        assert_eq!(err.to_string(), "Subscriber error: already set");
    }
}
