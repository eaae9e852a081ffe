//! Observability setup for the relayer CLI.
//!
//! Logs go to stderr so stdout only carries command output. Traces and logs
//! are optionally exported over OTLP.

use anyhow::{Context, Result};
use opentelemetry::{global, trace::TracerProvider as _, KeyValue};
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::{
    propagation::TraceContextPropagator,
    resource::Resource,
    trace::{Sampler, SdkTracerProvider, Tracer},
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};
use twin_bridge_relayer_core::config::ObservabilityConfig;

/// Shuts down OpenTelemetry export on drop, if enabled.
pub struct ObservabilityGuard {
    tracer_provider: Option<SdkTracerProvider>,
    logger_provider: Option<SdkLoggerProvider>,
}

impl Drop for ObservabilityGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take() {
            let _ = provider.shutdown();
        }
        // Dropping the logger provider flushes its processors.
        drop(self.logger_provider.take());
    }
}

/// Initialize the global tracing subscriber.
///
/// Keep the returned guard alive until the command finishes so pending spans
/// are exported.
///
/// # Errors
/// Fails if a global subscriber is already installed.
pub fn init_observability(config: &ObservabilityConfig) -> Result<ObservabilityGuard> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    let filter = || {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.level().as_str().to_lowercase()))
    };
    let stderr_layer = || {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_line_number(true)
    };

    if !config.use_otel {
        try_init_subscriber(Registry::default().with(filter()).with(stderr_layer()))?;
        return Ok(ObservabilityGuard {
            tracer_provider: None,
            logger_provider: None,
        });
    }

    match (setup_otlp_tracer(config), setup_otlp_logger(config)) {
        (Ok((tracer, tracer_provider)), Ok(logger_provider)) => {
            let subscriber = Registry::default()
                .with(filter())
                .with(stderr_layer())
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .with(OpenTelemetryTracingBridge::new(&logger_provider));
            try_init_subscriber(subscriber)?;

            Ok(ObservabilityGuard {
                tracer_provider: Some(tracer_provider),
                logger_provider: Some(logger_provider),
            })
        }
        (Err(e), _) | (_, Err(e)) => {
            try_init_subscriber(Registry::default().with(filter()).with(stderr_layer()))?;
            tracing::warn!(error = %format!("{e:#}"), "OpenTelemetry disabled");

            Ok(ObservabilityGuard {
                tracer_provider: None,
                logger_provider: None,
            })
        }
    }
}

fn try_init_subscriber(subscriber: impl SubscriberInitExt) -> Result<()> {
    subscriber
        .try_init()
        .context("Failed to set global default subscriber")
}

fn resource(config: &ObservabilityConfig) -> Resource {
    Resource::builder()
        .with_attributes(vec![
            KeyValue::new("service.name", config.service_name.clone()),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        ])
        .build()
}

/// Build an OTLP tracer exporting over gRPC.
fn setup_otlp_tracer(config: &ObservabilityConfig) -> Result<(Tracer, SdkTracerProvider)> {
    let mut exporter = opentelemetry_otlp::SpanExporter::builder().with_tonic();
    if let Some(endpoint) = &config.otel_endpoint {
        exporter = exporter.with_endpoint(endpoint);
    }

    let provider = SdkTracerProvider::builder()
        .with_resource(resource(config))
        .with_sampler(Sampler::AlwaysOn)
        .with_batch_exporter(exporter.build()?)
        .build();
    let tracer = provider.tracer(config.service_name.clone());

    Ok((tracer, provider))
}

/// Build an OTLP logger provider exporting over gRPC.
fn setup_otlp_logger(config: &ObservabilityConfig) -> Result<SdkLoggerProvider> {
    let mut exporter = opentelemetry_otlp::LogExporter::builder().with_tonic();
    if let Some(endpoint) = &config.otel_endpoint {
        exporter = exporter.with_endpoint(endpoint);
    }

    Ok(SdkLoggerProvider::builder()
        .with_resource(resource(config))
        .with_batch_exporter(exporter.build()?)
        .build())
}
