//! Telemetry bootstrap.
//!
//! Wires the tracing subscriber to OpenTelemetry logs, traces, and metrics.
//! All three signals export over OTLP when `OTEL_EXPORTER_OTLP_ENDPOINT` is
//! set, and to stdout otherwise. The returned guard flushes the providers on
//! drop.

use std::env;
use std::sync::OnceLock;
use std::time::Duration;

use opentelemetry::global;
use opentelemetry::metrics::Meter;
use opentelemetry::trace::TracerProvider;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::logs::{BatchLogProcessor, SdkLoggerProvider};
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{BatchSpanProcessor, SdkTracerProvider};
use tracing::subscriber;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Initialize telemetry and return the guard that flushes on shutdown.
pub fn init() -> Result<TelemetryGuard, anyhow::Error> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    let endpoint = env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok();
    let resource = Resource::builder()
        .with_service_name(service_name())
        .build();

    let logger_provider = build_logger_provider(&resource, endpoint.as_deref());
    let tracer_provider = build_tracer_provider(&resource, endpoint.as_deref());
    let meter_provider = build_meter_provider(&resource, endpoint.as_deref());

    // Keep HTTP client internals out of the exported logs.
    let mut log_filter = EnvFilter::new("info");
    for directive in ["hyper=off", "tonic=off", "h2=off", "reqwest=off"] {
        log_filter = log_filter.add_directive(directive.parse()?);
    }
    let log_layer = OpenTelemetryTracingBridge::new(&logger_provider).with_filter(log_filter);
    let trace_layer = OpenTelemetryLayer::new(tracer_provider.tracer(service_name()))
        .with_filter(EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_filter(EnvFilter::new("info"));

    subscriber::set_global_default(
        tracing_subscriber::registry()
            .with(log_layer)
            .with(trace_layer)
            .with(fmt_layer),
    )?;

    global::set_tracer_provider(tracer_provider.clone());
    global::set_meter_provider(meter_provider.clone());

    Ok(TelemetryGuard {
        logger_provider,
        tracer_provider,
        meter_provider,
    })
}

/// Process-wide meter for counters.
pub fn meter() -> &'static Meter {
    static METER: OnceLock<Meter> = OnceLock::new();
    METER.get_or_init(|| global::meter(service_name()))
}

fn service_name() -> &'static str {
    static NAME: OnceLock<String> = OnceLock::new();
    NAME.get_or_init(|| {
        env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "travel-agent".to_owned())
    })
}

/// Flushes and shuts down the telemetry providers when dropped.
pub struct TelemetryGuard {
    logger_provider: SdkLoggerProvider,
    tracer_provider: SdkTracerProvider,
    meter_provider: SdkMeterProvider,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Err(e) = self.logger_provider.shutdown() {
            eprintln!("Log provider shutdown failed: {e}");
        }
        if let Err(e) = self.tracer_provider.shutdown() {
            eprintln!("Trace provider shutdown failed: {e}");
        }
        if let Err(e) = self.meter_provider.shutdown() {
            eprintln!("Meter provider shutdown failed: {e}");
        }
    }
}

fn build_logger_provider(resource: &Resource, endpoint: Option<&str>) -> SdkLoggerProvider {
    let processor = match endpoint {
        Some(endpoint) => {
            let exporter = opentelemetry_otlp::LogExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint)
                .build()
                .expect("Failed to build OTLP log exporter");
            BatchLogProcessor::builder(exporter).build()
        }
        None => BatchLogProcessor::builder(opentelemetry_stdout::LogExporter::default()).build(),
    };
    SdkLoggerProvider::builder()
        .with_log_processor(processor)
        .with_resource(resource.clone())
        .build()
}

fn build_tracer_provider(resource: &Resource, endpoint: Option<&str>) -> SdkTracerProvider {
    let batch_config = opentelemetry_sdk::trace::BatchConfigBuilder::default()
        .with_scheduled_delay(Duration::from_secs(1))
        .build();
    match endpoint {
        Some(endpoint) => {
            let exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint)
                .build()
                .expect("Failed to build OTLP span exporter");
            SdkTracerProvider::builder()
                .with_span_processor(BatchSpanProcessor::new(exporter, batch_config))
                .with_resource(resource.clone())
                .build()
        }
        None => SdkTracerProvider::builder()
            .with_span_processor(BatchSpanProcessor::new(
                opentelemetry_stdout::SpanExporter::default(),
                batch_config,
            ))
            .with_resource(resource.clone())
            .build(),
    }
}

fn build_meter_provider(resource: &Resource, endpoint: Option<&str>) -> SdkMeterProvider {
    match endpoint {
        Some(endpoint) => {
            let exporter = opentelemetry_otlp::MetricExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint)
                .build()
                .expect("Failed to build OTLP metric exporter");
            SdkMeterProvider::builder()
                .with_reader(
                    PeriodicReader::builder(exporter)
                        .with_interval(Duration::from_secs(5))
                        .build(),
                )
                .with_resource(resource.clone())
                .build()
        }
        None => SdkMeterProvider::builder()
            .with_reader(
                PeriodicReader::builder(opentelemetry_stdout::MetricExporter::builder().build())
                    .with_interval(Duration::from_secs(5))
                    .build(),
            )
            .with_resource(resource.clone())
            .build(),
    }
}
