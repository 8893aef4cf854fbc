//! Subscriber and tracer provider setup

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::{SimpleSpanProcessor, TracerProvider};
use std::sync::{Arc, Mutex, OnceLock};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

static TRACER_PROVIDER: OnceLock<Arc<TracerProvider>> = OnceLock::new();

/// Span processor builders registered before initialization
type ProcessorBuilder = Box<dyn FnOnce() -> SimpleSpanProcessor + Send>;
static SPAN_PROCESSOR_BUILDERS: Mutex<Option<Vec<ProcessorBuilder>>> = Mutex::new(Some(Vec::new()));

/// How the process-wide subscriber is assembled.
#[derive(Debug, Clone)]
pub struct TelemetryOptions {
    /// Emit one JSON object per event instead of human-readable lines
    pub json: bool,
    /// Filter directive used when `RUST_LOG` is unset
    pub default_filter: String,
    /// Name given to the OpenTelemetry tracer
    pub service_name: String,
}

impl Default for TelemetryOptions {
    fn default() -> Self {
        Self {
            json: false,
            default_filter: "info,tower_http=info".to_string(),
            service_name: crate::attributes::SERVICE_NAME.to_string(),
        }
    }
}

/// Register a span processor (exporter) to attach when telemetry is initialized.
///
/// Must be called before `init_telemetry()`; later registrations are ignored
/// with a warning.
pub fn register_span_processor(builder: ProcessorBuilder) {
    let mut builders = match SPAN_PROCESSOR_BUILDERS.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    if let Some(ref mut vec) = *builders {
        vec.push(builder);
    } else {
        tracing::warn!("Attempted to register span processor after telemetry initialization");
    }
}

/// Install the global subscriber: env filter, fmt layer (pretty or JSON) and
/// an OpenTelemetry layer fed by the registered span processors.
///
/// Fails if a global subscriber is already installed.
///
/// ```rust,no_run
/// use edash_telemetry::{init_telemetry, TelemetryOptions};
///
/// init_telemetry(&TelemetryOptions::default()).expect("subscriber already set");
/// ```
pub fn init_telemetry(options: &TelemetryOptions) -> Result<(), TryInitError> {
    let builders = match SPAN_PROCESSOR_BUILDERS.lock() {
        Ok(mut guard) => guard.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    }
    .unwrap_or_default();

    let mut provider_builder = TracerProvider::builder();
    for builder in builders {
        provider_builder = provider_builder.with_span_processor(builder());
    }
    let tracer_provider = provider_builder.build();
    let tracer = tracer_provider.tracer(options.service_name.clone());
    let _ = TRACER_PROVIDER.set(Arc::new(tracer_provider));

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&options.default_filter));

    let json_layer = options.json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
    });
    let pretty_layer = (!options.json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_line_number(true)
    });

    tracing_subscriber::registry()
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .with(json_layer)
        .with(pretty_layer)
        .with(filter)
        .try_init()
}

/// Get the global tracer provider if initialized
pub fn tracer_provider() -> Option<Arc<TracerProvider>> {
    TRACER_PROVIDER.get().cloned()
}
