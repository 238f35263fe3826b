//! Subscriber setup.

use super::exporter;
use crate::infrastructure::paths;
use crate::Config;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_sdk::resource::Resource;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Service name attached to every exported span.
pub const SERVICE_NAME: &str = "Mascotas";

/// File name of the trace export inside the data directory.
pub const TRACE_FILE_NAME: &str = "mascotas-otlp.json";

/// Installs the global subscriber: an [`EnvFilter`] built from
/// `config.trace_level` (default `info`) feeding an OpenTelemetry layer that
/// exports to `<data dir>/mascotas-otlp.json`.
///
/// Safe to call more than once; only the first call installs a subscriber.
/// Does nothing if the data directory cannot be created.
///
/// # Example
///
/// ```rust
/// use mascotas::observability::init_tracing;
/// use mascotas::Config;
///
/// let config = Config {
///     trace_level: Some("debug".to_string()),
///     ..Default::default()
/// };
/// init_tracing(&config);
/// tracing::debug!("tracing is now active");
/// ```
pub fn init_tracing(config: &Config) {
    let level = config.trace_level.as_deref().unwrap_or("info");

    let data_dir = paths::get_data_dir();
    if std::fs::create_dir_all(&data_dir).is_err() {
        return;
    }

    let resource = Resource::new(vec![
        KeyValue::new("service.name", SERVICE_NAME),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
    ]);
    let provider = exporter::file_tracer_provider(data_dir.join(TRACE_FILE_NAME), resource);

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new(level))
        .with(OpenTelemetryLayer::new(provider.tracer(SERVICE_NAME)))
        .try_init();
}
