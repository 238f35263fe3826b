//! Span exporter writing OTLP/JSON lines to a rotating file.

use super::otlp;
use super::rotating::RotatingFile;
use futures_util::future::BoxFuture;
use opentelemetry::trace::TraceError;
use opentelemetry_sdk::export::trace::{ExportResult, SpanData, SpanExporter};
use opentelemetry_sdk::resource::Resource;
use opentelemetry_sdk::trace::TracerProvider;
use std::path::PathBuf;

#[derive(Debug)]
struct OtlpFileExporter {
    file: RotatingFile,
    resource: Resource,
    shut_down: bool,
}

impl SpanExporter for OtlpFileExporter {
    fn export(&mut self, batch: Vec<SpanData>) -> BoxFuture<'static, ExportResult> {
        let result = if self.shut_down {
            Err(TraceError::from("trace exporter already shut down"))
        } else {
            let line = otlp::encode_batch(&self.resource, &batch).to_string();
            self.file
                .append_line(&line)
                .map_err(|e| TraceError::from(e.to_string()))
        };
        Box::pin(std::future::ready(result))
    }

    fn shutdown(&mut self) {
        self.shut_down = true;
    }

    fn set_resource(&mut self, resource: &Resource) {
        self.resource = resource.clone();
    }
}

/// Builds a provider that exports every span synchronously to `file_path`.
pub fn file_tracer_provider(file_path: PathBuf, resource: Resource) -> TracerProvider {
    let exporter = OtlpFileExporter {
        file: RotatingFile::new(file_path),
        resource: resource.clone(),
        shut_down: false,
    };

    TracerProvider::builder()
        .with_config(opentelemetry_sdk::trace::Config::default().with_resource(resource))
        .with_simple_exporter(exporter)
        .build()
}
