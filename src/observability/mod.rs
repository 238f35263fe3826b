//! OpenTelemetry tracing with file-based export.
//!
//! ```text
//! tracing spans → tracing-opentelemetry → opentelemetry_sdk → OTLP/JSON lines → rotating file
//! ```
//!
//! Traces go to `~/.local/share/zellij/mascotas/mascotas-otlp.json` (10 MiB per
//! file, 3 backups). The level comes from the `trace_level` plugin option and
//! defaults to `info`. Passwords, access tokens and photo bytes never appear
//! in span fields.
//!
//! # Modules
//!
//! - [`init`]: subscriber installation
//! - [`context`]: parent span propagation to the worker and to HTTP requests
//! - `exporter`: the span exporter and tracer provider
//! - `otlp`: OTLP/JSON encoding
//! - `rotating`: size-rotated line file

pub mod context;
mod exporter;
pub mod init;
mod otlp;
mod rotating;

pub use context::TraceContext;
pub use init::init_tracing;
