//! Trace context propagation across the worker boundary and out over HTTP.
//!
//! The plugin and its worker run on separate threads with separate tracing
//! subscribers, so the parent span is carried inside each
//! [`WorkerMessage`](crate::worker::WorkerMessage) and re-attached on the
//! worker side. Requests to the hosted collaborator carry the same context
//! as a W3C `traceparent` header.

use opentelemetry::trace::{SpanContext, SpanId, TraceContextExt, TraceFlags, TraceId, TraceState};
use serde::{Deserialize, Serialize};

/// Serializable parent span reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceContext {
    /// 32 lowercase hex digits.
    pub trace_id: String,

    /// 16 lowercase hex digits.
    pub parent_span_id: String,
}

impl TraceContext {
    /// Captures the span that is current on this thread, if it is sampled
    /// into OpenTelemetry.
    #[must_use]
    pub fn from_current() -> Option<Self> {
        use tracing_opentelemetry::OpenTelemetrySpanExt;

        let context = tracing::Span::current().context();
        let span = context.span();
        let span_context = span.span_context();
        if !span_context.is_valid() {
            return None;
        }

        Some(Self {
            trace_id: span_context.trace_id().to_string(),
            parent_span_id: span_context.span_id().to_string(),
        })
    }

    /// W3C `traceparent` header value, always flagged as sampled.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mascotas::observability::TraceContext;
    ///
    /// let ctx = TraceContext {
    ///     trace_id: "4bf92f3577b34da6a3ce929d0e0e4736".into(),
    ///     parent_span_id: "00f067aa0ba902b7".into(),
    /// };
    /// assert_eq!(ctx.traceparent(), "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01");
    /// ```
    #[must_use]
    pub fn traceparent(&self) -> String {
        format!("00-{}-{}-01", self.trace_id, self.parent_span_id)
    }

    /// Makes this context the remote parent of spans opened on the current
    /// thread until the guard drops. `None` if the ids do not parse.
    #[must_use]
    pub fn attach(&self) -> Option<opentelemetry::ContextGuard> {
        let trace_id = TraceId::from_hex(&self.trace_id).ok()?;
        let span_id = SpanId::from_hex(&self.parent_span_id).ok()?;

        let remote = SpanContext::new(trace_id, span_id, TraceFlags::SAMPLED, true, TraceState::default());
        Some(
            opentelemetry::Context::current()
                .with_remote_span_context(remote)
                .attach(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_ids_do_not_attach() {
        let ctx = TraceContext {
            trace_id: "not-hex".into(),
            parent_span_id: "00f067aa0ba902b7".into(),
        };
        assert!(ctx.attach().is_none());
    }

    #[test]
    fn no_subscriber_means_no_context() {
        assert!(TraceContext::from_current().is_none());
    }
}
