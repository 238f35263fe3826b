//! Plugin ↔ worker message protocol.
//!
//! Both directions travel as JSON in a `PluginMessage` payload. Every message
//! to the worker carries the caller's [`TraceContext`] so the worker's spans
//! join the same trace.

use crate::backend::{BackendRequest, BackendResponse};
use crate::observability::TraceContext;
use serde::{Deserialize, Serialize};

/// Generates constructors that capture the current trace context.
macro_rules! worker_message_builders {
    (
        $(
            $builder_name:ident($variant:ident { $($field:ident: $ty:ty),* $(,)? })
        ),* $(,)?
    ) => {
        impl WorkerMessage {
            $(
                #[doc = concat!("Creates a `", stringify!($variant), "` message with the current trace context.")]
                #[must_use]
                pub fn $builder_name($($field: $ty),*) -> Self {
                    Self::$variant {
                        $($field,)*
                        trace_context: TraceContext::from_current(),
                    }
                }
            )*
        }
    };
}

worker_message_builders! {
    execute(Execute { request: BackendRequest }),
}

/// Requests sent to the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerMessage {
    /// Runs one collaborator call against the local backend.
    Execute {
        request: BackendRequest,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        trace_context: Option<TraceContext>,
    },
}

impl WorkerMessage {
    #[must_use]
    pub const fn trace_context(&self) -> Option<&TraceContext> {
        match self {
            Self::Execute { trace_context, .. } => trace_context.as_ref(),
        }
    }
}

/// Replies from the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerResponse {
    /// The call ran; its outcome (success or collaborator error) is inside.
    Completed { response: BackendResponse },

    /// The worker could not run the call at all.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendOp, Purpose};

    #[test]
    fn message_without_trace_context_omits_the_field() {
        let message = WorkerMessage::execute(BackendRequest::new(Purpose::SignOut, BackendOp::SignOut));
        assert!(message.trace_context().is_none());

        let payload = serde_json::to_string(&message).unwrap();
        assert!(!payload.contains("trace_context"));
        let parsed: WorkerMessage = serde_json::from_str(&payload).unwrap();
        assert_eq!(parsed, message);
    }
}
