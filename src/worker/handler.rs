//! Worker thread running collaborator calls against the local backend.
//!
//! Zellij workers receive serialized messages and reply through
//! `post_message_to_plugin`. [`MascotasWorker`] owns the [`JsonBackend`]
//! for its whole lifetime, so the backend file has exactly one writer.

use crate::backend::{Backend, BackendResponse, JsonBackend};
use crate::domain::error::{MascotasError, Result};
use crate::infrastructure::paths;
use crate::worker::{WorkerMessage, WorkerResponse};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use zellij_tile::prelude::{PluginMessage, ZellijWorker};
use zellij_tile::shim::post_message_to_plugin;

/// File name of the local backend store inside the data directory.
pub const BACKEND_FILE_NAME: &str = "backend.json";

/// Message name the worker replies under.
pub const WORKER_NAME: &str = "mascotas";

#[derive(Serialize, Deserialize, Default)]
pub struct MascotasWorker {
    #[serde(skip)]
    backend: Option<Box<dyn Backend>>,
}

impl std::fmt::Debug for MascotasWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MascotasWorker")
            .field("initialized", &self.backend.is_some())
            .finish()
    }
}

impl MascotasWorker {
    /// Opens the local backend in the plugin data directory.
    ///
    /// # Errors
    ///
    /// Returns a storage or I/O error if the backend file cannot be opened.
    pub fn new() -> Result<Self> {
        let backend = JsonBackend::new(paths::get_data_dir().join(BACKEND_FILE_NAME))?;
        Ok(Self::with_backend(Box::new(backend)))
    }

    /// Worker over an explicit backend.
    #[must_use]
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    fn backend(&mut self) -> Result<&mut Box<dyn Backend>> {
        if self.backend.is_none() {
            tracing::debug!("opening local backend");
            self.backend = Self::new()?.backend;
        }
        self.backend
            .as_mut()
            .ok_or_else(|| MascotasError::Worker("backend not initialized".to_string()))
    }

    /// Runs one message and returns the reply.
    pub fn handle_message(&mut self, message: WorkerMessage) -> WorkerResponse {
        let _context_guard = message.trace_context().and_then(|ctx| ctx.attach());

        match message {
            WorkerMessage::Execute { request, .. } => {
                let _span = tracing::debug_span!("worker_execute",
                    purpose = ?request.purpose,
                    op = request.op.name()
                )
                .entered();

                match self.backend() {
                    Ok(backend) => {
                        let response = request.execute(backend.as_mut());
                        if let Err(message) = &response.result {
                            tracing::debug!(error = %message, "collaborator call failed");
                        }
                        WorkerResponse::Completed { response }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to open local backend");
                        WorkerResponse::Completed {
                            response: BackendResponse::err(
                                request.purpose,
                                format!("No se pudo abrir el almacenamiento local: {e}"),
                            ),
                        }
                    }
                }
            }
        }
    }
}

static WORKER_TRACING_INITIALIZED: AtomicBool = AtomicBool::new(false);

fn init_worker_tracing() {
    if !WORKER_TRACING_INITIALIZED.swap(true, Ordering::Relaxed) {
        crate::observability::init_tracing(&crate::Config::default());
    }
}

impl ZellijWorker<'_> for MascotasWorker {
    fn on_message(&mut self, message: String, payload: String) {
        init_worker_tracing();

        let response = match serde_json::from_str::<WorkerMessage>(&payload) {
            Ok(worker_message) => self.handle_message(worker_message),
            Err(e) => {
                tracing::debug!(error = %e, "failed to deserialize worker message");
                WorkerResponse::Error {
                    message: format!("invalid worker message: {e}"),
                }
            }
        };

        match serde_json::to_string(&response) {
            Ok(payload) => post_message_to_plugin(PluginMessage {
                name: message,
                payload,
                worker_name: None,
            }),
            Err(e) => tracing::debug!(error = %e, "failed to serialize worker response"),
        }
    }
}
