//! Background worker running the local collaborator.
//!
//! - `messages`: request/response protocol with trace context propagation
//! - `handler`: worker implementation over [`JsonBackend`](crate::backend::JsonBackend)

pub mod handler;
pub mod messages;

pub use handler::{MascotasWorker, WORKER_NAME};
pub use messages::{WorkerMessage, WorkerResponse};
