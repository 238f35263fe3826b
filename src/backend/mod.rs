//! Collaborator layer: the backend-as-a-service the application delegates to.
//!
//! # Modules
//!
//! - `capability`: the [`Backend`] trait and query types
//! - `request`: serializable requests/responses tagged with a [`Purpose`]
//! - `json`: local file-backed collaborator run on the worker thread
//! - `remote`: HTTP translation for the hosted collaborator

pub mod capability;
pub mod json;
pub mod remote;
pub mod request;

pub use capability::{Backend, Filter, Order, Query, PHOTO_BUCKET, PROFILES_TABLE, REPORTS_TABLE};
pub use json::JsonBackend;
pub use remote::{RemoteClient, RemoteEndpoint};
pub use request::{BackendOp, BackendOutput, BackendRequest, BackendResponse, Purpose};
