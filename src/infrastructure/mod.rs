//! Infrastructure layer for sandbox filesystem interactions.
//!
//! The host filesystem is mounted under `/host` in the Zellij plugin sandbox.

pub mod files;
pub mod paths;

pub use files::{load_image, SessionStore, SESSION_FILE_NAME};
pub use paths::{expand_tilde, get_data_dir, strip_host_prefix};
