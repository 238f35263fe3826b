//! Application layer coordinating state, events, and actions.
//!
//! Sits between the plugin runtime (`main.rs`) and the workflows. Nothing in
//! here performs I/O: the handler returns [`Action`]s and the runtime executes
//! them.
//!
//! ```text
//! User Input → Events → Event Handler → Workflow Mutations → Actions → Side Effects
//!                           ↑                                     ↓
//!                           └──── Collaborator Responses / Timers ┘
//! ```
//!
//! # Modules
//!
//! - [`actions`]: Side effect commands emitted by the event handler
//! - [`handler`]: Event processing and response routing by purpose
//! - [`modes`]: Views and listing input modes
//! - [`state`]: Central application state and view model computation

pub mod actions;
pub mod handler;
pub mod modes;
pub mod state;

pub use actions::Action;
pub use handler::{handle_event, Event};
pub use modes::{InputMode, SearchFocus, View};
pub use state::AppState;
