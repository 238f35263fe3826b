//! Actions representing side effects to be executed by the plugin runtime.
//!
//! The event handler returns a `Vec<Action>` after processing each event. The
//! plugin runtime executes them in order: collaborator requests go to the
//! worker or out over HTTP, timers and file reads go to the host.
//!
//! # Example
//!
//! ```rust
//! use mascotas::app::Action;
//! use mascotas::backend::{BackendOp, BackendRequest, Purpose};
//!
//! let actions = vec![
//!     Action::Backend(BackendRequest::new(Purpose::RestoreSession, BackendOp::CurrentSession)),
//!     Action::StartTimer { seconds: 3.0 },
//! ];
//! # let _ = actions;
//! ```

use crate::backend::BackendRequest;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Hides the plugin pane.
    CloseFocus,

    /// Executes a collaborator call. The response comes back as
    /// [`Event::BackendResponse`](crate::app::Event::BackendResponse).
    Backend(BackendRequest),

    /// Asks the host for one timer firing after `seconds`.
    StartTimer { seconds: f64 },

    /// Reads a photo from the host filesystem. The result comes back as
    /// [`Event::ImageLoaded`](crate::app::Event::ImageLoaded) or
    /// [`Event::ImageLoadFailed`](crate::app::Event::ImageLoadFailed).
    LoadImage { path: String },
}
