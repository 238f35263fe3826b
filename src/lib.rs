//! Mascotas: a Zellij plugin for publishing and browsing lost-pet reports.
//!
//! The plugin provides:
//! - A searchable listing of every published report, newest first
//! - A publish form with photo upload and preview
//! - A profile view that creates the user's profile row on first visit
//! - Email/password login and registration
//!
//! Persistence, authentication and file storage are delegated to a
//! backend-as-a-service "collaborator": either a local JSON store run on a
//! Zellij worker thread, or a hosted service reached over HTTP.

#![allow(clippy::multiple_crate_versions)]

//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Zellij Plugin Shim (main.rs)                       │  ← Entry point
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Application Layer (app/)                           │  ← Events → Actions
//! │  Workflows (workflows/) + Session (session)         │  ← Business logic
//! └─────────────────────────────────────────────────────┘
//!         │                    │                    │
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ UI Layer      │   │ Backend Layer │   │ Worker Layer  │
//! │ (ui/)         │   │ (backend/)    │   │ (worker/)     │
//! │ - Rendering   │   │ - Capability  │   │ - Local store │
//! │ - Theming     │   │ - JSON store  │   │ - IPC bridge  │
//! │ - Components  │   │ - HTTP client │   │               │
//! └───────────────┘   └───────────────┘   └───────────────┘
//!         │                    │                    │
//! ┌─────────────────────────────────────────────────────┐
//! │  Infrastructure & Domain Layers                     │
//! │  - Sandbox paths and host files (infrastructure/)   │
//! │  - Reports, identities, errors (domain/)            │
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Observability (observability/)                     │
//! │  - OpenTelemetry tracing to a rotating OTLP file    │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Configuration
//!
//! ```kdl
//! pane {
//!     plugin location="file:/path/to/mascotas.wasm" {
//!         backend "remote"
//!         backend_url "https://xyz.supabase.co"
//!         backend_anon_key "eyJhbGciOi..."
//!         theme "catppuccin-latte"
//!         trace_level "debug"
//!     }
//! }
//! ```
//!
//! Without `backend` (or with `backend "local"`) everything is stored under
//! `~/.local/share/zellij/mascotas`.
//!
//! # Example
//!
//! ```rust
//! use mascotas::{handle_event, initialize, Action, Config, Event, View};
//!
//! let mut state = initialize(&Config::default());
//! let (_, actions) = handle_event(&mut state, &Event::Start)?;
//! assert!(matches!(actions.as_slice(), [Action::Backend(_), ..]));
//!
//! handle_event(&mut state, &Event::Navigate(View::Login))?;
//! assert_eq!(state.view, View::Login);
//! # Ok::<(), mascotas::MascotasError>(())
//! ```

pub mod app;
pub mod backend;
pub mod domain;
pub mod infrastructure;
pub mod observability;
pub mod session;
pub mod ui;
pub mod worker;
pub mod workflows;

pub use app::{handle_event, Action, AppState, Event, InputMode, SearchFocus, View};
pub use backend::RemoteEndpoint;
pub use domain::{MascotasError, Report, Result};
pub use ui::Theme;

use std::collections::BTreeMap;

/// Which collaborator serves the plugin.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BackendMode {
    /// JSON store on the worker thread.
    #[default]
    Local,
    /// Hosted service over HTTP.
    Remote(RemoteEndpoint),
}

/// Plugin configuration parsed from Zellij's configuration map.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub backend: BackendMode,

    /// Built-in theme name. Ignored if `theme_file` is set.
    pub theme_name: Option<String>,

    /// Path to a custom TOML theme file. See [`ui::theme`] for the format.
    pub theme_file: Option<String>,

    /// Tracing filter (`trace`, `debug`, `info`, `warn`, `error`). Default: `info`
    pub trace_level: Option<String>,
}

impl Config {
    /// Parses configuration from Zellij's configuration map.
    ///
    /// - `backend`: `local` (default) or `remote`
    /// - `backend_url`, `backend_anon_key`: required by `remote`
    /// - `theme`, `theme_file`, `trace_level`: passed through
    ///
    /// A `remote` backend with a missing or invalid URL or key falls back to
    /// `local` with a warning, so a bad configuration never leaves the plugin
    /// without a collaborator.
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use mascotas::{BackendMode, Config};
    ///
    /// let mut map = BTreeMap::new();
    /// map.insert("backend".to_string(), "remote".to_string());
    /// map.insert("backend_url".to_string(), "https://xyz.supabase.co".to_string());
    /// map.insert("backend_anon_key".to_string(), "anon".to_string());
    ///
    /// let config = Config::from_zellij(&map);
    /// assert!(matches!(config.backend, BackendMode::Remote(_)));
    /// ```
    #[must_use]
    pub fn from_zellij(config: &BTreeMap<String, String>) -> Self {
        let non_empty = |key: &str| {
            config
                .get(key)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(String::from)
        };

        let backend = match non_empty("backend").as_deref() {
            None | Some("local") => BackendMode::Local,
            Some("remote") => Self::remote_backend(non_empty("backend_url"), non_empty("backend_anon_key")),
            Some(other) => {
                tracing::warn!(backend = %other, "unknown backend, using local");
                BackendMode::Local
            }
        };

        Self {
            backend,
            theme_name: non_empty("theme"),
            theme_file: non_empty("theme_file"),
            trace_level: non_empty("trace_level"),
        }
    }

    fn remote_backend(url: Option<String>, anon_key: Option<String>) -> BackendMode {
        let (Some(url), Some(anon_key)) = (url, anon_key) else {
            tracing::warn!("remote backend needs backend_url and backend_anon_key, using local");
            return BackendMode::Local;
        };

        match RemoteEndpoint::new(&url, &anon_key) {
            Ok(endpoint) => BackendMode::Remote(endpoint),
            Err(e) => {
                tracing::warn!(error = %e, "invalid remote backend configuration, using local");
                BackendMode::Local
            }
        }
    }
}

/// Builds the initial application state: theme resolved from the file, the
/// name, or the default, in that order. The session starts out loading; the
/// runtime sends [`Event::Start`] once permissions are granted.
#[must_use]
pub fn initialize(config: &Config) -> AppState {
    tracing::debug!("initializing mascotas plugin");

    let theme = config.theme_file.as_ref().map_or_else(
        || {
            config.theme_name.as_ref().map_or_else(Theme::default, |theme_name| {
                Theme::from_name(theme_name).unwrap_or_else(|| {
                    tracing::debug!(theme_name = %theme_name, "unknown theme, using default");
                    Theme::default()
                })
            })
        },
        |theme_file| {
            let path = infrastructure::expand_tilde(theme_file);
            Theme::from_file(&path).unwrap_or_else(|e| {
                tracing::debug!(theme_file = %theme_file, error = %e, "failed to load theme from file, using default");
                Theme::default()
            })
        },
    );

    AppState::new(theme)
}
