//! Zellij plugin wrapper and entry point.
//!
//! Thin integration layer between the library and the Zellij plugin API:
//! translates host events into [`Event`]s and executes the returned
//! [`Action`]s.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │   Zellij Main Thread         │
//! │  ┌────────────────────────┐  │
//! │  │  State (plugin)        │──┼──► web_request (hosted backend)
//! │  └────────────────────────┘  │
//! │          │ IPC               │
//! │          ▼                   │
//! │  ┌────────────────────────┐  │
//! │  │ MascotasWorker         │  │  ← local JSON backend
//! │  └────────────────────────┘  │
//! └──────────────────────────────┘
//! ```
//!
//! # Keybindings
//!
//! Listing (normal mode):
//! - `j`/`Down`, `k`/`Up`: move selection
//! - `/`: search
//! - `R`: reload
//! - `p`, `u`, `l`, `r`: publish, profile, login, register
//! - `q`: close plugin
//!
//! Listing (search mode):
//! - characters: type the query
//! - `Enter`: move focus to the results
//! - `/`: back to the query
//! - `Esc`: leave search
//!
//! Forms:
//! - `Tab`/`Down`, `Shift+Tab`/`Up`: move between fields
//! - `Left`/`Right`: cycle option fields
//! - `Enter`: submit (on the photo field: load the typed path)
//! - `Esc`: back to the listing
//! - `Ctrl+l`, `Ctrl+r`: switch between login and register
//! - `Ctrl+x`: sign out

#![allow(clippy::multiple_crate_versions)]

use std::collections::BTreeMap;
use zellij_tile::prelude::*;
use zellij_tile::shim::post_message_to;

use mascotas::backend::remote::{HttpMethod, PendingCall, Prepared, TokenChange};
use mascotas::backend::{BackendRequest, RemoteClient};
use mascotas::infrastructure::{self, SessionStore, SESSION_FILE_NAME};
use mascotas::observability::TraceContext;
use mascotas::worker::{MascotasWorker, WorkerMessage, WorkerResponse, WORKER_NAME};
use mascotas::{handle_event, Action, BackendMode, Config, Event, InputMode, SearchFocus, View};

register_plugin!(State);
register_worker!(MascotasWorker, mascotas_worker, MASCOTAS_WORKER);

/// Plugin state wrapper.
struct State {
    /// Core application state from the library layer.
    app: mascotas::AppState,

    /// Hosted collaborator client; `None` runs everything on the worker.
    remote: Option<RemoteClient>,

    /// Where the hosted access token survives reloads.
    session_store: SessionStore,
}

impl Default for State {
    fn default() -> Self {
        Self {
            app: mascotas::initialize(&Config::default()),
            remote: None,
            session_store: SessionStore::new(infrastructure::get_data_dir().join(SESSION_FILE_NAME)),
        }
    }
}

impl ZellijPlugin for State {
    /// Parses configuration, requests permissions and subscribes to events.
    /// The first collaborator calls wait for the permission grant.
    fn load(&mut self, configuration: BTreeMap<String, String>) {
        let config = Config::from_zellij(&configuration);
        mascotas::observability::init_tracing(&config);

        let _guard = tracing::debug_span!("plugin_load").entered();

        self.app = mascotas::initialize(&config);
        self.remote = match config.backend {
            BackendMode::Local => None,
            BackendMode::Remote(endpoint) => {
                tracing::debug!(url = endpoint.base_url(), "using hosted backend");
                Some(RemoteClient::new(endpoint, self.session_store.load()))
            }
        };

        request_permission(&[
            PermissionType::ReadApplicationState,
            PermissionType::ChangeApplicationState,
            PermissionType::FullHdAccess,
            PermissionType::WebAccess,
        ]);

        subscribe(&[
            EventType::Key,
            EventType::CustomMessage,
            EventType::Timer,
            EventType::WebRequestResult,
            EventType::PermissionRequestResult,
        ]);

        tracing::debug!("plugin load complete - waiting for permissions");
    }

    fn update(&mut self, event: zellij_tile::prelude::Event) -> bool {
        let event_name = Self::get_event_name(&event);
        let span_name = format!("plugin_update::{event_name}");
        let span = tracing::debug_span!("plugin_update_event", otel.name = %span_name, event_type = %event_name);
        let _guard = span.entered();

        let our_event = match event {
            zellij_tile::prelude::Event::Key(ref key) => match self.map_key_event(key) {
                Some(event) => event,
                None => return false,
            },
            zellij_tile::prelude::Event::CustomMessage(message, payload) => {
                match Self::map_custom_message_event(&message, &payload) {
                    Some(event) => event,
                    None => return false,
                }
            }
            zellij_tile::prelude::Event::WebRequestResult(status, _headers, body, context) => {
                match self.map_web_result_event(status, &body, &context) {
                    Some(event) => event,
                    None => return false,
                }
            }
            zellij_tile::prelude::Event::Timer(_elapsed) => Event::TimerFired,
            zellij_tile::prelude::Event::PermissionRequestResult(PermissionStatus::Granted) => {
                tracing::debug!("permissions granted - starting");
                Event::Start
            }
            zellij_tile::prelude::Event::PermissionRequestResult(PermissionStatus::Denied) => {
                tracing::warn!("permissions denied - plugin functionality limited");
                return false;
            }
            _ => return false,
        };

        self.dispatch(&our_event)
    }

    fn render(&mut self, rows: usize, cols: usize) {
        mascotas::ui::render(&self.app, rows, cols);
    }
}

impl State {
    /// Runs one event through the library and executes the resulting actions.
    fn dispatch(&mut self, event: &Event) -> bool {
        match handle_event(&mut self.app, event) {
            Ok((should_render, actions)) => {
                tracing::debug!(action_count = actions.len(), should_render, "event handled");
                let mut render = should_render;
                for action in actions {
                    render |= self.execute_action(action);
                }
                render
            }
            Err(e) => {
                tracing::debug!(error = %e, "error handling event");
                false
            }
        }
    }

    fn get_event_name(event: &zellij_tile::prelude::Event) -> String {
        match event {
            zellij_tile::prelude::Event::Key(key) => format!("Key({})", Self::key_label(key)),
            zellij_tile::prelude::Event::CustomMessage(msg, _) => format!("CustomMessage({msg})"),
            zellij_tile::prelude::Event::WebRequestResult(status, ..) => format!("WebRequestResult({status})"),
            zellij_tile::prelude::Event::Timer(..) => "Timer".to_string(),
            zellij_tile::prelude::Event::PermissionRequestResult(..) => "PermissionRequestResult".to_string(),
            _ => "Other".to_string(),
        }
    }

    /// Key name for spans. Printable characters are collapsed so typed
    /// passwords never reach the trace file.
    fn key_label(key: &KeyWithModifier) -> String {
        match &key.bare_key {
            BareKey::Char(_) => "Char".to_string(),
            bare_key => format!("{bare_key:?}"),
        }
    }

    /// Maps keyboard events to application events for the current view.
    fn map_key_event(&self, key: &KeyWithModifier) -> Option<Event> {
        tracing::trace!(key = %Self::key_label(key), "key event");

        if key.has_modifiers(&[KeyModifier::Ctrl]) {
            return match key.bare_key {
                BareKey::Char('l') if self.app.view.is_form() => Some(Event::Navigate(View::Login)),
                BareKey::Char('r') if self.app.view.is_form() => Some(Event::Navigate(View::Register)),
                BareKey::Char('x') => Some(Event::SignOut),
                _ => None,
            };
        }

        if self.app.view == View::Home {
            self.map_listing_key(key)
        } else {
            Self::map_form_key(key)
        }
    }

    fn map_listing_key(&self, key: &KeyWithModifier) -> Option<Event> {
        let typing = self.app.input_mode == InputMode::Search(SearchFocus::Typing);

        Some(match key.bare_key {
            BareKey::Down => Event::KeyDown,
            BareKey::Up => Event::KeyUp,
            BareKey::Esc => match self.app.input_mode {
                InputMode::Search(_) => Event::ExitSearch,
                InputMode::Normal => Event::Escape,
            },
            BareKey::Enter => Event::Submit,
            BareKey::Backspace => Event::Backspace,
            BareKey::Char('/') => match self.app.input_mode {
                InputMode::Normal => Event::SearchMode,
                InputMode::Search(_) => Event::FocusSearchBar,
            },
            BareKey::Char(c) if typing => Event::Char(c),
            BareKey::Char('j') => Event::KeyDown,
            BareKey::Char('k') => Event::KeyUp,
            BareKey::Char('q') if self.app.input_mode == InputMode::Normal => Event::CloseFocus,
            BareKey::Char('R') => Event::Refresh,
            BareKey::Char(c) => {
                let target = View::NAV.into_iter().find(|view| view.shortcut() == c)?;
                Event::Navigate(target)
            }
            _ => return None,
        })
    }

    fn map_form_key(key: &KeyWithModifier) -> Option<Event> {
        if key.bare_key == BareKey::Tab && key.has_modifiers(&[KeyModifier::Shift]) {
            return Some(Event::FocusPrevious);
        }

        Some(match key.bare_key {
            BareKey::Tab | BareKey::Down => Event::FocusNext,
            BareKey::Up => Event::FocusPrevious,
            BareKey::Left => Event::Cycle { forward: false },
            BareKey::Right => Event::Cycle { forward: true },
            BareKey::Enter => Event::Submit,
            BareKey::Esc => Event::Escape,
            BareKey::Backspace => Event::Backspace,
            BareKey::Char(c) => Event::Char(c),
            _ => return None,
        })
    }

    /// Maps worker replies to application events.
    fn map_custom_message_event(message: &str, payload: &str) -> Option<Event> {
        if message != WORKER_NAME {
            tracing::debug!(message_name = %message, "ignoring custom message with unknown name");
            return None;
        }

        match serde_json::from_str::<WorkerResponse>(payload) {
            Ok(response) => Some(Event::WorkerResponse(response)),
            Err(e) => {
                tracing::debug!(error = %e, "failed to deserialize worker response");
                None
            }
        }
    }

    /// Interprets a hosted-backend reply and persists any token change.
    fn map_web_result_event(
        &mut self,
        status: u16,
        body: &[u8],
        context: &BTreeMap<String, String>,
    ) -> Option<Event> {
        let pending = PendingCall::from_context(context)?;
        let remote = self.remote.as_mut()?;
        let (response, token_change) = remote.interpret(&pending, status, body);

        let stored = match token_change {
            TokenChange::Unchanged => Ok(()),
            TokenChange::Set(token) => self.session_store.save(&token),
            TokenChange::Cleared => self.session_store.clear(),
        };
        if let Err(e) = stored {
            tracing::warn!(error = %e, "failed to persist hosted session");
        }

        Some(Event::BackendResponse(response))
    }

    fn post_worker_message(message: &WorkerMessage) {
        match serde_json::to_string(message) {
            Ok(payload) => {
                tracing::debug!(payload_len = payload.len(), "posting message to worker");
                post_message_to(PluginMessage {
                    worker_name: Some(WORKER_NAME.to_string()),
                    name: WORKER_NAME.to_string(),
                    payload,
                });
            }
            Err(e) => tracing::debug!(error = %e, "failed to serialize worker message"),
        }
    }

    /// Sends a collaborator request to whichever backend is configured.
    /// Returns whether a synchronously resolved response asked for a redraw.
    fn send_request(&mut self, request: BackendRequest) -> bool {
        let Some(remote) = &self.remote else {
            Self::post_worker_message(&WorkerMessage::execute(request));
            return false;
        };

        let traceparent = TraceContext::from_current().map(|ctx| ctx.traceparent());
        match remote.prepare(&request, traceparent) {
            Prepared::Immediate(response) => self.dispatch(&Event::BackendResponse(response)),
            Prepared::Http { call, pending } => {
                let verb = match call.method {
                    HttpMethod::Get => HttpVerb::Get,
                    HttpMethod::Post => HttpVerb::Post,
                };
                web_request(call.url, verb, call.headers, call.body, pending.to_context());
                false
            }
        }
    }

    /// Executes one action. Returns whether it produced state worth a redraw.
    #[tracing::instrument(level = "debug", skip(self))]
    fn execute_action(&mut self, action: Action) -> bool {
        match action {
            Action::CloseFocus => {
                hide_self();
                false
            }
            Action::Backend(request) => self.send_request(request),
            Action::StartTimer { seconds } => {
                set_timeout(seconds);
                false
            }
            Action::LoadImage { path } => {
                let event = match infrastructure::load_image(&path) {
                    Ok(image) => Event::ImageLoaded(image),
                    Err(e) => Event::ImageLoadFailed {
                        path,
                        error: e.to_string(),
                    },
                };
                self.dispatch(&event)
            }
        }
    }
}
