//! Event handling and state transition logic.
//!
//! [`handle_event`] is the only place where [`AppState`] changes. It
//! pattern-matches the event, drives the relevant workflow and collects the
//! side effects the plugin runtime must perform.
//!
//! # Event Types
//!
//! - **Navigation**: `Navigate`, `KeyDown`, `KeyUp`, `FocusNext`, `FocusPrevious`
//! - **Input**: `Char`, `Backspace`, `Cycle`, `Submit`, `Escape`
//! - **Search**: `SearchMode`, `FocusSearchBar`, `FocusResults`, `ExitSearch`
//! - **System**: `Start`, `TimerFired`, `ImageLoaded`, `ImageLoadFailed`
//! - **Collaborator**: `BackendResponse`, `WorkerResponse`
//!
//! # Routing
//!
//! Every collaborator request carries a [`Purpose`]. Responses are routed by
//! purpose to the workflow that issued them; a workflow that no longer waits
//! for that purpose (torn down, or already finished) ignores the response.
//!
//! # Example
//!
//! ```rust
//! use mascotas::app::{handle_event, Action, AppState, Event};
//! use mascotas::ui::theme::Theme;
//!
//! let mut state = AppState::new(Theme::default());
//! let (_redraw, actions) = handle_event(&mut state, &Event::Start)?;
//! assert!(matches!(actions[0], Action::Backend(_)));
//! # Ok::<(), mascotas::domain::MascotasError>(())
//! ```

use super::modes::{InputMode, SearchFocus, View};
use crate::app::{Action, AppState};
use crate::backend::{BackendOp, BackendRequest, BackendResponse, Purpose};
use crate::domain::error::Result;
use crate::domain::ImageFile;
use crate::session::AuthChange;
use crate::workflows::auth::REGISTERED_NOTICE;
use crate::workflows::{FieldPatch, ProfileOutcome, RegistrationOutcome, SubmissionField, TimerOwner};
use crate::worker::WorkerResponse;

/// Events triggered by user input, host callbacks or collaborator responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Plugin loaded: restore the session and fetch the listing.
    Start,
    /// Switches to another view, tearing down the current one.
    Navigate(View),
    /// Listing: selection down. Forms: next field.
    KeyDown,
    /// Listing: selection up. Forms: previous field.
    KeyUp,
    FocusNext,
    FocusPrevious,
    /// Types a character into the focused field or the search query.
    Char(char),
    Backspace,
    /// Steps the pet type option on the publish form.
    Cycle { forward: bool },
    /// Enter: loads the photo, submits the form, or leaves the search bar.
    Submit,
    /// Listing: leaves search. Forms: back to the listing.
    Escape,
    SearchMode,
    FocusSearchBar,
    FocusResults,
    ExitSearch,
    /// Fetches the listing again.
    Refresh,
    SignOut,
    /// Hides the plugin pane.
    CloseFocus,
    /// A photo path typed on the publish form was read from disk.
    ImageLoaded(ImageFile),
    ImageLoadFailed { path: String, error: String },
    /// A host timer elapsed.
    TimerFired,
    /// A collaborator response delivered directly (hosted collaborator).
    BackendResponse(BackendResponse),
    /// A message from the background worker (local collaborator).
    WorkerResponse(WorkerResponse),
}

impl Event {
    /// Variant name without its payload. Typed characters, loaded bytes and
    /// collaborator payloads stay out of span fields.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Navigate(_) => "Navigate",
            Self::KeyDown => "KeyDown",
            Self::KeyUp => "KeyUp",
            Self::FocusNext => "FocusNext",
            Self::FocusPrevious => "FocusPrevious",
            Self::Char(_) => "Char",
            Self::Backspace => "Backspace",
            Self::Cycle { .. } => "Cycle",
            Self::Submit => "Submit",
            Self::Escape => "Escape",
            Self::SearchMode => "SearchMode",
            Self::FocusSearchBar => "FocusSearchBar",
            Self::FocusResults => "FocusResults",
            Self::ExitSearch => "ExitSearch",
            Self::Refresh => "Refresh",
            Self::SignOut => "SignOut",
            Self::CloseFocus => "CloseFocus",
            Self::ImageLoaded(_) => "ImageLoaded",
            Self::ImageLoadFailed { .. } => "ImageLoadFailed",
            Self::TimerFired => "TimerFired",
            Self::BackendResponse(_) => "BackendResponse",
            Self::WorkerResponse(_) => "WorkerResponse",
        }
    }
}

/// Processes an event, mutates application state, and returns whether a
/// redraw is needed along with the actions to execute.
///
/// Timers scheduled while handling the event are appended as
/// [`Action::StartTimer`]s after the other actions.
///
/// # Errors
///
/// Currently infallible; the signature matches the plugin runtime's error
/// propagation.
pub fn handle_event(state: &mut AppState, event: &Event) -> Result<(bool, Vec<Action>)> {
    let _span = tracing::debug_span!("handle_event", event_type = event.kind(), view = ?state.view).entered();

    let (redraw, mut actions) = dispatch(state, event)?;

    actions.extend(
        state
            .timers
            .take_unstarted()
            .into_iter()
            .map(|seconds| Action::StartTimer { seconds }),
    );

    Ok((redraw, actions))
}

#[allow(clippy::too_many_lines)]
fn dispatch(state: &mut AppState, event: &Event) -> Result<(bool, Vec<Action>)> {
    match event {
        Event::Start => {
            let mut actions = vec![Action::Backend(state.session.initialize())];
            if state.view == View::Home {
                actions.extend(state.listing.activate().map(Action::Backend));
            }
            Ok((true, actions))
        }
        Event::Navigate(target) => {
            if *target == state.view {
                return Ok((false, vec![]));
            }
            Ok((true, navigate(state, *target)))
        }
        Event::KeyDown => {
            if state.view == View::Home {
                state.listing.move_down();
            } else {
                state.focus_next();
            }
            Ok((true, vec![]))
        }
        Event::KeyUp => {
            if state.view == View::Home {
                state.listing.move_up();
            } else {
                state.focus_previous();
            }
            Ok((true, vec![]))
        }
        Event::FocusNext => {
            state.focus_next();
            Ok((true, vec![]))
        }
        Event::FocusPrevious => {
            state.focus_previous();
            Ok((true, vec![]))
        }
        Event::Char(c) => Ok((edit_focused(state, &FieldPatch::Push(*c)), vec![])),
        Event::Backspace => Ok((edit_focused(state, &FieldPatch::Pop), vec![])),
        Event::Cycle { forward } => {
            if state.view != View::Publish || state.submission_field() != SubmissionField::PetType {
                return Ok((false, vec![]));
            }
            let changed = state
                .submission
                .edit(SubmissionField::PetType, &FieldPatch::Cycle { forward: *forward });
            Ok((changed, vec![]))
        }
        Event::Submit => Ok(submit(state)),
        Event::Escape => match (state.view, state.input_mode) {
            (View::Home, InputMode::Search(_)) => dispatch(state, &Event::ExitSearch),
            (View::Home, InputMode::Normal) => Ok((false, vec![])),
            _ => Ok((true, navigate(state, View::Home))),
        },
        Event::SearchMode => {
            if state.view != View::Home {
                return Ok((false, vec![]));
            }
            tracing::debug!("entering search mode");
            state.input_mode = InputMode::Search(SearchFocus::Typing);
            state.listing.set_query("");
            Ok((true, vec![]))
        }
        Event::FocusSearchBar => {
            if !matches!(state.input_mode, InputMode::Search(_)) {
                return Ok((false, vec![]));
            }
            state.input_mode = InputMode::Search(SearchFocus::Typing);
            Ok((true, vec![]))
        }
        Event::FocusResults => {
            if !matches!(state.input_mode, InputMode::Search(_)) {
                return Ok((false, vec![]));
            }
            if state.listing.query().is_empty() {
                state.input_mode = InputMode::Normal;
            } else {
                state.input_mode = InputMode::Search(SearchFocus::Navigating);
            }
            Ok((true, vec![]))
        }
        Event::ExitSearch => {
            tracing::debug!(query = %state.listing.query(), "exiting search mode");
            state.input_mode = InputMode::Normal;
            state.listing.set_query("");
            Ok((true, vec![]))
        }
        Event::Refresh => {
            if state.view != View::Home {
                return Ok((false, vec![]));
            }
            let actions: Vec<Action> = state.listing.activate().map(Action::Backend).into_iter().collect();
            Ok((!actions.is_empty(), actions))
        }
        Event::SignOut => {
            if !state.session.is_authenticated() {
                return Ok((true, navigate(state, View::Login)));
            }
            if state.signing_out {
                return Ok((false, vec![]));
            }
            state.signing_out = true;
            Ok((
                true,
                vec![Action::Backend(BackendRequest::new(Purpose::SignOut, BackendOp::SignOut))],
            ))
        }
        Event::CloseFocus => Ok((false, vec![Action::CloseFocus])),
        Event::ImageLoaded(image) => {
            if state.view != View::Publish {
                tracing::debug!("ignoring image loaded outside the publish view");
                return Ok((false, vec![]));
            }
            if let Err(e) = state.submission.select_image(image.clone(), &mut state.previews) {
                tracing::debug!(error = %e, file = %image.file_name, "photo rejected");
            }
            Ok((true, vec![]))
        }
        Event::ImageLoadFailed { path, error } => {
            tracing::warn!(path = %path, error = %error, "failed to read photo");
            if state.view == View::Publish {
                state
                    .submission
                    .image_load_failed(format!("No se pudo leer la imagen: {error}"));
            }
            Ok((true, vec![]))
        }
        Event::TimerFired => {
            let Some(fired) = state.timers.fire() else {
                return Ok((false, vec![]));
            };
            let dismissed = match fired.owner {
                TimerOwner::Submission => state.submission.on_timer(fired.token),
                TimerOwner::Profile => state.profile.on_timer(fired.token),
                TimerOwner::Login => state.login.on_timer(fired.token),
            };
            Ok((dismissed, vec![]))
        }
        Event::BackendResponse(response) => Ok((true, route_response(state, response.clone()))),
        Event::WorkerResponse(response) => match response {
            WorkerResponse::Completed { response } => Ok((true, route_response(state, response.clone()))),
            WorkerResponse::Error { message } => {
                tracing::error!(error = %message, "worker error");
                Ok((false, vec![]))
            }
        },
    }
}

/// Tears down the current view's workflow, switches, and activates the
/// target.
fn navigate(state: &mut AppState, target: View) -> Vec<Action> {
    let _span = tracing::debug_span!("navigate", from = ?state.view, to = ?target).entered();

    match state.view {
        View::Home => {
            state.input_mode = InputMode::Normal;
            state.listing.teardown();
        }
        View::Publish => state.submission.teardown(&mut state.previews),
        View::Profile => state.profile.teardown(),
        View::Login => state.login.teardown(),
        View::Register => state.register.teardown(),
    }

    state.view = target;
    state.focus = 0;

    match target {
        View::Home => state.listing.activate().map(Action::Backend).into_iter().collect(),
        View::Profile => {
            let outcome = state.profile.activate(&state.session);
            profile_outcome(state, outcome)
        }
        View::Publish | View::Login | View::Register => vec![],
    }
}

fn profile_outcome(state: &mut AppState, outcome: ProfileOutcome) -> Vec<Action> {
    match outcome {
        ProfileOutcome::Request(request) => vec![Action::Backend(request)],
        ProfileOutcome::RedirectToLogin => navigate(state, View::Login),
        ProfileOutcome::Deferred | ProfileOutcome::Unchanged => vec![],
    }
}

fn edit_focused(state: &mut AppState, patch: &FieldPatch) -> bool {
    match state.view {
        View::Home => {
            if state.input_mode != InputMode::Search(SearchFocus::Typing) {
                return false;
            }
            match patch {
                FieldPatch::Push(c) => state.listing.push_char(*c),
                FieldPatch::Pop => state.listing.pop_char(),
                FieldPatch::Set(query) => state.listing.set_query(query.clone()),
                FieldPatch::Cycle { .. } => return false,
            }
            tracing::trace!(query = %state.listing.query(), "search query updated");
            true
        }
        View::Publish => {
            let field = state.submission_field();
            state.submission.edit(field, patch)
        }
        View::Profile => {
            let field = state.profile_field();
            state.profile.edit(field, patch)
        }
        View::Login => {
            let field = state.login_field();
            state.login.edit(field, patch)
        }
        View::Register => {
            let field = state.register_field();
            state.register.edit(field, patch)
        }
    }
}

fn submit(state: &mut AppState) -> (bool, Vec<Action>) {
    let request = match state.view {
        View::Home => {
            if state.input_mode == InputMode::Search(SearchFocus::Typing) {
                return dispatch(state, &Event::FocusResults).unwrap_or((false, vec![]));
            }
            None
        }
        View::Publish => {
            let draft = state.submission.draft();
            let path = draft.photo_path.trim();
            let already_loaded = draft.image.as_ref().is_some_and(|image| image.file_name == path);
            if state.submission_field() == SubmissionField::Photo
                && !path.is_empty()
                && !already_loaded
                && !state.submission.phase().is_loading()
            {
                return (
                    false,
                    vec![Action::LoadImage {
                        path: path.to_string(),
                    }],
                );
            }
            state.submission.submit(&state.session)
        }
        View::Profile => state.profile.update(),
        View::Login => state.login.submit(),
        View::Register => state.register.submit(),
    };
    (true, request.map(Action::Backend).into_iter().collect())
}

/// Routes a collaborator response to the workflow awaiting its purpose.
fn route_response(state: &mut AppState, response: BackendResponse) -> Vec<Action> {
    let _span = tracing::debug_span!("route_response", purpose = ?response.purpose, ok = response.result.is_ok()).entered();

    match response.purpose {
        Purpose::RestoreSession => {
            let change = match response.into_session() {
                Ok(identity) => AuthChange::Restored(identity),
                Err(message) => AuthChange::RestoreFailed(message),
            };
            state.session.apply(change);
            if state.view == View::Profile {
                let outcome = state.profile.on_session_resolved(&state.session);
                profile_outcome(state, outcome)
            } else {
                vec![]
            }
        }
        Purpose::Login => {
            let Some(identity) = state.login.on_response(response) else {
                return vec![];
            };
            state.session.apply(AuthChange::SignedIn(identity));
            if state.view == View::Login {
                navigate(state, View::Profile)
            } else {
                vec![]
            }
        }
        Purpose::RegisterSignUp | Purpose::RegisterSignIn | Purpose::RegisterProfile => {
            match state.register.on_response(response) {
                RegistrationOutcome::Ignored | RegistrationOutcome::Failed => vec![],
                RegistrationOutcome::Continue(request) => vec![Action::Backend(request)],
                RegistrationOutcome::SignedIn(identity, request) => {
                    state.session.apply(AuthChange::SignedIn(identity));
                    vec![Action::Backend(request)]
                }
                RegistrationOutcome::Registered => {
                    let actions = if state.view == View::Login {
                        vec![]
                    } else {
                        navigate(state, View::Login)
                    };
                    state.login.announce(REGISTERED_NOTICE, &mut state.timers);
                    actions
                }
            }
        }
        Purpose::SignOut => {
            state.signing_out = false;
            if let Err(message) = &response.result {
                tracing::warn!(error = %message, "sign-out failed, clearing local session anyway");
            }
            state.session.teardown();
            state.profile.teardown();
            navigate(state, View::Login)
        }
        Purpose::SubmitUpload | Purpose::SubmitPublicUrl | Purpose::SubmitInsert => state
            .submission
            .on_response(response, &mut state.previews, &mut state.timers)
            .map(Action::Backend)
            .into_iter()
            .collect(),
        Purpose::ListReports => {
            state.listing.on_fetched(response);
            vec![]
        }
        Purpose::ProfileFetch | Purpose::ProfileCreate | Purpose::ProfileStats | Purpose::ProfileUpdate => state
            .profile
            .on_response(response, &mut state.timers)
            .map(Action::Backend)
            .into_iter()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendOutput;
    use crate::domain::Identity;
    use crate::ui::theme::Theme;
    use crate::workflows::{LoginField, Phase};

    fn backend_requests(actions: &[Action]) -> Vec<&BackendRequest> {
        actions
            .iter()
            .filter_map(|action| match action {
                Action::Backend(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    fn signed_in_state() -> AppState {
        let mut state = AppState::new(Theme::default());
        handle_event(&mut state, &Event::Start).unwrap();
        handle_event(
            &mut state,
            &Event::BackendResponse(BackendResponse::ok(
                Purpose::RestoreSession,
                BackendOutput::Session(Some(Identity::new("u1", "ana@example.org"))),
            )),
        )
        .unwrap();
        state
    }

    #[test]
    fn start_restores_session_and_fetches_listing() {
        let mut state = AppState::new(Theme::default());
        let (_, actions) = handle_event(&mut state, &Event::Start).unwrap();
        let purposes: Vec<Purpose> = backend_requests(&actions).iter().map(|r| r.purpose).collect();
        assert_eq!(purposes, vec![Purpose::RestoreSession, Purpose::ListReports]);
    }

    #[test]
    fn profile_without_session_redirects_to_login() {
        let mut state = AppState::new(Theme::default());
        handle_event(&mut state, &Event::Start).unwrap();
        handle_event(
            &mut state,
            &Event::BackendResponse(BackendResponse::ok(Purpose::RestoreSession, BackendOutput::Session(None))),
        )
        .unwrap();

        let (_, actions) = handle_event(&mut state, &Event::Navigate(View::Profile)).unwrap();
        assert_eq!(state.view, View::Login);
        assert!(actions.is_empty());
        assert_eq!(state.login.phase(), &Phase::Idle);
    }

    #[test]
    fn profile_waits_for_session_restore() {
        let mut state = AppState::new(Theme::default());
        handle_event(&mut state, &Event::Start).unwrap();
        let (_, actions) = handle_event(&mut state, &Event::Navigate(View::Profile)).unwrap();
        assert!(actions.is_empty());
        assert_eq!(state.view, View::Profile);

        let (_, actions) = handle_event(
            &mut state,
            &Event::BackendResponse(BackendResponse::ok(
                Purpose::RestoreSession,
                BackendOutput::Session(Some(Identity::new("u1", "ana@example.org"))),
            )),
        )
        .unwrap();
        assert_eq!(backend_requests(&actions)[0].purpose, Purpose::ProfileFetch);
    }

    #[test]
    fn typing_goes_to_the_focused_field() {
        let mut state = AppState::new(Theme::default());
        handle_event(&mut state, &Event::Navigate(View::Login)).unwrap();
        for c in "ana@x.cl".chars() {
            handle_event(&mut state, &Event::Char(c)).unwrap();
        }
        handle_event(&mut state, &Event::FocusNext).unwrap();
        handle_event(&mut state, &Event::Char('z')).unwrap();
        assert_eq!(state.login.value(LoginField::Email), "ana@x.cl");
        assert_eq!(state.login.value(LoginField::Password), "z");
    }

    #[test]
    fn enter_on_photo_field_loads_the_image() {
        let mut state = AppState::new(Theme::default());
        handle_event(&mut state, &Event::Navigate(View::Publish)).unwrap();
        while state.submission_field() != SubmissionField::Photo {
            handle_event(&mut state, &Event::FocusNext).unwrap();
        }
        for c in "~/luna.jpg".chars() {
            handle_event(&mut state, &Event::Char(c)).unwrap();
        }
        let (_, actions) = handle_event(&mut state, &Event::Submit).unwrap();
        assert_eq!(
            actions,
            vec![Action::LoadImage {
                path: "~/luna.jpg".to_string()
            }]
        );

        handle_event(
            &mut state,
            &Event::ImageLoaded(ImageFile::from_name("luna.jpg", vec![1, 2])),
        )
        .unwrap();
        assert_eq!(state.previews.active_count(), 1);

        handle_event(&mut state, &Event::Escape).unwrap();
        assert_eq!(state.view, View::Home);
        assert_eq!(state.previews.active_count(), 0);
    }

    #[test]
    fn sign_out_clears_session_even_on_error() {
        let mut state = signed_in_state();
        handle_event(&mut state, &Event::Navigate(View::Profile)).unwrap();

        let (_, actions) = handle_event(&mut state, &Event::SignOut).unwrap();
        assert_eq!(backend_requests(&actions)[0].purpose, Purpose::SignOut);
        let (_, again) = handle_event(&mut state, &Event::SignOut).unwrap();
        assert!(again.is_empty());

        handle_event(
            &mut state,
            &Event::BackendResponse(BackendResponse::err(Purpose::SignOut, "network down")),
        )
        .unwrap();
        assert!(!state.session.is_authenticated());
        assert_eq!(state.view, View::Login);
    }

    #[test]
    fn registration_completes_on_login_with_notice_and_timer() {
        let mut state = signed_in_state();
        handle_event(&mut state, &Event::Navigate(View::Register)).unwrap();
        for text in ["Ana", "ana@example.org", "secreto", "secreto"] {
            for c in text.chars() {
                handle_event(&mut state, &Event::Char(c)).unwrap();
            }
            handle_event(&mut state, &Event::FocusNext).unwrap();
        }
        let (_, actions) = handle_event(&mut state, &Event::Submit).unwrap();
        assert_eq!(backend_requests(&actions)[0].purpose, Purpose::RegisterSignUp);

        let identity = Identity::new("u2", "ana@example.org");
        handle_event(
            &mut state,
            &Event::BackendResponse(BackendResponse::ok(
                Purpose::RegisterSignUp,
                BackendOutput::Session(Some(identity.clone())),
            )),
        )
        .unwrap();
        handle_event(
            &mut state,
            &Event::BackendResponse(BackendResponse::ok(
                Purpose::RegisterSignIn,
                BackendOutput::Session(Some(identity)),
            )),
        )
        .unwrap();
        let (_, actions) = handle_event(
            &mut state,
            &Event::BackendResponse(BackendResponse::ok(Purpose::RegisterProfile, BackendOutput::Rows(vec![]))),
        )
        .unwrap();

        assert_eq!(state.view, View::Login);
        assert_eq!(state.login.phase().notice(), Some(REGISTERED_NOTICE));
        assert_eq!(actions, vec![Action::StartTimer { seconds: 3.0 }]);

        let (redraw, _) = handle_event(&mut state, &Event::TimerFired).unwrap();
        assert!(redraw);
        assert_eq!(state.login.phase(), &Phase::Idle);
    }

    #[test]
    fn search_typing_then_navigating() {
        let mut state = AppState::new(Theme::default());
        handle_event(&mut state, &Event::SearchMode).unwrap();
        handle_event(&mut state, &Event::Char('m')).unwrap();
        assert_eq!(state.listing.query(), "m");
        handle_event(&mut state, &Event::Submit).unwrap();
        assert_eq!(state.input_mode, InputMode::Search(SearchFocus::Navigating));
        assert!(!handle_event(&mut state, &Event::Char('x')).unwrap().0);
        handle_event(&mut state, &Event::Escape).unwrap();
        assert_eq!(state.input_mode, InputMode::Normal);
        assert_eq!(state.listing.query(), "");
    }

    #[test]
    fn leaving_the_form_mid_upload_still_inserts_the_report() {
        let mut state = signed_in_state();
        handle_event(&mut state, &Event::Navigate(View::Publish)).unwrap();
        for (field, text) in [
            (SubmissionField::Description, "Gata tricolor"),
            (SubmissionField::Location, "Ñuñoa"),
            (SubmissionField::Contact, "ana@example.org"),
        ] {
            while state.submission_field() != field {
                handle_event(&mut state, &Event::FocusNext).unwrap();
            }
            for c in text.chars() {
                handle_event(&mut state, &Event::Char(c)).unwrap();
            }
        }
        handle_event(&mut state, &Event::ImageLoaded(ImageFile::from_name("luna.jpg", vec![1, 2]))).unwrap();
        let (_, actions) = handle_event(&mut state, &Event::Submit).unwrap();
        assert_eq!(backend_requests(&actions)[0].purpose, Purpose::SubmitUpload);

        handle_event(&mut state, &Event::Escape).unwrap();
        assert_eq!(state.view, View::Home);
        assert_eq!(state.previews.active_count(), 0);

        let (_, actions) = handle_event(
            &mut state,
            &Event::BackendResponse(BackendResponse::ok(
                Purpose::SubmitUpload,
                BackendOutput::Uploaded { path: "luna.jpg".into() },
            )),
        )
        .unwrap();
        assert_eq!(backend_requests(&actions)[0].purpose, Purpose::SubmitPublicUrl);

        let (_, actions) = handle_event(
            &mut state,
            &Event::BackendResponse(BackendResponse::ok(
                Purpose::SubmitPublicUrl,
                BackendOutput::PublicUrl("https://cdn/luna.jpg".into()),
            )),
        )
        .unwrap();
        let insert = backend_requests(&actions)[0];
        assert_eq!(insert.purpose, Purpose::SubmitInsert);
        let BackendOp::Insert { row, .. } = &insert.op else {
            panic!("expected insert, got {insert:?}");
        };
        assert_eq!(row["location"], "Ñuñoa");
        assert_eq!(row["user_id"], "u1");
    }

    #[test]
    fn typed_passwords_stay_out_of_spans() {
        use std::io::Write;
        use std::sync::{Arc, Mutex};
        use tracing_subscriber::fmt::format::FmtSpan;

        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl Write for Captured {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_span_events(FmtSpan::NEW)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut state = AppState::new(Theme::default());
            handle_event(&mut state, &Event::Navigate(View::Login)).unwrap();
            handle_event(&mut state, &Event::FocusNext).unwrap();
            for c in "s3cr3tZ".chars() {
                handle_event(&mut state, &Event::Char(c)).unwrap();
            }
            handle_event(&mut state, &Event::Submit).unwrap();
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("event_type=\"Char\"") || output.contains("event_type=Char"));
        assert!(!output.contains("s3cr3tZ"));
        assert!(!output.contains("'Z'"));
    }

    #[test]
    fn worker_errors_do_not_redraw() {
        let mut state = AppState::new(Theme::default());
        let (redraw, actions) = handle_event(
            &mut state,
            &Event::WorkerResponse(WorkerResponse::Error {
                message: "bad payload".into(),
            }),
        )
        .unwrap();
        assert!(!redraw);
        assert!(actions.is_empty());
    }
}
