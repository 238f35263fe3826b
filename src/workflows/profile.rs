//! The signed-in user's profile.
//!
//! Activation runs a guarded fetch-or-create of the identity's profile row,
//! then counts the identity's own reports. The profile form saves with an
//! upsert.

use super::phase::Phase;
use super::timer::{TimerOwner, TimerToken, Timers, NOTICE_DISPLAY_SECS};
use super::{is_blank, FieldPatch};
use crate::backend::{BackendOp, BackendRequest, BackendResponse, Purpose, Query, PROFILES_TABLE, REPORTS_TABLE};
use crate::domain::{Identity, ReportStats, ReportStatus, UserProfile, ValidationError};
use crate::session::SessionContext;
use serde_json::Value;

/// Notice shown after saving the profile.
pub const UPDATED_NOTICE: &str = "Perfil actualizado correctamente";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    DisplayName,
    Email,
}

impl ProfileField {
    pub const ALL: [Self; 2] = [Self::DisplayName, Self::Email];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::DisplayName => "Nombre",
            Self::Email => "Email",
        }
    }
}

/// What activating the profile view led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileOutcome {
    Request(BackendRequest),
    /// No identity: the view must send the user to login.
    RedirectToLogin,
    /// The session is still being restored; activation resumes once it is.
    Deferred,
    /// A load is already running.
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Fetching,
    Creating,
    Counting,
    Saving,
}

impl Stage {
    const fn purpose(self) -> Purpose {
        match self {
            Self::Fetching => Purpose::ProfileFetch,
            Self::Creating => Purpose::ProfileCreate,
            Self::Counting => Purpose::ProfileStats,
            Self::Saving => Purpose::ProfileUpdate,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfileWorkflow {
    identity: Option<Identity>,
    profile: Option<UserProfile>,
    stats: Option<ReportStats>,
    display_name: String,
    email: String,
    phase: Phase,
    stage: Option<Stage>,
    deferred: bool,
}

impl ProfileWorkflow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    #[must_use]
    pub const fn stats(&self) -> Option<ReportStats> {
        self.stats
    }

    #[must_use]
    pub const fn phase(&self) -> &Phase {
        &self.phase
    }

    #[must_use]
    pub const fn is_deferred(&self) -> bool {
        self.deferred
    }

    #[must_use]
    pub fn value(&self, field: ProfileField) -> &str {
        match field {
            ProfileField::DisplayName => &self.display_name,
            ProfileField::Email => &self.email,
        }
    }

    /// Begins loading the profile of the session's identity.
    pub fn activate(&mut self, session: &SessionContext) -> ProfileOutcome {
        let _span = tracing::debug_span!("profile_activate").entered();

        if session.is_loading() {
            tracing::debug!("session still loading, deferring profile load");
            self.deferred = true;
            return ProfileOutcome::Deferred;
        }
        self.deferred = false;

        let Some(identity) = session.identity() else {
            tracing::debug!("no identity, redirecting to login");
            return ProfileOutcome::RedirectToLogin;
        };

        if self.stage.is_some() {
            return ProfileOutcome::Unchanged;
        }

        self.identity = Some(identity.clone());
        self.stage = Some(Stage::Fetching);
        self.phase = Phase::Loading;
        ProfileOutcome::Request(BackendRequest::new(
            Purpose::ProfileFetch,
            BackendOp::Select {
                table: PROFILES_TABLE.to_string(),
                query: Query::all().eq("id", identity.id.clone()),
            },
        ))
    }

    /// Resumes a deferred activation once the session has resolved.
    pub fn on_session_resolved(&mut self, session: &SessionContext) -> ProfileOutcome {
        if self.deferred {
            self.activate(session)
        } else {
            ProfileOutcome::Unchanged
        }
    }

    /// Applies a patch. No-op while loading or saving.
    pub fn edit(&mut self, field: ProfileField, patch: &FieldPatch) -> bool {
        if self.phase.is_loading() {
            return false;
        }
        match field {
            ProfileField::DisplayName => patch.apply_to(&mut self.display_name),
            ProfileField::Email => patch.apply_to(&mut self.email),
        }
        self.phase.on_edit();
        true
    }

    /// Saves the form with an upsert.
    pub fn update(&mut self) -> Option<BackendRequest> {
        let _span = tracing::debug_span!("profile_update").entered();

        if self.phase.is_loading() {
            return None;
        }
        let id = self.profile.as_ref()?.id.clone();

        let missing = ProfileField::ALL
            .into_iter()
            .find(|field| is_blank(self.value(*field)));
        if let Some(field) = missing {
            self.phase.fail(ValidationError::MissingField(field.label()).to_string());
            return None;
        }

        let row = UserProfile {
            id,
            display_name: self.display_name.trim().to_string(),
            email: self.email.trim().to_string(),
        };
        let row = match serde_json::to_value(&row) {
            Ok(row) => row,
            Err(e) => {
                self.phase.fail(e.to_string());
                return None;
            }
        };

        self.stage = Some(Stage::Saving);
        self.phase = Phase::Loading;
        Some(BackendRequest::new(
            Purpose::ProfileUpdate,
            BackendOp::Upsert {
                table: PROFILES_TABLE.to_string(),
                row,
            },
        ))
    }

    /// Routes a response to the step awaiting it.
    pub fn on_response(&mut self, response: BackendResponse, timers: &mut Timers) -> Option<BackendRequest> {
        let _span = tracing::debug_span!("profile_on_response", purpose = ?response.purpose).entered();

        let Some(stage) = self.stage.filter(|stage| stage.purpose() == response.purpose) else {
            tracing::debug!("ignoring response, step not pending");
            return None;
        };

        let rows = match response.into_rows() {
            Ok(rows) => rows,
            Err(message) => {
                self.stage = None;
                self.phase.fail(message);
                return None;
            }
        };

        match stage {
            Stage::Fetching => match first_profile(rows) {
                Some(profile) => self.loaded(profile),
                None => self.create(),
            },
            Stage::Creating => {
                match first_profile(rows).or_else(|| self.identity.as_ref().map(UserProfile::placeholder)) {
                    Some(profile) => self.loaded(profile),
                    None => {
                        self.stage = None;
                        self.phase = Phase::Idle;
                        None
                    }
                }
            }
            Stage::Counting => {
                let found = rows
                    .iter()
                    .filter_map(|row| row.get("status").cloned())
                    .filter(|status| serde_json::from_value::<ReportStatus>(status.clone()).ok() == Some(ReportStatus::Found))
                    .count();
                self.stats = Some(ReportStats {
                    total: rows.len(),
                    found,
                });
                self.stage = None;
                self.phase = Phase::Idle;
                None
            }
            Stage::Saving => {
                if let Some(profile) = first_profile(rows) {
                    self.display_name.clone_from(&profile.display_name);
                    self.email.clone_from(&profile.email);
                    self.profile = Some(profile);
                } else if let Some(profile) = self.profile.as_mut() {
                    profile.display_name.clone_from(&self.display_name);
                    profile.email.clone_from(&self.email);
                }
                self.stage = None;
                self.phase = Phase::Success {
                    notice: UPDATED_NOTICE.to_string(),
                    timer: timers.schedule(TimerOwner::Profile, NOTICE_DISPLAY_SECS),
                };
                None
            }
        }
    }

    pub fn on_timer(&mut self, token: TimerToken) -> bool {
        self.phase.on_timer(token)
    }

    /// Forgets everything, including pending steps and notices.
    pub fn teardown(&mut self) {
        *self = Self::default();
    }

    /// Creates the missing row. The stage guard means at most one create is
    /// ever in flight from this client.
    fn create(&mut self) -> Option<BackendRequest> {
        let identity = self.identity.as_ref()?;
        let row = serde_json::to_value(UserProfile::placeholder(identity)).ok()?;
        tracing::debug!(user_id = %identity.id, "creating missing profile");

        self.stage = Some(Stage::Creating);
        Some(BackendRequest::new(
            Purpose::ProfileCreate,
            BackendOp::Insert {
                table: PROFILES_TABLE.to_string(),
                row,
            },
        ))
    }

    fn loaded(&mut self, profile: UserProfile) -> Option<BackendRequest> {
        self.display_name.clone_from(&profile.display_name);
        self.email.clone_from(&profile.email);
        let user_id = profile.id.clone();
        self.profile = Some(profile);

        self.stage = Some(Stage::Counting);
        Some(BackendRequest::new(
            Purpose::ProfileStats,
            BackendOp::Select {
                table: REPORTS_TABLE.to_string(),
                query: Query::all().eq("user_id", user_id),
            },
        ))
    }
}

fn first_profile(rows: Vec<Value>) -> Option<UserProfile> {
    rows.into_iter().find_map(|row| match serde_json::from_value(row) {
        Ok(profile) => Some(profile),
        Err(e) => {
            tracing::warn!(error = %e, "skipping malformed profile row");
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendOutput;
    use crate::session::AuthChange;
    use serde_json::json;

    fn signed_in() -> SessionContext {
        let mut session = SessionContext::new();
        session.apply(AuthChange::SignedIn(Identity::new("u1", "ana@example.org")));
        session
    }

    fn rows(purpose: Purpose, rows: Vec<Value>) -> BackendResponse {
        BackendResponse::ok(purpose, BackendOutput::Rows(rows))
    }

    fn request(outcome: ProfileOutcome) -> BackendRequest {
        match outcome {
            ProfileOutcome::Request(request) => request,
            other => panic!("expected request, got {other:?}"),
        }
    }

    #[test]
    fn missing_identity_redirects() {
        let mut session = SessionContext::new();
        session.apply(AuthChange::Restored(None));
        let mut profile = ProfileWorkflow::new();
        assert_eq!(profile.activate(&session), ProfileOutcome::RedirectToLogin);
        assert_eq!(profile.phase(), &Phase::Idle);
    }

    #[test]
    fn activation_waits_for_the_session() {
        let mut session = SessionContext::new();
        let mut profile = ProfileWorkflow::new();
        assert_eq!(profile.activate(&session), ProfileOutcome::Deferred);

        session.apply(AuthChange::Restored(Some(Identity::new("u1", "a@b.c"))));
        let fetch = request(profile.on_session_resolved(&session));
        assert_eq!(fetch.purpose, Purpose::ProfileFetch);
    }

    #[test]
    fn absent_row_is_created_once_with_session_email() {
        let session = signed_in();
        let mut timers = Timers::new();
        let mut profile = ProfileWorkflow::new();

        request(profile.activate(&session));
        assert_eq!(profile.activate(&session), ProfileOutcome::Unchanged);

        let create = profile
            .on_response(rows(Purpose::ProfileFetch, vec![]), &mut timers)
            .unwrap();
        let BackendOp::Insert { table, row } = &create.op else {
            panic!("expected insert, got {create:?}");
        };
        assert_eq!(table, PROFILES_TABLE);
        assert_eq!(row, &json!({"id": "u1", "display_name": "", "email": "ana@example.org"}));

        // A duplicate fetch response cannot trigger a second create.
        assert!(profile
            .on_response(rows(Purpose::ProfileFetch, vec![]), &mut timers)
            .is_none());

        let stats = profile
            .on_response(rows(Purpose::ProfileCreate, vec![row.clone()]), &mut timers)
            .unwrap();
        assert_eq!(stats.purpose, Purpose::ProfileStats);
        assert_eq!(profile.value(ProfileField::Email), "ana@example.org");
        assert_eq!(profile.value(ProfileField::DisplayName), "");
    }

    #[test]
    fn counts_own_and_found_reports() {
        let session = signed_in();
        let mut timers = Timers::new();
        let mut profile = ProfileWorkflow::new();
        request(profile.activate(&session));
        profile.on_response(
            rows(Purpose::ProfileFetch, vec![json!({"id": "u1", "display_name": "Ana", "email": "ana@example.org"})]),
            &mut timers,
        );
        profile.on_response(
            rows(
                Purpose::ProfileStats,
                vec![json!({"status": "lost"}), json!({"status": "found"}), json!({"status": "found"})],
            ),
            &mut timers,
        );
        assert_eq!(profile.stats(), Some(ReportStats { total: 3, found: 2 }));
        assert_eq!(profile.phase(), &Phase::Idle);
    }

    #[test]
    fn update_upserts_and_shows_notice() {
        let session = signed_in();
        let mut timers = Timers::new();
        let mut profile = ProfileWorkflow::new();
        request(profile.activate(&session));
        profile.on_response(
            rows(Purpose::ProfileFetch, vec![json!({"id": "u1", "display_name": "", "email": "ana@example.org"})]),
            &mut timers,
        );
        profile.on_response(rows(Purpose::ProfileStats, vec![]), &mut timers);

        profile.edit(ProfileField::DisplayName, &FieldPatch::Set("Ana".into()));
        let upsert = profile.update().unwrap();
        assert!(matches!(upsert.op, BackendOp::Upsert { .. }));
        assert!(profile.update().is_none());

        profile.on_response(
            rows(Purpose::ProfileUpdate, vec![json!({"id": "u1", "display_name": "Ana", "email": "ana@example.org"})]),
            &mut timers,
        );
        assert_eq!(profile.phase().notice(), Some(UPDATED_NOTICE));
        assert_eq!(profile.profile().map(|p| p.display_name.as_str()), Some("Ana"));
    }

    #[test]
    fn update_failure_is_shown_verbatim() {
        let session = signed_in();
        let mut timers = Timers::new();
        let mut profile = ProfileWorkflow::new();
        request(profile.activate(&session));
        profile.on_response(
            rows(Purpose::ProfileFetch, vec![json!({"id": "u1", "display_name": "Ana", "email": "a@b.c"})]),
            &mut timers,
        );
        profile.on_response(rows(Purpose::ProfileStats, vec![]), &mut timers);

        profile.update().unwrap();
        profile.on_response(
            BackendResponse::err(Purpose::ProfileUpdate, "new row violates row-level security policy"),
            &mut timers,
        );
        assert_eq!(
            profile.phase().failure(),
            Some("new row violates row-level security policy")
        );
    }
}
