//! Session context.
//!
//! [`SessionContext`] holds the current identity and whether it is still being
//! restored. It is owned by [`AppState`](crate::app::AppState) and passed by
//! reference to the workflows that need it; nothing reads it ambiently.
//!
//! # Lifecycle
//!
//! 1. [`SessionContext::new`] starts in the loading state
//! 2. [`SessionContext::initialize`] yields the current-session request
//! 3. Every auth response is folded in with [`SessionContext::apply`]
//! 4. [`SessionContext::teardown`] clears it on sign-out

use crate::backend::{BackendOp, BackendRequest, Purpose};
use crate::domain::Identity;

/// An auth-state change reported by the collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthChange {
    /// Startup lookup finished.
    Restored(Option<Identity>),
    /// Startup lookup failed; treated as signed out.
    RestoreFailed(String),
    SignedIn(Identity),
    SignedOut,
}

/// Current identity and loading flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    identity: Option<Identity>,
    loading: bool,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    /// A context that has not resolved its identity yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            identity: None,
            loading: true,
        }
    }

    /// Starts (or restarts) restoring the session from the collaborator.
    pub fn initialize(&mut self) -> BackendRequest {
        self.loading = true;
        BackendRequest::new(Purpose::RestoreSession, BackendOp::CurrentSession)
    }

    pub fn apply(&mut self, change: AuthChange) {
        let _span = tracing::debug_span!("session_apply").entered();

        match change {
            AuthChange::Restored(identity) => {
                tracing::debug!(signed_in = identity.is_some(), "session restored");
                self.identity = identity;
            }
            AuthChange::RestoreFailed(message) => {
                tracing::warn!(error = %message, "session restore failed");
                self.identity = None;
            }
            AuthChange::SignedIn(identity) => {
                tracing::debug!(user_id = %identity.id, "signed in");
                self.identity = Some(identity);
            }
            AuthChange::SignedOut => {
                tracing::debug!("signed out");
                self.identity = None;
            }
        }
        self.loading = false;
    }

    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Drops the identity. The context stays usable for a later sign-in.
    pub fn teardown(&mut self) {
        self.identity = None;
        self.loading = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_loading_and_resolves_on_restore() {
        let mut session = SessionContext::new();
        assert!(session.is_loading());

        let request = session.initialize();
        assert_eq!(request.purpose, Purpose::RestoreSession);

        session.apply(AuthChange::Restored(Some(Identity::new("u1", "a@b.c"))));
        assert!(!session.is_loading());
        assert_eq!(session.identity().map(|i| i.id.as_str()), Some("u1"));
    }

    #[test]
    fn restore_failure_counts_as_signed_out() {
        let mut session = SessionContext::new();
        session.apply(AuthChange::RestoreFailed("offline".into()));
        assert!(!session.is_loading());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn teardown_clears_identity() {
        let mut session = SessionContext::new();
        session.apply(AuthChange::SignedIn(Identity::new("u1", "a@b.c")));
        session.teardown();
        assert!(session.identity().is_none());
    }
}
