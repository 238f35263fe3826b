//! Authenticated principals and user profiles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The authenticated user principal returned by the collaborator's auth
/// service.
///
/// `access_token` is only populated by the hosted collaborator and is
/// redacted from `Debug` output so it never reaches the trace file.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            access_token: None,
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Row of the `profiles` table. One per identity, keyed by the identity id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
}

impl UserProfile {
    /// Profile created on first visit: empty display name, session email.
    #[must_use]
    pub fn placeholder(identity: &Identity) -> Self {
        Self {
            id: identity.id.clone(),
            display_name: String::new(),
            email: identity.email.clone(),
        }
    }
}

/// Aggregate counts of an identity's own reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReportStats {
    pub total: usize,
    pub found: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_token() {
        let identity = Identity::new("u1", "ana@example.org").with_token("secret-jwt");
        let printed = format!("{identity:?}");
        assert!(!printed.contains("secret-jwt"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn token_is_not_serialized_when_absent() {
        let row = serde_json::to_value(Identity::new("u1", "ana@example.org")).unwrap();
        assert!(row.get("access_token").is_none());
    }

    #[test]
    fn placeholder_profile_uses_session_email() {
        let identity = Identity::new("u1", "ana@example.org");
        let profile = UserProfile::placeholder(&identity);
        assert_eq!(profile.display_name, "");
        assert_eq!(profile.email, "ana@example.org");
        assert_eq!(profile.id, "u1");
    }
}
