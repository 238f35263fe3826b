//! The request/notice state machine shared by every form.
//!
//! ```text
//! Idle ──submit──▶ Loading ──ok──▶ Success ──timer──▶ Idle
//!                     │
//!                     └──err──▶ Failure ──edit──▶ Idle
//! ```

use super::timer::TimerToken;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// A request is in flight. Inputs are disabled.
    Loading,
    /// Transient notice, dismissed when `timer` fires.
    Success { notice: String, timer: TimerToken },
    /// Persists until the next edit or submit.
    Failure { message: String },
}

impl Phase {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Failure { message } => Some(message),
            _ => None,
        }
    }

    #[must_use]
    pub fn notice(&self) -> Option<&str> {
        match self {
            Self::Success { notice, .. } => Some(notice),
            _ => None,
        }
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        *self = Self::Failure {
            message: message.into(),
        };
    }

    /// Editing a form clears a failure back to idle.
    pub fn on_edit(&mut self) {
        if matches!(self, Self::Failure { .. }) {
            *self = Self::Idle;
        }
    }

    /// Dismisses the notice if `token` is the one it is waiting for.
    ///
    /// Returns whether anything changed. Stale tokens are ignored.
    pub fn on_timer(&mut self, token: TimerToken) -> bool {
        match self {
            Self::Success { timer, .. } if *timer == token => {
                *self = Self::Idle;
                true
            }
            _ => false,
        }
    }
}
