//! Form and data workflows.
//!
//! Each workflow owns a draft (where it has one), a [`Phase`], and at most one
//! outstanding collaborator request. Workflows never perform I/O: they return
//! [`BackendRequest`](crate::backend::BackendRequest)s and consume
//! [`BackendResponse`](crate::backend::BackendResponse)s routed to them by
//! purpose.
//!
//! # Modules
//!
//! - [`submission`]: publish a new report with a photo
//! - [`listing`]: fetch and filter all reports
//! - [`profile`]: fetch-or-create, stats and update of the user's profile
//! - [`auth`]: login and registration forms
//! - [`phase`], [`timer`], [`preview`]: shared state machine and resources

pub mod auth;
pub mod listing;
pub mod phase;
pub mod preview;
pub mod profile;
pub mod submission;
pub mod timer;

pub use auth::{LoginField, LoginWorkflow, RegisterField, RegistrationOutcome, RegistrationWorkflow};
pub use listing::{ListingState, ListingWorkflow};
pub use phase::Phase;
pub use preview::{Preview, PreviewHandle, PreviewRegistry};
pub use profile::{ProfileField, ProfileOutcome, ProfileWorkflow};
pub use submission::{SubmissionDraft, SubmissionField, SubmissionWorkflow};
pub use timer::{TimerOwner, TimerToken, Timers, NOTICE_DISPLAY_SECS};

/// A field-keyed change to a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPatch {
    Set(String),
    Push(char),
    Pop,
    /// Steps an option field. Ignored by text fields.
    Cycle { forward: bool },
}

impl FieldPatch {
    /// Applies the patch to a text field.
    pub fn apply_to(&self, text: &mut String) {
        match self {
            Self::Set(value) => text.clone_from(value),
            Self::Push(c) => text.push(*c),
            Self::Pop => {
                text.pop();
            }
            Self::Cycle { .. } => {}
        }
    }
}

pub(crate) fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_patches() {
        let mut text = String::from("Fir");
        FieldPatch::Push('u').apply_to(&mut text);
        assert_eq!(text, "Firu");
        FieldPatch::Pop.apply_to(&mut text);
        FieldPatch::Cycle { forward: true }.apply_to(&mut text);
        assert_eq!(text, "Fir");
        FieldPatch::Set("Luna".into()).apply_to(&mut text);
        assert_eq!(text, "Luna");
    }
}
