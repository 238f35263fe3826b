//! Publishing a new lost-pet report.
//!
//! A submission is three chained collaborator calls:
//!
//! 1. upload the photo to [`PHOTO_BUCKET`] under a random object name
//! 2. resolve the object's public URL
//! 3. insert the report row with that URL
//!
//! The chain is driven by responses routed back through
//! [`SubmissionWorkflow::on_response`]. The first failure ends it; nothing is
//! retried. Once started the chain cannot be cancelled: leaving the form
//! detaches it and it still runs to the insert.

use super::phase::Phase;
use super::preview::{PreviewHandle, PreviewRegistry};
use super::timer::{TimerOwner, Timers, NOTICE_DISPLAY_SECS};
use super::{is_blank, FieldPatch};
use crate::backend::{BackendOp, BackendRequest, BackendResponse, Purpose, PHOTO_BUCKET, REPORTS_TABLE};
use crate::domain::{ImageFile, NewReport, PetType, ReportStatus, ValidationError};
use crate::session::SessionContext;
use chrono::Utc;

/// Notice shown after a report is published.
pub const PUBLISHED_NOTICE: &str = "¡Publicación creada con éxito!";

/// Fields of the publish form, in focus order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionField {
    PetType,
    Name,
    Breed,
    Description,
    Photo,
    Location,
    Contact,
}

impl SubmissionField {
    pub const ALL: [Self; 7] = [
        Self::PetType,
        Self::Name,
        Self::Breed,
        Self::Description,
        Self::Photo,
        Self::Location,
        Self::Contact,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PetType => "Tipo",
            Self::Name => "Nombre",
            Self::Breed => "Raza",
            Self::Description => "Descripción",
            Self::Photo => "Foto",
            Self::Location => "Ubicación",
            Self::Contact => "Contacto",
        }
    }
}

/// In-progress report. `photo_path` is what the user typed; `image` is the
/// file once loaded and accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionDraft {
    pub pet_type: PetType,
    pub name: String,
    pub breed: String,
    pub description: String,
    pub photo_path: String,
    pub image: Option<ImageFile>,
    pub location: String,
    pub contact: String,
}

impl SubmissionDraft {
    /// Display value of a field.
    #[must_use]
    pub fn value(&self, field: SubmissionField) -> &str {
        match field {
            SubmissionField::PetType => self.pet_type.label(),
            SubmissionField::Name => &self.name,
            SubmissionField::Breed => &self.breed,
            SubmissionField::Description => &self.description,
            SubmissionField::Photo => &self.photo_path,
            SubmissionField::Location => &self.location,
            SubmissionField::Contact => &self.contact,
        }
    }

    fn patch(&mut self, field: SubmissionField, patch: &FieldPatch) {
        let text = match field {
            SubmissionField::PetType => {
                if let FieldPatch::Cycle { forward } = patch {
                    self.pet_type = if *forward {
                        self.pet_type.next()
                    } else {
                        self.pet_type.previous()
                    };
                }
                return;
            }
            SubmissionField::Name => &mut self.name,
            SubmissionField::Breed => &mut self.breed,
            SubmissionField::Description => &mut self.description,
            SubmissionField::Photo => &mut self.photo_path,
            SubmissionField::Location => &mut self.location,
            SubmissionField::Contact => &mut self.contact,
        };
        patch.apply_to(text);
    }

    /// Required fields first, then the photo.
    fn validate(&self) -> Result<&ImageFile, ValidationError> {
        for field in [
            SubmissionField::Description,
            SubmissionField::Location,
            SubmissionField::Contact,
        ] {
            if is_blank(self.value(field)) {
                return Err(ValidationError::MissingField(field.label()));
            }
        }
        self.image.as_ref().ok_or(ValidationError::MissingImage)
    }

    fn to_row(&self, photo_url: String, author: Option<String>) -> NewReport {
        let breed = self.breed.trim();
        NewReport {
            pet_type: self.pet_type,
            name: self.name.trim().to_string(),
            breed: (!breed.is_empty()).then(|| breed.to_string()),
            description: self.description.trim().to_string(),
            photo_url,
            location: self.location.trim().to_string(),
            contact: self.contact.trim().to_string(),
            published_at: Utc::now(),
            status: ReportStatus::Lost,
            user_id: author,
        }
    }
}

/// Step of the chain awaiting a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Uploading,
    ResolvingUrl,
    Inserting,
}

impl Stage {
    const fn purpose(self) -> Purpose {
        match self {
            Self::Uploading => Purpose::SubmitUpload,
            Self::ResolvingUrl => Purpose::SubmitPublicUrl,
            Self::Inserting => Purpose::SubmitInsert,
        }
    }
}

#[derive(Debug, Clone)]
struct InFlight {
    stage: Stage,
    object: String,
    author: Option<String>,
    /// Field values at submit time, without the photo bytes.
    fields: SubmissionDraft,
    /// The form was left; outcomes are logged instead of shown.
    detached: bool,
}

#[derive(Debug, Default)]
pub struct SubmissionWorkflow {
    draft: SubmissionDraft,
    phase: Phase,
    preview: Option<PreviewHandle>,
    in_flight: Option<InFlight>,
}

impl SubmissionWorkflow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn draft(&self) -> &SubmissionDraft {
        &self.draft
    }

    #[must_use]
    pub const fn phase(&self) -> &Phase {
        &self.phase
    }

    #[must_use]
    pub const fn preview(&self) -> Option<&PreviewHandle> {
        self.preview.as_ref()
    }

    /// Applies a patch. No-op while a submission is pending.
    pub fn edit(&mut self, field: SubmissionField, patch: &FieldPatch) -> bool {
        if self.phase.is_loading() {
            return false;
        }
        self.draft.patch(field, patch);
        self.phase.on_edit();
        true
    }

    /// Validates a freshly loaded photo and, if accepted, swaps the preview.
    ///
    /// # Errors
    ///
    /// Returns the validation error, which is also set as the form failure.
    pub fn select_image(
        &mut self,
        image: ImageFile,
        previews: &mut PreviewRegistry,
    ) -> Result<(), ValidationError> {
        let _span = tracing::debug_span!("submission_select_image", image = ?image).entered();

        if self.phase.is_loading() {
            return Ok(());
        }
        if let Err(e) = image.validate() {
            tracing::debug!(error = %e, "image rejected");
            self.phase.fail(e.to_string());
            return Err(e);
        }

        if let Some(previous) = self.preview.take() {
            previews.revoke(previous);
        }
        self.preview = Some(previews.create(&image));
        self.draft.photo_path.clone_from(&image.file_name);
        self.draft.image = Some(image);
        self.phase.on_edit();
        Ok(())
    }

    /// The photo could not be read from disk.
    pub fn image_load_failed(&mut self, message: impl Into<String>) {
        if !self.phase.is_loading() {
            self.phase.fail(message);
        }
    }

    /// Validates the draft and starts the upload.
    ///
    /// Returns `None` if a submission is already pending or validation
    /// failed.
    pub fn submit(&mut self, session: &SessionContext) -> Option<BackendRequest> {
        let _span = tracing::debug_span!("submission_submit").entered();

        if self.phase.is_loading() {
            tracing::debug!("submission already pending");
            return None;
        }
        if self.in_flight.is_some() {
            tracing::debug!("previous submission still running in the background");
            return None;
        }

        let image = match self.draft.validate() {
            Ok(image) => image,
            Err(e) => {
                tracing::debug!(error = %e, "draft rejected");
                self.phase.fail(e.to_string());
                return None;
            }
        };

        let object = image.random_object_name();
        let request = BackendRequest::new(
            Purpose::SubmitUpload,
            BackendOp::Upload {
                bucket: PHOTO_BUCKET.to_string(),
                path: object.clone(),
                content_type: image.mime_type.clone(),
                bytes: image.bytes.clone(),
            },
        );

        self.in_flight = Some(InFlight {
            stage: Stage::Uploading,
            object,
            author: session.identity().map(|identity| identity.id.clone()),
            fields: SubmissionDraft {
                image: None,
                ..self.draft.clone()
            },
            detached: false,
        });
        self.phase = Phase::Loading;
        Some(request)
    }

    /// Routes a response to the step awaiting it.
    ///
    /// Responses that arrive for a step that is not pending (duplicated, or
    /// after the chain ended) are ignored.
    pub fn on_response(
        &mut self,
        response: BackendResponse,
        previews: &mut PreviewRegistry,
        timers: &mut Timers,
    ) -> Option<BackendRequest> {
        let Some(in_flight) = self.in_flight.as_mut() else {
            tracing::debug!(purpose = ?response.purpose, "ignoring response, nothing pending");
            return None;
        };
        if in_flight.stage.purpose() != response.purpose {
            tracing::debug!(purpose = ?response.purpose, "ignoring response for another step");
            return None;
        }

        match in_flight.stage {
            Stage::Uploading => match response.into_uploaded() {
                Ok(path) => {
                    in_flight.stage = Stage::ResolvingUrl;
                    Some(BackendRequest::new(
                        Purpose::SubmitPublicUrl,
                        BackendOp::PublicUrl {
                            bucket: PHOTO_BUCKET.to_string(),
                            path,
                        },
                    ))
                }
                Err(message) => self.abort(message),
            },
            Stage::ResolvingUrl => match response.into_url() {
                Ok(url) => {
                    in_flight.stage = Stage::Inserting;
                    let row = in_flight.fields.to_row(url, in_flight.author.clone());
                    match serde_json::to_value(&row) {
                        Ok(row) => Some(BackendRequest::new(
                            Purpose::SubmitInsert,
                            BackendOp::Insert {
                                table: REPORTS_TABLE.to_string(),
                                row,
                            },
                        )),
                        Err(e) => self.abort(e.to_string()),
                    }
                }
                Err(message) => self.abort(message),
            },
            Stage::Inserting => {
                match response.into_rows() {
                    Ok(_) => self.succeed(previews, timers),
                    Err(message) => {
                        self.abort(message);
                    }
                }
                None
            }
        }
    }

    /// Dismisses the success notice if `token` is current.
    pub fn on_timer(&mut self, token: super::TimerToken) -> bool {
        self.phase.on_timer(token)
    }

    /// True while a chain started from a form that was since left is still
    /// running.
    #[must_use]
    pub fn has_detached(&self) -> bool {
        self.in_flight.as_ref().is_some_and(|in_flight| in_flight.detached)
    }

    /// Releases the preview and forgets the draft and any notice. A pending
    /// chain keeps running detached.
    pub fn teardown(&mut self, previews: &mut PreviewRegistry) {
        if let Some(handle) = self.preview.take() {
            previews.revoke(handle);
        }
        let mut in_flight = self.in_flight.take();
        if let Some(in_flight) = in_flight.as_mut() {
            tracing::debug!(stage = ?in_flight.stage, object = %in_flight.object, "detaching pending submission");
            in_flight.detached = true;
        }
        *self = Self {
            in_flight,
            ..Self::default()
        };
    }

    fn abort(&mut self, message: String) -> Option<BackendRequest> {
        let in_flight = self.in_flight.take()?;
        if in_flight.detached {
            tracing::warn!(stage = ?in_flight.stage, object = %in_flight.object, error = %message, "detached submission failed");
            return None;
        }
        tracing::debug!(stage = ?in_flight.stage, object = %in_flight.object, error = %message, "submission failed");
        self.phase.fail(message);
        None
    }

    fn succeed(&mut self, previews: &mut PreviewRegistry, timers: &mut Timers) {
        let Some(in_flight) = self.in_flight.take() else {
            return;
        };
        tracing::info!(object = %in_flight.object, detached = in_flight.detached, "report published");
        if in_flight.detached {
            return;
        }
        if let Some(handle) = self.preview.take() {
            previews.revoke(handle);
        }
        self.draft = SubmissionDraft::default();
        self.phase = Phase::Success {
            notice: PUBLISHED_NOTICE.to_string(),
            timer: timers.schedule(TimerOwner::Submission, NOTICE_DISPLAY_SECS),
        };
    }
}
