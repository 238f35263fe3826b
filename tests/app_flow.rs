//! End-to-end flows: `AppState` driven by events, with every collaborator
//! request executed against a `JsonBackend` in a temporary directory.

use mascotas::backend::{Backend, BackendRequest, JsonBackend, Purpose, Query, PROFILES_TABLE, REPORTS_TABLE};
use mascotas::domain::{NewReport, PetType, ReportStatus, MAX_IMAGE_BYTES};
use mascotas::infrastructure::load_image;
use mascotas::workflows::submission::PUBLISHED_NOTICE;
use mascotas::workflows::SubmissionField;
use mascotas::{handle_event, Action, AppState, Event, Theme, View};
use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

struct Harness {
    dir: TempDir,
    state: AppState,
    backend: JsonBackend,
}

impl Harness {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonBackend::new(dir.path().join("backend.json")).unwrap();
        Self {
            dir,
            state: AppState::new(Theme::default()),
            backend,
        }
    }

    /// Handles `event` and everything it causes, returning every request
    /// that reached the collaborator.
    fn send(&mut self, event: Event) -> Vec<BackendRequest> {
        let mut issued = Vec::new();
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            let (_, actions) = handle_event(&mut self.state, &event).unwrap();
            for action in actions {
                match action {
                    Action::Backend(request) => {
                        issued.push(request.clone());
                        queue.push_back(Event::BackendResponse(request.execute(&mut self.backend)));
                    }
                    Action::LoadImage { path } => queue.push_back(match load_image(&path) {
                        Ok(image) => Event::ImageLoaded(image),
                        Err(e) => Event::ImageLoadFailed {
                            path,
                            error: e.to_string(),
                        },
                    }),
                    Action::StartTimer { .. } | Action::CloseFocus => {}
                }
            }
        }
        issued
    }

    fn type_text(&mut self, text: &str) -> Vec<BackendRequest> {
        text.chars().flat_map(|c| self.send(Event::Char(c))).collect()
    }

    fn write_file(&self, name: &str, len: usize) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, vec![0x89; len]).unwrap();
        path
    }

    fn focus_publish_field(&mut self, field: SubmissionField) {
        while self.state.submission_field() != field {
            self.send(Event::FocusNext);
        }
    }

    /// Fills every field, then loads the photo. Focus ends on the photo field.
    fn fill_publish_form(&mut self, photo: &PathBuf) {
        self.send(Event::Navigate(View::Publish));
        for (field, value) in [
            (SubmissionField::Name, "Firulais"),
            (SubmissionField::Description, "Perro café con collar rojo"),
            (SubmissionField::Location, "Macul Centro"),
            (SubmissionField::Contact, "+56 9 1234 5678"),
            (SubmissionField::Photo, photo.to_str().unwrap()),
        ] {
            self.focus_publish_field(field);
            self.type_text(value);
        }
        assert!(self.send(Event::Submit).is_empty());
    }

    fn seed_report(&mut self, name: &str, location: &str) {
        let row = NewReport {
            pet_type: PetType::Cat,
            name: name.to_string(),
            breed: None,
            description: "Visto por última vez cerca del parque".to_string(),
            photo_url: "https://example.org/foto.jpg".to_string(),
            location: location.to_string(),
            contact: "vecinos@example.org".to_string(),
            published_at: chrono::Utc::now(),
            status: ReportStatus::Lost,
            user_id: None,
        };
        self.backend
            .insert(REPORTS_TABLE, serde_json::to_value(row).unwrap())
            .unwrap();
    }

    fn profile_rows(&self, user_id: &str) -> Vec<serde_json::Value> {
        self.backend
            .select(PROFILES_TABLE, &Query::all().eq("id", user_id))
            .unwrap()
    }
}

fn purposes(requests: &[BackendRequest]) -> Vec<Purpose> {
    requests.iter().map(|request| request.purpose).collect()
}

#[test]
fn publishing_adds_exactly_one_report_to_the_listing() {
    let mut h = Harness::new();
    h.send(Event::Start);
    assert_eq!(h.state.listing.total_count(), 0);

    let photo = h.write_file("firulais.png", 2048);
    h.fill_publish_form(&photo);
    assert_eq!(h.state.submission.draft().photo_path, "firulais.png");

    let issued = h.send(Event::Submit);
    assert_eq!(
        purposes(&issued),
        vec![Purpose::SubmitUpload, Purpose::SubmitPublicUrl, Purpose::SubmitInsert]
    );
    assert_eq!(h.state.submission.phase().notice(), Some(PUBLISHED_NOTICE));
    assert!(h.state.submission.draft().name.is_empty());
    assert!(h.state.submission.draft().image.is_none());
    assert_eq!(h.state.previews.active_count(), 0);

    h.send(Event::Navigate(View::Home));
    assert_eq!(h.state.listing.total_count(), 1);
    let report = h.state.listing.selected().unwrap();
    assert_eq!(report.name, "Firulais");
    assert_eq!(report.location, "Macul Centro");
    assert!(report.photo_url.ends_with(".png"));
}

#[test]
fn invalid_photos_never_reach_the_collaborator() {
    let mut h = Harness::new();
    h.send(Event::Start);

    let too_large = h.write_file("enorme.png", MAX_IMAGE_BYTES + 1);
    h.fill_publish_form(&too_large);
    assert_eq!(
        h.state.submission.phase().failure(),
        Some("La imagen no puede superar los 5 MB")
    );
    assert!(h.send(Event::Submit).is_empty());

    let not_an_image = h.write_file("notas.txt", 10);
    h.focus_publish_field(SubmissionField::Photo);
    while !h.state.submission.draft().photo_path.is_empty() {
        h.send(Event::Backspace);
    }
    h.type_text(not_an_image.to_str().unwrap());
    assert!(h.send(Event::Submit).is_empty());
    assert_eq!(
        h.state.submission.phase().failure(),
        Some("El archivo seleccionado no es una imagen")
    );
}

#[test]
fn search_is_a_case_insensitive_substring_match() {
    let mut h = Harness::new();
    h.seed_report("Michi", "Macul Centro");
    h.seed_report("Pelusa", "Providencia");
    h.send(Event::Start);
    assert_eq!(h.state.listing.total_count(), 2);

    h.send(Event::SearchMode);
    h.type_text("macul");
    assert_eq!(h.state.listing.visible_count(), 1);
    assert_eq!(h.state.listing.selected().unwrap().name, "Michi");

    for _ in 0..5 {
        h.send(Event::Backspace);
    }
    h.type_text("PROVI");
    assert_eq!(h.state.listing.selected().unwrap().name, "Pelusa");
}

#[test]
fn mismatched_registration_passwords_issue_no_request() {
    let mut h = Harness::new();
    h.send(Event::Start);
    h.send(Event::Navigate(View::Register));

    let mut issued = Vec::new();
    for text in ["Ana", "ana@example.org", "secreto", "secreta"] {
        issued.extend(h.type_text(text));
        issued.extend(h.send(Event::FocusNext));
    }
    issued.extend(h.send(Event::Submit));

    assert!(issued.is_empty());
    assert_eq!(h.state.register.phase().failure(), Some("Las contraseñas no coinciden"));
}

#[test]
fn first_profile_visit_creates_exactly_one_row() {
    let mut h = Harness::new();
    let identity = h.backend.sign_up("ana@example.org", "secreto").unwrap();
    h.send(Event::Start);

    h.send(Event::Navigate(View::Login));
    h.type_text("ana@example.org");
    h.send(Event::FocusNext);
    h.type_text("secreto");
    let issued = h.send(Event::Submit);

    assert_eq!(h.state.view, View::Profile);
    assert_eq!(
        purposes(&issued),
        vec![Purpose::Login, Purpose::ProfileFetch, Purpose::ProfileCreate, Purpose::ProfileStats]
    );
    let rows = h.profile_rows(&identity.id);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["display_name"], "");
    assert_eq!(rows[0]["email"], "ana@example.org");

    h.send(Event::Navigate(View::Home));
    let issued = h.send(Event::Navigate(View::Profile));
    assert!(!purposes(&issued).contains(&Purpose::ProfileCreate));
    assert_eq!(h.profile_rows(&identity.id).len(), 1);
}

#[test]
fn submits_while_pending_are_no_ops() {
    let mut state = AppState::new(Theme::default());
    handle_event(&mut state, &Event::Navigate(View::Login)).unwrap();
    for c in "ana@example.org".chars() {
        handle_event(&mut state, &Event::Char(c)).unwrap();
    }
    handle_event(&mut state, &Event::FocusNext).unwrap();
    for c in "secreto".chars() {
        handle_event(&mut state, &Event::Char(c)).unwrap();
    }

    let (_, first) = handle_event(&mut state, &Event::Submit).unwrap();
    assert!(matches!(first.as_slice(), [Action::Backend(request)] if request.purpose == Purpose::Login));

    let (_, second) = handle_event(&mut state, &Event::Submit).unwrap();
    assert!(second.is_empty());
    assert!(state.login.phase().is_loading());
}
