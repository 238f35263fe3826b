//! Application state and view model computation.
//!
//! [`AppState`] owns the session, every workflow, the preview registry and the
//! timer queue. It is the single source of truth for the UI: the event handler
//! mutates it, and [`AppState::compute_viewmodel`] turns a snapshot of it into
//! a [`UIViewModel`] for the renderer.
//!
//! # Windowing
//!
//! The listing shows a window of rows centred on the selection, the same way
//! regardless of whether search is active. Chrome rows (header, tabs, table
//! header, detail pane, banner, footer) are subtracted first.

use super::modes::{InputMode, SearchFocus, View};
use crate::domain::Report;
use crate::session::SessionContext;
use crate::ui::helpers::truncate;
use crate::ui::theme::Theme;
use crate::ui::viewmodel::{
    Banner, BannerKind, Body, DetailPane, DisplayItem, EmptyState, FooterInfo, FormBody,
    FormFieldView, HeaderInfo, ListingBody, NavTab, SearchBarInfo, UIViewModel,
};
use crate::workflows::{
    ListingState, ListingWorkflow, LoginField, LoginWorkflow, Phase, PreviewRegistry,
    ProfileField, ProfileWorkflow, RegisterField, RegistrationWorkflow, SubmissionField,
    SubmissionWorkflow, Timers,
};
use chrono::{DateTime, Utc};

/// Rows taken by the header, tabs, borders, table header, banner and footer.
const CHROME_ROWS: usize = 8;
/// Rows taken by the search bar when visible.
const SEARCH_BAR_ROWS: usize = 3;
/// Border plus the detail lines of the selected report.
const DETAIL_ROWS: usize = 8;
const NAME_COLUMN_WIDTH: usize = 24;

/// Central application state container.
#[derive(Debug)]
pub struct AppState {
    /// Screen currently shown.
    pub view: View,

    /// Listing keyboard mode. Reset to normal whenever the view changes.
    pub input_mode: InputMode,

    /// Index of the focused field on form views.
    pub focus: usize,

    pub session: SessionContext,

    pub listing: ListingWorkflow,

    pub submission: SubmissionWorkflow,

    pub profile: ProfileWorkflow,

    pub login: LoginWorkflow,

    pub register: RegistrationWorkflow,

    /// Live photo previews. Owned here so workflows release them explicitly.
    pub previews: PreviewRegistry,

    pub timers: Timers,

    /// Set while a sign-out request is in flight.
    pub signing_out: bool,

    /// Color scheme for UI rendering.
    pub theme: Theme,
}

impl AppState {
    /// Creates the state shown before the session has been restored.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mascotas::app::{AppState, View};
    /// use mascotas::ui::theme::Theme;
    ///
    /// let state = AppState::new(Theme::default());
    /// assert_eq!(state.view, View::Home);
    /// assert!(state.session.is_loading());
    /// ```
    #[must_use]
    pub fn new(theme: Theme) -> Self {
        Self {
            view: View::Home,
            input_mode: InputMode::Normal,
            focus: 0,
            session: SessionContext::new(),
            listing: ListingWorkflow::new(),
            submission: SubmissionWorkflow::new(),
            profile: ProfileWorkflow::new(),
            login: LoginWorkflow::new(),
            register: RegistrationWorkflow::new(),
            previews: PreviewRegistry::new(),
            timers: Timers::new(),
            signing_out: false,
            theme,
        }
    }

    /// Number of focusable fields on a view.
    #[must_use]
    pub const fn field_count(view: View) -> usize {
        match view {
            View::Home => 0,
            View::Publish => SubmissionField::ALL.len(),
            View::Profile => ProfileField::ALL.len(),
            View::Login => LoginField::ALL.len(),
            View::Register => RegisterField::ALL.len(),
        }
    }

    pub fn focus_next(&mut self) {
        let count = Self::field_count(self.view);
        if count > 0 {
            self.focus = (self.focus + 1) % count;
        }
    }

    pub fn focus_previous(&mut self) {
        let count = Self::field_count(self.view);
        if count > 0 {
            self.focus = self.focus.checked_sub(1).unwrap_or(count - 1);
        }
    }

    #[must_use]
    pub fn submission_field(&self) -> SubmissionField {
        SubmissionField::ALL[self.focus % SubmissionField::ALL.len()]
    }

    #[must_use]
    pub fn profile_field(&self) -> ProfileField {
        ProfileField::ALL[self.focus % ProfileField::ALL.len()]
    }

    #[must_use]
    pub fn login_field(&self) -> LoginField {
        LoginField::ALL[self.focus % LoginField::ALL.len()]
    }

    #[must_use]
    pub fn register_field(&self) -> RegisterField {
        RegisterField::ALL[self.focus % RegisterField::ALL.len()]
    }

    /// Phase of the form on the current view, if it has one.
    #[must_use]
    pub const fn active_phase(&self) -> Option<&Phase> {
        match self.view {
            View::Home => None,
            View::Publish => Some(self.submission.phase()),
            View::Profile => Some(self.profile.phase()),
            View::Login => Some(self.login.phase()),
            View::Register => Some(self.register.phase()),
        }
    }

    /// Computes a renderable view model for a `rows` x `cols` pane.
    #[must_use]
    pub fn compute_viewmodel(&self, rows: usize, cols: usize) -> UIViewModel {
        self.compute_viewmodel_at(rows, cols, Utc::now())
    }

    /// Like [`compute_viewmodel`](Self::compute_viewmodel) with a fixed clock.
    #[must_use]
    pub fn compute_viewmodel_at(&self, rows: usize, cols: usize, now: DateTime<Utc>) -> UIViewModel {
        let body = match self.view {
            View::Home => self.compute_listing(rows, cols, now),
            View::Publish => self.compute_publish_form(),
            View::Profile => self.compute_profile_form(),
            View::Login => self.compute_login_form(),
            View::Register => self.compute_register_form(),
        };

        UIViewModel {
            header: self.compute_header(),
            body,
            banner: self.compute_banner(),
            footer: self.compute_footer(),
        }
    }

    fn compute_header(&self) -> HeaderInfo {
        let tabs = View::NAV
            .into_iter()
            .map(|view| NavTab {
                label: view.nav_label().to_string(),
                shortcut: view.shortcut(),
                is_active: view == self.view,
            })
            .collect();

        let account = match self.session.identity() {
            Some(identity) => identity.email.clone(),
            None if self.session.is_loading() => "Verificando sesión...".to_string(),
            None => "Sin sesión".to_string(),
        };

        HeaderInfo {
            title: format!(" {} ", self.view.title()),
            tabs,
            account,
        }
    }

    fn compute_banner(&self) -> Option<Banner> {
        let phase = self.active_phase()?;
        if let Some(message) = phase.failure() {
            return Some(Banner {
                kind: BannerKind::Error,
                text: message.to_string(),
            });
        }
        phase.notice().map(|notice| Banner {
            kind: BannerKind::Success,
            text: notice.to_string(),
        })
    }

    fn compute_listing(&self, rows: usize, cols: usize, now: DateTime<Utc>) -> Body {
        let search_bar = match self.input_mode {
            InputMode::Search(focus) => Some(SearchBarInfo {
                query: self.listing.query().to_string(),
                is_typing: focus == SearchFocus::Typing,
            }),
            InputMode::Normal => None,
        };

        let empty_state = match self.listing.state() {
            ListingState::Loading => Some(EmptyState {
                message: "Cargando publicaciones...".to_string(),
                subtitle: String::new(),
            }),
            ListingState::Failed(message) => Some(EmptyState {
                message,
                subtitle: "Presiona R para reintentar".to_string(),
            }),
            ListingState::Empty if self.listing.total_count() == 0 => Some(EmptyState {
                message: "Aún no hay publicaciones".to_string(),
                subtitle: "Presiona p para publicar una mascota perdida".to_string(),
            }),
            ListingState::Empty => Some(EmptyState {
                message: "No se encontraron resultados".to_string(),
                subtitle: format!("Ninguna publicación coincide con \"{}\"", self.listing.query()),
            }),
            ListingState::Items => None,
        };

        let count = format!(
            "{} de {}",
            self.listing.visible_count(),
            self.listing.total_count()
        );

        if empty_state.is_some() {
            return Body::Listing(ListingBody {
                search_bar,
                display_items: vec![],
                selected_index: 0,
                detail: None,
                empty_state,
                count,
            });
        }

        let available_rows = self.calculate_available_rows(rows);
        let total = self.listing.visible_count();
        let selected = self.listing.selected_index();

        let mut visible_start = selected.saturating_sub(available_rows / 2);
        let visible_end = (visible_start + available_rows).min(total);
        if visible_end - visible_start < available_rows && total >= available_rows {
            visible_start = visible_end.saturating_sub(available_rows);
        }

        let needle = self.listing.query().trim().to_string();
        let display_items = self
            .listing
            .visible()
            .enumerate()
            .skip(visible_start)
            .take(visible_end - visible_start)
            .map(|(idx, report)| compute_display_item(report, idx == selected, &needle, cols, now))
            .collect();

        Body::Listing(ListingBody {
            search_bar,
            display_items,
            selected_index: selected.saturating_sub(visible_start),
            detail: self.listing.selected().map(|report| compute_detail(report, now)),
            empty_state: None,
            count,
        })
    }

    fn compute_publish_form(&self) -> Body {
        let draft = self.submission.draft();
        let focused = self.submission_field();
        let fields = SubmissionField::ALL
            .into_iter()
            .map(|field| {
                let value = match field {
                    SubmissionField::Photo if draft.photo_path.is_empty() => {
                        "(ruta de la imagen, Enter para cargar)".to_string()
                    }
                    _ => draft.value(field).to_string(),
                };
                FormFieldView {
                    label: field.label().to_string(),
                    value,
                    is_focused: field == focused,
                    is_choice: field == SubmissionField::PetType,
                }
            })
            .collect();

        let extra_lines = self
            .submission
            .preview()
            .and_then(|handle| self.previews.get(handle))
            .map(|preview| vec![format!("Vista previa: {}", preview.summary())])
            .unwrap_or_default();

        let is_busy = self.submission.phase().is_loading();
        Body::Form(FormBody {
            fields,
            extra_lines,
            submit_label: if is_busy { "Publicando..." } else { "Publicar" }.to_string(),
            is_busy,
        })
    }

    fn compute_profile_form(&self) -> Body {
        if self.profile.profile().is_none() {
            let message = if self.session.is_loading() || self.profile.phase().is_loading() {
                "Cargando perfil..."
            } else {
                "Perfil no disponible"
            };
            return Body::Empty(EmptyState {
                message: message.to_string(),
                subtitle: String::new(),
            });
        }

        let focused = self.profile_field();
        let fields = ProfileField::ALL
            .into_iter()
            .map(|field| FormFieldView {
                label: field.label().to_string(),
                value: self.profile.value(field).to_string(),
                is_focused: field == focused,
                is_choice: false,
            })
            .collect();

        let extra_lines = match self.profile.stats() {
            Some(stats) => vec![
                format!("Publicaciones: {}", stats.total),
                format!("Mascotas encontradas: {}", stats.found),
            ],
            None => vec!["Calculando estadísticas...".to_string()],
        };

        let is_busy = self.profile.phase().is_loading();
        Body::Form(FormBody {
            fields,
            extra_lines,
            submit_label: if is_busy { "Guardando..." } else { "Guardar cambios" }.to_string(),
            is_busy,
        })
    }

    fn compute_login_form(&self) -> Body {
        let focused = self.login_field();
        let fields = LoginField::ALL
            .into_iter()
            .map(|field| FormFieldView {
                label: field.label().to_string(),
                value: display_value(self.login.value(field), field.is_secret()),
                is_focused: field == focused,
                is_choice: false,
            })
            .collect();

        let is_busy = self.login.phase().is_loading();
        Body::Form(FormBody {
            fields,
            extra_lines: vec![],
            submit_label: if is_busy { "Iniciando sesión..." } else { "Iniciar sesión" }.to_string(),
            is_busy,
        })
    }

    fn compute_register_form(&self) -> Body {
        let focused = self.register_field();
        let fields = RegisterField::ALL
            .into_iter()
            .map(|field| FormFieldView {
                label: field.label().to_string(),
                value: display_value(self.register.value(field), field.is_secret()),
                is_focused: field == focused,
                is_choice: false,
            })
            .collect();

        let is_busy = self.register.phase().is_loading();
        Body::Form(FormBody {
            fields,
            extra_lines: vec![],
            submit_label: if is_busy { "Registrando..." } else { "Registrarse" }.to_string(),
            is_busy,
        })
    }

    fn compute_footer(&self) -> FooterInfo {
        let keybindings = match (self.view, self.input_mode) {
            (View::Home, InputMode::Search(SearchFocus::Typing)) => {
                "ESC: salir de búsqueda  Enter: resultados  Escribe para filtrar"
            }
            (View::Home, InputMode::Search(SearchFocus::Navigating)) => {
                "ESC: salir de búsqueda  /: editar  j/k: navegar"
            }
            (View::Home, InputMode::Normal) => {
                "j/k: navegar  /: buscar  p: publicar  u: perfil  l: entrar  r: registro  R: recargar  q: salir"
            }
            (View::Publish, _) => {
                "Tab/↓: siguiente  ↑: anterior  ←/→: tipo  Enter: cargar foto / publicar  ESC: inicio"
            }
            (View::Profile, _) => "Tab: siguiente  Enter: guardar  Ctrl+x: cerrar sesión  ESC: inicio",
            (View::Login, _) => "Tab: siguiente  Enter: entrar  Ctrl+r: registro  ESC: inicio",
            (View::Register, _) => "Tab: siguiente  Enter: registrarse  Ctrl+l: entrar  ESC: inicio",
        };

        FooterInfo {
            keybindings: keybindings.to_string(),
        }
    }

    const fn calculate_available_rows(&self, total_rows: usize) -> usize {
        let chrome = match self.input_mode {
            InputMode::Normal => CHROME_ROWS + DETAIL_ROWS,
            InputMode::Search(_) => CHROME_ROWS + DETAIL_ROWS + SEARCH_BAR_ROWS,
        };
        let available = total_rows.saturating_sub(chrome);
        if available == 0 {
            1
        } else {
            available
        }
    }
}

fn display_value(value: &str, secret: bool) -> String {
    if secret {
        "•".repeat(value.chars().count())
    } else {
        value.to_string()
    }
}

fn compute_display_item(
    report: &Report,
    is_selected: bool,
    needle: &str,
    cols: usize,
    now: DateTime<Utc>,
) -> DisplayItem {
    let name = if report.name.trim().is_empty() {
        "Sin nombre".to_string()
    } else {
        truncate(&report.name, NAME_COLUMN_WIDTH - 1)
    };
    let location_width = cols.saturating_sub(NAME_COLUMN_WIDTH + 40).max(10);

    DisplayItem {
        pet: report.pet_type.label().to_string(),
        highlight_ranges: highlight_ranges(&name, needle),
        name,
        location: truncate(&report.location, location_width),
        published: report.published_ago(now),
        status: report.status.label().to_string(),
        is_selected,
    }
}

fn compute_detail(report: &Report, now: DateTime<Utc>) -> DetailPane {
    let lines = [
        ("Raza", report.breed.clone().unwrap_or_else(|| "-".to_string())),
        ("Descripción", report.description.clone()),
        ("Ubicación", report.location.clone()),
        ("Contacto", report.contact.clone()),
        ("Estado", report.status.label().to_string()),
        ("Publicado", report.published_ago(now)),
        ("Foto", report.photo_url.clone()),
    ];
    DetailPane {
        lines: lines
            .into_iter()
            .map(|(label, value)| (label.to_string(), value))
            .collect(),
    }
}

/// Character ranges of every case-insensitive occurrence of `needle` in
/// `text`, non-overlapping, left to right.
pub(crate) fn highlight_ranges(text: &str, needle: &str) -> Vec<(usize, usize)> {
    let needle: Vec<char> = needle.chars().flat_map(char::to_lowercase).collect();
    if needle.is_empty() {
        return vec![];
    }
    let haystack: Vec<char> = text.chars().collect();

    let mut ranges = Vec::new();
    let mut idx = 0;
    while idx + needle.len() <= haystack.len() {
        let matches = haystack[idx..idx + needle.len()]
            .iter()
            .zip(&needle)
            .all(|(c, n)| c.to_lowercase().eq(std::iter::once(*n)));
        if matches {
            ranges.push((idx, idx + needle.len()));
            idx += needle.len();
        } else {
            idx += 1;
        }
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendOutput, BackendResponse, Purpose};
    use crate::domain::Identity;
    use crate::session::AuthChange;
    use crate::workflows::FieldPatch;
    use serde_json::json;

    fn state_with_reports(names: &[&str]) -> AppState {
        let mut state = AppState::new(Theme::default());
        state.listing.activate();
        let rows = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                json!({
                    "id": format!("r{i}"),
                    "type": "dog",
                    "name": name,
                    "description": "Perro perdido",
                    "photo_url": "file:///x.png",
                    "location": "Macul Centro",
                    "contact": "123",
                    "published_at": format!("2024-05-{:02}T10:00:00Z", i + 1),
                    "status": "lost",
                })
            })
            .collect();
        state
            .listing
            .on_fetched(BackendResponse::ok(Purpose::ListReports, BackendOutput::Rows(rows)));
        state
    }

    #[test]
    fn loading_and_empty_are_distinct() {
        let mut state = AppState::new(Theme::default());
        state.listing.activate();
        let Body::Listing(body) = state.compute_viewmodel(24, 80).body else {
            panic!("expected listing");
        };
        assert_eq!(
            body.empty_state.map(|e| e.message),
            Some("Cargando publicaciones...".to_string())
        );

        state
            .listing
            .on_fetched(BackendResponse::ok(Purpose::ListReports, BackendOutput::Rows(vec![])));
        let Body::Listing(body) = state.compute_viewmodel(24, 80).body else {
            panic!("expected listing");
        };
        assert_eq!(
            body.empty_state.map(|e| e.message),
            Some("Aún no hay publicaciones".to_string())
        );
    }

    #[test]
    fn no_results_mentions_the_query() {
        let mut state = state_with_reports(&["Firulais"]);
        state.listing.set_query("zzz");
        let Body::Listing(body) = state.compute_viewmodel(24, 80).body else {
            panic!("expected listing");
        };
        let empty = body.empty_state.unwrap();
        assert_eq!(empty.message, "No se encontraron resultados");
        assert!(empty.subtitle.contains("zzz"));
    }

    #[test]
    fn window_follows_selection() {
        let names: Vec<String> = (0..40).map(|i| format!("Mascota {i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut state = state_with_reports(&refs);
        for _ in 0..30 {
            state.listing.move_down();
        }
        let Body::Listing(body) = state.compute_viewmodel(30, 100).body else {
            panic!("expected listing");
        };
        assert_eq!(body.display_items.len(), 30 - CHROME_ROWS - DETAIL_ROWS);
        assert!(body.display_items[body.selected_index].is_selected);
        assert_eq!(body.count, "40 de 40");
        assert!(body.detail.is_some());
    }

    #[test]
    fn passwords_are_masked() {
        let mut state = AppState::new(Theme::default());
        state.view = View::Login;
        state
            .login
            .edit(LoginField::Password, &FieldPatch::Set("secreto".into()));
        let Body::Form(form) = state.compute_viewmodel(24, 80).body else {
            panic!("expected form");
        };
        assert_eq!(form.fields[1].value, "•••••••");
        assert!(form.fields[0].is_focused);
    }

    #[test]
    fn failure_becomes_an_error_banner() {
        let mut state = AppState::new(Theme::default());
        state.view = View::Publish;
        state.submission.submit(&state.session);
        let vm = state.compute_viewmodel(24, 80);
        assert_eq!(
            vm.banner,
            Some(Banner {
                kind: BannerKind::Error,
                text: "El campo Descripción es obligatorio".to_string(),
            })
        );
    }

    #[test]
    fn header_shows_account() {
        let mut state = AppState::new(Theme::default());
        assert_eq!(state.compute_viewmodel(24, 80).header.account, "Verificando sesión...");
        state
            .session
            .apply(AuthChange::SignedIn(Identity::new("u1", "ana@example.org")));
        let header = state.compute_viewmodel(24, 80).header;
        assert_eq!(header.account, "ana@example.org");
        assert!(header.tabs[0].is_active);
    }

    #[test]
    fn highlight_is_case_insensitive() {
        assert_eq!(highlight_ranges("Macul Centro", "macul"), vec![(0, 5)]);
        assert_eq!(highlight_ranges("Ñuñoa ñu", "ÑU"), vec![(0, 2), (6, 8)]);
        assert!(highlight_ranges("Luna", "").is_empty());
    }

    #[test]
    fn focus_wraps_per_view() {
        let mut state = AppState::new(Theme::default());
        state.view = View::Login;
        state.focus_previous();
        assert_eq!(state.login_field(), LoginField::Password);
        state.focus_next();
        assert_eq!(state.login_field(), LoginField::Email);
    }
}
