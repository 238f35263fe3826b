//! View model types representing renderable UI state.
//!
//! View models are computed from [`AppState`](crate::app::AppState) and hold
//! display-ready data only: labels are already localized, secrets already
//! masked, highlight ranges already computed. The renderer never looks at the
//! workflows directly.
//!
//! # Example
//!
//! ```rust
//! use mascotas::ui::viewmodel::{Body, EmptyState, FooterInfo, HeaderInfo, UIViewModel};
//!
//! let vm = UIViewModel {
//!     header: HeaderInfo {
//!         title: "Mascotas Perdidas".to_string(),
//!         tabs: vec![],
//!         account: "Sin sesión".to_string(),
//!     },
//!     body: Body::Empty(EmptyState {
//!         message: "Cargando publicaciones...".to_string(),
//!         subtitle: String::new(),
//!     }),
//!     banner: None,
//!     footer: FooterInfo { keybindings: "q: salir".to_string() },
//! };
//! # let _ = vm;
//! ```

/// Complete view model for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UIViewModel {
    pub header: HeaderInfo,

    pub body: Body,

    /// Failure or notice of the active form, shown above the footer.
    pub banner: Option<Banner>,

    pub footer: FooterInfo,
}

/// Title line plus navigation tabs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderInfo {
    pub title: String,

    pub tabs: Vec<NavTab>,

    /// Email of the signed-in identity, or a signed-out marker.
    pub account: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavTab {
    pub label: String,
    pub shortcut: char,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Listing(ListingBody),
    Form(FormBody),
    /// Loading placeholders and other whole-body messages.
    Empty(EmptyState),
}

/// The report listing with its windowed rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingBody {
    pub search_bar: Option<SearchBarInfo>,

    /// Rows inside the visible window.
    pub display_items: Vec<DisplayItem>,

    /// Selection relative to `display_items`.
    pub selected_index: usize,

    /// Full record of the selected report.
    pub detail: Option<DetailPane>,

    /// Set when there is nothing to list.
    pub empty_state: Option<EmptyState>,

    /// `"3 de 10"` style counter.
    pub count: String,
}

/// One report row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayItem {
    pub pet: String,

    pub name: String,

    pub location: String,

    pub published: String,

    pub status: String,

    pub is_selected: bool,

    /// Character ranges of `name` matching the query (start, exclusive end).
    pub highlight_ranges: Vec<(usize, usize)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailPane {
    pub lines: Vec<(String, String)>,
}

/// Any of the four forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormBody {
    pub fields: Vec<FormFieldView>,

    /// Read-only lines below the fields, e.g. the photo preview or stats.
    pub extra_lines: Vec<String>,

    /// Label of the submit control; changes while a request is pending.
    pub submit_label: String,

    pub is_busy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFieldView {
    pub label: String,

    /// Value as displayed. Secrets are masked.
    pub value: String,

    pub is_focused: bool,

    /// Option fields render with arrows instead of a text cursor.
    pub is_choice: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooterInfo {
    pub keybindings: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyState {
    pub message: String,

    pub subtitle: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchBarInfo {
    pub query: String,

    /// Whether keystrokes go to the query.
    pub is_typing: bool,
}
