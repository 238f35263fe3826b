//! View and input mode state types.
//!
//! [`View`] is the screen being shown; the application switches between the
//! five views and nothing else. [`InputMode`] only matters on the listing,
//! where the search bar can take the keyboard.
//!
//! # Example
//!
//! ```rust
//! use mascotas::app::modes::{InputMode, SearchFocus, View};
//!
//! let view = View::Home;
//! let input_mode = InputMode::Search(SearchFocus::Typing);
//! assert_eq!(view.title(), "Mascotas Perdidas");
//! # let _ = input_mode;
//! ```

/// The five screens of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    /// Listing of every report with search.
    Home,
    /// Form to publish a report.
    Publish,
    /// Signed-in user's profile. Requires a session.
    Profile,
    Login,
    Register,
}

impl View {
    /// Views in navigation bar order.
    pub const NAV: [Self; 5] = [
        Self::Home,
        Self::Publish,
        Self::Profile,
        Self::Login,
        Self::Register,
    ];

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Home => "Mascotas Perdidas",
            Self::Publish => "Publicar Mascota Perdida",
            Self::Profile => "Perfil de Usuario",
            Self::Login => "Iniciar Sesión",
            Self::Register => "Registro",
        }
    }

    /// Short label for the navigation bar.
    #[must_use]
    pub const fn nav_label(self) -> &'static str {
        match self {
            Self::Home => "Inicio",
            Self::Publish => "Publicar",
            Self::Profile => "Perfil",
            Self::Login => "Entrar",
            Self::Register => "Registro",
        }
    }

    /// Key that jumps to this view from the listing.
    #[must_use]
    pub const fn shortcut(self) -> char {
        match self {
            Self::Home => 'h',
            Self::Publish => 'p',
            Self::Profile => 'u',
            Self::Login => 'l',
            Self::Register => 'r',
        }
    }

    #[must_use]
    pub const fn is_form(self) -> bool {
        !matches!(self, Self::Home)
    }
}

/// Focus state within search mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFocus {
    /// Keystrokes edit the query.
    Typing,
    /// Keystrokes move through the filtered results.
    Navigating,
}

/// Keyboard handling mode on the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Shortcuts and j/k navigation.
    Normal,
    Search(SearchFocus),
}
