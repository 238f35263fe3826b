//! User interface rendering layer with component-based architecture.
//!
//! ```text
//! AppState → compute_viewmodel → UIViewModel → render → ANSI Output
//! ```
//!
//! # Modules
//!
//! - [`viewmodel`]: display-ready view model types
//! - [`renderer`]: top-level rendering entry point
//! - [`components`]: header, tabs, table, forms, banner, footer
//! - [`helpers`]: cursor positioning, character-aware cutting and highlighting
//! - [`theme`]: colour themes and ANSI escape sequences
//!
//! # Example
//!
//! ```rust,no_run
//! use mascotas::app::AppState;
//! use mascotas::ui::{render, Theme};
//!
//! let state = AppState::new(Theme::default());
//! render(&state, 24, 80);
//! ```

pub mod components;
pub mod helpers;
pub mod renderer;
pub mod theme;
pub mod viewmodel;

pub use renderer::{render, render_viewmodel};
pub use theme::Theme;
pub use viewmodel::{
    Banner, BannerKind, Body, DisplayItem, EmptyState, FooterInfo, FormBody, HeaderInfo, SearchBarInfo,
    UIViewModel,
};
