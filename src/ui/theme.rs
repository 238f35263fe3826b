//! Colour themes and ANSI escape sequence generation.
//!
//! Themes are TOML documents. Two are bundled with the plugin and any other
//! can be loaded from a file given in the plugin configuration.
//!
//! # Built-in Themes
//!
//! - `catppuccin-mocha`: dark (default)
//! - `catppuccin-latte`: light
//!
//! # TOML Format
//!
//! ```toml
//! name = "my-theme"
//!
//! [colors]
//! header_fg = "#cdd6f4"
//! tab_active_fg = "#1e1e2e"
//! tab_active_bg = "#cba6f7"
//! selection_fg = "#1e1e2e"
//! selection_bg = "#f5c2e7"
//! text_normal = "#cdd6f4"
//! text_dim = "#6c7086"
//! border = "#45475a"
//! search_bar_border = "#f5c2e7"
//! match_highlight_fg = "#1e1e2e"
//! match_highlight_bg = "#f9e2af"
//! empty_state_fg = "#89b4fa"
//! account_fg = "#f9e2af"
//! field_focus_fg = "#89b4fa"
//! error_fg = "#f38ba8"
//! success_fg = "#a6e3a1"
//! ```

use crate::domain::error::{MascotasError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Name of the theme used when none is configured.
pub const DEFAULT_THEME: &str = "catppuccin-mocha";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Theme {
    pub name: String,
    pub colors: ThemeColors,
}

/// Hex colour strings (`"#rrggbb"`) for each UI element.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ThemeColors {
    pub header_fg: String,
    #[serde(default)]
    pub header_bg: Option<String>,

    /// Tab of the view currently shown.
    pub tab_active_fg: String,
    pub tab_active_bg: String,

    pub selection_fg: String,
    pub selection_bg: String,

    pub text_normal: String,
    /// Footer, labels and secondary info.
    pub text_dim: String,

    pub border: String,

    pub search_bar_border: String,
    pub match_highlight_fg: String,
    pub match_highlight_bg: String,

    pub empty_state_fg: String,

    /// Signed-in email in the header.
    pub account_fg: String,

    /// Label and cursor of the focused form field.
    pub field_focus_fg: String,

    /// Failure banners.
    pub error_fg: String,
    /// Notice banners.
    pub success_fg: String,
}

impl Theme {
    /// Loads a built-in theme by name, or `None` if the name is unknown.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mascotas::ui::Theme;
    ///
    /// let theme = Theme::from_name("catppuccin-latte").unwrap();
    /// assert_eq!(theme.name, "catppuccin-latte");
    /// assert!(Theme::from_name("solarized").is_none());
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let toml_str = match name {
            "catppuccin-mocha" => include_str!("../../themes/catppuccin-mocha.toml"),
            "catppuccin-latte" => include_str!("../../themes/catppuccin-latte.toml"),
            _ => return None,
        };

        toml::from_str(toml_str).ok()
    }

    /// Loads a theme from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`MascotasError::Theme`] if the file cannot be read or does not
    /// parse as a complete theme.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| MascotasError::Theme(format!("failed to read theme file: {e}")))?;

        toml::from_str(&contents)
            .map_err(|e| MascotasError::Theme(format!("failed to parse theme TOML: {e}")))
    }

    /// Parses `#rrggbb`, falling back to white on malformed input.
    fn hex_to_rgb(hex: &str) -> (u8, u8, u8) {
        let hex = hex.trim_start_matches('#').trim();

        if hex.len() != 6 || !hex.is_ascii() {
            return (255, 255, 255);
        }

        let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(255);
        let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(255);
        let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(255);

        (r, g, b)
    }

    /// 24-bit foreground colour sequence.
    ///
    /// ```rust
    /// use mascotas::ui::Theme;
    ///
    /// assert_eq!(Theme::fg("#ff0080"), "\u{1b}[38;2;255;0;128m");
    /// ```
    #[must_use]
    pub fn fg(hex: &str) -> String {
        let (r, g, b) = Self::hex_to_rgb(hex);
        format!("\u{001b}[38;2;{r};{g};{b}m")
    }

    /// 24-bit background colour sequence.
    #[must_use]
    pub fn bg(hex: &str) -> String {
        let (r, g, b) = Self::hex_to_rgb(hex);
        format!("\u{001b}[48;2;{r};{g};{b}m")
    }

    #[must_use]
    pub const fn bold() -> &'static str {
        "\u{001b}[1m"
    }

    #[must_use]
    pub const fn dim() -> &'static str {
        "\u{001b}[2m"
    }

    /// Clears all styling.
    #[must_use]
    pub const fn reset() -> &'static str {
        "\u{001b}[0m"
    }
}

impl Default for Theme {
    /// Catppuccin Mocha.
    ///
    /// # Panics
    ///
    /// Panics if the bundled theme fails to parse, which the tests rule out.
    fn default() -> Self {
        Self::from_name(DEFAULT_THEME).expect("bundled catppuccin-mocha theme should always parse")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_themes_parse() {
        for name in ["catppuccin-mocha", "catppuccin-latte"] {
            let theme = Theme::from_name(name).unwrap();
            assert_eq!(theme.name, name);
            assert!(theme.colors.error_fg.starts_with('#'));
        }
        assert_eq!(Theme::default().name, DEFAULT_THEME);
    }

    #[test]
    fn malformed_hex_falls_back_to_white() {
        assert_eq!(Theme::fg("#xyz"), "\u{1b}[38;2;255;255;255m");
        assert_eq!(Theme::bg("1e1e2e"), "\u{1b}[48;2;30;30;46m");
    }

    #[test]
    fn theme_file_errors_are_theme_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roto.toml");
        fs::write(&path, "name = \"roto\"\n[colors]\nheader_fg = \"#ffffff\"\n").unwrap();

        let err = Theme::from_file(&path).unwrap_err();
        assert!(matches!(err, MascotasError::Theme(_)));

        let err = Theme::from_file(dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().starts_with("Theme error: failed to read"));
    }

    #[test]
    fn custom_theme_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("propio.toml");
        let mut theme = Theme::default();
        theme.name = "propio".to_string();
        fs::write(&path, toml::to_string(&theme).unwrap()).unwrap();

        assert_eq!(Theme::from_file(&path).unwrap().name, "propio");
    }
}
