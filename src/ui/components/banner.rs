//! One-line banner for form failures and success notices.

use crate::ui::helpers::{position_cursor, print_cell};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::{Banner, BannerKind};

pub fn render_banner(row: usize, banner: &Banner, theme: &Theme, cols: usize) -> usize {
    let (color, marker) = match banner.kind {
        BannerKind::Error => (&theme.colors.error_fg, "✗"),
        BannerKind::Success => (&theme.colors.success_fg, "✓"),
    };

    position_cursor(row, 1);
    print!("{}", Theme::bold());
    print!("{}", Theme::fg(color));
    print_cell(&format!(" {marker} {}", banner.text), cols);
    print!("{}", Theme::reset());
    row + 1
}
