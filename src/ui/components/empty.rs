//! Empty state: a centred message with a dimmed subtitle.

use crate::ui::helpers::{position_cursor, print_centered};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::EmptyState;

/// Renders the message at `row` and the subtitle below it.
///
/// Used for loading placeholders, fetch failures, an empty table and a search
/// without results.
pub fn render_empty_state(row: usize, empty: &EmptyState, theme: &Theme, cols: usize) -> usize {
    position_cursor(row, 1);
    print!("{}", Theme::fg(&theme.colors.empty_state_fg));
    print_centered(&empty.message, cols);
    print!("{}", Theme::reset());

    if empty.subtitle.is_empty() {
        return row + 1;
    }

    position_cursor(row + 1, 1);
    print!("{}", Theme::dim());
    print!("{}", Theme::fg(&theme.colors.text_dim));
    print_centered(&empty.subtitle, cols);
    print!("{}", Theme::reset());
    row + 2
}
