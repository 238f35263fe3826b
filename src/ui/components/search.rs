//! Search bar: a bordered box holding the listing filter.

use crate::ui::helpers::{display_len, position_cursor, truncate};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::SearchBarInfo;

/// Horizontal margin for the search box (spaces on left and right).
const SEARCH_BOX_MARGIN: usize = 5;

/// Renders the 3-line search box at `row` and returns `row + 3`.
///
/// ```text
///      ┌──────────────────────┐
///      │ Buscar: macul█       │
///      └──────────────────────┘
/// ```
///
/// The block cursor is only drawn while keystrokes go to the query.
pub fn render_search_bar(row: usize, search: &SearchBarInfo, theme: &Theme, cols: usize) -> usize {
    let box_width = cols.saturating_sub(SEARCH_BOX_MARGIN * 2);
    let inner_width = box_width.saturating_sub(2);
    let border = Theme::fg(&theme.colors.search_bar_border);

    position_cursor(row, 1);
    print!("{}", " ".repeat(SEARCH_BOX_MARGIN));
    print!("{border}┌{}┐{}", "─".repeat(inner_width), Theme::reset());

    let cursor = if search.is_typing { "█" } else { "" };
    let search_text = truncate(&format!(" Buscar: {}{cursor}", search.query), inner_width);
    let padding = inner_width.saturating_sub(display_len(&search_text));

    position_cursor(row + 1, 1);
    print!("{}", " ".repeat(SEARCH_BOX_MARGIN));
    print!("{border}│");
    if search.is_typing {
        print!("{}", Theme::fg(&theme.colors.text_normal));
    } else {
        print!("{}", Theme::fg(&theme.colors.text_dim));
    }
    print!("{search_text}");
    print!("{}", " ".repeat(padding));
    print!("{border}│{}", Theme::reset());

    position_cursor(row + 2, 1);
    print!("{}", " ".repeat(SEARCH_BOX_MARGIN));
    print!("{border}└{}┘{}", "─".repeat(inner_width), Theme::reset());

    row + 3
}
