//! Composable UI component renderers.
//!
//! # Components
//!
//! - `header`: title, account and navigation tabs
//! - `search`: search input box
//! - `table`: report rows and the detail pane
//! - `form`: the four input forms
//! - `empty`: centred placeholder messages
//! - `banner`: failure and notice line
//! - `footer`: keybinding hints
//!
//! # Layout
//!
//! ```text
//! [blank line]
//! [Header]
//! [Tabs]
//! [Border]
//! [Body: listing (search bar, table, detail pane) | form | empty state]
//! [Banner]
//! [Border]
//! [Footer]
//! ```

mod banner;
mod empty;
mod footer;
mod form;
mod header;
mod search;
mod table;

use crate::ui::helpers::{display_len, position_cursor};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::{Body, ListingBody, UIViewModel};

use banner::render_banner;
use empty::render_empty_state;
use footer::render_footer;
use form::render_form;
use header::render_header;
use search::render_search_bar;
use table::{render_detail, render_table_headers, render_table_rows};

/// Rows between the top border and an empty-state message.
const EMPTY_STATE_OFFSET: usize = 3;

/// Renders a horizontal border at `row` and returns `row + 1`.
fn render_border(row: usize, color: &str, cols: usize) -> usize {
    position_cursor(row, 1);
    print!("{}", Theme::fg(color));
    print!("{}", "─".repeat(cols));
    print!("{}", Theme::reset());
    row + 1
}

/// Border with a right-aligned label, e.g. `──── 3 de 10 ──`.
fn render_labelled_border(row: usize, label: &str, color: &str, cols: usize) -> usize {
    let label = format!(" {label} ");
    let label_len = display_len(&label);
    if label_len + 4 > cols {
        return render_border(row, color, cols);
    }

    position_cursor(row, 1);
    print!("{}", Theme::fg(color));
    print!("{}", "─".repeat(cols - label_len - 2));
    print!("{label}──");
    print!("{}", Theme::reset());
    row + 1
}

/// Renders a whole frame.
pub fn render_layout(vm: &UIViewModel, theme: &Theme, cols: usize, rows: usize) {
    let mut current_row = 2;

    current_row = render_header(current_row, &vm.header, theme, cols);
    current_row = render_border(current_row, &theme.colors.border, cols);

    let footer_row = rows.max(current_row + 3);
    let border_row = footer_row - 1;
    let banner_row = border_row - 1;

    match &vm.body {
        Body::Listing(listing) => render_listing(current_row, listing, theme, cols, banner_row),
        Body::Form(form) => {
            render_form(current_row, form, theme, cols, banner_row);
        }
        Body::Empty(empty) => {
            render_empty_state(current_row + EMPTY_STATE_OFFSET, empty, theme, cols);
        }
    }

    if let Some(banner) = &vm.banner {
        render_banner(banner_row, banner, theme, cols);
    }
    render_border(border_row, &theme.colors.border, cols);
    render_footer(footer_row, &vm.footer, theme, cols);
}

/// Listing body between `row` and `banner_row`: optional search bar, table,
/// and the detail pane pinned above the banner.
fn render_listing(row: usize, listing: &ListingBody, theme: &Theme, cols: usize, banner_row: usize) {
    let mut current_row = row;

    if let Some(search) = &listing.search_bar {
        current_row = render_search_bar(current_row, search, theme, cols);
    }

    if let Some(empty) = &listing.empty_state {
        render_empty_state(current_row + EMPTY_STATE_OFFSET, empty, theme, cols);
        return;
    }

    current_row = render_table_headers(current_row, theme, cols);
    render_table_rows(current_row, &listing.display_items, theme, cols);

    if let Some(detail) = &listing.detail {
        let detail_row = banner_row.saturating_sub(detail.lines.len() + 1);
        if detail_row > current_row {
            let next = render_labelled_border(detail_row, &listing.count, &theme.colors.border, cols);
            render_detail(next, detail, theme, cols);
        }
    }
}
